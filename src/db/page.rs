use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::Donation;

/// Default number of rows per page of the ordered donations view.
pub const PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;
const MAX_CURSOR_TOKEN_LEN: usize = 512;

/// A resume point in the amount-descending scan of the donations
/// collection: the sort key plus the row id as the stable tiebreak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub amount: f64,
    pub id: String,
}

impl Cursor {
    pub fn for_donation(donation: &Donation) -> Cursor {
        Cursor {
            amount: donation.amount,
            id: donation.id.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("cursor token exceeds max length")]
    TooLong,
    #[error("cursor token is not valid base64: {0}")]
    InvalidFormat(#[from] base64::DecodeError),
    #[error("cursor payload is not valid: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Where a page fetch enters the ordered scan.
///
/// `At` is the forward-scan approximation of backward navigation: it
/// resumes *inclusively* at the anchor row and can duplicate or skip
/// rows when the sort order is not strictly stable.
#[derive(Debug, Clone, PartialEq)]
pub enum PageStart {
    First,
    After(Cursor),
    At(Cursor),
}

pub fn encode_cursor(cursor: &Cursor) -> Result<String, CursorError> {
    let payload = serde_json::to_vec(cursor)?;
    Ok(URL_SAFE_NO_PAD.encode(payload))
}

pub fn decode_cursor(token: &str) -> Result<Cursor, CursorError> {
    if token.len() > MAX_CURSOR_TOKEN_LEN {
        return Err(CursorError::TooLong);
    }
    let payload = URL_SAFE_NO_PAD.decode(token)?;
    Ok(serde_json::from_slice(&payload)?)
}

/// Clamps a requested page size into a sane range.
pub fn clamp_page_size(requested: Option<u32>) -> u32 {
    requested.unwrap_or(PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}
