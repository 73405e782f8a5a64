//! Summary statistics over full collection scans.
//!
//! These are recomputed from a fresh fetch on every request; the relief
//! fund dataset is small and no caching layer exists on purpose.

use serde::Serialize;

use crate::db::models::{DonatedBack, Donation};

pub const TOP_DONOR_COUNT: usize = 5;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TopDonor {
    pub id: String,
    pub name: String,
    pub amount: f64,
}

/// Empty donor names display and aggregate as "Anonymous".
pub fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "Anonymous"
    } else {
        name
    }
}

pub fn total_amount(donations: &[Donation]) -> f64 {
    donations.iter().map(|d| d.amount).sum()
}

/// Distinct donor display names, case-sensitive. Two donors sharing a
/// name collapse into one; an accepted approximation of donor identity.
pub fn unique_donors(donations: &[Donation]) -> usize {
    donations
        .iter()
        .map(|d| display_name(&d.name))
        .collect::<std::collections::HashSet<_>>()
        .len()
}

/// Top donors by amount descending, truncated to [`TOP_DONOR_COUNT`].
/// Ties keep their fetch order (stable sort).
pub fn top_donors(donations: &[Donation]) -> Vec<TopDonor> {
    let mut ranked: Vec<&Donation> = donations.iter().collect();
    ranked.sort_by(|a, b| b.amount.partial_cmp(&a.amount).unwrap_or(std::cmp::Ordering::Equal));
    ranked
        .into_iter()
        .take(TOP_DONOR_COUNT)
        .map(|d| TopDonor {
            id: d.id.clone(),
            name: display_name(&d.name).to_string(),
            amount: d.amount,
        })
        .collect()
}

pub fn donated_back_total(details: &[DonatedBack]) -> f64 {
    details.iter().map(|d| d.total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ItemType;
    use chrono::Utc;

    fn donation(id: &str, name: &str, amount: f64) -> Donation {
        Donation {
            id: id.to_string(),
            name: name.to_string(),
            amount,
            composite_key: None,
            donated_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn total_treats_missing_amounts_as_zero() {
        // A document with no usable amount is mapped to 0 at fetch time,
        // so the sum over [5000, 0, 0] is 5000.
        let donations = vec![
            donation("1", "Jane", 5000.0),
            donation("2", "Bad", 0.0),
            donation("3", "Null", 0.0),
        ];
        assert_eq!(total_amount(&donations), 5000.0);
    }

    #[test]
    fn unique_donors_maps_empty_names_to_anonymous() {
        let donations = vec![
            donation("1", "Jane", 100.0),
            donation("2", "", 200.0),
            donation("3", "Jane", 300.0),
        ];
        // "Jane" and "Anonymous"
        assert_eq!(unique_donors(&donations), 2);
    }

    #[test]
    fn unique_donors_is_case_sensitive() {
        let donations = vec![donation("1", "jane", 100.0), donation("2", "Jane", 100.0)];
        assert_eq!(unique_donors(&donations), 2);
    }

    #[test]
    fn top_donors_sorts_descending_and_truncates() {
        let donations: Vec<Donation> = (1..=8)
            .map(|i| donation(&format!("d{i}"), &format!("Donor {i}"), (i as f64) * 10.0))
            .collect();
        let top = top_donors(&donations);
        assert_eq!(top.len(), TOP_DONOR_COUNT);
        assert_eq!(top[0].amount, 80.0);
        assert_eq!(top[4].amount, 40.0);
        for pair in top.windows(2) {
            assert!(pair[0].amount >= pair[1].amount);
        }
    }

    #[test]
    fn top_donors_breaks_ties_in_fetch_order() {
        let donations = vec![
            donation("first", "A", 100.0),
            donation("second", "B", 100.0),
            donation("third", "C", 500.0),
        ];
        let top = top_donors(&donations);
        assert_eq!(top[0].id, "third");
        assert_eq!(top[1].id, "first");
        assert_eq!(top[2].id, "second");
    }

    #[test]
    fn top_donors_renders_empty_names_as_anonymous() {
        let donations = vec![donation("1", "", 700.0)];
        assert_eq!(top_donors(&donations)[0].name, "Anonymous");
    }

    #[test]
    fn donated_back_total_sums_record_totals() {
        let details = vec![
            DonatedBack {
                id: "1".to_string(),
                organization_name: "Metta Clinic".to_string(),
                count: 40,
                items: "first aid kits".to_string(),
                type_of_items: ItemType::Material,
                total: 120_000.0,
                location: Some("Mandalay".to_string()),
                created_at: Utc::now(),
            },
            DonatedBack {
                id: "2".to_string(),
                organization_name: "Shelter Network".to_string(),
                count: 1,
                items: "cash grant".to_string(),
                type_of_items: ItemType::Financial,
                total: 65_000.0,
                location: None,
                created_at: Utc::now(),
            },
        ];
        assert_eq!(donated_back_total(&details), 185_000.0);
    }
}
