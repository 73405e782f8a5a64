//! Donation certificate generation.
//!
//! Overlays the donor name and a formatted amount onto a fixed PDF
//! template. The coordinates are an implicit contract with the one
//! shipped template; a new template design means new constants.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::path::Path;
use thiserror::Error;

const FONT_RESOURCE: &str = "FCert";

const NAME_X: i64 = 130;
const NAME_Y: i64 = 275;
const NAME_FONT_SIZE: i64 = 16;

const AMOUNT_X: i64 = 250;
const AMOUNT_Y: i64 = 355;
const AMOUNT_FONT_SIZE: i64 = 20;

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("certificate template could not be read: {0}")]
    TemplateRead(#[from] std::io::Error),
    #[error("certificate template could not be processed: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("certificate template has no pages")]
    NoPages,
}

/// Reads the template from disk and overlays the donor fields.
pub fn generate_from_file(
    template_path: &Path,
    name: &str,
    amount: f64,
) -> Result<Vec<u8>, CertificateError> {
    let template = std::fs::read(template_path)?;
    generate(&template, name, amount)
}

/// Overlays `name` and the formatted amount onto the first page of the
/// template and returns the serialized document. Identical inputs
/// produce identical drawn text.
pub fn generate(template: &[u8], name: &str, amount: f64) -> Result<Vec<u8>, CertificateError> {
    let mut doc = Document::load_mem(template)?;

    let page_id = doc
        .get_pages()
        .into_iter()
        .next()
        .map(|(_, id)| id)
        .ok_or(CertificateError::NoPages)?;

    ensure_bold_font(&mut doc, page_id)?;

    let content_data = doc.get_page_content(page_id)?;
    let mut content = Content::decode(&content_data)?;

    content.operations.push(Operation::new("q", vec![]));
    push_text(&mut content, name, NAME_X, NAME_Y, NAME_FONT_SIZE);
    push_text(
        &mut content,
        &format_mmk(amount),
        AMOUNT_X,
        AMOUNT_Y,
        AMOUNT_FONT_SIZE,
    );
    content.operations.push(Operation::new("Q", vec![]));

    doc.change_page_content(page_id, content.encode()?)?;

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

fn push_text(content: &mut Content, text: &str, x: i64, y: i64, size: i64) {
    content.operations.push(Operation::new("BT", vec![]));
    content.operations.push(Operation::new(
        "Tf",
        vec![
            Object::Name(FONT_RESOURCE.as_bytes().to_vec()),
            Object::Integer(size),
        ],
    ));
    content.operations.push(Operation::new(
        "rg",
        vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
    ));
    content.operations.push(Operation::new(
        "Td",
        vec![Object::Integer(x), Object::Integer(y)],
    ));
    content
        .operations
        .push(Operation::new("Tj", vec![Object::string_literal(text)]));
    content.operations.push(Operation::new("ET", vec![]));
}

/// Registers Helvetica-Bold under [`FONT_RESOURCE`] in the page's font
/// resources, wherever the template happens to keep them (inline
/// dictionary, indirect reference, or absent).
fn ensure_bold_font(doc: &mut Document, page_id: ObjectId) -> Result<(), lopdf::Error> {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let resources_slot = {
        let page = doc.get_dictionary(page_id)?;
        classify(page, b"Resources")
    };

    let resources_slot = match resources_slot {
        Slot::Missing => {
            let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
            page.set(
                "Resources",
                dictionary! { "Font" => dictionary! { FONT_RESOURCE => font_id } },
            );
            return Ok(());
        }
        other => other,
    };

    let font_slot = {
        let resources = match resources_slot {
            Slot::Reference(id) => doc.get_dictionary(id)?,
            _ => doc.get_dictionary(page_id)?.get(b"Resources")?.as_dict()?,
        };
        classify(resources, b"Font")
    };

    match font_slot {
        Slot::Reference(font_dict_id) => {
            let fonts = doc.get_object_mut(font_dict_id)?.as_dict_mut()?;
            fonts.set(FONT_RESOURCE, font_id);
        }
        Slot::Direct => {
            let resources = resources_dict_mut(doc, page_id, resources_slot)?;
            resources
                .get_mut(b"Font")?
                .as_dict_mut()?
                .set(FONT_RESOURCE, font_id);
        }
        Slot::Missing => {
            let resources = resources_dict_mut(doc, page_id, resources_slot)?;
            resources.set("Font", dictionary! { FONT_RESOURCE => font_id });
        }
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Slot {
    Missing,
    Direct,
    Reference(ObjectId),
}

fn classify(dict: &Dictionary, key: &[u8]) -> Slot {
    match dict.get(key) {
        Ok(Object::Reference(id)) => Slot::Reference(*id),
        Ok(_) => Slot::Direct,
        Err(_) => Slot::Missing,
    }
}

fn resources_dict_mut(
    doc: &mut Document,
    page_id: ObjectId,
    slot: Slot,
) -> Result<&mut Dictionary, lopdf::Error> {
    match slot {
        Slot::Reference(id) => doc.get_object_mut(id)?.as_dict_mut(),
        _ => doc
            .get_object_mut(page_id)?
            .as_dict_mut()?
            .get_mut(b"Resources")?
            .as_dict_mut(),
    }
}

/// Formats an amount the way the certificate and stats pages show it,
/// e.g. `MMK 5,000` or `MMK 1,234.50`.
pub fn format_mmk(amount: f64) -> String {
    format!("MMK {}", group_thousands(amount))
}

fn group_thousands(amount: f64) -> String {
    let raw = if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    };
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Download file name for a donor's certificate, safe for a
/// Content-Disposition header.
pub fn certificate_file_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let trimmed = safe.trim_matches('_');
    if trimmed.is_empty() {
        "donor_certificate.pdf".to_string()
    } else {
        format!("{trimmed}_certificate.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Stream;

    /// A minimal one-page document standing in for the real template.
    fn blank_template() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).expect("serialize template");
        out
    }

    fn drawn_strings(pdf: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(pdf).expect("load generated pdf");
        let page_id = *doc.get_pages().values().next().expect("one page");
        let content_data = doc.get_page_content(page_id).expect("page content");
        let content = Content::decode(&content_data).expect("decode content");
        content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn overlays_name_and_formatted_amount() {
        let template = blank_template();
        let pdf = generate(&template, "Jane Doe", 5000.0).expect("generate");
        let strings = drawn_strings(&pdf);
        assert_eq!(strings, vec!["Jane Doe".to_string(), "MMK 5,000".to_string()]);
    }

    #[test]
    fn generation_is_deterministic() {
        let template = blank_template();
        let first = generate(&template, "Jane Doe", 12_345.0).expect("generate");
        let second = generate(&template, "Jane Doe", 12_345.0).expect("generate");
        assert_eq!(first, second);
    }

    #[test]
    fn text_is_drawn_at_the_template_coordinates() {
        let template = blank_template();
        let pdf = generate(&template, "Jane", 100.0).expect("generate");
        let doc = Document::load_mem(&pdf).expect("load");
        let page_id = *doc.get_pages().values().next().expect("one page");
        let content =
            Content::decode(&doc.get_page_content(page_id).expect("content")).expect("decode");
        let offsets: Vec<(i64, i64)> = content
            .operations
            .iter()
            .filter(|op| op.operator == "Td")
            .filter_map(|op| match (op.operands.first(), op.operands.get(1)) {
                (Some(Object::Integer(x)), Some(Object::Integer(y))) => Some((*x, *y)),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![(NAME_X, NAME_Y), (AMOUNT_X, AMOUNT_Y)]);
    }

    #[test]
    fn rejects_bytes_that_are_not_a_pdf() {
        assert!(generate(b"definitely not a pdf", "Jane", 1.0).is_err());
    }

    #[test]
    fn amount_formatting_groups_thousands() {
        assert_eq!(format_mmk(0.0), "MMK 0");
        assert_eq!(format_mmk(500.0), "MMK 500");
        assert_eq!(format_mmk(5000.0), "MMK 5,000");
        assert_eq!(format_mmk(1_234_567.0), "MMK 1,234,567");
        assert_eq!(format_mmk(1234.5), "MMK 1,234.50");
    }

    #[test]
    fn file_name_is_header_safe() {
        assert_eq!(certificate_file_name("Jane Doe"), "Jane_Doe_certificate.pdf");
        assert_eq!(certificate_file_name(""), "donor_certificate.pdf");
        assert_eq!(certificate_file_name("a/b\"c"), "a_b_c_certificate.pdf");
    }
}
