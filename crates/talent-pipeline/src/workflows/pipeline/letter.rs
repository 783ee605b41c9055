//! Offer letter rendering and download packaging.

use mime::Mime;

use super::domain::{Candidate, InvalidStateError, OfferDetails, PipelineError};

/// Output flavor for an exported letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LetterFormat {
    #[default]
    Html,
    Text,
}

impl LetterFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "txt",
        }
    }

    pub fn content_type(self) -> Mime {
        match self {
            Self::Html => mime::TEXT_HTML_UTF_8,
            Self::Text => mime::TEXT_PLAIN_UTF_8,
        }
    }
}

/// Letter body together with the suggested download name.
#[derive(Debug, Clone)]
pub struct OfferLetterExport {
    pub filename: String,
    pub content_type: Mime,
    pub body: Vec<u8>,
}

/// Render the plain text offer letter for a candidate holding an offer.
pub fn render_offer_letter(candidate: &Candidate) -> Result<String, PipelineError> {
    let details = offer_details(candidate)?;
    Ok(letter_paragraphs(&candidate.name, details).join("\n\n") + "\n")
}

/// Render the offer letter as a standalone HTML document.
pub fn render_offer_letter_html(candidate: &Candidate) -> Result<String, PipelineError> {
    let details = offer_details(candidate)?;
    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>Offer Letter - {}</title>\n</head>\n<body>\n",
        escape_html(&candidate.name)
    ));
    for paragraph in letter_paragraphs(&candidate.name, details) {
        let lines: Vec<String> = paragraph.lines().map(escape_html).collect();
        html.push_str(&format!("<p>{}</p>\n", lines.join("<br>")));
    }
    html.push_str("</body>\n</html>\n");
    Ok(html)
}

pub fn export_offer_letter(
    candidate: &Candidate,
    format: LetterFormat,
) -> Result<OfferLetterExport, PipelineError> {
    let body = match format {
        LetterFormat::Html => render_offer_letter_html(candidate)?,
        LetterFormat::Text => render_offer_letter(candidate)?,
    };

    Ok(OfferLetterExport {
        filename: letter_filename(&candidate.name, format),
        content_type: format.content_type(),
        body: body.into_bytes(),
    })
}

/// `Offer_Letter_<Name_with_underscores>.<ext>`
/// Download name safe to quote inside a `Content-Disposition` header.
///
/// Whitespace runs become `_`; quotes, control characters and other punctuation are dropped.
pub fn letter_filename(name: &str, format: LetterFormat) -> String {
    let words: Vec<String> = name
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect();
    let stem = if words.is_empty() {
        "Candidate".to_string()
    } else {
        words.join("_")
    };
    format!("Offer_Letter_{}.{}", stem, format.extension())
}

fn offer_details(candidate: &Candidate) -> Result<&OfferDetails, PipelineError> {
    candidate
        .offer
        .as_ref()
        .map(|offer| &offer.details)
        .ok_or_else(|| InvalidStateError::NoOffer(candidate.id.clone()).into())
}

fn letter_paragraphs(name: &str, details: &OfferDetails) -> Vec<String> {
    vec![
        format!("Dear {name},"),
        format!(
            "We are pleased to offer you the position of {} with our organization.",
            details.position
        ),
        format!(
            "Your annual salary will be {}, and your start date will be {}.",
            details.salary,
            details.start_date.format("%Y-%m-%d")
        ),
        "We look forward to welcoming you to the team. Please confirm your acceptance of this offer at your earliest convenience.".to_string(),
        "Sincerely,\nThe Hiring Team".to_string(),
    ]
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
