//! Extraction helpers over parsed document snapshots.
//!
//! Site modules express their field extraction with these primitives so the
//! cleanup rules (whitespace trimming, thousands separators, the `nick (ip)`
//! convention used by the target boards) live in one place.

use scraper::{ElementRef, Html, Selector};

/// Parse a CSS selector literal.
///
/// # Panics
///
/// Panics on a malformed selector; call sites pass static literals only.
#[must_use]
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector literal")
}

/// Concatenated, trimmed text content of one element.
#[must_use]
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Text of the first match under a document root.
#[must_use]
pub fn doc_first_text(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel).next().map(text_of)
}

/// Text of the first match under an element.
#[must_use]
pub fn el_first_text(el: ElementRef<'_>, sel: &Selector) -> Option<String> {
    el.select(sel).next().map(text_of)
}

/// Attribute of the first match under an element.
#[must_use]
pub fn el_first_attr(el: ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    el.select(sel)
        .next()
        .and_then(|m| m.value().attr(attr))
        .map(str::to_string)
}

/// Parse a rendered count such as `"1,234"` or `"댓글 123개"`: keeps the
/// ASCII digits and drops everything else.
#[must_use]
pub fn parse_count(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// The original boards render vote counters in several alternative spots;
/// the first match wins and an absent or unparseable counter reads as zero.
#[must_use]
pub fn count_of(doc: &Html, sel: &Selector) -> u32 {
    doc_first_text(doc, sel)
        .and_then(|t| parse_count(&t))
        .unwrap_or(0)
}

/// Split the `nick (ip)` display convention into name and optional ip.
#[must_use]
pub fn split_author(raw: &str) -> (String, Option<String>) {
    if let Some(open) = raw.find('(') {
        let name = raw[..open].trim().to_string();
        let rest = &raw[open + 1..];
        if let Some(close) = rest.find(')') {
            let ip = rest[..close].trim();
            if !ip.is_empty() {
                return (name, Some(ip.to_string()));
            }
        }
        return (name, None);
    }
    (raw.trim().to_string(), None)
}
