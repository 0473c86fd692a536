use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::domain::LetterFields;

/// Marker that opens the letter body. Case-sensitive on purpose: lowercase
/// "dear" mid-sentence is not a salutation.
const SALUTATION_MARKER: &str = "Dear";

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)NHS\s*(?:Number|No\.?|#)?\s*:?\s*(\d(?:[\d ]*\d)?)").unwrap()
});

/// Ordered date patterns, first match wins. Long written form beats the
/// short numeric form beats a literal ISO date.
type DateNormalizer = fn(&Captures) -> Option<String>;

static DATE_PATTERNS: LazyLock<Vec<(Regex, DateNormalizer)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(
                r"(?i)\b(\d{1,2})\s*(?:st|nd|rd|th)?\s+(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{4})\b",
            )
            .unwrap(),
            normalize_long_form,
        ),
        (
            Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4})\b").unwrap(),
            normalize_short_numeric,
        ),
        (
            Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").unwrap(),
            normalize_iso_literal,
        ),
    ]
});

/// Pure extraction of structured fields from letter text. All fields are
/// best-effort; absence comes back as `None`, never as an error.
pub fn extract_fields(text: &str) -> LetterFields {
    LetterFields {
        identifier: extract_identifier(text),
        letter_date: extract_letter_date(text),
        body: extract_body(text),
    }
}

/// First labeled numeric token, raw (whitespace between digit groups kept).
fn extract_identifier(text: &str) -> Option<String> {
    IDENTIFIER
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn extract_letter_date(text: &str) -> Option<String> {
    DATE_PATTERNS.iter().find_map(|(pattern, normalize)| {
        pattern.captures(text).and_then(|c| normalize(&c))
    })
}

fn extract_body(text: &str) -> Option<String> {
    text.find(SALUTATION_MARKER).map(|at| text[at..].to_string())
}

/// Strips whitespace out of a captured identifier. Returns `None` when the
/// result is empty or contains anything but digits.
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}

/// `YYYY-MM` prefix of an ISO date or timestamp, by fixed-position slice.
/// `None` for anything too short or not date-shaped.
pub fn month_partition(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    if bytes.len() < 7 {
        return None;
    }
    let shape_ok = bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit);
    if shape_ok {
        Some(value[..7].to_string())
    } else {
        None
    }
}

fn normalize_long_form(captures: &Captures) -> Option<String> {
    let day: u32 = captures.get(1)?.as_str().parse().ok()?;
    let month = month_number(captures.get(2)?.as_str())?;
    let year = captures.get(3)?.as_str();
    if !(1..=31).contains(&day) {
        return None;
    }
    Some(format!("{year}-{month:02}-{day:02}"))
}

fn normalize_short_numeric(captures: &Captures) -> Option<String> {
    // Day-month-year ordering assumed, as written in UK correspondence.
    let day: u32 = captures.get(1)?.as_str().parse().ok()?;
    let month: u32 = captures.get(2)?.as_str().parse().ok()?;
    let year = captures.get(3)?.as_str();
    if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
        return None;
    }
    Some(format!("{year}-{month:02}-{day:02}"))
}

fn normalize_iso_literal(captures: &Captures) -> Option<String> {
    captures.get(1).map(|m| m.as_str().to_string())
}

fn month_number(name: &str) -> Option<u32> {
    match name.to_ascii_lowercase().as_str() {
        "january" => Some(1),
        "february" => Some(2),
        "march" => Some(3),
        "april" => Some(4),
        "may" => Some(5),
        "june" => Some(6),
        "july" => Some(7),
        "august" => Some(8),
        "september" => Some(9),
        "october" => Some(10),
        "november" => Some(11),
        "december" => Some(12),
        _ => None,
    }
}
