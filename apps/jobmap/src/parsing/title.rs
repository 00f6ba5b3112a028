//! Extracts contract type, city and department from a raw listing title.
//!
//! Titles on the feed loosely follow `[Type] Job title - City (Dept)`, with plenty of
//! variation: missing brackets, no dash before the city, region names in place of a
//! city, free text inside the brackets. Parsing is an ordered list of pure steps over
//! a `TitleDraft`; each step only refines what the previous one produced.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::parsing::contract_type::ContractType;

lazy_static! {
    // Leading `[...]` segment, content captured.
    static ref BRACKET: Regex = Regex::new(r"^\[(.*?)\]").unwrap();

    // Same segment plus trailing whitespace, for stripping.
    static ref BRACKET_PREFIX: Regex = Regex::new(r"^\[.*?\]\s*").unwrap();

    // `(75)`, `(974)`, `(2A)` at the very end.
    static ref DEPARTMENT_SUFFIX: Regex = Regex::new(r"\(([0-9]{2,3}|2A|2B)\)\s*$").unwrap();

    // One or more capitalized words chained by spaces or hyphens: "Le Havre", "Saint-Étienne".
    static ref CAPITALIZED_RUN: Regex = Regex::new(
        r"^[A-ZÀ-ÖØ-Þ][a-zà-öø-ÿ]+(?:[\s-][A-ZÀ-ÖØ-Þ][a-zà-öø-ÿ]+)*$"
    ).unwrap();
}

/// Capitalized words that commonly end a job title and are never a city.
/// Matched exactly: accented spellings are not on the list.
const NOT_A_CITY: &[&str] = &[
    "Projet",
    "Mission",
    "Etudes",
    "Travaux",
    "Developpement",
    "Service",
    "Donnees",
];

/// Structured fields extracted from a listing title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedTitle {
    pub contract_type: ContractType,
    pub clean_title: String,
    /// Empty when no city could be extracted.
    pub city: String,
    /// Department code (`"75"`, `"974"`, `"2A"`), empty when absent.
    pub department: String,
}

/// Intermediate state threaded through the parsing steps.
#[derive(Debug, Clone, PartialEq)]
struct TitleDraft {
    contract_type: ContractType,
    text: String,
    city: String,
    department: String,
}

type TitleStep = fn(&str, TitleDraft) -> TitleDraft;

const STEPS: [TitleStep; 5] = [
    detect_type,
    strip_bracket_prefix,
    extract_department,
    extract_city,
    finish,
];

/// Parses a raw listing title. Never fails: the worst case is `Other` with the
/// whole (trimmed) title and no location.
pub fn parse_title(raw: &str) -> ParsedTitle {
    let draft = TitleDraft {
        contract_type: ContractType::Other,
        text: raw.to_string(),
        city: String::new(),
        department: String::new(),
    };

    let done = STEPS.iter().fold(draft, |draft, step| step(raw, draft));

    ParsedTitle {
        contract_type: done.contract_type,
        clean_title: done.text,
        city: done.city,
        department: done.department,
    }
}

/// Bracket content first; if it holds no keyword ("[Urgent]"), the whole title is scanned.
fn detect_type(raw: &str, draft: TitleDraft) -> TitleDraft {
    let detected = match BRACKET.captures(raw) {
        Some(caps) => ContractType::detect(&caps[1]).or_else(|| ContractType::detect(raw)),
        None => ContractType::detect(raw),
    };

    TitleDraft {
        contract_type: detected.unwrap_or_default(),
        ..draft
    }
}

/// The bracket is stripped whether or not it yielded a type.
fn strip_bracket_prefix(_raw: &str, draft: TitleDraft) -> TitleDraft {
    let text = BRACKET_PREFIX.replace(&draft.text, "").into_owned();
    TitleDraft { text, ..draft }
}

fn extract_department(_raw: &str, draft: TitleDraft) -> TitleDraft {
    let Some(caps) = DEPARTMENT_SUFFIX.captures(&draft.text) else {
        return draft;
    };

    let department = caps[1].to_string();
    let start = caps.get(0).map(|m| m.start()).unwrap_or(draft.text.len());
    let text = draft.text[..start].trim().to_string();

    TitleDraft {
        text,
        department,
        ..draft
    }
}

fn extract_city(_raw: &str, draft: TitleDraft) -> TitleDraft {
    let text = draft.text.replace(['–', '—'], "-");

    if let Some(idx) = text.rfind(" - ") {
        return TitleDraft {
            city: text[idx + 3..].trim().to_string(),
            text: text[..idx].trim().to_string(),
            ..draft
        };
    }

    // Without a separator, only trust a trailing capitalized run when a department
    // code backs it up: "Ingénieur Bourges (18)".
    if draft.department.is_empty() {
        return TitleDraft { text, ..draft };
    }

    match trailing_city_start(&text) {
        Some(start) if !is_denylisted(&text[start..]) => TitleDraft {
            city: text[start..].to_string(),
            text: text[..start].trim().to_string(),
            ..draft
        },
        _ => TitleDraft { text, ..draft },
    }
}

fn is_denylisted(candidate: &str) -> bool {
    NOT_A_CITY.contains(&candidate)
}

fn finish(_raw: &str, draft: TitleDraft) -> TitleDraft {
    TitleDraft {
        text: draft.text.trim().to_string(),
        city: draft.city.trim().to_string(),
        ..draft
    }
}

/// Byte offset of the longest run of capitalized words ending the text.
/// The run starts on a word boundary and never covers the whole text, so a title
/// is never swallowed entirely ("Data (31)" keeps "Data" as its title).
fn trailing_city_start(text: &str) -> Option<usize> {
    let mut prev_is_space = false;
    for (idx, ch) in text.char_indices() {
        if prev_is_space && !ch.is_whitespace() && CAPITALIZED_RUN.is_match(&text[idx..]) {
            return Some(idx);
        }
        prev_is_space = ch.is_whitespace();
    }
    None
}
