//! Lead qualification extraction from assistant replies.
//!
//! The generator is prompted to ask about budget, location and timeline.
//! Its replies are mined with loose patterns and the captured text is stored
//! as-is. Nothing here parses amounts or dates.
//!
//! Rules:
//! - A field that is already set is never overwritten
//! - Each rule fires at most once per reply (first match)
//! - `ready_to_contact` only ever goes from false to true
//! - `property_type` has no rule

use crate::session::UserData;
use once_cell::sync::Lazy;
use regex::Regex;

static BUDGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)budget.*?(\$[\d,]+|\d+k|\d+ thousand|\d+ million)").expect("valid budget regex")
});

static LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)locations?.*?([A-Za-z\s,]+)").expect("valid location regex")
});

static TIMELINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)timeline.*?(\d+\s+(?:days|weeks|months|years))").expect("valid timeline regex")
});

static READY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)viewing|tour|show|see the (?:house|property|home)|speak with an agent")
        .expect("valid readiness regex")
});

/// Turns free assistant text into qualification fields.
///
/// Implementations must be pure: `current` is never mutated and fields that
/// are already set come back unchanged.
pub trait QualificationExtractor: Send + Sync {
    fn extract(&self, text: &str, current: &UserData) -> UserData;
}

/// Regex heuristics over the reply text
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn new() -> Self {
        Self
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Budget amount token, verbatim ("$450,000", "500k", "2 million").
pub fn extract_budget(text: &str) -> Option<String> {
    first_capture(&BUDGET_RE, text)
}

/// Run of letters/spaces/commas following "location(s)", trimmed.
pub fn extract_location(text: &str) -> Option<String> {
    first_capture(&LOCATION_RE, text).map(|s| s.trim().to_string())
}

/// "<number> <unit>" following "timeline".
pub fn extract_timeline(text: &str) -> Option<String> {
    first_capture(&TIMELINE_RE, text)
}

/// True when the reply talks about viewings, tours or an agent.
pub fn signals_ready_to_contact(text: &str) -> bool {
    READY_RE.is_match(text)
}

impl QualificationExtractor for PatternExtractor {
    fn extract(&self, text: &str, current: &UserData) -> UserData {
        let mut updated = current.clone();

        if updated.budget.is_none() {
            updated.budget = extract_budget(text);
        }
        if updated.preferred_location.is_none() {
            updated.preferred_location = extract_location(text);
        }
        if updated.timeline.is_none() {
            updated.timeline = extract_timeline(text);
        }
        if signals_ready_to_contact(text) {
            updated.ready_to_contact = true;
        }

        updated
    }
}
