//! Knowledge base matcher for fast-path answers.
//!
//! The session store calls this BEFORE the generator. When a curated entry
//! covers the question the stored answer is returned and no LLM call is made.
//!
//! Matching is plain keyword overlap:
//! - Entry keywords: lower-cased question tokens, punctuation stripped,
//!   longer than 3 characters (duplicates count once per occurrence)
//! - A keyword matches if it is a substring of the lower-cased user question
//! - First entry in corpus order whose ratio exceeds the threshold wins

use serde::{Deserialize, Serialize};

/// Fraction of entry keywords that must appear in the question (strictly above)
pub const MATCH_THRESHOLD: f64 = 0.4;

/// Keywords must be longer than this after punctuation is stripped
const MIN_KEYWORD_LEN: usize = 3;

/// Opaque entry identifier, kept exactly as written in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgeId(serde_json::Value);

impl KnowledgeId {
    pub fn number(n: i64) -> Self {
        Self(serde_json::Value::from(n))
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self(serde_json::Value::String(s.into()))
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for KnowledgeId {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for KnowledgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => write!(f, "{}", s),
            serde_json::Value::Null => Ok(()),
            other => write!(f, "{}", other),
        }
    }
}

/// One curated Q&A pair. Absent `id` and `category` stay absent on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    #[serde(default, skip_serializing_if = "KnowledgeId::is_null")]
    pub id: KnowledgeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub question: String,
    pub answer: String,
}

/// The knowledge base document: `{"questions": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub questions: Vec<KnowledgeEntry>,
}

/// A knowledge entry that answered a question
#[derive(Debug, Clone)]
pub struct KnowledgeMatch<'a> {
    pub entry: &'a KnowledgeEntry,
    /// Position of the entry in the corpus
    pub index: usize,
    /// matched / total keywords
    pub ratio: f64,
    pub matched_keywords: Vec<String>,
}

/// Significant keywords of a corpus question, in order.
pub fn keywords(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                .collect::<String>()
        })
        .filter(|word| word.chars().count() > MIN_KEYWORD_LEN)
        .collect()
}

/// Ratio of the entry's keywords found in the question.
/// None when the entry has no significant keywords.
pub fn match_ratio(question: &str, entry: &KnowledgeEntry) -> Option<f64> {
    let entry_keywords = keywords(&entry.question);
    if entry_keywords.is_empty() {
        return None;
    }
    let question = question.to_lowercase();
    let matched = entry_keywords
        .iter()
        .filter(|k| question.contains(k.as_str()))
        .count();
    Some(matched as f64 / entry_keywords.len() as f64)
}

/// First entry, in corpus order, whose match ratio exceeds the threshold.
pub fn find_match<'a>(question: &str, corpus: &'a [KnowledgeEntry]) -> Option<KnowledgeMatch<'a>> {
    let lowered = question.to_lowercase();

    for (index, entry) in corpus.iter().enumerate() {
        let entry_keywords = keywords(&entry.question);
        if entry_keywords.is_empty() {
            continue;
        }

        let matched_keywords: Vec<String> = entry_keywords
            .iter()
            .filter(|k| lowered.contains(k.as_str()))
            .cloned()
            .collect();
        let ratio = matched_keywords.len() as f64 / entry_keywords.len() as f64;

        if ratio > MATCH_THRESHOLD {
            return Some(KnowledgeMatch {
                entry,
                index,
                ratio,
                matched_keywords,
            });
        }
    }

    None
}

/// Answer text of the first matching entry, if any.
pub fn find_relevant_answer<'a>(question: &str, corpus: &'a [KnowledgeEntry]) -> Option<&'a str> {
    find_match(question, corpus).map(|m| m.entry.answer.as_str())
}
