//! Usage analytics: keyword counts and a sliding log of questions.
//!
//! Every inbound question updates one JSON document:
//! - `questionCounts`: keyword -> cumulative occurrences
//! - `conversationStats`: (timestamp, truncated question), newest last,
//!   capped at `max_conversations`
//!
//! The document is loaded, modified and saved on every call. Writes from this
//! process are serialized by the aggregator; other processes are not.

use crate::error::StoreError;
use crate::storage::JsonStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::debug;

/// Default size of the question log
pub const DEFAULT_MAX_CONVERSATIONS: usize = 1000;

/// Number of keywords in a summary
pub const TOP_KEYWORDS: usize = 20;

/// Keywords need at least this many characters
const MIN_KEYWORD_LEN: usize = 4;

/// Logged questions are cut to this many characters
const MAX_QUESTION_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationStat {
    pub timestamp: DateTime<Utc>,
    pub question: String,
}

/// The persisted analytics document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRecord {
    #[serde(default)]
    pub question_counts: BTreeMap<String, u64>,
    #[serde(default)]
    pub conversation_stats: Vec<ConversationStat>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    /// Calendar date, YYYY-MM-DD (UTC)
    pub date: String,
    pub count: u64,
}

/// Read-side view served by the analytics endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub top_keywords: Vec<KeywordCount>,
    pub conversations_by_day: Vec<DayCount>,
    pub total_conversations: usize,
}

/// Keywords of a question: lower-cased, non-word characters dropped,
/// whitespace separated, 4+ characters. Repeats are kept.
pub fn extract_keywords(question: &str) -> Vec<String> {
    let normalized: String = question
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    normalized
        .split_whitespace()
        .filter(|word| word.chars().count() >= MIN_KEYWORD_LEN)
        .map(str::to_string)
        .collect()
}

impl AnalyticsRecord {
    /// Count the question's keywords and log it, evicting the oldest entries
    /// beyond `max_conversations`.
    pub fn record_question(&mut self, question: &str, at: DateTime<Utc>, max_conversations: usize) {
        for keyword in extract_keywords(question) {
            *self.question_counts.entry(keyword).or_insert(0) += 1;
        }

        self.conversation_stats.push(ConversationStat {
            timestamp: at,
            question: question.chars().take(MAX_QUESTION_CHARS).collect(),
        });

        let len = self.conversation_stats.len();
        if len > max_conversations {
            self.conversation_stats.drain(..len - max_conversations);
        }
    }

    /// Top keywords by count, conversations per day and the log size.
    ///
    /// Keywords with equal counts keep the map's order (alphabetical).
    pub fn summarize(&self) -> AnalyticsSummary {
        let mut sorted: Vec<(&String, &u64)> = self.question_counts.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(a.1));

        let top_keywords = sorted
            .into_iter()
            .take(TOP_KEYWORDS)
            .map(|(keyword, count)| KeywordCount {
                keyword: keyword.clone(),
                count: *count,
            })
            .collect();

        let mut by_day: BTreeMap<String, u64> = BTreeMap::new();
        for stat in &self.conversation_stats {
            let date = stat.timestamp.date_naive().format("%Y-%m-%d").to_string();
            *by_day.entry(date).or_insert(0) += 1;
        }

        AnalyticsSummary {
            top_keywords,
            conversations_by_day: by_day
                .into_iter()
                .map(|(date, count)| DayCount { date, count })
                .collect(),
            total_conversations: self.conversation_stats.len(),
        }
    }
}

/// Single per-process owner of the analytics document
pub struct AnalyticsAggregator {
    store: Box<dyn JsonStore<AnalyticsRecord>>,
    write_lock: Mutex<()>,
    enabled: bool,
    max_conversations: usize,
}

impl AnalyticsAggregator {
    pub fn new(store: Box<dyn JsonStore<AnalyticsRecord>>) -> Self {
        Self::with_settings(store, true, DEFAULT_MAX_CONVERSATIONS)
    }

    pub fn with_settings(
        store: Box<dyn JsonStore<AnalyticsRecord>>,
        enabled: bool,
        max_conversations: usize,
    ) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
            enabled,
            max_conversations,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record one inbound question and persist the document.
    pub fn record(&self, question: &str) -> Result<(), StoreError> {
        self.record_at(question, Utc::now())
    }

    pub fn record_at(&self, question: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        if !self.enabled {
            return Ok(());
        }

        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut record = self.store.load()?;
        record.record_question(question, at, self.max_conversations);
        self.store.save(&record)?;

        debug!(
            "Analytics recorded ({} logged questions)",
            record.conversation_stats.len()
        );
        Ok(())
    }

    pub fn summary(&self) -> Result<AnalyticsSummary, StoreError> {
        Ok(self.store.load()?.summarize())
    }
}
