//! Shared types and the retrieval engine for REALbot components.
//!
//! Everything here is transport-free: the knowledge matcher, the
//! qualification extractor, the analytics aggregator and the document store
//! seam. The daemon wires them to HTTP and to the generator.

pub mod analytics;
pub mod error;
pub mod knowledge;
pub mod qualification;
pub mod session;
pub mod storage;

pub use analytics::{AnalyticsAggregator, AnalyticsRecord, AnalyticsSummary};
pub use error::{RealbotError, StoreError};
pub use knowledge::{find_relevant_answer, KnowledgeBase, KnowledgeEntry, KnowledgeId};
pub use qualification::{PatternExtractor, QualificationExtractor};
pub use session::{ContactDetails, ContactInfo, Message, Role, Session, UserData};
pub use storage::{JsonFileStore, JsonStore, MemoryStore};

/// Crate version, reported by the daemon
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Knowledge base document name inside the data dir
pub const KNOWLEDGE_FILE: &str = "knowledgeBase.json";

/// Analytics document name inside the data dir
pub const ANALYTICS_FILE: &str = "analytics.json";
