//! Live knowledge corpus.
//!
//! Loaded once at startup and replaced wholesale by the admin endpoint. The
//! document is written first; the in-memory corpus only changes once the
//! write succeeded, so matcher and file never disagree after a failed update.

use realbot_shared::error::{RealbotError, StoreError};
use realbot_shared::knowledge::{KnowledgeBase, KnowledgeEntry};
use realbot_shared::storage::{JsonStore, MemoryStore};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

pub struct KnowledgeService {
    corpus: RwLock<Arc<Vec<KnowledgeEntry>>>,
    store: Arc<dyn JsonStore<KnowledgeBase>>,
}

impl KnowledgeService {
    /// Read the corpus from `store`. A read failure leaves the corpus empty.
    pub fn load(store: Box<dyn JsonStore<KnowledgeBase>>) -> Self {
        let entries = match store.load() {
            Ok(kb) => {
                info!("Loaded knowledge base ({} entries)", kb.questions.len());
                kb.questions
            }
            Err(e) => {
                error!("Failed to load knowledge base, starting empty: {}", e);
                Vec::new()
            }
        };

        Self {
            corpus: RwLock::new(Arc::new(entries)),
            store: Arc::from(store),
        }
    }

    /// In-memory corpus
    pub fn with_entries(entries: Vec<KnowledgeEntry>) -> Self {
        let store = MemoryStore::new(KnowledgeBase {
            questions: entries,
        });
        Self::load(Box::new(store))
    }

    /// Snapshot of the current corpus
    pub async fn entries(&self) -> Arc<Vec<KnowledgeEntry>> {
        Arc::clone(&*self.corpus.read().await)
    }

    pub async fn document(&self) -> KnowledgeBase {
        KnowledgeBase {
            questions: Vec::clone(&*self.entries().await),
        }
    }

    /// Persist and swap in a new corpus
    pub async fn replace(&self, entries: Vec<KnowledgeEntry>) -> Result<(), StoreError> {
        let mut corpus = self.corpus.write().await;
        let store = Arc::clone(&self.store);
        let document = tokio::task::spawn_blocking(move || {
            let document = KnowledgeBase { questions: entries };
            store.save(&document).map(|()| document)
        })
        .await
        .unwrap_or_else(|e| Err(StoreError::Unavailable(e.to_string())))?;
        info!("Knowledge base replaced ({} entries)", document.questions.len());
        *corpus = Arc::new(document.questions);
        Ok(())
    }
}

/// Validate an update payload `{"questions": [...]}`.
pub fn parse_update(payload: &serde_json::Value) -> Result<Vec<KnowledgeEntry>, RealbotError> {
    let questions = payload
        .get("questions")
        .filter(|q| q.is_array())
        .ok_or_else(|| RealbotError::Validation("questions must be an array".to_string()))?;

    serde_json::from_value(questions.clone())
        .map_err(|e| RealbotError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use realbot_shared::knowledge::KnowledgeId;
    use realbot_shared::storage::JsonFileStore;
    use serde_json::json;
    use std::time::{Duration, Instant};

    /// Document whose writes block the calling thread
    struct SlowStore(Duration);

    impl JsonStore<KnowledgeBase> for SlowStore {
        fn load(&self) -> Result<KnowledgeBase, StoreError> {
            Ok(KnowledgeBase::default())
        }

        fn save(&self, _value: &KnowledgeBase) -> Result<(), StoreError> {
            std::thread::sleep(self.0);
            Ok(())
        }
    }

    fn sample() -> Vec<KnowledgeEntry> {
        vec![KnowledgeEntry {
            id: KnowledgeId::number(7),
            category: Some("selling".to_string()),
            question: "How do I list my home".to_string(),
            answer: "Call us.".to_string(),
        }]
    }

    #[test]
    fn test_parse_update_ok() {
        let payload = json!({"questions": [
            {"id": 7, "category": "selling", "question": "How do I list my home", "answer": "Call us."}
        ]});
        assert_eq!(parse_update(&payload).unwrap(), sample());
    }

    #[test]
    fn test_parse_update_rejects_non_array() {
        for payload in [json!({}), json!({"questions": "nope"}), json!({"questions": {"id": 1}})] {
            let err = parse_update(&payload).unwrap_err();
            assert!(matches!(err, RealbotError::Validation(_)));
        }
    }

    #[test]
    fn test_parse_update_rejects_bad_entry() {
        let payload = json!({"questions": [{"id": 1}]});
        assert!(matches!(parse_update(&payload), Err(RealbotError::Validation(_))));
    }

    #[tokio::test]
    async fn test_replace_persists_and_swaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledgeBase.json");
        let service = KnowledgeService::load(Box::new(JsonFileStore::<KnowledgeBase>::new(&path)));
        assert!(service.entries().await.is_empty());

        service.replace(sample()).await.unwrap();
        assert_eq!(*service.entries().await, sample());

        let reloaded = KnowledgeService::load(Box::new(JsonFileStore::<KnowledgeBase>::new(&path)));
        assert_eq!(reloaded.document().await.questions, sample());
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledgeBase.json");
        std::fs::write(&path, "[[[").unwrap();
        let service = KnowledgeService::load(Box::new(JsonFileStore::<KnowledgeBase>::new(&path)));
        assert!(service.entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_replace_writes_off_the_runtime() {
        let service = KnowledgeService::load(Box::new(SlowStore(Duration::from_millis(300))));

        let started = Instant::now();
        let (replaced, ticker) = tokio::join!(service.replace(sample()), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            started.elapsed()
        });

        replaced.unwrap();
        assert_eq!(*service.entries().await, sample());
        assert!(ticker < Duration::from_millis(200), "runtime stalled for {:?}", ticker);
    }
}
