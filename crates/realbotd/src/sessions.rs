//! In-memory conversation sessions.
//!
//! Each session sits behind its own mutex. Every operation on a session holds
//! that mutex for its full duration, generator call included, so two messages
//! for the same session are processed one after the other while different
//! sessions never wait on each other.

use crate::knowledge::KnowledgeService;
use crate::llm::Generator;
use crate::prompts::build_system_prompt;
use realbot_shared::analytics::AnalyticsAggregator;
use realbot_shared::error::{RealbotError, StoreError};
use realbot_shared::knowledge::find_relevant_answer;
use realbot_shared::qualification::QualificationExtractor;
use realbot_shared::session::{ContactDetails, ContactInfo, Message, Session, UserData};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Reply sent when the generator fails or times out
pub const APOLOGY: &str =
    "I'm sorry, I'm having trouble connecting to my knowledge base. Please try again in a moment.";

/// Assistant turn produced for one user message
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub message: String,
    pub user_data: UserData,
}

/// Visible history of a session (system message excluded)
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub entries: Vec<Message>,
    pub user_data: UserData,
}

type SessionHandle = Arc<Mutex<Session>>;

pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    knowledge: Arc<KnowledgeService>,
    generator: Arc<dyn Generator>,
    extractor: Arc<dyn QualificationExtractor>,
    analytics: Arc<AnalyticsAggregator>,
    generator_timeout: Duration,
}

impl SessionStore {
    pub fn new(
        knowledge: Arc<KnowledgeService>,
        generator: Arc<dyn Generator>,
        extractor: Arc<dyn QualificationExtractor>,
        analytics: Arc<AnalyticsAggregator>,
        generator_timeout: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            knowledge,
            generator,
            extractor,
            analytics,
            generator_timeout,
        }
    }

    async fn handle(&self, id: &str) -> Result<SessionHandle, RealbotError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RealbotError::SessionNotFound(id.to_string()))
    }

    /// Return the session, creating an empty one first if the id is new.
    pub async fn get_or_create(&self, id: &str) -> Session {
        let existing = self.sessions.read().await.get(id).cloned();
        let handle = match existing {
            Some(handle) => handle,
            None => {
                let mut sessions = self.sessions.write().await;
                Arc::clone(sessions.entry(id.to_string()).or_insert_with(|| {
                    info!("New session {}", id);
                    Arc::new(Mutex::new(Session::new(id)))
                }))
            }
        };

        let session = handle.lock().await;
        session.clone()
    }

    /// Start a session under a fresh server-generated id.
    pub async fn create(&self) -> Session {
        let id = uuid::Uuid::new_v4().to_string();
        self.get_or_create(&id).await
    }

    pub async fn append_user_message(&self, id: &str, text: &str) -> Result<(), RealbotError> {
        let handle = self.handle(id).await?;
        let mut session = handle.lock().await;
        session.push(Message::user(text));
        Ok(())
    }

    /// Produce the assistant turn for `text`, which is expected to be the
    /// user message just appended.
    pub async fn respond(&self, id: &str, text: &str) -> Result<Reply, RealbotError> {
        let handle = self.handle(id).await?;
        let mut session = handle.lock().await;
        Ok(self.respond_locked(&mut session, text).await)
    }

    /// Full inbound message path: record the user turn, count it in
    /// analytics and answer it, all under the session lock.
    pub async fn send_message(&self, id: &str, text: &str) -> Result<Reply, RealbotError> {
        let handle = self.handle(id).await?;
        let mut session = handle.lock().await;

        session.push(Message::user(text));

        let analytics = Arc::clone(&self.analytics);
        let question = text.to_string();
        let recorded = tokio::task::spawn_blocking(move || analytics.record(&question))
            .await
            .unwrap_or_else(|e| Err(StoreError::Unavailable(e.to_string())));
        if let Err(e) = recorded {
            warn!("Failed to record analytics for session {}: {}", id, e);
        }

        Ok(self.respond_locked(&mut session, text).await)
    }

    async fn respond_locked(&self, session: &mut Session, text: &str) -> Reply {
        let corpus = self.knowledge.entries().await;

        if let Some(answer) = find_relevant_answer(text, &corpus) {
            debug!("Session {}: answered from knowledge base", session.id);
            session.push(Message::assistant(answer));
            return Reply {
                message: answer.to_string(),
                user_data: session.user_data.clone(),
            };
        }

        if session.ensure_system_message(build_system_prompt(&corpus)) {
            debug!("Session {}: system prompt installed", session.id);
        }

        let outcome = tokio::time::timeout(
            self.generator_timeout,
            self.generator.generate(&session.messages, &session.user_data),
        )
        .await;

        let message = match outcome {
            Ok(Ok(reply)) => {
                session.user_data = self.extractor.extract(&reply, &session.user_data);
                reply
            }
            Ok(Err(e)) => {
                warn!("Session {}: generator failed: {}", session.id, e);
                APOLOGY.to_string()
            }
            Err(_) => {
                warn!(
                    "Session {}: generator timed out after {:?}",
                    session.id, self.generator_timeout
                );
                APOLOGY.to_string()
            }
        };

        session.push(Message::assistant(message.clone()));
        Reply {
            message,
            user_data: session.user_data.clone(),
        }
    }

    /// Overwrite the contact info, stamped with the current time.
    pub async fn set_contact_info(
        &self,
        id: &str,
        details: ContactDetails,
    ) -> Result<UserData, RealbotError> {
        let handle = self.handle(id).await?;
        let mut session = handle.lock().await;
        session.user_data.contact_info = Some(ContactInfo::from_details(details, Utc::now()));
        info!("Session {}: contact info submitted", id);
        Ok(session.user_data.clone())
    }

    pub async fn conversation(&self, id: &str) -> Result<Conversation, RealbotError> {
        let handle = self.handle(id).await?;
        let session = handle.lock().await;
        Ok(Conversation {
            entries: session.conversation(),
            user_data: session.user_data.clone(),
        })
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
