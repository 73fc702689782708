//! HTTP server for realbotd

use crate::config::Config;
use crate::knowledge::KnowledgeService;
use crate::llm::Generator;
use crate::routes;
use crate::sessions::SessionStore;
use anyhow::Result;
use axum::Router;
use realbot_shared::analytics::{AnalyticsAggregator, AnalyticsRecord};
use realbot_shared::knowledge::KnowledgeBase;
use realbot_shared::qualification::PatternExtractor;
use realbot_shared::storage::JsonFileStore;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub knowledge: Arc<KnowledgeService>,
    pub analytics: Arc<AnalyticsAggregator>,
}

impl AppState {
    pub fn new(
        config: Config,
        knowledge: Arc<KnowledgeService>,
        analytics: Arc<AnalyticsAggregator>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let sessions = SessionStore::new(
            Arc::clone(&knowledge),
            generator,
            Arc::new(PatternExtractor::new()),
            Arc::clone(&analytics),
            Duration::from_secs(config.openai.timeout_secs),
        );

        Self {
            config,
            sessions,
            knowledge,
            analytics,
        }
    }

    /// State backed by the JSON documents under the configured data dir
    pub fn from_config(config: Config, generator: Arc<dyn Generator>) -> Self {
        let knowledge = Arc::new(KnowledgeService::load(Box::new(
            JsonFileStore::<KnowledgeBase>::new(config.knowledge_path()),
        )));
        let analytics = Arc::new(AnalyticsAggregator::with_settings(
            Box::new(JsonFileStore::<AnalyticsRecord>::new(config.analytics_path())),
            config.analytics.enabled,
            config.analytics.max_conversations,
        ));

        Self::new(config, knowledge, analytics, generator)
    }
}

/// Router with every route and the HTTP middleware
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::chat_routes())
        .merge(routes::admin_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run the HTTP server
pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.bind_addr();
    let app = build_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("REALbot listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
