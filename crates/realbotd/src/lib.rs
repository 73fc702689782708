//! realbotd - REALbot chat daemon
//!
//! Serves the chat and admin HTTP API on top of the retrieval engine in
//! `realbot-shared`.

pub mod config;
pub mod knowledge;
pub mod llm;
pub mod prompts;
pub mod routes;
pub mod server;
pub mod sessions;

pub use config::Config;
pub use server::{build_router, AppState};
pub use sessions::{SessionStore, APOLOGY};
