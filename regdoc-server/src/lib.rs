//! HTTP server for the regulatory-document retrieval pipeline: ingestion
//! (C7), query planning (C8), retrieval (C9), and grounded streamed answers
//! with citation validation (C10), exposed over the routes in [`http`].

mod citation;
mod composer;
pub mod config;
mod coordinator;
mod dto;
mod error;
pub mod http;
mod planner;
mod retriever;
mod state;

pub use config::AppConfig;
pub use error::ApiError;
pub use http::app;
pub use state::AppState;
