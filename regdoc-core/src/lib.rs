//! # regdoc-core
//!
//! Trait abstractions shared by every external model the retrieval pipeline
//! talks to: embeddings, reranking, and chat/completion. Concrete providers
//! (see `regdoc-gateways`) implement these traits over HTTP; the pipeline
//! itself never depends on a vendor SDK.
//!
//! ```text
//! ┌──────────────────┐    ┌──────────────────┐    ┌──────────────────┐
//! │  regdoc-server   │───▶│  regdoc-core     │◀───│ regdoc-gateways  │
//! │  (pipeline)      │    │  (this crate)    │    │  (HTTP clients)  │
//! └──────────────────┘    └──────────────────┘    └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`embedding`] — turn text into dense vectors (C3).
//! - [`reranker`] — score query/passage pairs (C4).
//! - [`llm`] — chat/completion streaming and message types (C5).

#![no_std]
extern crate alloc;

pub mod embedding;
pub mod llm;
pub mod reranker;

use alloc::string::String;

#[doc(inline)]
pub use embedding::EmbeddingModel;
#[doc(inline)]
pub use llm::LanguageModel;
#[doc(inline)]
pub use reranker::Reranker;

/// Result type used throughout the crate.
pub type Result<T = String> = anyhow::Result<T>;

pub use anyhow::Error;
