// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! # Tamsaek - Prompt-Search Harness
//!
//! Small library for finding the best system prompt for a fixed task.
//! For each of the supported tasks (summarization, code generation,
//! data extraction, question answering) it enumerates a table of
//! candidate system prompts, renders each through the task's template,
//! generates a completion per candidate against a pluggable backend,
//! scores every output with a token-level LCS F-measure, and returns
//! the single best `{system_prompt, prompt, output, score}` tuple.
//!
//! ## Design
//!
//! - **One backend capability**: the search depends only on
//!   `generate(prompt) -> text`; hosted APIs, local commands, and test
//!   stubs are interchangeable.
//! - **Deterministic search**: candidate enumeration is fixed per task
//!   and style, ties go to the earliest candidate, and the parallel
//!   mode reduces in candidate order.
//! - **Failure isolation**: one candidate's backend failure never
//!   aborts the search; only a search where every candidate failed
//!   returns the structured [`Error::NoUsableResult`].
//!
//! ## Quick Start
//!
//! ```rust
//! use tamsaek::prelude::*;
//!
//! let backend = MockBackend::new(|_| "A short summary.".to_string());
//! let payload = Payload::new().set("text", "The full article body.");
//!
//! let outcome = dispatch(&backend, TaskType::Summarization, &payload)
//!     .reasoning(ReasoningStyle::ChainOfThought)
//!     .go()
//!     .unwrap();
//!
//! println!("{} -> {:.3}", outcome.system_prompt, outcome.score);
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod candidates;
pub mod dispatch;
pub mod error;
pub mod optimize;
pub mod score;
pub mod task;
pub mod template;

// Real providers (feature-gated)
#[cfg(feature = "api")]
pub mod api;

// Re-exports for convenience
pub use backend::{Backend, FailingBackend, Generation, MockBackend};
pub use candidates::{generate_for_tag, GENERIC_FALLBACK, LANGUAGE_SLOT};
pub use dispatch::{dispatch, Dispatch, Payload};
pub use error::{CandidateFailure, Error, Result, SearchDetails};
pub use optimize::{
    optimize, CandidatePool, Optimize, PoolStats, ScoredCandidate, SearchOutcome,
};
pub use score::{lcs_f1, FnScorer, LcsF1, Scorer};
pub use task::{ReasoningStyle, TaskType};
pub use template::{Fields, TemplateRegistry, DEFAULT_TEMPLATES, SYSTEM_PROMPT_SLOT};

#[cfg(feature = "api")]
pub use api::{ApiBackend, Provider};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::backend::{Backend, FailingBackend, Generation, MockBackend};
    pub use crate::dispatch::{dispatch, Payload};
    pub use crate::error::{Error, Result, SearchDetails};
    pub use crate::optimize::{optimize, CandidatePool, SearchOutcome};
    pub use crate::score::{lcs_f1, LcsF1, Scorer};
    pub use crate::task::{ReasoningStyle, TaskType};
    pub use crate::template::{Fields, TemplateRegistry};

    #[cfg(feature = "api")]
    pub use crate::api::{ApiBackend, Provider};
}

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
