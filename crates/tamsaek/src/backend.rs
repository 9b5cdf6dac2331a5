// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Generation backend trait using Generic Associated Types (GATs).
//!
//! [`Backend`] is the single capability the search loop depends on:
//! `generate(prompt) -> text`. Using GATs instead of `async_trait`
//! allows zero-cost async without boxing; synchronous implementations
//! return `Ready<T>`.
//!
//! The optimizer never branches on backend identity. Anything
//! satisfying the one-method contract works: a hosted API (see
//! [`crate::api`] with the `api` feature), a local subprocess, or the
//! test stubs here.
//!
//! # Examples
//!
//! ```rust
//! use tamsaek::backend::{Backend, MockBackend};
//!
//! let backend = MockBackend::new(|prompt| format!("echo: {}", prompt));
//! ```

use crate::error::{Error, Result};
use std::future::Future;

/// Output from a generation request.
#[derive(Debug, Clone)]
pub struct Generation {
    /// The generated text.
    pub text: String,
    /// Number of prompt tokens used.
    pub prompt_tokens: u32,
    /// Number of completion tokens generated.
    pub completion_tokens: u32,
}

impl Generation {
    /// Create a new Generation with just the text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            prompt_tokens: 0,
            completion_tokens: 0,
        }
    }

    /// Create a new Generation with token counts.
    pub fn with_tokens(text: impl Into<String>, prompt: u32, completion: u32) -> Self {
        Self {
            text: text.into(),
            prompt_tokens: prompt,
            completion_tokens: completion,
        }
    }

    /// Get the total token count.
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Trait for text-generation backends.
///
/// The associated `GenerateFut<'a>` type is the future returned by
/// [`Backend::generate`]; each implementation defines its own future
/// type without boxing.
pub trait Backend: Send + Sync {
    /// The future type returned by `generate()`.
    type GenerateFut<'a>: Future<Output = Result<Generation>> + Send + 'a
    where
        Self: 'a;

    /// Generate a completion for the given prompt.
    fn generate<'a>(&'a self, prompt: &'a str) -> Self::GenerateFut<'a>;

    /// Get the backend name for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// A mock backend for testing and examples.
///
/// Uses a closure to generate responses synchronously, without any
/// network or model dependency.
pub struct MockBackend<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    generator: F,
    name: &'static str,
}

impl<F> MockBackend<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    /// Create a new mock backend with the given generator function.
    pub fn new(generator: F) -> Self {
        Self {
            generator,
            name: "mock",
        }
    }

    /// Set a custom name for the mock backend.
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl<F> Backend for MockBackend<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    type GenerateFut<'a>
        = std::future::Ready<Result<Generation>>
    where
        Self: 'a;

    fn generate<'a>(&'a self, prompt: &'a str) -> Self::GenerateFut<'a> {
        let text = (self.generator)(prompt);
        std::future::ready(Ok(Generation::new(text)))
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// A backend that fails every request with a fixed error.
///
/// Useful for exercising the search loop's failure paths.
#[derive(Debug, Clone)]
pub struct FailingBackend {
    message: String,
}

impl FailingBackend {
    /// Create a new failing backend with the given error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Backend for FailingBackend {
    type GenerateFut<'a>
        = std::future::Ready<Result<Generation>>
    where
        Self: 'a;

    fn generate<'a>(&'a self, _prompt: &'a str) -> Self::GenerateFut<'a> {
        std::future::ready(Err(Error::backend(&self.message)))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

// ============================================================================
// Tests
// ============================================================================
