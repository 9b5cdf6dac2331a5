// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Task dispatch: payload validation and reference extraction.
//!
//! [`dispatch`] is the payload-level front door. It checks the payload
//! against the task's required keys, derives the render inputs and the
//! scoring reference, and delegates to [`crate::optimize`].
//!
//! The reference is task-specific: summarization and data extraction
//! score against the input `text`, question answering against the
//! `context`, and code generation against the `task_description` (a
//! proxy; there is no ground-truth code to compare against).
//!
//! # Examples
//!
//! ```rust
//! use tamsaek::backend::MockBackend;
//! use tamsaek::dispatch::{dispatch, Payload};
//! use tamsaek::task::TaskType;
//!
//! let backend = MockBackend::new(|_| "a short summary".to_string());
//! let payload = Payload::new().set("text", "The article body.");
//!
//! let outcome = dispatch(&backend, TaskType::Summarization, &payload)
//!     .go()
//!     .unwrap();
//! assert!(outcome.score >= 0.0);
//! ```

use std::collections::BTreeMap;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::optimize::{optimize, SearchOutcome};
use crate::task::{ReasoningStyle, TaskType};
use crate::template::{Fields, TemplateRegistry};

/// Task payload: a string map plus an ordered field-name list for data
/// extraction.
///
/// Which keys are required depends on the task; see
/// [`TaskType::required_keys`]. An empty field list counts as a missing
/// `fields` key.
#[derive(Debug, Clone, Default)]
pub struct Payload {
    values: BTreeMap<String, String>,
    fields: Vec<String>,
}

impl Payload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a string value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Append one extraction field name.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    /// Append extraction field names, preserving order.
    pub fn fields<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.fields.extend(names.into_iter().map(Into::into));
        self
    }

    /// Look up a string value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The ordered extraction field names.
    pub fn field_names(&self) -> &[String] {
        &self.fields
    }
}

/// Entry point for dispatching a task payload.
pub fn dispatch<'a, B: Backend>(
    backend: &'a B,
    task: TaskType,
    payload: &'a Payload,
) -> Dispatch<'a, B> {
    Dispatch {
        backend,
        task,
        payload,
        style: ReasoningStyle::Standard,
        registry: None,
        parallel: false,
    }
}

/// Dispatch builder.
pub struct Dispatch<'a, B: Backend> {
    backend: &'a B,
    task: TaskType,
    payload: &'a Payload,
    style: ReasoningStyle,
    registry: Option<&'a TemplateRegistry>,
    parallel: bool,
}

impl<'a, B: Backend> Dispatch<'a, B> {
    /// Set the reasoning style (default: standard).
    pub fn reasoning(mut self, style: ReasoningStyle) -> Self {
        self.style = style;
        self
    }

    /// Use a custom template registry instead of the process default.
    pub fn registry(mut self, registry: &'a TemplateRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Fan backend calls out concurrently.
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    /// Execute synchronously.
    #[cfg(feature = "native")]
    pub fn go(self) -> Result<SearchOutcome> {
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.run()))
        } else {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to create tokio runtime")
                .block_on(self.run())
        }
    }

    /// Execute synchronously (fallback without tokio).
    #[cfg(not(feature = "native"))]
    pub fn go(self) -> Result<SearchOutcome> {
        futures::executor::block_on(self.run())
    }

    /// Execute asynchronously.
    pub async fn run(self) -> Result<SearchOutcome> {
        let task = self.task;
        let mut inputs = Fields::new();
        let mut parameter: Option<&str> = None;
        let reference;

        match task {
            TaskType::Summarization => {
                let text = require(self.payload, task, "text")?;
                inputs.insert("text".to_string(), text.to_string());
                reference = text;
            }
            TaskType::CodeGeneration => {
                let description = require(self.payload, task, "task_description")?;
                let language = require(self.payload, task, "language")?;
                inputs.insert("task_description".to_string(), description.to_string());
                inputs.insert("language".to_string(), language.to_string());
                parameter = Some(language);
                reference = description;
            }
            TaskType::DataExtraction => {
                let text = require(self.payload, task, "text")?;
                if self.payload.field_names().is_empty() {
                    return Err(Error::MissingPayloadField {
                        task,
                        field: "fields",
                    });
                }
                inputs.insert("text".to_string(), text.to_string());
                inputs.insert("fields".to_string(), self.payload.field_names().join(", "));
                reference = text;
            }
            TaskType::QuestionAnswering => {
                let context = require(self.payload, task, "context")?;
                let question = require(self.payload, task, "question")?;
                inputs.insert("context".to_string(), context.to_string());
                inputs.insert("question".to_string(), question.to_string());
                reference = context;
            }
        }

        let mut search = optimize(self.backend, task)
            .inputs(inputs)
            .reference(reference)
            .reasoning(self.style);
        if let Some(registry) = self.registry {
            search = search.registry(registry);
        }
        if let Some(language) = parameter {
            search = search.parameter(language);
        }
        if self.parallel {
            search = search.parallel();
        }
        search.run().await
    }
}

fn require<'p>(payload: &'p Payload, task: TaskType, field: &'static str) -> Result<&'p str> {
    payload
        .get(field)
        .ok_or(Error::MissingPayloadField { task, field })
}

// ============================================================================
// Tests
// ============================================================================
