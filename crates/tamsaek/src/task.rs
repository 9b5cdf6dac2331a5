// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Task and reasoning-style enumerations.
//!
//! [`TaskType`] is the closed set of tasks the harness knows how to
//! prompt for; it selects the template, the candidate system-prompt
//! table, the payload contract, and the reference-extraction rule.
//! [`ReasoningStyle`] is an orthogonal modifier applied to every base
//! candidate (see [`crate::candidates`]).
//!
//! # Example
//!
//! ```rust
//! use tamsaek::task::{ReasoningStyle, TaskType};
//!
//! let task = TaskType::parse("question_answering").unwrap();
//! assert_eq!(task.required_keys(), &["context", "question"]);
//!
//! // Unrecognized styles fold to Standard rather than failing.
//! assert_eq!(ReasoningStyle::parse("nonsense"), ReasoningStyle::Standard);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The closed enumeration of supported tasks.
///
/// Unknown task tags exist only at the string boundary: inside the
/// library the enum is total, and [`TaskType::parse`] is where an
/// out-of-set tag becomes [`Error::UnknownTaskType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Condense a text into a short summary.
    Summarization,
    /// Produce code in a caller-chosen language from a task description.
    CodeGeneration,
    /// Pull named fields out of a text.
    DataExtraction,
    /// Answer a question against a supplied context.
    QuestionAnswering,
}

impl TaskType {
    /// All task types, in tag order.
    pub const ALL: [TaskType; 4] = [
        Self::Summarization,
        Self::CodeGeneration,
        Self::DataExtraction,
        Self::QuestionAnswering,
    ];

    /// Parse a task tag. Strict: anything outside the closed set is
    /// [`Error::UnknownTaskType`].
    pub fn parse(tag: &str) -> Result<Self> {
        match tag {
            "summarization" => Ok(Self::Summarization),
            "code_generation" => Ok(Self::CodeGeneration),
            "data_extraction" => Ok(Self::DataExtraction),
            "question_answering" => Ok(Self::QuestionAnswering),
            other => Err(Error::unknown_task_type(other)),
        }
    }

    /// The canonical string tag.
    #[inline]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Summarization => "summarization",
            Self::CodeGeneration => "code_generation",
            Self::DataExtraction => "data_extraction",
            Self::QuestionAnswering => "question_answering",
        }
    }

    /// Name of the template this task renders through. Templates are
    /// registered under the task tag.
    #[inline]
    pub fn template_name(&self) -> &'static str {
        self.tag()
    }

    /// Payload keys the dispatcher requires for this task.
    #[inline]
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Summarization => &["text"],
            Self::CodeGeneration => &["task_description", "language"],
            Self::DataExtraction => &["text", "fields"],
            Self::QuestionAnswering => &["context", "question"],
        }
    }

    /// The payload key whose value serves as the scoring reference.
    ///
    /// For code generation the reference is the task description: there
    /// is no ground-truth code to compare against, so the resulting
    /// score is a proxy metric, not a correctness measure.
    #[inline]
    pub fn reference_key(&self) -> &'static str {
        match self {
            Self::Summarization | Self::DataExtraction => "text",
            Self::CodeGeneration => "task_description",
            Self::QuestionAnswering => "context",
        }
    }
}

impl core::fmt::Display for TaskType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.tag())
    }
}

impl core::str::FromStr for TaskType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Reasoning-style modifier applied to every base candidate prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningStyle {
    /// Base candidates, unmodified.
    #[default]
    Standard,
    /// Append step-by-step reasoning instructions.
    ChainOfThought,
    /// Append multi-path reasoning instructions.
    TreeOfThought,
}

impl ReasoningStyle {
    /// Parse a style tag. Total: unrecognized tags fold to
    /// [`ReasoningStyle::Standard`], which leaves the base candidate
    /// list unmodified.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "chain_of_thought" => Self::ChainOfThought,
            "tree_of_thought" => Self::TreeOfThought,
            _ => Self::Standard,
        }
    }

    /// The canonical string tag.
    #[inline]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::ChainOfThought => "chain_of_thought",
            Self::TreeOfThought => "tree_of_thought",
        }
    }
}

impl core::fmt::Display for ReasoningStyle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.tag())
    }
}
