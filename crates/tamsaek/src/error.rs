// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Error types for Tamsaek

use crate::task::TaskType;
use thiserror::Error;

/// Result type alias for Tamsaek operations
pub type Result<T> = core::result::Result<T, Error>;

/// A single candidate's recorded backend failure.
///
/// Candidate failures are recoverable at the search level: the failing
/// candidate is skipped and the search continues. They are collected so
/// the caller can see how much of the candidate space was actually
/// explored.
#[derive(Debug, Clone)]
pub struct CandidateFailure {
    /// Index of the candidate in generation order.
    pub index: usize,
    /// The backend's error message.
    pub message: String,
}

impl CandidateFailure {
    /// Create a new candidate failure record.
    pub fn new(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
        }
    }
}

/// Details of a search where every candidate failed.
///
/// This type captures the terminal outcome of a candidate search that
/// produced no usable generation at all. It is DISTINCT from a
/// low-but-valid score: a caller holding a [`SearchDetails`] knows that
/// nothing was generated, not that the best generation was poor.
#[derive(Debug, Clone, Default)]
pub struct SearchDetails {
    /// Number of candidates the search attempted.
    pub candidates_tried: usize,
    /// Per-candidate failure records, in generation order.
    pub failures: Vec<CandidateFailure>,
}

impl SearchDetails {
    /// Create new search details.
    pub fn new(candidates_tried: usize, failures: Vec<CandidateFailure>) -> Self {
        Self {
            candidates_tried,
            failures,
        }
    }

    /// Number of candidates that failed.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

impl core::fmt::Display for SearchDetails {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "all {} candidate(s) failed", self.candidates_tried)?;
        if let Some(first) = self.failures.first() {
            write!(f, "; first failure at index {}: {}", first.index, first.message)?;
        }
        Ok(())
    }
}

/// Main error type for the Tamsaek library
#[derive(Error, Debug)]
pub enum Error {
    /// A task tag outside the closed enumeration.
    #[error("Unknown task type: {0}")]
    UnknownTaskType(String),

    /// A template name that was never registered.
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    /// A template placeholder with no supplied value.
    #[error("Missing template field: {0}")]
    MissingField(String),

    /// A payload key the task requires but the caller did not supply.
    #[error("Missing payload field `{field}` for task `{task}`")]
    MissingPayloadField {
        /// The task whose payload contract was violated.
        task: TaskType,
        /// The absent key.
        field: &'static str,
    },

    /// Malformed template text (unbalanced braces).
    #[error("Parse error: {0}")]
    Parse(String),

    /// A generation backend failure for one candidate.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The candidate generator returned nothing. Defensive: the
    /// generator's contract makes this unreachable for known tasks.
    #[error("No candidate prompts generated")]
    NoCandidates,

    /// Every candidate in the search failed.
    ///
    /// This is DISTINCT from library errors. It is the structured
    /// "nothing could be generated" outcome of an otherwise valid call;
    /// use [`Error::search_details`] to extract the per-candidate record.
    #[error("No usable result: {0}")]
    NoUsableResult(SearchDetails),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an unknown-task-type error
    pub fn unknown_task_type(tag: impl Into<String>) -> Self {
        Self::UnknownTaskType(tag.into())
    }

    /// Create an unknown-template error
    pub fn unknown_template(name: impl Into<String>) -> Self {
        Self::UnknownTemplate(name.into())
    }

    /// Create a missing-field error
    pub fn missing_field(name: impl Into<String>) -> Self {
        Self::MissingField(name.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    // =========================================================================
    // Error Classification Methods
    // =========================================================================

    /// Check if this is a configuration error (bad task tag or template
    /// setup). Configuration errors are fatal to the call and never
    /// retried.
    #[inline]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownTaskType(_) | Self::UnknownTemplate(_) | Self::Parse(_)
        )
    }

    /// Check if this is a caller input error (payload or render fields).
    #[inline]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_) | Self::MissingPayloadField { .. }
        )
    }

    /// Check if this is the structured all-candidates-failed outcome.
    #[inline]
    pub fn is_search_failure(&self) -> bool {
        matches!(self, Self::NoUsableResult(_))
    }

    /// Get search details if this is a search failure.
    ///
    /// Returns `None` for every other variant.
    #[inline]
    pub fn search_details(&self) -> Option<&SearchDetails> {
        match self {
            Self::NoUsableResult(details) => Some(details),
            _ => None,
        }
    }

    /// Check if this error can be recovered from by retrying the call
    /// (search failures can; configuration and input errors cannot).
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        self.is_search_failure() || matches!(self, Self::Backend(_))
    }

    /// Get the error category for logging/metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnknownTaskType(_) => "task_type",
            Self::UnknownTemplate(_) => "template",
            Self::MissingField(_) => "field",
            Self::MissingPayloadField { .. } => "payload",
            Self::Parse(_) => "parse",
            Self::Backend(_) => "backend",
            Self::NoCandidates => "candidates",
            Self::NoUsableResult(_) => "search",
            Self::Json(_) => "json",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unknown_template("nonexistent");
        assert_eq!(err.to_string(), "Unknown template: nonexistent");

        let err = Error::missing_field("question");
        assert_eq!(err.to_string(), "Missing template field: question");

        let err = Error::MissingPayloadField {
            task: TaskType::QuestionAnswering,
            field: "context",
        };
        assert_eq!(
            err.to_string(),
            "Missing payload field `context` for task `question_answering`"
        );
    }

    #[test]
    fn test_classification() {
        assert!(Error::unknown_task_type("x").is_config_error());
        assert!(Error::unknown_template("x").is_config_error());
        assert!(Error::parse("x").is_config_error());
        assert!(!Error::backend("x").is_config_error());

        assert!(Error::missing_field("x").is_input_error());
        assert!(Error::MissingPayloadField {
            task: TaskType::Summarization,
            field: "text",
        }
        .is_input_error());

        assert!(Error::backend("timeout").is_recoverable());
        assert!(!Error::unknown_task_type("x").is_recoverable());
    }

    #[test]
    fn test_search_failure_details() {
        let details = SearchDetails::new(5, vec![CandidateFailure::new(0, "connection refused")]);
        let err = Error::NoUsableResult(details);

        assert!(err.is_search_failure());
        assert!(err.is_recoverable());

        let details = err.search_details().unwrap();
        assert_eq!(details.candidates_tried, 5);
        assert_eq!(details.failure_count(), 1);

        let msg = err.to_string();
        assert!(msg.contains("No usable result"));
        assert!(msg.contains("all 5 candidate(s) failed"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_error_category() {
        assert_eq!(Error::unknown_task_type("x").category(), "task_type");
        assert_eq!(Error::unknown_template("x").category(), "template");
        assert_eq!(Error::missing_field("x").category(), "field");
        assert_eq!(Error::backend("x").category(), "backend");
        assert_eq!(Error::NoCandidates.category(), "candidates");
        assert_eq!(
            Error::NoUsableResult(SearchDetails::default()).category(),
            "search"
        );
        assert_eq!(Error::Other("x".to_string()).category(), "other");
    }
}
