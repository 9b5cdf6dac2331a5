// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! End-to-end integration tests for the prompt-search harness.

use std::sync::atomic::{AtomicUsize, Ordering};

use tamsaek::backend::{Backend, FailingBackend, Generation, MockBackend};
use tamsaek::candidates;
use tamsaek::dispatch::{dispatch, Payload};
use tamsaek::error::{Error, Result};
use tamsaek::optimize::optimize;
use tamsaek::score::lcs_f1;
use tamsaek::task::{ReasoningStyle, TaskType};
use tamsaek::template::TemplateRegistry;

/// Backend whose responses are keyed by call index.
struct ScriptedBackend {
    outputs: Vec<std::result::Result<&'static str, &'static str>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    fn new(outputs: Vec<std::result::Result<&'static str, &'static str>>) -> Self {
        Self {
            outputs,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Backend for ScriptedBackend {
    type GenerateFut<'a> = std::future::Ready<Result<Generation>>;

    fn generate<'a>(&'a self, _prompt: &'a str) -> Self::GenerateFut<'a> {
        let i = self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match self.outputs[i % self.outputs.len()] {
            Ok(text) => Ok(Generation::new(text)),
            Err(message) => Err(Error::backend(message)),
        };
        std::future::ready(result)
    }
}

#[test]
fn summarization_with_stub_backend() {
    let backend = MockBackend::new(|_| "A fixed summary of the article.".to_string());
    let payload = Payload::new().set("text", "Long article about candidate prompt search.");

    let outcome = dispatch(&backend, TaskType::Summarization, &payload)
        .go()
        .unwrap();

    // Score equals the metric applied to (input text, fixed output).
    assert_eq!(
        outcome.score,
        lcs_f1(
            "Long article about candidate prompt search.",
            "A fixed summary of the article."
        )
    );

    // Every candidate tied, so the winner is the first in generation order.
    let expected_first =
        candidates::generate(TaskType::Summarization, None, ReasoningStyle::Standard)[0].clone();
    assert_eq!(outcome.system_prompt, expected_first);
    assert_eq!(outcome.candidate_index, 0);

    // The full prompt is the rendered summarization template.
    assert!(outcome.prompt.starts_with(&expected_first));
    assert!(outcome
        .prompt
        .contains("Summarize the following text:\nLong article about candidate prompt search."));
}

#[test]
fn best_candidate_wins_over_scripted_outputs() {
    // Candidate 7 is the only one echoing the reference exactly.
    let mut outputs: Vec<std::result::Result<&'static str, &'static str>> =
        vec![Ok("noise with no overlap at all"); 10];
    outputs[7] = Ok("the exact reference text");
    let backend = ScriptedBackend::new(outputs);

    let payload = Payload::new().set("text", "the exact reference text");
    let outcome = dispatch(&backend, TaskType::Summarization, &payload)
        .go()
        .unwrap();

    assert_eq!(outcome.candidate_index, 7);
    assert_eq!(outcome.score, 1.0);
    assert_eq!(outcome.output, "the exact reference text");
}

#[test]
fn partial_backend_failure_keeps_search_alive() {
    let outputs = vec![
        Ok("some overlap with reference"),
        Err("rate limited"),
        Ok("reference words appear here"),
        Err("rate limited"),
        Ok("nothing shared"),
        Ok("nothing shared"),
        Ok("nothing shared"),
        Ok("nothing shared"),
        Ok("nothing shared"),
        Ok("nothing shared"),
    ];
    let backend = ScriptedBackend::new(outputs);

    let payload = Payload::new().set("text", "reference words appear here");
    let outcome = dispatch(&backend, TaskType::Summarization, &payload)
        .go()
        .unwrap();

    assert_eq!(outcome.candidate_index, 2);
    assert_eq!(outcome.failures.len(), 2);
    assert!(!outcome.complete());
}

#[test]
fn total_backend_failure_is_tagged() {
    let backend = FailingBackend::new("model unavailable");
    let payload = Payload::new()
        .set("context", "C")
        .set("question", "Q");

    let err = dispatch(&backend, TaskType::QuestionAnswering, &payload)
        .go()
        .unwrap_err();

    assert!(err.is_search_failure());
    let details = err.search_details().unwrap();
    assert_eq!(details.candidates_tried, 19);
    assert_eq!(details.failure_count(), 19);
}

#[test]
fn reasoning_style_expands_the_search_space() {
    let calls = std::sync::Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let backend = MockBackend::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        "constant".to_string()
    });
    let payload = Payload::new().set("text", "body");

    let outcome = dispatch(&backend, TaskType::Summarization, &payload)
        .reasoning(ReasoningStyle::ChainOfThought)
        .go()
        .unwrap();

    assert_eq!(outcome.candidates_tried, 50);
    assert_eq!(calls.load(Ordering::SeqCst), 50);
    assert!(outcome.system_prompt.ends_with("Let's think step by step."));
}

#[test]
fn code_generation_without_language_keeps_artifact() {
    let backend = MockBackend::new(|_| "fn f() {}".to_string());

    // Going through `optimize` directly, with the language render input
    // supplied but no generator parameter.
    let outcome = optimize(&backend, TaskType::CodeGeneration)
        .input("task_description", "reverse a string")
        .input("language", "Rust")
        .reference("reverse a string")
        .go()
        .unwrap();

    // The template slot was filled, the system-prompt artifact was not.
    assert!(outcome.prompt.contains("Write a Rust function to reverse a string."));
    assert!(outcome.system_prompt.contains("{language}"));
}

#[test]
fn custom_registry_overrides_rendering() {
    let mut registry = TemplateRegistry::new();
    registry.register("summarization", "{system_prompt} || {text}");

    let backend = MockBackend::new(|_| "out".to_string());
    let payload = Payload::new().set("text", "body");

    let outcome = dispatch(&backend, TaskType::Summarization, &payload)
        .registry(&registry)
        .go()
        .unwrap();

    assert!(outcome.prompt.ends_with("|| body"));
}

#[tokio::test(flavor = "multi_thread")]
async fn parallel_dispatch_preserves_tie_break() {
    let backend = MockBackend::new(|_| "constant output".to_string());
    let payload = Payload::new().set("text", "body text here");

    let sequential = dispatch(&backend, TaskType::Summarization, &payload)
        .run()
        .await
        .unwrap();
    let parallel = dispatch(&backend, TaskType::Summarization, &payload)
        .parallel()
        .run()
        .await
        .unwrap();

    assert_eq!(sequential.candidate_index, 0);
    assert_eq!(parallel.candidate_index, 0);
    assert_eq!(parallel.system_prompt, sequential.system_prompt);
}

#[test]
fn unknown_task_tag_fails_while_generation_falls_back() {
    assert!(matches!(
        TaskType::parse("sentiment"),
        Err(Error::UnknownTaskType(_))
    ));

    let fallback = candidates::generate_for_tag("sentiment", None, ReasoningStyle::Standard);
    assert_eq!(fallback.len(), 1);
    assert_eq!(fallback[0], tamsaek::GENERIC_FALLBACK);
}
