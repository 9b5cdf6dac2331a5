// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Candidate search with scoring.
//!
//! This module provides the [`optimize`] entry point: enumerate the
//! candidate system prompts for a task, render each into a full prompt,
//! generate a completion per candidate, score every completion against
//! the reference text, and keep the single best result.
//!
//! A backend failure on one candidate is recorded and skipped; the
//! search only fails as a whole, with the structured
//! [`Error::NoUsableResult`], when *every* candidate failed. A template
//! misconfiguration, by contrast, aborts the call immediately.
//!
//! Ties are broken by generation order: the comparison is strict, so
//! the earliest candidate to reach the maximum score wins. Parallel
//! mode preserves this by sorting completed generations by candidate
//! index before the reduction.
//!
//! # Examples
//!
//! ```rust
//! use tamsaek::backend::MockBackend;
//! use tamsaek::optimize::optimize;
//! use tamsaek::task::TaskType;
//!
//! let backend = MockBackend::new(|_| "a fixed summary".to_string());
//!
//! let outcome = optimize(&backend, TaskType::Summarization)
//!     .input("text", "The article body goes here.")
//!     .reference("The article body goes here.")
//!     .go()
//!     .unwrap();
//!
//! assert_eq!(outcome.candidate_index, 0); // constant output, first wins
//! ```

use smallvec::SmallVec;

use crate::backend::{Backend, Generation};
use crate::candidates;
use crate::error::{CandidateFailure, Error, Result, SearchDetails};
use crate::score::{FnScorer, LcsF1, Scorer};
use crate::task::{ReasoningStyle, TaskType};
use crate::template::{Fields, TemplateRegistry};

/// Entry point for a candidate search.
///
/// Creates a builder over the given backend and task. Render inputs and
/// the scoring reference are supplied through the builder; see
/// [`crate::dispatch`] for the payload-level front door that fills them
/// from the task's payload contract.
pub fn optimize<B: Backend>(backend: &B, task: TaskType) -> Optimize<'_, B, LcsF1> {
    Optimize::new(backend, task)
}

/// Candidate search builder.
pub struct Optimize<'a, B: Backend, S: Scorer> {
    backend: &'a B,
    task: TaskType,
    registry: Option<&'a TemplateRegistry>,
    inputs: Fields,
    reference: String,
    parameter: Option<String>,
    style: ReasoningStyle,
    scorer: S,
    parallel: bool,
}

impl<'a, B: Backend> Optimize<'a, B, LcsF1> {
    /// Create a new search builder with the default [`LcsF1`] scorer.
    pub fn new(backend: &'a B, task: TaskType) -> Self {
        Self {
            backend,
            task,
            registry: None,
            inputs: Fields::new(),
            reference: String::new(),
            parameter: None,
            style: ReasoningStyle::Standard,
            scorer: LcsF1,
            parallel: false,
        }
    }
}

impl<'a, B: Backend, S: Scorer> Optimize<'a, B, S> {
    /// Add a single render input.
    pub fn input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    /// Replace the render inputs wholesale.
    pub fn inputs(mut self, inputs: Fields) -> Self {
        self.inputs = inputs;
        self
    }

    /// Set the reference text candidates are scored against.
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    /// Set the task parameter (the target language, for code generation).
    pub fn parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

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

    /// Replace the scorer.
    pub fn scorer<S2: Scorer>(self, scorer: S2) -> Optimize<'a, B, S2> {
        Optimize {
            backend: self.backend,
            task: self.task,
            registry: self.registry,
            inputs: self.inputs,
            reference: self.reference,
            parameter: self.parameter,
            style: self.style,
            scorer,
            parallel: self.parallel,
        }
    }

    /// Set a custom scoring metric from a closure taking
    /// `(reference, candidate_output)`.
    pub fn metric<F: Fn(&str, &str) -> f64 + Send + Sync>(
        self,
        f: F,
    ) -> Optimize<'a, B, FnScorer<F>> {
        self.scorer(FnScorer(f))
    }

    /// Fan backend calls out concurrently instead of looping
    /// sequentially. Purely a performance choice: per-candidate failures
    /// stay isolated and the earliest-index tie-break is preserved.
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    /// Execute synchronously and return the best result.
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

    /// Execute synchronously and return the best result (fallback without tokio).
    #[cfg(not(feature = "native"))]
    pub fn go(self) -> Result<SearchOutcome> {
        futures::executor::block_on(self.run())
    }

    /// Execute synchronously, returning both the result and the full
    /// candidate pool.
    #[cfg(feature = "native")]
    pub fn go_with_pool(self) -> (Result<SearchOutcome>, CandidatePool) {
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.run_with_pool()))
        } else {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to create tokio runtime")
                .block_on(self.run_with_pool())
        }
    }

    /// Execute synchronously with the candidate pool (fallback without tokio).
    #[cfg(not(feature = "native"))]
    pub fn go_with_pool(self) -> (Result<SearchOutcome>, CandidatePool) {
        futures::executor::block_on(self.run_with_pool())
    }

    /// Execute asynchronously.
    ///
    /// Keeps a running best only; no per-candidate history is retained.
    pub async fn run(self) -> Result<SearchOutcome> {
        let (result, _) = self.search(false).await;
        result
    }

    /// Execute asynchronously, also returning every scored candidate for
    /// post-hoc analysis.
    pub async fn run_with_pool(self) -> (Result<SearchOutcome>, CandidatePool) {
        self.search(true).await
    }

    async fn search(self, keep_pool: bool) -> (Result<SearchOutcome>, CandidatePool) {
        let mut pool = CandidatePool::default();

        let candidates =
            candidates::generate(self.task, self.parameter.as_deref(), self.style);
        if candidates.is_empty() {
            return (Err(Error::NoCandidates), pool);
        }

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "prompt_search",
            task = self.task.tag(),
            candidates = candidates.len(),
        )
        .entered();

        // Template misconfiguration aborts the whole call before any
        // backend work.
        let registry = self.registry.unwrap_or_else(|| TemplateRegistry::global());
        let template = self.task.template_name();
        let mut prompts = Vec::with_capacity(candidates.len());
        for system_prompt in &candidates {
            match registry.render(template, system_prompt, &self.inputs) {
                Ok(prompt) => prompts.push(prompt),
                Err(e) => return (Err(e), pool),
            }
        }

        let mut best: Option<Best> = None;
        let mut best_score = f64::NEG_INFINITY;
        let mut failures: Vec<CandidateFailure> = Vec::new();
        let mut total_tokens = 0u32;

        let generations = if self.parallel {
            self.fan_out(&prompts).await
        } else {
            let mut out: Vec<(usize, Result<Generation>)> = Vec::with_capacity(prompts.len());
            for (i, prompt) in prompts.iter().enumerate() {
                out.push((i, self.backend.generate(prompt).await));
            }
            out
        };

        for (i, result) in generations {
            let generation = match result {
                Ok(generation) => generation,
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(candidate = i, error = %e, "backend failed, skipping candidate");
                    failures.push(CandidateFailure::new(i, e.to_string()));
                    continue;
                }
            };

            total_tokens += generation.total_tokens();

            let score = self.scorer.score(&self.reference, &generation.text);
            // Unscoreable output degrades to 0 rather than killing the search
            let score = if score.is_finite() { score } else { 0.0 };

            #[cfg(feature = "tracing")]
            tracing::debug!(candidate = i, score, "candidate scored");

            if keep_pool {
                pool.push(ScoredCandidate {
                    index: i,
                    system_prompt: candidates[i].clone(),
                    output: generation.text.clone(),
                    score,
                });
            }

            // Strict comparison: the earliest candidate keeps ties
            if score > best_score {
                best_score = score;
                best = Some(Best {
                    index: i,
                    output: generation.text,
                    score,
                });
            }
        }

        let candidates_tried = candidates.len();
        let result = match best {
            Some(b) => {
                #[cfg(feature = "tracing")]
                tracing::info!(
                    best_index = b.index,
                    best_score = b.score,
                    failed = failures.len(),
                    "search complete"
                );
                let mut candidates = candidates;
                let mut prompts = prompts;
                Ok(SearchOutcome {
                    system_prompt: std::mem::take(&mut candidates[b.index]),
                    prompt: std::mem::take(&mut prompts[b.index]),
                    output: b.output,
                    score: b.score,
                    candidate_index: b.index,
                    candidates_tried,
                    failures,
                    tokens: total_tokens,
                })
            }
            None => Err(Error::NoUsableResult(SearchDetails::new(
                candidates_tried,
                failures,
            ))),
        };

        (result, pool)
    }

    /// Dispatch all backend calls concurrently, then order completions
    /// by candidate index so the reduction matches sequential mode.
    async fn fan_out(&self, prompts: &[String]) -> Vec<(usize, Result<Generation>)> {
        use futures::stream::{FuturesUnordered, StreamExt};

        let mut futs = FuturesUnordered::new();
        for (i, prompt) in prompts.iter().enumerate() {
            let fut = self.backend.generate(prompt);
            futs.push(async move { (i, fut.await) });
        }

        let mut completed: Vec<(usize, Result<Generation>)> = Vec::with_capacity(prompts.len());
        while let Some(result) = futs.next().await {
            completed.push(result);
        }
        completed.sort_by_key(|(i, _)| *i);
        completed
    }
}

struct Best {
    index: usize,
    output: String,
    score: f64,
}

/// The best-scoring invocation of a candidate search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// The winning candidate system prompt.
    pub system_prompt: String,
    /// The full rendered prompt sent to the backend.
    pub prompt: String,
    /// The backend's output for the winning candidate.
    pub output: String,
    /// The winning score.
    pub score: f64,
    /// Index of the winning candidate in generation order.
    pub candidate_index: usize,
    /// Total number of candidates the search attempted.
    pub candidates_tried: usize,
    /// Candidates skipped because their backend call failed.
    pub failures: Vec<CandidateFailure>,
    /// Total tokens reported by the backend across all candidates.
    pub tokens: u32,
}

impl SearchOutcome {
    /// Whether every candidate's backend call succeeded.
    pub fn complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A scored candidate retained in the pool.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    /// Index in generation order.
    pub index: usize,
    /// The candidate system prompt.
    pub system_prompt: String,
    /// The generated output.
    pub output: String,
    /// Score against the reference.
    pub score: f64,
}

/// Pool of all scored candidates from a search, for post-hoc analysis.
///
/// Only populated by the `*_with_pool` entry points; the plain search
/// keeps a running best and discards the rest.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    candidates: SmallVec<[ScoredCandidate; 8]>,
}

impl CandidatePool {
    fn push(&mut self, candidate: ScoredCandidate) {
        self.candidates.push(candidate);
    }

    /// All scored candidates, in generation order.
    pub fn candidates(&self) -> &[ScoredCandidate] {
        &self.candidates
    }

    /// Number of scored candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Check if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// The best-scoring candidate (earliest index on ties).
    pub fn best(&self) -> Option<&ScoredCandidate> {
        self.candidates.iter().fold(None, |best, c| match best {
            Some(b) if c.score <= b.score => Some(b),
            _ => Some(c),
        })
    }

    /// Candidates at or above the threshold, in generation order.
    pub fn filter_by_threshold(&self, threshold: f64) -> Vec<&ScoredCandidate> {
        self.candidates
            .iter()
            .filter(|c| c.score >= threshold)
            .collect()
    }

    /// The top K candidates sorted by score, earliest index first on ties.
    pub fn top_k(&self, k: usize) -> Vec<&ScoredCandidate> {
        let mut sorted: Vec<_> = self.candidates.iter().collect();
        sorted.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        sorted.truncate(k);
        sorted
    }

    /// Summary statistics over the pool's scores.
    pub fn stats(&self) -> PoolStats {
        if self.candidates.is_empty() {
            return PoolStats::default();
        }

        let scores: Vec<f64> = self.candidates.iter().map(|c| c.score).collect();
        let count = scores.len();
        let mean = scores.iter().sum::<f64>() / count as f64;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / count as f64;

        PoolStats {
            count,
            mean,
            std_dev: variance.sqrt(),
            min: scores.iter().copied().fold(f64::MAX, f64::min),
            max: scores.iter().copied().fold(f64::MIN, f64::max),
        }
    }
}

/// Statistics about a candidate pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStats {
    /// Number of scored candidates.
    pub count: usize,
    /// Mean score.
    pub mean: f64,
    /// Standard deviation of scores.
    pub std_dev: f64,
    /// Minimum score.
    pub min: f64,
    /// Maximum score.
    pub max: f64,
}

impl PoolStats {
    /// Score range (max - min).
    #[inline]
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FailingBackend, MockBackend};
    use crate::score::lcs_f1;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that fails at the given call indices and otherwise echoes
    /// a per-call marker.
    struct FlakyBackend {
        fail_at: &'static [usize],
        outputs: &'static [&'static str],
        calls: AtomicUsize,
    }

    impl FlakyBackend {
        fn new(fail_at: &'static [usize], outputs: &'static [&'static str]) -> Self {
            Self {
                fail_at,
                outputs,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Backend for FlakyBackend {
        type GenerateFut<'a>
            = std::future::Ready<Result<Generation>>
        where
            Self: 'a;

        fn generate<'a>(&'a self, _prompt: &'a str) -> Self::GenerateFut<'a> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            let result = if self.fail_at.contains(&i) {
                Err(Error::backend(format!("injected failure at {i}")))
            } else {
                Ok(Generation::new(self.outputs[i % self.outputs.len()]))
            };
            std::future::ready(result)
        }
    }

    #[test]
    fn test_tie_break_first_candidate_wins() {
        let backend = MockBackend::new(|_| "a fixed summary".to_string());

        let outcome = optimize(&backend, TaskType::Summarization)
            .input("text", "A long article about magpies.")
            .reference("A long article about magpies.")
            .go()
            .unwrap();

        // Constant output means all scores tie; strict comparison keeps
        // the earliest candidate.
        assert_eq!(outcome.candidate_index, 0);
        assert_eq!(
            outcome.system_prompt,
            candidates::generate(TaskType::Summarization, None, ReasoningStyle::Standard)[0]
        );
        assert!(outcome.complete());
        assert_eq!(outcome.candidates_tried, 10);
    }

    #[test]
    fn test_partial_failure_returns_best_survivor() {
        // 10 summarization candidates; calls 1 and 3 fail. The call at
        // index 2 returns a perfect match for the reference.
        let backend = FlakyBackend::new(
            &[1, 3],
            &[
                "nothing in common",
                "unused",
                "the reference body",
                "unused",
                "nothing in common",
                "nothing in common",
                "nothing in common",
                "nothing in common",
                "nothing in common",
                "nothing in common",
            ],
        );

        let outcome = optimize(&backend, TaskType::Summarization)
            .input("text", "the reference body")
            .reference("the reference body")
            .go()
            .unwrap();

        assert_eq!(outcome.candidate_index, 2);
        assert_eq!(outcome.score, 1.0);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.failures[0].index, 1);
        assert_eq!(outcome.failures[1].index, 3);
    }

    #[test]
    fn test_total_failure_is_structured() {
        let backend = FailingBackend::new("backend offline");

        let err = optimize(&backend, TaskType::Summarization)
            .input("text", "body")
            .reference("body")
            .go()
            .unwrap_err();

        assert!(err.is_search_failure());
        let details = err.search_details().unwrap();
        assert_eq!(details.candidates_tried, 10);
        assert_eq!(details.failure_count(), 10);
        assert!(details.failures[0].message.contains("backend offline"));
    }

    #[test]
    fn test_template_error_aborts_call() {
        let backend = MockBackend::new(|_| "output".to_string());

        // No "text" render input: MissingField, not NoUsableResult.
        let err = optimize(&backend, TaskType::Summarization)
            .reference("body")
            .go()
            .unwrap_err();

        assert!(matches!(err, Error::MissingField(ref f) if f == "text"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_parallel_matches_sequential() {
        let backend = MockBackend::new(|_| "a fixed summary".to_string());

        let sequential = optimize(&backend, TaskType::Summarization)
            .input("text", "Some article body.")
            .reference("Some article body.")
            .run()
            .await
            .unwrap();

        let parallel = optimize(&backend, TaskType::Summarization)
            .input("text", "Some article body.")
            .reference("Some article body.")
            .parallel()
            .run()
            .await
            .unwrap();

        assert_eq!(parallel.candidate_index, sequential.candidate_index);
        assert_eq!(parallel.system_prompt, sequential.system_prompt);
        assert_eq!(parallel.score, sequential.score);
    }

    #[tokio::test]
    async fn test_parallel_isolates_failures() {
        let backend = FlakyBackend::new(&[0, 4, 7], &["the body", "other words entirely"]);

        let outcome = optimize(&backend, TaskType::Summarization)
            .input("text", "the body")
            .reference("the body")
            .parallel()
            .run()
            .await
            .unwrap();

        assert_eq!(outcome.failures.len(), 3);
        assert!(outcome.score > 0.0);
    }

    #[test]
    fn test_best_score_matches_scorer() {
        let backend = MockBackend::new(|_| "a fixed summary".to_string());

        let outcome = optimize(&backend, TaskType::Summarization)
            .input("text", "Long article text.")
            .reference("Long article text.")
            .go()
            .unwrap();

        assert_eq!(outcome.score, lcs_f1("Long article text.", "a fixed summary"));
    }

    #[test]
    fn test_custom_metric() {
        let counter = AtomicUsize::new(0);
        let backend = MockBackend::new(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            "x ".repeat(n + 1)
        });

        // Longest output wins under a length metric; the last candidate
        // produces the longest text.
        let outcome = optimize(&backend, TaskType::Summarization)
            .input("text", "body")
            .reference("body")
            .metric(|_, candidate| candidate.len() as f64)
            .go()
            .unwrap();

        assert_eq!(outcome.candidate_index, 9);
    }

    #[test]
    fn test_reasoning_expansion_widens_search() {
        let calls = AtomicUsize::new(0);
        let backend = MockBackend::new(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            "out".to_string()
        });

        let outcome = optimize(&backend, TaskType::Summarization)
            .input("text", "body")
            .reference("body")
            .reasoning(ReasoningStyle::ChainOfThought)
            .go()
            .unwrap();

        assert_eq!(outcome.candidates_tried, 50);
    }

    #[test]
    fn test_pool_retention() {
        let backend = MockBackend::new(|_| "a fixed summary".to_string());

        let (outcome, pool) = optimize(&backend, TaskType::Summarization)
            .input("text", "body text")
            .reference("body text")
            .go_with_pool();

        let outcome = outcome.unwrap();
        assert_eq!(pool.len(), 10);
        assert_eq!(pool.best().unwrap().index, outcome.candidate_index);

        let stats = pool.stats();
        assert_eq!(stats.count, 10);
        // Constant output: no variance across candidates.
        assert!(stats.std_dev < 1e-12);
        assert!((stats.range()).abs() < 1e-12);
    }

    #[test]
    fn test_pool_filtering_and_top_k() {
        let counter = AtomicUsize::new(0);
        let backend = MockBackend::new(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 0 { "the body" } else { "unrelated" }.to_string()
        });

        let (_, pool) = optimize(&backend, TaskType::Summarization)
            .input("text", "the body")
            .reference("the body")
            .go_with_pool();

        let perfect = pool.filter_by_threshold(1.0);
        assert_eq!(perfect.len(), 5);

        let top = pool.top_k(3);
        assert_eq!(top.len(), 3);
        // Ties resolved by earliest index.
        assert_eq!(top[0].index, 0);
        assert_eq!(top[1].index, 2);
    }

    #[test]
    fn test_run_keeps_no_history() {
        let backend = MockBackend::new(|_| "out".to_string());

        let (result, pool) = futures::executor::block_on(
            optimize(&backend, TaskType::Summarization)
                .input("text", "body")
                .reference("body")
                .search(false),
        );

        assert!(result.is_ok());
        assert!(pool.is_empty());
    }
}
