// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Output scoring against a reference text.
//!
//! The built-in metric is a token-level longest-common-subsequence
//! F-measure ([`lcs_f1`]): the harmonic mean of LCS precision and
//! recall, normalized to `[0, 1]`. Tokenization is lowercase split on
//! non-alphanumeric characters, with no stemming, so a score is exactly
//! reproducible for fixed inputs.
//!
//! The harness scores candidate outputs against the task *input* (or the
//! task description, for code generation) because no ground truth exists
//! at search time. The score is a proxy for overlap with the source
//! material, not a correctness oracle.
//!
//! # Example
//!
//! ```rust
//! use tamsaek::score::lcs_f1;
//!
//! assert_eq!(lcs_f1("the cat sat", "the cat sat"), 1.0);
//! assert!(lcs_f1("the cat sat", "completely unrelated words") < 0.01);
//! ```

/// Scorer trait for ranking candidate outputs. Higher is better.
pub trait Scorer: Send + Sync {
    /// Score a candidate output against the reference text.
    fn score(&self, reference: &str, candidate: &str) -> f64;
}

/// The default scorer: token-level LCS F-measure.
#[derive(Debug, Clone, Copy, Default)]
pub struct LcsF1;

impl Scorer for LcsF1 {
    #[inline]
    fn score(&self, reference: &str, candidate: &str) -> f64 {
        lcs_f1(reference, candidate)
    }
}

/// Scorer created from a closure.
pub struct FnScorer<F>(pub F);

impl<F: Fn(&str, &str) -> f64 + Send + Sync> Scorer for FnScorer<F> {
    #[inline]
    fn score(&self, reference: &str, candidate: &str) -> f64 {
        (self.0)(reference, candidate)
    }
}

/// Token-level LCS F1 between `reference` and `candidate`.
///
/// Returns 0.0 when either side has no tokens; otherwise
/// `2·P·R / (P + R)` where `P = LCS/|candidate|` and
/// `R = LCS/|reference|`. Always finite, always in `[0, 1]`.
pub fn lcs_f1(reference: &str, candidate: &str) -> f64 {
    let reference = tokens(reference);
    let candidate = tokens(candidate);
    if reference.is_empty() || candidate.is_empty() {
        return 0.0;
    }

    let lcs = lcs_len(&reference, &candidate) as f64;
    if lcs == 0.0 {
        return 0.0;
    }

    let precision = lcs / candidate.len() as f64;
    let recall = lcs / reference.len() as f64;
    let f = 2.0 * precision * recall / (precision + recall);
    if f.is_finite() {
        f.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Lowercase alphanumeric tokens, in order.
fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

/// LCS length via single-row dynamic programming, O(min(n,m)) space.
fn lcs_len(a: &[String], b: &[String]) -> usize {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; short.len() + 1];

    for x in long {
        let mut diag = 0;
        for (j, y) in short.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if x == y {
                diag + 1
            } else {
                above.max(row[j])
            };
            diag = above;
        }
    }
    row[short.len()]
}
