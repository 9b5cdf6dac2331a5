// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Candidate system-prompt generation.
//!
//! Each task has a fixed table of base system prompts. A non-standard
//! [`ReasoningStyle`] expands the base list against that style's fixed
//! modifier table as a full cross product (base × modifier, modifier
//! varying fastest), appending the modifier sentence to the base prompt
//! with a single separating space.
//!
//! Generation is deterministic: the same arguments always produce the
//! same ordered list, which is what makes the optimizer's
//! earliest-index tie-break reproducible. The order itself carries no
//! ranking.
//!
//! # Example
//!
//! ```rust
//! use tamsaek::candidates;
//! use tamsaek::task::{ReasoningStyle, TaskType};
//!
//! let base = candidates::generate(TaskType::Summarization, None, ReasoningStyle::Standard);
//! assert_eq!(base.len(), 10);
//!
//! let expanded =
//!     candidates::generate(TaskType::Summarization, None, ReasoningStyle::ChainOfThought);
//! assert_eq!(expanded.len(), 50);
//! ```

use crate::task::{ReasoningStyle, TaskType};

/// The placeholder embedded in code-generation candidates. Substituted
/// with the caller's language parameter when one is supplied; left as a
/// literal artifact otherwise (no default language is ever inferred).
pub const LANGUAGE_SLOT: &str = "{language}";

/// Fallback candidate for task tags outside the closed enumeration.
pub const GENERIC_FALLBACK: &str = "You are a helpful assistant.";

const CODE_GENERATION: &[&str] = &[
    "You are an expert {language} developer. Write clean, efficient, and well-documented code following best practices.",
    "Act as a senior {language} engineer. Provide optimized, readable, and maintainable code with clear comments.",
    "You are a helpful {language} coding assistant. Generate concise, correct, and idiomatic {language} code.",
    "Write high-quality {language} code that is easy to understand, properly structured, and thoroughly documented.",
    "As a seasoned {language} programmer, produce robust and efficient code that adheres to common standards and conventions.",
    "Create clear and well-structured {language} code with appropriate error handling and inline explanations.",
    "Provide maintainable and scalable {language} code solutions with concise and informative comments.",
    "Write {language} code that balances readability and performance, and includes meaningful variable names and documentation.",
    "Generate {language} code that is modular, reusable, and follows design patterns where applicable.",
    "Develop {language} code that is testable, with clear separation of concerns and comprehensive docstrings or comments.",
    "Produce idiomatic {language} code that leverages the latest language features and libraries effectively.",
    "Provide {language} code snippets that are ready to integrate into larger projects, with proper formatting and style.",
    "Write efficient {language} code focusing on optimal algorithmic complexity and resource management.",
    "Generate robust {language} code with clear input validation, exception handling, and documentation.",
];

const SUMMARIZATION: &[&str] = &[
    "You are a world-class summarizer. Create concise, accurate summaries in your own words.",
    "Summarize the following text clearly and briefly without copying it verbatim.",
    "You are a helpful assistant. Write a short, informative summary in your own words.",
    "Summarize the text concisely, avoiding direct quotes from the original.",
    "You are an expert summarizer. Write a clear, concise summary in your own words without copying any sentences from the original text.",
    "Summarize the following content accurately and briefly, ensuring the summary is paraphrased and not directly lifted from the original.",
    "Act as a skilled assistant. Provide a short, insightful summary that captures the key points using original phrasing.",
    "Read the following text and generate a coherent, to-the-point summary that avoids repetition or direct quotes.",
    "Write a well-structured summary highlighting the main ideas in a concise and original manner, without copying any part of the input text.",
    "Rephrase the core information from the following passage into a brief summary. Use your own words and ensure clarity.",
];

const DATA_EXTRACTION: &[&str] = &[
    "You are a highly accurate data extraction specialist. Extract only the explicitly requested fields without any additional or irrelevant information.",
    "Carefully extract and return the specified data fields in a clean, structured, and consistent format, preferably JSON.",
    "Act as a precise information retrieval system: provide only the requested data points and omit any unrelated text or commentary.",
    "Your task is to extract the required information exactly as requested, formatted in a structured and machine-readable manner. Avoid explanations or extra content.",
    "Focus solely on the fields specified. Deliver the extracted data concisely, maintaining consistent formatting and clarity.",
    "Extract only the essential data fields with precision, ensuring the output is clear, structured, and ready for downstream processing.",
    "Provide the requested information strictly as instructed, formatted consistently without adding any interpretation or summary.",
    "Be concise and accurate. Return the requested data in a standardized format, excluding all extraneous details.",
    "You are a focused data extraction engine. Output only the requested fields in a structured format suitable for automation.",
    "Extract requested data points cleanly and precisely, avoiding any additional explanation, comments, or formatting beyond the specified structure.",
];

const QUESTION_ANSWERING: &[&str] = &[
    "You are a knowledgeable and helpful assistant. Provide concise, accurate, and clear answers based strictly on the given context.",
    "Answer the question directly and precisely, ensuring correctness and relevance to the provided information.",
    "You are an expert in question answering. Respond clearly and comprehensively without unnecessary details.",
    "Provide well-informed, concise answers that address the question fully and rely solely on the context provided.",
    "Be clear, accurate, and helpful. Avoid speculation and stick to information available in the context.",
    "Answer questions with clarity and precision, using only the facts given. Do not include unrelated information.",
    "You are a context-aware assistant. Provide direct, succinct answers backed by the information supplied.",
    "Focus on answering the question completely and correctly, prioritizing clarity and relevance.",
    "Give straightforward, informative answers while avoiding ambiguity or vague responses.",
    "Respond as a professional expert: concise, accurate, and directly addressing the question.",
    "Provide answers that are fact-based, neutral, and easy to understand, grounded entirely on the provided context.",
    "Act as a reliable source of information. Deliver answers that are brief but thorough, with no extraneous content.",
    "Address the question precisely, focusing on clarity and correctness without unnecessary elaboration.",
    "Provide answers that demonstrate understanding of the question, maintaining focus on relevant details only.",
    "Deliver responses that are structured and to the point, ensuring the user gains clear insight from your answer.",
    "Be succinct and informative, ensuring each answer directly satisfies the question with no fluff.",
    "Answer with confidence and accuracy, based strictly on the data given, avoiding assumptions or guesses.",
    "Maintain an objective tone, presenting answers clearly, logically, and free from ambiguity.",
    "Provide responses that a subject matter expert would give: concise, precise, and well-informed.",
];

const CHAIN_OF_THOUGHT: &[&str] = &[
    "Let's think step by step.",
    "Break the problem into smaller steps and reason through each one before answering.",
    "First lay out your reasoning, then state the final answer.",
    "Work through the task carefully, explaining each intermediate step.",
    "Show your chain of reasoning before committing to an answer.",
];

const TREE_OF_THOUGHT: &[&str] = &[
    "Consider several different approaches, evaluate each briefly, and continue with the most promising one.",
    "Explore multiple lines of reasoning in parallel and select the strongest before answering.",
    "Branch into at least three candidate strategies, compare them, and follow the best.",
    "Sketch alternative solution paths, weigh their trade-offs, and commit to the one most likely to succeed.",
];

/// The fixed base candidate table for a task.
#[inline]
pub fn base_candidates(task: TaskType) -> &'static [&'static str] {
    match task {
        TaskType::CodeGeneration => CODE_GENERATION,
        TaskType::Summarization => SUMMARIZATION,
        TaskType::DataExtraction => DATA_EXTRACTION,
        TaskType::QuestionAnswering => QUESTION_ANSWERING,
    }
}

/// The fixed modifier table for a reasoning style. Empty for
/// [`ReasoningStyle::Standard`].
#[inline]
pub fn modifiers(style: ReasoningStyle) -> &'static [&'static str] {
    match style {
        ReasoningStyle::Standard => &[],
        ReasoningStyle::ChainOfThought => CHAIN_OF_THOUGHT,
        ReasoningStyle::TreeOfThought => TREE_OF_THOUGHT,
    }
}

/// Generate the ordered candidate list for a task.
///
/// `parameter` replaces every `{language}` occurrence when supplied;
/// otherwise the literal slot stays in the text. Non-standard styles
/// produce the full base × modifier cross product, modifier varying
/// fastest. Never empty.
pub fn generate(task: TaskType, parameter: Option<&str>, style: ReasoningStyle) -> Vec<String> {
    let base = base_candidates(task);
    let mods = modifiers(style);
    let mut out = Vec::with_capacity(base.len() * mods.len().max(1));

    for entry in base {
        let entry = substitute_parameter(entry, parameter);
        if mods.is_empty() {
            out.push(entry);
        } else {
            for modifier in mods {
                out.push(format!("{} {}", entry, modifier));
            }
        }
    }
    out
}

/// String-tag entry point for callers holding raw task tags.
///
/// Tags outside the closed enumeration yield the single
/// [`GENERIC_FALLBACK`] candidate instead of failing: generation is
/// never empty.
pub fn generate_for_tag(tag: &str, parameter: Option<&str>, style: ReasoningStyle) -> Vec<String> {
    match TaskType::parse(tag) {
        Ok(task) => generate(task, parameter, style),
        Err(_) => vec![GENERIC_FALLBACK.to_string()],
    }
}

fn substitute_parameter(entry: &str, parameter: Option<&str>) -> String {
    match parameter {
        Some(p) => entry.replace(LANGUAGE_SLOT, p),
        None => entry.to_string(),
    }
}
