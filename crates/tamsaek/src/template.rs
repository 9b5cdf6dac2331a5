// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Template registry with named-placeholder rendering.
//!
//! A template is a plain string with `{name}` placeholders. The
//! `{system_prompt}` slot is reserved and filled from the render call's
//! dedicated argument; every other placeholder is looked up in the
//! caller-supplied [`Fields`]. `{{` and `}}` escape literal braces.
//!
//! Substitution is a single pass over the *template* text only:
//! placeholder-looking sequences inside substituted values stay literal.
//! This is what keeps an unresolved `{language}` artifact in a candidate
//! system prompt from being re-expanded at render time.
//!
//! # Example
//!
//! ```rust
//! use tamsaek::template::{Fields, TemplateRegistry};
//!
//! let registry = TemplateRegistry::with_defaults();
//!
//! let mut fields = Fields::new();
//! fields.insert("context".to_string(), "C".to_string());
//! fields.insert("question".to_string(), "Q".to_string());
//!
//! let prompt = registry
//!     .render("question_answering", "SYS", &fields)
//!     .unwrap();
//! assert_eq!(prompt, "SYS\nContext: C\nQuestion: Q\nAnswer:");
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// Named substitution values for template rendering.
pub type Fields = BTreeMap<String, String>;

/// The placeholder name reserved for the system prompt.
pub const SYSTEM_PROMPT_SLOT: &str = "system_prompt";

/// Default templates, registered under their task tags.
pub const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    (
        "summarization",
        "{system_prompt}\nSummarize the following text:\n{text}\n",
    ),
    (
        "code_generation",
        "{system_prompt}\nWrite a {language} function to {task_description}.\n# Solution:\n",
    ),
    (
        "data_extraction",
        "{system_prompt}\nExtract the following fields from the text: {fields}\nText: {text}\n",
    ),
    (
        "question_answering",
        "{system_prompt}\nContext: {context}\nQuestion: {question}\nAnswer:",
    ),
];

/// Registry of named prompt templates.
///
/// Registered once at setup and read-only afterwards; the process-wide
/// [`TemplateRegistry::global`] instance is safe for concurrent reads.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, String>,
}

impl TemplateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-loaded with [`DEFAULT_TEMPLATES`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (name, template) in DEFAULT_TEMPLATES {
            registry.register(*name, *template);
        }
        registry
    }

    /// The process-wide default registry, initialized on first use.
    pub fn global() -> &'static TemplateRegistry {
        static GLOBAL: OnceLock<TemplateRegistry> = OnceLock::new();
        GLOBAL.get_or_init(TemplateRegistry::with_defaults)
    }

    /// Store or overwrite a template under `name`.
    ///
    /// Placeholder names are not validated here; a bad placeholder
    /// surfaces as [`Error::MissingField`] at render time.
    pub fn register(&mut self, name: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(name.into(), template.into());
    }

    /// Look up a template's raw text.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Render the named template, substituting `{system_prompt}` and the
    /// supplied fields.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownTemplate`] when `name` is not registered.
    /// - [`Error::MissingField`] when a placeholder has no value.
    /// - [`Error::Parse`] on unbalanced braces.
    pub fn render(&self, name: &str, system_prompt: &str, fields: &Fields) -> Result<String> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| Error::unknown_template(name))?;

        let mut out = String::with_capacity(template.len() + system_prompt.len() + 64);
        let mut rest = template.as_str();

        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let brace = rest.as_bytes()[pos];
            let after = &rest[pos + 1..];

            // Doubled braces are literals
            if after.as_bytes().first() == Some(&brace) {
                out.push(brace as char);
                rest = &after[1..];
                continue;
            }

            if brace == b'}' {
                return Err(Error::parse(format!("stray `}}` in template `{name}`")));
            }

            let end = after.find('}').ok_or_else(|| {
                Error::parse(format!("unclosed placeholder in template `{name}`"))
            })?;
            let key = &after[..end];
            let value = if key == SYSTEM_PROMPT_SLOT {
                system_prompt
            } else {
                fields
                    .get(key)
                    .map(String::as_str)
                    .ok_or_else(|| Error::missing_field(key))?
            };
            out.push_str(value);
            rest = &after[end + 1..];
        }
        out.push_str(rest);

        Ok(out)
    }
}
