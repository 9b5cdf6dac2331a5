// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Real generation backends: hosted APIs and local commands.
//!
//! [`ApiBackend`] implements the [`Backend`] trait over multiple
//! providers using blocking HTTP requests (via `reqwest::blocking`),
//! keeping the same sync pattern as
//! [`MockBackend`](crate::backend::MockBackend). The search loop never
//! branches on which provider is in use.
//!
//! # Providers
//!
//! - **Anthropic**: Claude API (Messages format)
//! - **OpenAI**: Chat Completions API, including compatible endpoints
//!   such as local model servers that speak the same protocol
//! - **Command**: a local binary; the prompt goes to stdin, the
//!   completion is read from stdout
//!
//! # Examples
//!
//! ```ignore
//! use tamsaek::api::ApiBackend;
//!
//! // Auto-detect from environment
//! let backend = ApiBackend::from_env().unwrap();
//!
//! // Explicit providers
//! let backend = ApiBackend::anthropic("sk-...", "claude-sonnet-4-20250514");
//! let backend = ApiBackend::openai("sk-...", "gpt-4o");
//! let backend = ApiBackend::command("/usr/local/bin/generate");
//! ```

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use crate::backend::{Backend, Generation};
use crate::error::{Error, Result};

/// Supported generation providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// Anthropic Claude API (Messages format).
    Anthropic {
        /// API key for authentication.
        api_key: String,
        /// Model identifier (e.g., "claude-sonnet-4-20250514").
        model: String,
        /// Base URL for the API endpoint.
        base_url: String,
    },
    /// OpenAI Chat Completions API (also compatible endpoints).
    OpenAi {
        /// API key for authentication.
        api_key: String,
        /// Model identifier (e.g., "gpt-4o").
        model: String,
        /// Base URL for the API endpoint.
        base_url: String,
    },
    /// Local command invocation: prompt on stdin, completion on stdout.
    Command {
        /// Path to the binary.
        path: String,
    },
}

/// Generation backend over a real provider.
pub struct ApiBackend {
    client: Option<Client>,
    provider: Provider,
    temperature: f64,
    max_tokens: u32,
    timeout: Option<Duration>,
}

impl ApiBackend {
    /// Auto-detect a provider from the environment.
    ///
    /// Checked in order:
    /// 1. `ANTHROPIC_API_KEY` → Anthropic Claude
    /// 2. `OPENAI_API_KEY` → OpenAI (or a compatible endpoint)
    /// 3. `TAMSAEK_COMMAND` → local command
    ///
    /// Override defaults with:
    /// - `TAMSAEK_MODEL`: model name (API providers only)
    /// - `TAMSAEK_BASE_URL`: endpoint URL (API providers only)
    pub fn from_env() -> Result<Self> {
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            let model = std::env::var("TAMSAEK_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());
            let base_url = std::env::var("TAMSAEK_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string());
            return Ok(Self::anthropic_with_url(key, model, base_url));
        }

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            let model = std::env::var("TAMSAEK_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
            let base_url = std::env::var("TAMSAEK_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string());
            return Ok(Self::openai_with_url(key, model, base_url));
        }

        if let Ok(path) = std::env::var("TAMSAEK_COMMAND") {
            return Ok(Self::command(path));
        }

        Err(Error::backend(
            "No generation backend found. Set ANTHROPIC_API_KEY, OPENAI_API_KEY, or TAMSAEK_COMMAND.",
        ))
    }

    /// The process-wide shared backend, built from the environment on
    /// first use and reused across calls.
    ///
    /// First successful init wins; concurrent first callers may build a
    /// throwaway instance.
    pub fn shared() -> Result<&'static ApiBackend> {
        static SHARED: OnceLock<ApiBackend> = OnceLock::new();
        if let Some(backend) = SHARED.get() {
            return Ok(backend);
        }
        let built = Self::from_env()?;
        Ok(SHARED.get_or_init(|| built))
    }

    /// Create an Anthropic Claude backend.
    pub fn anthropic(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::anthropic_with_url(api_key, model, "https://api.anthropic.com")
    }

    /// Create an Anthropic Claude backend with a custom base URL.
    pub fn anthropic_with_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self::with_provider(Provider::Anthropic {
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        })
    }

    /// Create an OpenAI backend.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::openai_with_url(api_key, model, "https://api.openai.com")
    }

    /// Create an OpenAI-compatible backend with a custom base URL.
    ///
    /// This is also the way to reach local model servers that expose the
    /// Chat Completions protocol.
    pub fn openai_with_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self::with_provider(Provider::OpenAi {
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        })
    }

    /// Create a local-command backend.
    pub fn command(path: impl Into<String>) -> Self {
        Self {
            client: None,
            provider: Provider::Command { path: path.into() },
            temperature: 0.7,
            max_tokens: 1024,
            timeout: None,
        }
    }

    fn with_provider(provider: Provider) -> Self {
        Self {
            client: Some(Client::new()),
            provider,
            temperature: 0.7,
            max_tokens: 1024,
            timeout: Some(Duration::from_secs(60)),
        }
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    /// Set the maximum completion tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    /// Set the per-request timeout. An expired request surfaces as a
    /// backend failure for that candidate only.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the provider being used.
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    #[cfg(feature = "tracing")]
    fn provider_name(&self) -> &'static str {
        match &self.provider {
            Provider::Anthropic { .. } => "anthropic",
            Provider::OpenAi { .. } => "openai",
            Provider::Command { .. } => "command",
        }
    }

    fn call(&self, prompt: &str) -> Result<Generation> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "backend_call",
            provider = self.provider_name(),
            model = self.name(),
        )
        .entered();

        let result = match &self.provider {
            Provider::Anthropic {
                api_key,
                model,
                base_url,
            } => self.call_anthropic(api_key, model, base_url, prompt),
            Provider::OpenAi {
                api_key,
                model,
                base_url,
            } => self.call_openai(api_key, model, base_url, prompt),
            Provider::Command { path } => self.call_command(path, prompt),
        };

        #[cfg(feature = "tracing")]
        if let Ok(ref generation) = result {
            tracing::info!(
                prompt_tokens = generation.prompt_tokens,
                completion_tokens = generation.completion_tokens,
                "backend call complete"
            );
        }

        result
    }

    fn call_anthropic(
        &self,
        api_key: &str,
        model: &str,
        base_url: &str,
        prompt: &str,
    ) -> Result<Generation> {
        let client = self.client.as_ref().unwrap();

        let mut body = serde_json::json!({
            "model": model,
            "max_tokens": self.max_tokens,
            "messages": [{"role": "user", "content": prompt}]
        });
        if self.temperature != 0.7 {
            body["temperature"] = Value::from(self.temperature);
        }

        let url = format!("{}/v1/messages", base_url.trim_end_matches('/'));
        let mut request = client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request
            .send()
            .map_err(|e| Error::backend(format!("Anthropic API request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .map_err(|e| Error::backend(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(Error::backend(format!(
                "Anthropic API error ({}): {}",
                status, response_text
            )));
        }

        let json: Value = serde_json::from_str(&response_text)
            .map_err(|e| Error::backend(format!("Failed to parse Anthropic response: {}", e)))?;

        let text = json["content"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|block| block["text"].as_str())
            .ok_or_else(|| {
                Error::backend(format!("Unexpected Anthropic response format: {}", json))
            })?
            .to_string();

        let prompt_tokens = json["usage"]["input_tokens"].as_u64().unwrap_or(0) as u32;
        let completion_tokens = json["usage"]["output_tokens"].as_u64().unwrap_or(0) as u32;

        Ok(Generation::with_tokens(
            text,
            prompt_tokens,
            completion_tokens,
        ))
    }

    fn call_openai(
        &self,
        api_key: &str,
        model: &str,
        base_url: &str,
        prompt: &str,
    ) -> Result<Generation> {
        let client = self.client.as_ref().unwrap();

        let body = serde_json::json!({
            "model": model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": [{"role": "user", "content": prompt}]
        });

        let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));
        let mut request = client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("content-type", "application/json")
            .json(&body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request
            .send()
            .map_err(|e| Error::backend(format!("OpenAI API request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .map_err(|e| Error::backend(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(Error::backend(format!(
                "OpenAI API error ({}): {}",
                status, response_text
            )));
        }

        let json: Value = serde_json::from_str(&response_text)
            .map_err(|e| Error::backend(format!("Failed to parse OpenAI response: {}", e)))?;

        let text = json["choices"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|choice| choice["message"]["content"].as_str())
            .ok_or_else(|| Error::backend(format!("Unexpected OpenAI response format: {}", json)))?
            .to_string();

        let prompt_tokens = json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32;
        let completion_tokens = json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32;

        Ok(Generation::with_tokens(
            text,
            prompt_tokens,
            completion_tokens,
        ))
    }

    fn call_command(&self, path: &str, prompt: &str) -> Result<Generation> {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::backend(format!("Failed to execute `{}`: {}", path, e)))?;

        child
            .stdin
            .take()
            .ok_or_else(|| Error::backend("Failed to open command stdin"))?
            .write_all(prompt.as_bytes())
            .map_err(|e| Error::backend(format!("Failed to write prompt to `{}`: {}", path, e)))?;

        let output = child
            .wait_with_output()
            .map_err(|e| Error::backend(format!("Failed to read output of `{}`: {}", path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::backend(format!("`{}` failed: {}", path, stderr)));
        }

        let text = String::from_utf8(output.stdout)
            .map_err(|e| Error::backend(format!("`{}` output is not valid UTF-8: {}", path, e)))?
            .trim()
            .to_string();

        // Rough token estimate; commands report no usage
        let est_prompt_tokens = (prompt.split_whitespace().count() as f64 * 1.3) as u32;
        let est_completion_tokens = (text.split_whitespace().count() as f64 * 1.3) as u32;

        Ok(Generation::with_tokens(
            text,
            est_prompt_tokens,
            est_completion_tokens,
        ))
    }
}

impl Backend for ApiBackend {
    type GenerateFut<'a> = std::future::Ready<Result<Generation>>;

    fn generate<'a>(&'a self, prompt: &'a str) -> Self::GenerateFut<'a> {
        std::future::ready(self.call(prompt))
    }

    fn name(&self) -> &str {
        match &self.provider {
            Provider::Anthropic { model, .. } => model,
            Provider::OpenAi { model, .. } => model,
            Provider::Command { .. } => "command",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let backend = ApiBackend::anthropic("test-key", "claude-sonnet-4-20250514");
        assert_eq!(backend.name(), "claude-sonnet-4-20250514");

        let backend = ApiBackend::openai("test-key", "gpt-4o");
        assert_eq!(backend.name(), "gpt-4o");
    }

    #[test]
    fn test_builder_methods() {
        let backend = ApiBackend::anthropic("key", "model")
            .temperature(0.5)
            .max_tokens(2048)
            .timeout(Duration::from_secs(5));
        assert!((backend.temperature - 0.5).abs() < f64::EPSILON);
        assert_eq!(backend.max_tokens, 2048);
        assert_eq!(backend.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_custom_base_url() {
        let backend = ApiBackend::openai_with_url("key", "model", "https://custom.api.com");
        match backend.provider() {
            Provider::OpenAi { base_url, .. } => {
                assert_eq!(base_url, "https://custom.api.com");
            }
            _ => panic!("Wrong provider"),
        }
    }

    #[test]
    fn test_command_creation() {
        let backend = ApiBackend::command("/usr/local/bin/generate");
        assert_eq!(backend.name(), "command");
        assert!(backend.client.is_none());
    }

    #[test]
    fn test_command_backend_failure_is_backend_error() {
        let backend = ApiBackend::command("/nonexistent/binary/for/tamsaek");
        let err = backend.call("prompt").unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
        assert!(err.is_recoverable());
    }
}
