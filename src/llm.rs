//! Chat-completion backed translation.
//!
//! The model is treated as an opaque oracle: the request carries a fixed
//! instruction as the system turn and the user's WebFOCUS text, untouched, as
//! the user turn. Whatever text comes back is the answer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{API_KEY_ENV, LlmConfig};
use crate::engine::Translator;
use crate::error::{TranslateError, TranslateResult};

/// Instruction sent as the system turn unless the config replaces it.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You translate WebFOCUS report requests into Microsoft SQL Server queries.
Rules:
1. Handle the TABLE FILE, WHERE, IF, PRINT, SUM and BY statements.
2. Translate MISSING to IS NULL.
3. Translate the operators GT to >, LT to <, NE to <>, EQ to =.
4. Add JOIN clauses where the request needs them.
Answer with the SQL query only.";

/// Longest slice of an error body quoted back to the user.
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Translator that delegates to an OpenAI-compatible chat endpoint.
pub struct LlmTranslator {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmTranslator {
    /// Build the HTTP client. The credential is only checked on first use.
    pub fn new(config: LlmConfig) -> TranslateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranslateError::config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn system_prompt(&self) -> &str {
        self.config
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    /// Request payload for one translation.
    pub fn request_body<'a>(&'a self, source: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: self.system_prompt(),
                },
                ChatMessage {
                    role: "user",
                    content: source,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn api_key(&self) -> TranslateResult<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| TranslateError::config(format!("{} is not set", API_KEY_ENV)))
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn translate(&self, source: &str) -> TranslateResult<String> {
        let key = self.api_key()?;
        let url = self.endpoint();
        debug!(model = %self.config.model, %url, "sending translation request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&self.request_body(source))
            .send()
            .await
            .map_err(|e| TranslateError::external(format!("request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            warn!(status = status.as_u16(), "translation request rejected");
            return Err(TranslateError::external(format!(
                "HTTP {}: {}",
                status.as_u16(),
                snippet.trim()
            )));
        }

        let data: ChatResponse = resp
            .json()
            .await
            .map_err(|e| TranslateError::external(format!("malformed response: {}", e)))?;

        let content = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let sql = strip_code_fences(&content);
        if sql.is_empty() {
            return Err(TranslateError::external("model returned no text"));
        }
        Ok(sql.to_string())
    }
}

/// Remove a surrounding Markdown code fence (```sql ... ```), if any.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string (e.g. "sql") on the opening fence line
    let inner = match inner.split_once('\n') {
        Some((info, rest)) if !info.trim().contains(' ') => rest,
        _ => inner,
    };
    inner.trim_end().trim_end_matches("```").trim()
}
