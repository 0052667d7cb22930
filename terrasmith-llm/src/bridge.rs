//! The AI bridge: prompt construction, bounded retries, strict reply parsing.

use crate::client::ChatClient;
use crate::types::{ChatRequest, Message};
use async_trait::async_trait;
use serde_json::Value;
use terrasmith_core::{BridgeError, Config};
use terrasmith_dsl::{validate, Document, Translator};
use tracing::warn;

/// Total attempts before the bridge reports failure to the compiler.
pub const MAX_ATTEMPTS: u32 = 2;

const MAX_TOKENS: i32 = 500;
const TEMPERATURE: f32 = 0.1;

/// System instruction: enumerates the schema and forbids extra fields.
/// Kept in lock-step with the document structs in `terrasmith-dsl`.
const SYSTEM_PROMPT: &str = "\
You translate infrastructure requests into a Cloudflare DSL.
Reply with ONLY one valid JSON object: no prose, no markdown.
Schema:
- intent: one of [\"create_worker_and_bind_domain\",\"create_dns_record\",\"create_kv_namespace\",\"create_d1_database\"]
- zone_name: base domain, e.g. \"example.com\"
- hostname: fully qualified domain name, e.g. \"api.example.com\"

Only for create_worker_and_bind_domain:
- routing: { \"mode\": \"custom_domain\" or \"route\" } (optional, default custom_domain)
- worker: { \"name\": lowercase [a-z0-9-], \"module\": boolean, \"compatibility_date\": \"YYYY-MM-DD\" }
- bindings: { \"kv\": [namespace names], \"d1\": [database names] } (optional)

Never invent fields outside this schema. Use sensible defaults.";

/// OpenAI-backed implementation of the [`Translator`] seam.
#[derive(Debug)]
pub struct OpenAiBridge {
    client: ChatClient,
    model: String,
}

impl OpenAiBridge {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: ChatClient::new(api_key),
            model: model.into(),
        }
    }

    /// Build a bridge from config, or `None` when no AI key is present
    /// (the compiler then goes straight to the extractor).
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.has_openai_key() {
            return None;
        }
        config
            .auth
            .openai_api_key
            .as_ref()
            .map(|key| Self::new(key.clone(), config.defaults.model_id.clone()))
    }

    /// Swap the underlying client (test servers, alternate endpoints).
    pub fn with_client(mut self, client: ChatClient) -> Self {
        self.client = client;
        self
    }

    async fn attempt(&self, text: &str) -> Result<Document, BridgeError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            max_tokens: Some(MAX_TOKENS),
            temperature: Some(TEMPERATURE),
        };

        let response = self.client.complete(&request).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| BridgeError::UnparseableReply {
                provider: "openai".to_string(),
                reason: "no completion in response".to_string(),
            })?;

        let json = extract_json_object(&content).ok_or_else(|| BridgeError::UnparseableReply {
            provider: "openai".to_string(),
            reason: "reply contains no JSON object".to_string(),
        })?;
        let candidate: Value =
            serde_json::from_str(json).map_err(|e| BridgeError::UnparseableReply {
                provider: "openai".to_string(),
                reason: e.to_string(),
            })?;

        validate(&candidate).map_err(BridgeError::Rejected)
    }
}

#[async_trait]
impl Translator for OpenAiBridge {
    async fn translate(&self, text: &str) -> Result<Document, BridgeError> {
        let mut outcome = self.attempt(text).await;
        let mut attempts = 1;
        while attempts < MAX_ATTEMPTS {
            match &outcome {
                Ok(_) => break,
                Err(err) => warn!(attempt = attempts, error = %err, "bridge attempt failed, retrying"),
            }
            outcome = self.attempt(text).await;
            attempts += 1;
        }
        outcome
    }
}

/// Locate the first balanced JSON object in a reply that may be wrapped in
/// prose or markdown fences. String literals and escapes are honored so a
/// `}` inside a value cannot truncate the document.
fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let bytes = reply.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&reply[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
