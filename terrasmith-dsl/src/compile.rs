//! DSL Compiler front-end: the ordered strategy chain.
//!
//! Policy lives here; the AI bridge and the extractor are mechanism. The
//! chain is [bridge, extractor] when a translator is supplied, [extractor]
//! when not: running without an AI credential is a supported mode, not an
//! error path. Errors cross this boundary as values only.

use crate::document::Document;
use crate::extract::Extractor;
use async_trait::async_trait;
use terrasmith_core::{BridgeError, CompilationError};
use tracing::{info, warn};

/// Seam for the AI-backed text → document path. Implemented by the
/// OpenAI bridge in `terrasmith-llm`; anything returned here has already
/// passed the schema validator.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<Document, BridgeError>;
}

/// Compile free text into one validated document, or fail with the full
/// cause chain. Never returns partial or best-guess output.
pub async fn compile(
    text: &str,
    translator: Option<&dyn Translator>,
    extractor: &Extractor,
) -> Result<Document, CompilationError> {
    let bridge_failure = match translator {
        Some(translator) => match translator.translate(text).await {
            Ok(doc) => {
                info!(intent = doc.intent.as_str(), "AI translation accepted");
                return Ok(doc);
            }
            Err(err) => {
                warn!(error = %err, "AI translation failed, falling back to rule-based extraction");
                Some(err)
            }
        },
        None => {
            info!("no AI credential configured, using rule-based extraction");
            None
        }
    };

    match extractor.extract(text) {
        Ok(doc) => {
            info!(intent = doc.intent.as_str(), "fallback extraction accepted");
            Ok(doc)
        }
        Err(extraction) => Err(match bridge_failure {
            Some(bridge) => CompilationError::Exhausted { bridge, extraction },
            None => CompilationError::NoSignal { extraction },
        }),
    }
}
