//! TERRASMITH DSL - Document model, validator, extractor and compiler front-end
//!
//! The DSL document is the sole intermediate representation between a
//! natural-language request and the Terraform renderer. Everything that
//! produces a candidate document (the AI bridge, the rule-based extractor)
//! funnels through the same closed-schema validator; nothing downstream
//! ever sees an unvalidated document.
//!
//! Pipeline:
//! ```text
//! text → compile() → [Translator (AI bridge) → validate]
//!                  → [Extractor (rule-based) → validate]
//!                  → Document → renderer
//! ```

pub mod compile;
pub mod document;
pub mod extract;
pub mod validate;

pub use compile::{compile, Translator};
pub use document::{Bindings, Document, Intent, Routing, RoutingMode, Worker};
pub use extract::{Extractor, FALLBACK_COMPATIBILITY_DATE};
pub use validate::validate;
