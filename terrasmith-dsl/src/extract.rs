//! Fallback Extractor - deterministic, rule-based text → DSL conversion.
//!
//! Used when no AI credential is configured or the bridge gives up. The
//! output is self-checked through the schema validator before it is
//! returned; if the text carries no hostname-shaped signal at all the
//! extraction fails, it never guesses one.

use crate::document::{Bindings, Document, Intent, Routing, Worker};
use crate::validate::validate;
use once_cell::sync::Lazy;
use regex::Regex;
use terrasmith_core::ExtractionError;

/// Compatibility date stamped on synthesized workers. Bump deliberately:
/// it changes what the Cloudflare runtime guarantees to generated workers.
pub const FALLBACK_COMPATIBILITY_DATE: &str = "2024-01-01";

const WORKER_NAME_MAX: usize = 63;
const WORKER_NAME_MIN: usize = 3;

/// First FQDN-shaped token: two or more labels, alphabetic TLD.
static FQDN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?(\.[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?)*\.[a-z]{2,}\b")
        .expect("static pattern")
});

/// Rule-based extractor with a configurable worker-vocabulary keyword set.
#[derive(Debug, Clone)]
pub struct Extractor {
    worker_keywords: Vec<String>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            worker_keywords: ["worker", "script", "function", "serverless"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Extractor {
    /// Replace the worker-creation vocabulary.
    pub fn with_worker_keywords(keywords: impl IntoIterator<Item = String>) -> Self {
        Self {
            worker_keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Deterministically derive a document from free text.
    ///
    /// Identical input yields a byte-identical document.
    pub fn extract(&self, text: &str) -> Result<Document, ExtractionError> {
        let lowered = text.to_lowercase();

        let hostname = FQDN_RE
            .find(&lowered)
            .map(|m| m.as_str().to_string())
            .ok_or(ExtractionError::NoHostname)?;
        let zone_name = derive_zone(&hostname);

        let intent = if self.worker_keywords.iter().any(|kw| lowered.contains(kw)) {
            Intent::CreateWorkerAndBindDomain
        } else {
            Intent::CreateDnsRecord
        };

        let worker = intent.requires_worker().then(|| Worker {
            name: synthesize_worker_name(&hostname),
            module: true,
            compatibility_date: FALLBACK_COMPATIBILITY_DATE.to_string(),
        });

        let doc = Document {
            intent,
            zone_name,
            hostname,
            routing: Routing::default(),
            worker,
            bindings: Bindings::default(),
        };

        // Self-check: the extractor obeys the same contract as everyone else.
        let candidate = serde_json::to_value(&doc).map_err(|e| {
            ExtractionError::SelfCheck(terrasmith_core::RejectionError::Malformed {
                reason: e.to_string(),
            })
        })?;
        validate(&candidate).map_err(ExtractionError::SelfCheck)
    }
}

/// Zone derivation: with three or more labels, drop the leftmost;
/// otherwise the hostname already is the zone apex.
fn derive_zone(hostname: &str) -> String {
    let labels: Vec<&str> = hostname.split('.').collect();
    if labels.len() >= 3 {
        labels[1..].join(".")
    } else {
        hostname.to_string()
    }
}

/// Worker name from the leftmost hostname label, coerced into the
/// `[a-z0-9-]{3,63}` contract.
fn synthesize_worker_name(hostname: &str) -> String {
    let label = hostname.split('.').next().unwrap_or_default();
    let mut name: String = label
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();
    name.truncate(WORKER_NAME_MAX);
    while name.ends_with('-') {
        name.pop();
    }
    if name.len() < WORKER_NAME_MIN {
        name.push_str("-fn");
    }
    name.trim_start_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RoutingMode;

    #[test]
    fn test_worker_trigger_scenario() {
        let doc = Extractor::default()
            .extract("Create a Worker and connect it to api.example.com")
            .expect("extraction");
        assert_eq!(doc.intent, Intent::CreateWorkerAndBindDomain);
        assert_eq!(doc.hostname, "api.example.com");
        assert_eq!(doc.zone_name, "example.com");
        assert_eq!(doc.routing.mode, RoutingMode::CustomDomain);

        let worker = doc.worker.expect("worker synthesized");
        assert_eq!(worker.name, "api");
        assert!(worker.module);
        assert_eq!(worker.compatibility_date, FALLBACK_COMPATIBILITY_DATE);
    }

    #[test]
    fn test_dns_intent_without_worker_vocabulary() {
        let doc = Extractor::default()
            .extract("Point www.example.com at the apex")
            .expect("extraction");
        assert_eq!(doc.intent, Intent::CreateDnsRecord);
        assert!(doc.worker.is_none());
    }

    #[test]
    fn test_two_label_hostname_is_its_own_zone() {
        let doc = Extractor::default()
            .extract("Add a record for example.com")
            .expect("extraction");
        assert_eq!(doc.hostname, "example.com");
        assert_eq!(doc.zone_name, "example.com");
    }

    #[test]
    fn test_deep_hostname_drops_one_label() {
        let doc = Extractor::default()
            .extract("Worker at edge.api.example.com please")
            .expect("extraction");
        assert_eq!(doc.hostname, "edge.api.example.com");
        assert_eq!(doc.zone_name, "api.example.com");
    }

    #[test]
    fn test_no_hostname_is_terminal() {
        let err = Extractor::default()
            .extract("make me some infrastructure")
            .expect_err("no signal");
        assert_eq!(err, ExtractionError::NoHostname);
    }

    #[test]
    fn test_uppercase_input_is_normalized() {
        let doc = Extractor::default()
            .extract("Create a worker on API.Example.COM")
            .expect("extraction");
        assert_eq!(doc.hostname, "api.example.com");
    }

    #[test]
    fn test_determinism() {
        let text = "Create a Worker and connect it to api.example.com";
        let a = Extractor::default().extract(text).expect("first");
        let b = Extractor::default().extract(text).expect("second");
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_short_label_padded_to_name_minimum() {
        let doc = Extractor::default()
            .extract("Deploy a worker at a.example.com")
            .expect("extraction");
        let worker = doc.worker.expect("worker");
        assert_eq!(worker.name, "a-fn");
    }

    #[test]
    fn test_custom_keyword_set() {
        let extractor = Extractor::with_worker_keywords(["despliega".to_string()]);
        let doc = extractor
            .extract("despliega algo en api.example.com")
            .expect("extraction");
        assert_eq!(doc.intent, Intent::CreateWorkerAndBindDomain);
    }

    #[test]
    fn test_result_always_passes_validation() {
        for text in [
            "worker for api.example.com",
            "record for a.b.c.d.example.org",
            "x.io",
        ] {
            let doc = Extractor::default().extract(text).expect("extraction");
            let candidate = serde_json::to_value(&doc).unwrap();
            assert!(crate::validate(&candidate).is_ok());
        }
    }
}
