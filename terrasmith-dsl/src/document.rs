//! The DSL document: terrasmith's sole intermediate representation.
//!
//! Field set is closed (`deny_unknown_fields` at every level); this is the
//! bit-exact wire contract for candidate documents regardless of whether
//! they came from the AI bridge or the rule-based extractor. A `Document`
//! is immutable once validated: consumers only ever take `&Document`.

use serde::{Deserialize, Serialize};

/// Closed set of resource-creation intents. Selects the renderer branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    #[serde(rename = "create_worker_and_bind_domain")]
    CreateWorkerAndBindDomain,
    #[serde(rename = "create_dns_record")]
    CreateDnsRecord,
    #[serde(rename = "create_kv_namespace")]
    CreateKvNamespace,
    #[serde(rename = "create_d1_database")]
    CreateD1Database,
}

impl Intent {
    /// Whether this intent requires a `worker` block.
    pub fn requires_worker(self) -> bool {
        matches!(self, Intent::CreateWorkerAndBindDomain)
    }

    /// Wire-format name, for diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::CreateWorkerAndBindDomain => "create_worker_and_bind_domain",
            Intent::CreateDnsRecord => "create_dns_record",
            Intent::CreateKvNamespace => "create_kv_namespace",
            Intent::CreateD1Database => "create_d1_database",
        }
    }
}

/// How a worker is exposed on the zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutingMode {
    #[default]
    #[serde(rename = "custom_domain")]
    CustomDomain,
    #[serde(rename = "route")]
    Route,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Routing {
    #[serde(default)]
    pub mode: RoutingMode,
}

/// Worker script configuration, required iff the intent is
/// `create_worker_and_bind_domain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Worker {
    pub name: String,
    pub module: bool,
    pub compatibility_date: String,
}

/// Resource bindings attached to a worker. Order is preserved; entries are
/// identifiers reusable as generated-code labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bindings {
    #[serde(default)]
    pub kv: Vec<String>,
    #[serde(default)]
    pub d1: Vec<String>,
}

impl Bindings {
    pub fn is_empty(&self) -> bool {
        self.kv.is_empty() && self.d1.is_empty()
    }
}

/// A validated DSL document. Construct via [`crate::validate`] (or the
/// extractor, which self-checks through it); never hand a renderer a
/// document that skipped validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    pub intent: Intent,
    pub zone_name: String,
    pub hostname: String,
    #[serde(default)]
    pub routing: Routing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<Worker>,
    #[serde(default, skip_serializing_if = "Bindings::is_empty")]
    pub bindings: Bindings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_wire_names() {
        assert_eq!(
            serde_json::to_string(&Intent::CreateWorkerAndBindDomain).unwrap(),
            "\"create_worker_and_bind_domain\""
        );
        assert_eq!(
            serde_json::to_string(&Intent::CreateD1Database).unwrap(),
            "\"create_d1_database\""
        );
    }

    #[test]
    fn test_routing_defaults_to_custom_domain() {
        let routing: Routing = serde_json::from_str("{}").unwrap();
        assert_eq!(routing.mode, RoutingMode::CustomDomain);
        assert_eq!(Routing::default().mode, RoutingMode::CustomDomain);
    }

    #[test]
    fn test_unknown_field_in_worker_rejected() {
        let result: Result<Worker, _> = serde_json::from_str(
            r#"{"name":"api","module":true,"compatibility_date":"2024-01-01","memory":128}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_document_round_trip() {
        let doc = Document {
            intent: Intent::CreateWorkerAndBindDomain,
            zone_name: "example.com".to_string(),
            hostname: "api.example.com".to_string(),
            routing: Routing::default(),
            worker: Some(Worker {
                name: "api".to_string(),
                module: true,
                compatibility_date: "2024-01-01".to_string(),
            }),
            bindings: Bindings {
                kv: vec!["cache".to_string()],
                d1: vec![],
            },
        };
        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
