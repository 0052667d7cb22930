//! Schema Validator - the single gate between candidate documents and the
//! renderer.
//!
//! Two stages: serde deserialization into the closed document structs
//! (unknown fields, missing fields, wrong types), then semantic rules that
//! the type system cannot express (character classes, worker-iff-intent,
//! date format). Pure and total: any JSON value in, acceptance or a
//! specific [`RejectionError`] out, never a panic.

use crate::document::{Document, Intent};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use terrasmith_core::RejectionError;

/// DNS name: lowercase labels of `[a-z0-9-]`, no leading/trailing hyphen,
/// each label at most 63 chars.
pub(crate) static DNS_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?(\.[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?)*$")
        .expect("static pattern")
});

/// Worker name: Cloudflare allows 3..=63 chars of `[a-z0-9-]`.
pub(crate) static WORKER_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9-]{3,63}$").expect("static pattern"));

/// Binding identifier: reusable as a generated-code label, so no leading or
/// trailing hyphen.
pub(crate) static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").expect("static pattern"));

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static pattern"));

/// Validate an arbitrary candidate against the DSL contract.
///
/// Applies the one documented default (absent `routing` → `custom_domain`)
/// and nothing else; required fields are never silently filled in.
pub fn validate(candidate: &Value) -> Result<Document, RejectionError> {
    let doc: Document = serde_json::from_value(candidate.clone()).map_err(classify_serde)?;
    check_semantics(&doc)?;
    Ok(doc)
}

fn classify_serde(err: serde_json::Error) -> RejectionError {
    let reason = err.to_string();
    if let Some(rest) = reason.strip_prefix("missing field `") {
        if let Some(field) = rest.split('`').next() {
            return RejectionError::RequiredFieldMissing {
                field: field.to_string(),
            };
        }
    }
    RejectionError::Malformed { reason }
}

fn check_semantics(doc: &Document) -> Result<(), RejectionError> {
    if !DNS_NAME_RE.is_match(&doc.hostname) {
        return Err(invalid("hostname", format!("'{}' is not a valid FQDN", doc.hostname)));
    }
    if !DNS_NAME_RE.is_match(&doc.zone_name) || !doc.zone_name.contains('.') {
        return Err(invalid(
            "zone_name",
            format!("'{}' is not a valid base domain", doc.zone_name),
        ));
    }

    match (&doc.worker, doc.intent.requires_worker()) {
        (None, true) => {
            return Err(RejectionError::RequiredFieldMissing {
                field: "worker".to_string(),
            })
        }
        (Some(_), false) => {
            return Err(invalid(
                "worker",
                format!("not allowed for intent '{}'", doc.intent.as_str()),
            ))
        }
        _ => {}
    }

    if let Some(worker) = &doc.worker {
        if !WORKER_NAME_RE.is_match(&worker.name) {
            return Err(invalid(
                "worker.name",
                format!("'{}' must match [a-z0-9-] and be 3-63 chars", worker.name),
            ));
        }
        if !DATE_RE.is_match(&worker.compatibility_date) {
            return Err(invalid(
                "worker.compatibility_date",
                format!("'{}' must be YYYY-MM-DD", worker.compatibility_date),
            ));
        }
    }

    for (field, entries) in [("bindings.kv", &doc.bindings.kv), ("bindings.d1", &doc.bindings.d1)] {
        for entry in entries {
            if !IDENTIFIER_RE.is_match(entry) {
                return Err(invalid(
                    field,
                    format!("'{}' is not a valid resource identifier", entry),
                ));
            }
        }
    }

    if doc.intent != Intent::CreateWorkerAndBindDomain && !doc.bindings.is_empty() {
        return Err(invalid(
            "bindings",
            format!("not allowed for intent '{}'", doc.intent.as_str()),
        ));
    }

    Ok(())
}

fn invalid(field: &str, reason: String) -> RejectionError {
    RejectionError::InvalidValue {
        field: field.to_string(),
        reason,
    }
}
