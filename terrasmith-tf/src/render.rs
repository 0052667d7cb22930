//! Template Renderer - deterministic DSL document → Terraform artifacts.
//!
//! Pure text generation: no filesystem, no network, no clock. Identical
//! input produces byte-identical output, which keeps plan diffs
//! reproducible and the per-intent branches independently testable.
//! Callers hand in a validated [`Document`]; identifier safety is the
//! validator's job, the renderer only maps hyphens to underscores for HCL
//! labels.

use std::path::PathBuf;
use terrasmith_dsl::{Document, Intent, RoutingMode, Worker};

/// Renderer inputs that come from configuration rather than the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderParams {
    pub account_id: String,
}

/// One generated file, addressed relative to the run directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub rel_path: PathBuf,
    pub contents: String,
}

/// The full artifact set for one run, in stable order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub files: Vec<Artifact>,
}

impl ArtifactSet {
    pub fn get(&self, rel_path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|a| a.rel_path == PathBuf::from(rel_path))
            .map(|a| a.contents.as_str())
    }
}

/// Static module-worker asset, emitted with every run.
const WORKER_ASSET: &str = r#"export default {
  async fetch(request, env, ctx) {
    const url = new URL(request.url);
    return new Response(`Hello from ${url.hostname}`, {
      headers: { "content-type": "text/plain; charset=utf-8" },
    });
  },
};
"#;

/// Render a validated document into its artifact set.
pub fn render(doc: &Document, params: &RenderParams) -> ArtifactSet {
    ArtifactSet {
        files: vec![
            Artifact {
                rel_path: PathBuf::from("providers.tf"),
                contents: render_providers(params),
            },
            Artifact {
                rel_path: PathBuf::from("main.tf"),
                contents: render_main(doc),
            },
            Artifact {
                rel_path: PathBuf::from("src/worker.js"),
                contents: WORKER_ASSET.to_string(),
            },
        ],
    }
}

fn render_providers(params: &RenderParams) -> String {
    let mut out = String::new();
    out.push_str("terraform {\n");
    out.push_str("  required_version = \">= 1.5.0\"\n\n");
    out.push_str("  required_providers {\n");
    out.push_str("    cloudflare = {\n");
    out.push_str("      source  = \"cloudflare/cloudflare\"\n");
    out.push_str("      version = \"~> 4.0\"\n");
    out.push_str("    }\n");
    out.push_str("  }\n");
    out.push_str("}\n\n");
    out.push_str("provider \"cloudflare\" {}\n\n");
    out.push_str("variable \"zone_name\" {\n  type = string\n}\n\n");
    out.push_str("variable \"hostname\" {\n  type = string\n}\n\n");
    out.push_str("variable \"worker_name\" {\n  type = string\n}\n\n");
    out.push_str("variable \"account_id\" {\n");
    out.push_str("  type    = string\n");
    out.push_str(&format!("  default = \"{}\"\n", params.account_id));
    out.push_str("}\n\n");
    out.push_str("data \"cloudflare_zone\" \"zone\" {\n");
    out.push_str("  name = var.zone_name\n");
    out.push_str("}\n");
    out
}

/// Exhaustive dispatch over intent (and routing mode for workers); every
/// branch emits a closed resource set.
fn render_main(doc: &Document) -> String {
    let mut out = String::new();
    match doc.intent {
        Intent::CreateWorkerAndBindDomain => {
            // Validator guarantees the worker block for this intent.
            if let Some(worker) = &doc.worker {
                render_worker_stack(&mut out, doc, worker);
            }
        }
        Intent::CreateDnsRecord => {
            out.push_str("resource \"cloudflare_record\" \"record\" {\n");
            out.push_str("  zone_id = data.cloudflare_zone.zone.id\n");
            out.push_str("  name    = var.hostname\n");
            out.push_str("  type    = \"CNAME\"\n");
            out.push_str("  value   = var.zone_name\n");
            out.push_str("  proxied = false\n");
            out.push_str("  ttl     = 300\n");
            out.push_str("}\n");
        }
        Intent::CreateKvNamespace => {
            out.push_str("resource \"cloudflare_workers_kv_namespace\" \"namespace\" {\n");
            out.push_str("  account_id = var.account_id\n");
            out.push_str(&format!("  title      = \"{}\"\n", leftmost_label(&doc.hostname)));
            out.push_str("}\n");
        }
        Intent::CreateD1Database => {
            out.push_str("resource \"cloudflare_d1_database\" \"database\" {\n");
            out.push_str("  account_id = var.account_id\n");
            out.push_str(&format!("  name       = \"{}\"\n", leftmost_label(&doc.hostname)));
            out.push_str("}\n");
        }
    }
    out
}

fn render_worker_stack(out: &mut String, doc: &Document, worker: &Worker) {
    for id in &doc.bindings.kv {
        out.push_str(&format!(
            "resource \"cloudflare_workers_kv_namespace\" \"kv_{}\" {{\n",
            hcl_label(id)
        ));
        out.push_str("  account_id = var.account_id\n");
        out.push_str(&format!("  title      = \"{}\"\n", id));
        out.push_str("}\n\n");
    }

    for id in &doc.bindings.d1 {
        out.push_str(&format!(
            "resource \"cloudflare_d1_database\" \"d1_{}\" {{\n",
            hcl_label(id)
        ));
        out.push_str("  account_id = var.account_id\n");
        out.push_str(&format!("  name       = \"{}\"\n", id));
        out.push_str("}\n\n");
    }

    out.push_str("resource \"cloudflare_worker_script\" \"worker\" {\n");
    out.push_str("  account_id         = var.account_id\n");
    out.push_str("  name               = var.worker_name\n");
    out.push_str("  content            = file(\"${path.module}/src/worker.js\")\n");
    out.push_str(&format!("  module             = {}\n", worker.module));
    out.push_str(&format!(
        "  compatibility_date = \"{}\"\n",
        worker.compatibility_date
    ));
    for id in &doc.bindings.kv {
        out.push_str("\n  kv_namespace_binding {\n");
        out.push_str(&format!("    name         = \"{}\"\n", id));
        out.push_str(&format!(
            "    namespace_id = cloudflare_workers_kv_namespace.kv_{}.id\n",
            hcl_label(id)
        ));
        out.push_str("  }\n");
    }
    for id in &doc.bindings.d1 {
        out.push_str("\n  d1_database_binding {\n");
        out.push_str(&format!("    name        = \"{}\"\n", id));
        out.push_str(&format!(
            "    database_id = cloudflare_d1_database.d1_{}.id\n",
            hcl_label(id)
        ));
        out.push_str("  }\n");
    }
    out.push_str("}\n\n");

    // The two exposure modes are mutually exclusive by construction.
    match doc.routing.mode {
        RoutingMode::CustomDomain => {
            out.push_str("resource \"cloudflare_worker_domain\" \"domain\" {\n");
            out.push_str("  account_id = var.account_id\n");
            out.push_str("  zone_id    = data.cloudflare_zone.zone.id\n");
            out.push_str("  hostname   = var.hostname\n");
            out.push_str("  service    = cloudflare_worker_script.worker.name\n");
            out.push_str("}\n");
        }
        RoutingMode::Route => {
            out.push_str("resource \"cloudflare_record\" \"worker_dns\" {\n");
            out.push_str("  zone_id = data.cloudflare_zone.zone.id\n");
            out.push_str("  name    = var.hostname\n");
            out.push_str("  type    = \"CNAME\"\n");
            out.push_str("  value   = var.zone_name\n");
            out.push_str("  proxied = true\n");
            out.push_str("  ttl     = 1\n");
            out.push_str("}\n\n");
            out.push_str("resource \"cloudflare_worker_route\" \"route\" {\n");
            out.push_str("  zone_id     = data.cloudflare_zone.zone.id\n");
            out.push_str("  pattern     = \"${var.hostname}/*\"\n");
            out.push_str("  script_name = cloudflare_worker_script.worker.name\n");
            out.push_str("}\n");
        }
    }
}

fn hcl_label(id: &str) -> String {
    id.replace('-', "_")
}

fn leftmost_label(hostname: &str) -> &str {
    hostname.split('.').next().unwrap_or(hostname)
}
