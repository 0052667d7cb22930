//! TERRASMITH TF - Terraform back-end.
//!
//! Three pieces, in dependency order:
//! - [`render`]: pure, deterministic DSL document → HCL artifact generation
//! - [`run`]: immutable, timestamp-named run directories plus latest-run
//!   resolution (a derived view over the run root, never cached state)
//! - [`exec`]: the terraform subprocess wrapper invoked against exactly one
//!   resolved run directory

pub mod exec;
pub mod render;
pub mod run;

pub use exec::TerraformRunner;
pub use render::{render, Artifact, ArtifactSet, RenderParams};
pub use run::{Run, RunManager};
