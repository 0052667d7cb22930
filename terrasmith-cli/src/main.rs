//! terrasmith - natural language to Terraform for Cloudflare.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "terrasmith", version, about = "Natural language to Terraform for Cloudflare")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Set up credentials and defaults interactively
    Init,

    /// Compile a request, generate a run directory and run terraform plan
    Plan {
        /// Natural-language request, e.g. "Create a Worker on api.example.com"
        prompt: String,

        /// Run root directory
        #[arg(long, default_value = "terraform")]
        run_root: PathBuf,

        /// Generate the run directory without invoking terraform
        #[arg(long)]
        no_exec: bool,
    },

    /// Apply the latest (or an explicitly chosen) run
    Apply {
        /// Run root directory
        #[arg(long, default_value = "terraform")]
        run_root: PathBuf,

        /// Explicit run directory instead of the latest
        #[arg(long)]
        run: Option<PathBuf>,

        /// Skip terraform's confirmation prompt
        #[arg(long)]
        auto_approve: bool,
    },

    /// Destroy the resources of the latest (or an explicitly chosen) run
    Destroy {
        /// Run root directory
        #[arg(long, default_value = "terraform")]
        run_root: PathBuf,

        /// Explicit run directory instead of the latest
        #[arg(long)]
        run: Option<PathBuf>,

        /// Skip terraform's confirmation prompt
        #[arg(long)]
        auto_approve: bool,
    },

    /// List existing runs, oldest first
    Runs {
        /// Run root directory
        #[arg(long, default_value = "terraform")]
        run_root: PathBuf,
    },

    /// Check configuration and tooling
    Doctor,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Init => commands::init(),
        Commands::Plan {
            prompt,
            run_root,
            no_exec,
        } => commands::plan(&prompt, &run_root, no_exec).await,
        Commands::Apply {
            run_root,
            run,
            auto_approve,
        } => commands::apply(&run_root, run.as_deref(), auto_approve),
        Commands::Destroy {
            run_root,
            run,
            auto_approve,
        } => commands::destroy(&run_root, run.as_deref(), auto_approve),
        Commands::Runs { run_root } => commands::runs(&run_root),
        Commands::Doctor => commands::doctor(),
    };

    if let Err(err) = outcome {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
