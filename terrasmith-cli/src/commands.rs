//! Subcommand implementations.
//!
//! Each command surfaces failures as stage-labeled [`TsError`] values;
//! `main` prints them and sets the exit code. Raw provider error bodies and
//! credentials never reach the terminal.

use std::io::Write;
use std::path::Path;
use terrasmith_core::{Config, ConfigError, TsResult};
use terrasmith_dsl::{compile, Extractor, Translator};
use terrasmith_llm::OpenAiBridge;
use terrasmith_tf::{render, RenderParams, Run, RunManager, TerraformRunner};

pub fn init() -> TsResult<()> {
    let mut config = Config::load()?;

    println!("terrasmith configuration (empty input keeps the current value)");
    update(&mut config.auth.openai_api_key, "OpenAI API key")?;
    update(&mut config.auth.cloudflare_api_token, "Cloudflare API token")?;
    update(&mut config.defaults.account_id, "Cloudflare account id")?;
    update(&mut config.defaults.zone_name, "Default zone")?;

    let path = config.save()?;
    println!("configuration saved to {} (mode 0600)", path.display());

    if !config.has_openai_key() {
        println!("note: no OpenAI key set, compilation will use the rule-based extractor only");
    }
    if !config.has_cloudflare_config() {
        println!("note: Cloudflare token/account id incomplete, terraform will need them from the environment");
    }
    Ok(())
}

pub async fn plan(prompt: &str, run_root: &Path, no_exec: bool) -> TsResult<()> {
    let config = Config::load()?;

    let bridge = OpenAiBridge::from_config(&config);
    let translator = bridge.as_ref().map(|b| b as &dyn Translator);
    let doc = compile(prompt, translator, &Extractor::default()).await?;
    println!("compiled: intent={} hostname={}", doc.intent.as_str(), doc.hostname);

    let account_id = config.account_id()?;
    let artifacts = render(&doc, &RenderParams { account_id: account_id.clone() });
    let run = RunManager::new(run_root).create_run(&doc, &artifacts, &account_id)?;
    println!("run created: {}", run.path.display());

    if no_exec {
        return Ok(());
    }

    let runner = TerraformRunner::new(&run.path, config.auth.cloudflare_api_token.clone());
    runner.init()?;
    let output = runner.plan()?;
    print!("{output}");
    Ok(())
}

pub fn apply(run_root: &Path, run: Option<&Path>, auto_approve: bool) -> TsResult<()> {
    let config = Config::load()?;
    let run = resolve_run(run_root, run)?;
    println!("applying run {}", run.path.display());

    let runner = TerraformRunner::new(&run.path, config.auth.cloudflare_api_token.clone());
    runner.init()?;
    let output = runner.apply(auto_approve)?;
    print!("{output}");
    Ok(())
}

pub fn destroy(run_root: &Path, run: Option<&Path>, auto_approve: bool) -> TsResult<()> {
    let config = Config::load()?;
    let run = resolve_run(run_root, run)?;
    println!("destroying run {}", run.path.display());

    let runner = TerraformRunner::new(&run.path, config.auth.cloudflare_api_token.clone());
    runner.init()?;
    let output = runner.destroy(auto_approve)?;
    print!("{output}");
    Ok(())
}

pub fn runs(run_root: &Path) -> TsResult<()> {
    let runs = RunManager::new(run_root).list_runs()?;
    if runs.is_empty() {
        println!("no runs under {}", run_root.display());
        return Ok(());
    }
    for run in runs {
        println!("{}", run.token);
    }
    Ok(())
}

pub fn doctor() -> TsResult<()> {
    let config = Config::load()?;
    let path = Config::config_file()?;

    println!("config file:          {}", path.display());
    println!("openai key:           {}", configured(config.has_openai_key()));
    println!(
        "cloudflare token:     {}",
        configured(config.auth.cloudflare_api_token.is_some())
    );
    println!(
        "account id:           {}",
        configured(config.defaults.account_id.is_some())
    );
    match TerraformRunner::version() {
        Some(version) => println!("terraform:            v{version}"),
        None => println!("terraform:            not found in PATH"),
    }

    if !config.has_openai_key() {
        println!("\ncompilation will rely on the rule-based extractor only");
    }
    Ok(())
}

fn resolve_run(run_root: &Path, explicit: Option<&Path>) -> TsResult<Run> {
    match explicit {
        Some(path) => Ok(RunManager::resolve(path)?),
        None => Ok(RunManager::new(run_root).latest_run()?),
    }
}

fn configured(present: bool) -> &'static str {
    if present {
        "configured"
    } else {
        "not set"
    }
}

/// Prompt on stdout, read one trimmed line; empty keeps the current value.
fn update(slot: &mut Option<String>, label: &str) -> TsResult<()> {
    let state = if slot.is_some() { "set" } else { "unset" };
    print!("{label} [{state}]: ");
    std::io::stdout().flush().map_err(stdin_err)?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line).map_err(stdin_err)?;
    let value = line.trim();
    if !value.is_empty() {
        *slot = Some(value.to_string());
    }
    Ok(())
}

fn stdin_err(err: std::io::Error) -> terrasmith_core::TsError {
    ConfigError::Read {
        path: "<stdin>".to_string(),
        reason: err.to_string(),
    }
    .into()
}
