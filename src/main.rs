//! commitcraft - CLI entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use futures_util::StreamExt;
use git2::Repository;
use tracing_subscriber::EnvFilter;

use commitcraft::config::{
    BackendConfig, BackendKind, CommitType, Credentials, GenerationParams, timeout_from_env,
};
use commitcraft::git::{DEFAULT_EXCLUDES, collect_staged_diff, commit_staged};
use commitcraft::llm::{Backend, ChoiceRecord, FileResponseLogger, GenerationService};

/// Generate commit messages for staged changes using Mistral models.
#[derive(Parser, Debug)]
#[command(name = "commitcraft")]
#[command(about = "Generate commit messages for staged changes using Mistral models")]
#[command(version)]
struct Cli {
    /// Backend to use: mistral (model checked first) or codestral
    #[arg(short, long, default_value = "mistral")]
    backend: BackendKind,

    /// Model identifier
    #[arg(short, long, default_value = "mistral-small-latest")]
    model: String,

    /// Number of candidate messages to request
    #[arg(short, long, default_value_t = 1)]
    generate: usize,

    /// Commit message convention: conventional, gitmoji or plain
    #[arg(short = 't', long = "type", default_value = "conventional")]
    commit_type: CommitType,

    /// Language of the generated message
    #[arg(short, long, default_value = "en")]
    locale: String,

    /// Maximum commit message length in characters
    #[arg(long, default_value_t = 50)]
    max_length: usize,

    /// Maximum tokens the model may generate
    #[arg(long, default_value_t = 1024)]
    max_tokens: u32,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.7)]
    temperature: f32,

    /// Network timeout in seconds (default: COMMITCRAFT_TIMEOUT or 10)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Custom instructions replacing the built-in prompt
    #[arg(short, long)]
    prompt: Option<String>,

    /// Outbound proxy URL
    #[arg(long)]
    proxy: Option<String>,

    /// Write prompts and responses to COMMITCRAFT_LOG_DIR
    #[arg(long)]
    log: bool,

    /// Exclude files from the diff (repeatable)
    #[arg(short = 'x', long = "exclude")]
    exclude: Vec<String>,

    /// Include lockfiles normally left out of the diff
    #[arg(long)]
    include_lockfiles: bool,

    /// Print the candidates without committing
    #[arg(long)]
    dry_run: bool,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Step 1: Collect the staged diff
    let repo = Repository::discover(".")
        .context("Not a git repository. Run commitcraft from within a git repository.")?;

    let mut excludes = cli.exclude.clone();
    if !cli.include_lockfiles {
        excludes.extend(DEFAULT_EXCLUDES.iter().map(|s| s.to_string()));
    }
    let diff = collect_staged_diff(&repo, &excludes).context("Failed to collect staged changes")?;

    println!(
        "Found {} staged file(s){}",
        diff.files.len(),
        if diff.truncated { " (diff truncated)" } else { "" }
    );

    // Step 2: Build the backend
    let params = GenerationParams {
        locale: cli.locale.clone(),
        generate: cli.generate,
        commit_type: cli.commit_type,
        user_prompt: cli.prompt.clone(),
        max_length: cli.max_length,
        max_tokens: cli.max_tokens,
        temperature: cli.temperature,
        timeout: cli
            .timeout
            .map(Duration::from_secs)
            .unwrap_or_else(timeout_from_env),
        logging: cli.log,
        credentials: Credentials::from_env(),
        model: cli.model.clone(),
        proxy: cli.proxy.clone(),
    };
    params.validate()?;

    let config = BackendConfig::new(cli.backend).with_env_overrides();
    let backend = Backend::from_config(&config, &params).context("Failed to configure backend")?;

    let service = GenerationService::new(backend, params, diff.text)
        .with_logger(Arc::new(FileResponseLogger::new(FileResponseLogger::default_dir())))
        .with_tagged_labels(cli.generate > 1);

    // Step 3: Generate
    println!("Generating commit message(s) with {}...", cli.model);
    let records: Vec<ChoiceRecord> = service.generate().collect().await;

    let selectable: Vec<&ChoiceRecord> = records.iter().filter(|r| !r.disabled).collect();
    for record in records.iter().filter(|r| r.is_error) {
        eprintln!("{}", record.label);
    }
    if selectable.is_empty() {
        bail!("No commit message was generated");
    }

    if cli.dry_run {
        for record in &selectable {
            println!("{}", record.value);
        }
        return Ok(());
    }

    // Step 4: Pick and commit
    let labels: Vec<&str> = selectable.iter().map(|r| r.label.as_str()).collect();
    let picked = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Pick a commit message")
        .items(&labels)
        .default(0)
        .interact_opt()
        .context("Failed to read selection")?;

    let Some(index) = picked else {
        println!("Commit cancelled");
        return Ok(());
    };

    let message = &selectable[index].value;
    let oid = commit_staged(&repo, message).context("Failed to create commit")?;
    println!("✓ Committed {} {}", &oid.to_string()[..7], message);

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "commitcraft=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
