use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use taskex_core::{extract_tasks, parse_profile, ExtractionContext, ExtractionMode};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract embedded commands from model output", long_about = None)]
struct Args {
    /// Path to the extraction profile (YAML)
    #[arg(short, long)]
    profile: PathBuf,

    /// Message encoding: text or json
    #[arg(short, long, default_value = "text")]
    mode: ExtractionMode,

    /// The message to scan; read from stdin when omitted
    message: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let profile_yaml = std::fs::read_to_string(&args.profile)
        .with_context(|| format!("failed to read profile {}", args.profile.display()))?;
    let profile = parse_profile(&profile_yaml)
        .with_context(|| format!("invalid profile {}", args.profile.display()))?;

    let message = match args.message {
        Some(message) => message,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read message from stdin")?;
            buf
        }
    };

    let resolver = profile.resolver();
    let ctx = ExtractionContext {
        resolver: &resolver,
        schema_table: &profile.schemas,
        task_mode: profile.task_mode.clone(),
        suggestion_root: profile.suggestion_root.clone(),
        existing_data: profile.existing_data.clone(),
        wrapper: profile.wrapper.clone(),
        max_action_len: profile.max_action_len,
    };

    let result = extract_tasks(&message, args.mode, &ctx);
    tracing::debug!(
        run = result.tasks_to_run.len(),
        suggested = result.tasks_to_suggest.len(),
        "extraction finished"
    );

    let json = serde_json::to_string_pretty(&result).context("failed to serialize result")?;
    println!("{json}");
    Ok(())
}
