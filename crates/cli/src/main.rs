use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use filmrecipe_core::{
    load_config_or_default, validate_config, FilmLabApi, FilmLabClient, ImagePayload,
    IntakeOutcome, ProcessOutcome, WorkflowOrchestrator,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let image_path = match args.next() {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("filmrecipe {}", VERSION);
            eprintln!("Usage: filmrecipe <image-path> [output-dir]");
            bail!("missing image path argument");
        }
    };
    let output_dir = args.next().map(PathBuf::from).unwrap_or_else(|| {
        PathBuf::from("renders")
    });

    // Determine config path
    let config_path = std::env::var("FILMRECIPE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    let config = load_config_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;
    info!("Using film lab at {}", config.api.base_url);

    let bytes = std::fs::read(&image_path)
        .with_context(|| format!("Failed to read {:?}", image_path))?;
    let file_name = image_path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Image path has no usable file name")?;
    let payload = ImagePayload::new(file_name, bytes);

    let client = FilmLabClient::new(config.api.clone());
    let orchestrator = WorkflowOrchestrator::new(client, config.intake.clone());

    // Phase 1: upload and match
    let receipt = match orchestrator.submit(payload).await? {
        IntakeOutcome::Accepted(receipt) => receipt,
        // No concurrent submits in a one-shot CLI run
        IntakeOutcome::Superseded => bail!("upload was superseded"),
    };

    println!("Job {}: {} candidate films", receipt.job_id, receipt.candidate_films.len());
    for (rank, film) in receipt.candidate_films.iter().enumerate() {
        println!(
            "  {}. {} ({}) - ISO {}, {} tier, score {:.1}",
            rank + 1,
            film.film_name,
            film.manufacturer,
            film.iso_base,
            film.tier,
            film.score
        );
        println!("     {}", film.reason);
    }

    // Phase 2: render the whole batch
    let summary = match orchestrator.process_all().await? {
        ProcessOutcome::Completed(summary) => summary,
        ProcessOutcome::Superseded => bail!("render batch was superseded"),
    };
    println!(
        "Rendered: {} succeeded, {} failed",
        summary.success_count, summary.failed_count
    );
    for failure in summary.failures() {
        if let filmrecipe_core::RenderOutcome::Failed { film_id, cause, .. } = failure {
            warn!("Film {} failed: {}", film_id, cause);
        }
    }

    // Phase 3: fetch artifacts
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {:?}", output_dir))?;

    for outcome in summary.successes() {
        let url = match outcome.output_url() {
            Some(url) => url,
            None => continue,
        };
        let name = url.rsplit('/').next().unwrap_or("render.jpg");
        let target = output_dir.join(name);

        let bytes = orchestrator
            .api()
            .fetch_artifact(url)
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;
        std::fs::write(&target, bytes)
            .with_context(|| format!("Failed to write {:?}", target))?;
        println!("Saved {:?}", target);
    }

    if summary.success_count > 0 {
        let bundle = match summary.zip_url.as_deref() {
            Some(url) => orchestrator.api().artifact_url(url),
            None => orchestrator.api().bundle_url(&receipt.job_id),
        };
        match orchestrator.api().fetch_artifact(&bundle).await {
            Ok(bytes) => {
                let target = output_dir.join("all_films.zip");
                std::fs::write(&target, bytes)
                    .with_context(|| format!("Failed to write {:?}", target))?;
                println!("Saved {:?}", target);
            }
            Err(e) => warn!("ZIP bundle unavailable: {}", e),
        }
    }

    Ok(())
}
