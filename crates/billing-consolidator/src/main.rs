mod bootstrap;
mod manifest;
mod summary;

use anyhow::{Context, Result};
use billing_core::settings::Settings;
use billing_data::reader::{collect_inputs, load_inputs};
use billing_report::{build_report, report_filename};
use billing_runtime::{ConsolidationOrchestrator, ProgressEvent};
use chrono::Local;
use tokio::sync::mpsc;

use crate::manifest::RunManifest;

/// Prefix of timestamped report filenames.
const REPORT_PREFIX: &str = "billing";

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Billing Consolidator v{} starting", env!("CARGO_PKG_VERSION"));

    if settings.clear {
        tracing::info!("Saved configuration cleared");
        if settings.inputs.is_empty() {
            return Ok(());
        }
    }

    let paths = collect_inputs(&settings.inputs)?;
    let inputs = load_inputs(&paths)?;
    let submitted = inputs.len();
    tracing::info!(
        "Processing {} workbook(s) with {} worker(s)",
        submitted,
        settings.effective_workers()
    );

    let orchestrator = ConsolidationOrchestrator::new(settings.effective_workers());
    let (tx, rx) = mpsc::unbounded_channel();
    let progress = tokio::spawn(log_progress(rx));
    let outcome = orchestrator.run_with_progress(inputs, Some(tx)).await;
    progress.await?;

    print!("{}", summary::render(&outcome));

    if outcome.failures.len() == submitted {
        anyhow::bail!("none of the {} workbook(s) could be processed", submitted);
    }

    let generated_at = Local::now().naive_local();
    let report_path = match &settings.output {
        Some(path) => path.clone(),
        None => settings
            .effective_output_dir()
            .join(report_filename(REPORT_PREFIX, generated_at)),
    };
    if let Some(parent) = report_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let bytes = build_report(&outcome.dataset)?;
    std::fs::write(&report_path, bytes)
        .with_context(|| format!("Failed to write report {}", report_path.display()))?;
    println!("\nReport written to {}", report_path.display());

    if settings.manifest {
        let manifest_path = RunManifest::path_for(&report_path);
        RunManifest::new(&outcome, &report_path, generated_at).write_to(&manifest_path)?;
        println!("Manifest written to {}", manifest_path.display());
    }

    Ok(())
}

/// Log one line per merged workbook until the orchestrator drops the sender.
async fn log_progress(mut rx: mpsc::UnboundedReceiver<ProgressEvent>) {
    while let Some(event) = rx.recv().await {
        let status = if event.succeeded { "ok" } else { "failed" };
        tracing::info!(
            "[{}/{}] {} ... {}",
            event.index,
            event.total,
            event.workbook,
            status
        );
    }
}
