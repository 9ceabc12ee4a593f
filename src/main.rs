use anyhow::Result;
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use whisper_local::transcription::job;
use whisper_local::{cli, config, model, offline, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();

    // Offline mode must be set before anything touches the model cache
    offline::enforce();

    let config = config::Config::load()?;
    println!("✓ Config loaded from ~/.whisper-local.toml");

    telemetry::init(config.telemetry.enabled, &config.telemetry.log_path)?;
    tracing::info!("whisper-local starting");
    println!("✓ Telemetry initialized");

    let models_root = config::Config::expand_path(&config.models.dir)?;
    let available = model::available_models(&models_root);
    if available.is_empty() {
        println!("✓ Local models: none");
    } else {
        println!("✓ Local models: {}", available.join(", "));
    }

    let request = args.into_request();
    let stop = Arc::new(AtomicBool::new(false));

    tracing::info!(
        model = request.model,
        input = %request.input.display(),
        tag = request.tag,
        "run starting (press Ctrl+C to stop)"
    );

    let worker_stop = Arc::clone(&stop);
    let mut worker = tokio::task::spawn_blocking(move || job::run(&config, &request, &worker_stop));

    let report = tokio::select! {
        result = &mut worker => result??,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
            println!("\nStopping after the current segment...");
            stop.store(true, Ordering::SeqCst);
            worker.await??
        }
    };

    tracing::info!(
        completed = report.completed,
        failed = report.failed,
        "run finished"
    );
    println!(
        "✓ Done: {} completed, {} failed",
        report.completed, report.failed
    );

    if report.failed > 0 {
        anyhow::bail!("{} file(s) failed", report.failed);
    }

    Ok(())
}
