mod cli;
mod console;
mod metrics;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediaconv_core::executor::EncoderCapabilities;
use mediaconv_core::media::{format_duration, format_size, AudioCodec, VideoCodec};
use mediaconv_core::{
    load_config_or_default, validate_config, BatchRunner, Config, FfmpegExecutor, FfprobeProbe,
    JobBuilder, JobExecutor, MediaProbe, Overrides, SettingsResolver,
};

use cli::{Cli, Commands};
use console::ConsoleSink;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "mediaconv_core=debug,mediaconv_cli=debug,info"
    } else {
        "warn"
    };
    let json_layer = cli
        .log_json
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!cli.log_json)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(json_layer)
        .with(text_layer)
        .init();

    let config = load_config_or_default(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load default configuration".to_string(),
    })?;
    validate_config(&config).context("Configuration validation failed")?;

    let result = match cli.command {
        Commands::Probe { file, json } => probe_file(&config, &file, json).await,
        Commands::Convert {
            input,
            container,
            overrides,
        } => convert_file(&config, &input, &container, &overrides.to_overrides()).await,
        Commands::Batch {
            inputs,
            container,
            overrides,
        } => run_batch(&config, &inputs, &container, &overrides.to_overrides()).await,
        Commands::CheckTools => check_tools(&config).await,
    };

    if let Some(path) = &cli.metrics_out {
        metrics::write_metrics(path)?;
    }

    result
}

fn job_builder(config: &Config) -> JobBuilder {
    let probe: Arc<dyn MediaProbe> = Arc::new(FfprobeProbe::new(config.tools.clone()));
    JobBuilder::new(
        probe,
        SettingsResolver::new(config.defaults.clone()),
        config.output.clone(),
    )
}

fn executor(config: &Config) -> FfmpegExecutor {
    FfmpegExecutor::new(config.tools.clone(), config.executor.clone())
}

/// Token cancelled on the first Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping conversion");
            child.cancel();
        }
    });
    token
}

async fn probe_file(config: &Config, file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        bail!("File does not exist: {}", file.display());
    }

    let probe = FfprobeProbe::new(config.tools.clone());
    let descriptor = probe.probe(file).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
    } else {
        println!("File: {}", descriptor.path.display());
        println!("{}", descriptor.summary());
        if descriptor.bitrate_bps > 0 {
            println!("Bitrate: {} kb/s", descriptor.bitrate_bps / 1000);
        }
    }

    Ok(())
}

async fn convert_file(
    config: &Config,
    input: &Path,
    container: &str,
    overrides: &Overrides,
) -> Result<()> {
    let builder = job_builder(config);
    let executor = executor(config);

    let mut job = builder
        .build(input, container, overrides)
        .await
        .context("Could not prepare conversion")?;

    println!("Input:  {}", job.input.summary());
    println!(
        "Output: {} ({}, {})",
        job.output_path.display(),
        job.mode,
        job.output_container.description()
    );
    info!(args = ?executor.build_args(&job), "FFmpeg arguments");

    let sink = ConsoleSink::new();
    let result = executor
        .execute(&mut job, &sink, cancel_on_interrupt())
        .await;
    sink.finish();

    match result {
        Ok(outcome) => {
            println!(
                "Done: {} ({}, {})",
                outcome.output_path.display(),
                format_size(outcome.size_bytes),
                format_duration(outcome.elapsed_secs)
            );
            Ok(())
        }
        Err(e) => bail!("Conversion failed: {}", e.detail()),
    }
}

async fn run_batch(
    config: &Config,
    inputs: &[std::path::PathBuf],
    container: &str,
    overrides: &Overrides,
) -> Result<()> {
    let runner = BatchRunner::new(
        Arc::new(job_builder(config)),
        Arc::new(executor(config)),
        config.batch.clone(),
    );

    let sink = ConsoleSink::new();
    let outcome = runner
        .run_batch(inputs, container, overrides, &sink, cancel_on_interrupt())
        .await;
    sink.finish();

    for output in &outcome.succeeded {
        println!("ok      {}", output.display());
    }
    for failure in &outcome.failed {
        let first_line = failure.reason.lines().next().unwrap_or_default();
        println!(
            "failed  {} [{}] {}",
            failure.input.display(),
            failure.stage,
            first_line
        );
    }
    println!(
        "{} of {} converted",
        outcome.succeeded.len(),
        outcome.total
    );

    if !outcome.all_succeeded() {
        bail!("{} of {} inputs failed", outcome.failed.len(), outcome.total);
    }
    Ok(())
}

async fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let mut all_ok = true;

    match executor(config).validate().await {
        Ok(()) => println!("✓ ffmpeg - {}", config.tools.ffmpeg_path.display()),
        Err(e) => {
            all_ok = false;
            println!("✗ ffmpeg - {}", e);
        }
    }

    match FfprobeProbe::new(config.tools.clone()).validate().await {
        Ok(()) => println!("✓ ffprobe - {}", config.tools.ffprobe_path.display()),
        Err(e) => {
            all_ok = false;
            println!("✗ ffprobe - {}", e);
        }
    }

    let caps = EncoderCapabilities::detect(&config.tools.ffmpeg_path).await;
    println!("\nEncoders:");
    for codec in VideoCodec::ALL {
        let mark = if caps.supports_video(codec) { "✓" } else { "✗" };
        println!("  {} {} ({})", mark, codec, codec.ffmpeg_encoder());
    }
    for codec in AudioCodec::ALL {
        let mark = if caps.supports_audio(codec) { "✓" } else { "✗" };
        println!("  {} {} ({})", mark, codec, codec.ffmpeg_encoder());
    }

    let missing = caps.missing_video().len() + caps.missing_audio().len();
    if missing > 0 {
        println!("\n{} encoder(s) unavailable; conversions needing them will fail", missing);
    }

    if !all_ok {
        bail!("Required tools are missing");
    }
    Ok(())
}
