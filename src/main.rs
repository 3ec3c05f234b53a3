use std::future::Future;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use feargreed_recorder::{
    stop_signal, CnnSource, CycleOutcome, GitCli, PersistencePolicy, Recorder, RecorderConfig,
    StopHandle,
};

#[derive(Parser, Debug)]
#[command(name = "feargreed-recorder")]
#[command(about = "Record the CNN Fear & Greed index to CSV and publish it with git")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Record file to write
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Persistence policy (overwrite, append-daily, append-timestamp, append-ohlc)
    #[arg(short, long)]
    policy: Option<PersistencePolicy>,

    /// Seconds between cycles
    #[arg(short, long)]
    interval: Option<u64>,

    /// Git repository to publish from (defaults to the current directory)
    #[arg(short, long)]
    repo: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Write the record file without committing or pushing
    #[arg(long)]
    no_publish: bool,
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut RecorderConfig) {
        if let Some(file) = &self.file {
            config.file_path = file.clone();
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(interval) = self.interval {
            config.cycle_period_secs = interval;
        }
        if let Some(repo) = &self.repo {
            config.repo_dir = Some(repo.clone());
        }
        if self.no_publish {
            config.publish = false;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = RecorderConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    args.apply(&mut config);

    // Cycles are strictly sequential, so a single-threaded runtime is enough
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(run(config, args.once))
}

async fn run(config: RecorderConfig, once: bool) -> Result<()> {
    let source = CnnSource::builder()
        .base_url(config.source_url.clone())
        .granularity(config.policy.granularity())
        .timeout(config.request_timeout())
        .build()?;
    let vcs = match &config.repo_dir {
        Some(dir) => GitCli::in_dir(dir),
        None => GitCli::new(),
    };
    let recorder = Recorder::from_config(&config, source, vcs);

    info!(
        file = %recorder.store().path().display(),
        policy = %config.policy,
        publish = config.publish,
        period_secs = config.cycle_period_secs,
        "Starting recorder"
    );

    if once {
        let outcome = recorder.run_once(Local::now()).await;
        if let CycleOutcome::Recorded { observation, .. } = &outcome {
            println!("{}", observation);
        }
        return Ok(());
    }

    let (handle, stop) = stop_signal();
    tokio::spawn(stop_on_interrupt(handle, tokio::signal::ctrl_c()));

    recorder.run_forever(stop).await;
    Ok(())
}

/// Stop the recorder once `interrupt` fires.
///
/// If the handler could not be installed the handle is held forever, so the
/// recorder keeps running instead of stopping after one cycle.
async fn stop_on_interrupt<F>(handle: StopHandle, interrupt: F)
where
    F: Future<Output = io::Result<()>>,
{
    match interrupt.await {
        Ok(()) => {
            info!("Interrupt received, stopping after the current cycle");
            handle.stop();
        }
        Err(e) => {
            warn!(error = %e, "Could not listen for Ctrl-C, running until killed");
            let _handle = handle;
            std::future::pending::<()>().await;
        }
    }
}
