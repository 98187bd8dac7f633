use anyhow::Result;
use clap::Parser;
use docker_profiler::*;
use std::path::Path;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[derive(Parser)]
#[command(name = "docker-profiler", version = version::VERSION)]
#[command(about = "Profiles running Docker containers - streams live stats into per-target metric series", long_about = None)]
struct Cli {
    /// Container name to profile
    #[arg(short, long)]
    container: String,

    /// Collect live stats from matching containers until their streams end or Ctrl-C
    #[arg(long)]
    profile: bool,

    /// Print the collected datapoints for the target
    #[arg(long)]
    report: bool,

    /// Render the report as one JSON object per line
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();
    let config = config::ProfilerConfig::load()?;

    if cli.profile {
        let docker = docker_repo::DockerRepo::connect()?;
        let collector = collector::Collector::new(
            docker,
            config.storage.data_dir.as_str(),
            config.collector.cancel_on_first_error,
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let signal_handle = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received shutdown signal");
                let _ = shutdown_tx.send(true);
            }
        });

        let summary = collector.collect(&cli.container, shutdown_rx).await?;
        signal_handle.abort();
        for fault in &summary.faults {
            tracing::warn!(error = %fault, "stream fault");
        }
    }

    if cli.report {
        let target = collector::normalize_name(&cli.container);
        let datapoints =
            metrics_repo::list_target(Path::new(&config.storage.data_dir), target).await?;

        for (id, d) in datapoints.iter().enumerate() {
            if cli.json {
                println!("{}", serde_json::to_string(d)?);
                continue;
            }
            let timestamp = chrono::DateTime::from_timestamp_millis(d.timestamp_ms)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| d.timestamp_ms.to_string());
            println!("---");
            println!("id:           {id:06}");
            println!("timestamp:    {timestamp}");
            println!("memory usage: {}", d.memory_usage_str());
            println!("memory limit: {}", d.memory_limit_str());
            println!("cpu percent:  {:.2}", d.cpu_percentage);
            println!("cpu online:   {}", d.cpu_online_count);
            println!("cpu usage:    {}", d.cpu_usage_ns);
            println!();
        }
    }

    Ok(())
}
