//! statcast - live host telemetry over Server-Sent Events.
//!
//! A standalone binary that samples host metrics and streams them to browsers.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use statcast::{
    start_web_server, MetricsProvider, StatusSampler, SystemCollector, WebConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "statcast")]
#[command(about = "Live host telemetry over Server-Sent Events")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Samples CPU, temperature, memory, disk and frequency on a fixed interval and streams every sample to all connected subscribers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: config.json next to the executable)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Web server bind address (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Web server port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Broadcast interval in milliseconds (overrides the config file)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server (default)
    Serve,

    /// Take a single status sample and exit
    Snapshot(SnapshotArgs),

    /// Show host information
    Info,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let config = match WebConfig::load_or_create(&config_path) {
        Ok(config) => apply_overrides(config, &cli),
        Err(e) => {
            error!("Failed to load config: {}", e);
            return Err(e).context("configuration");
        }
    };

    match &cli.command {
        Some(Commands::Serve) | None => serve_command(config, &config_path).await?,
        Some(Commands::Snapshot(args)) => snapshot_command(&config, args).await?,
        Some(Commands::Info) => info_command(&config).await?,
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn default_config_path() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("failed to get executable path")?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join("config.json"))
}

fn apply_overrides(mut config: WebConfig, cli: &Cli) -> WebConfig {
    if let Some(host) = &cli.host {
        config = config.with_host(host.clone());
    }
    if let Some(port) = cli.port {
        config = config.with_port(port);
    }
    if let Some(interval) = cli.interval {
        config = config.with_interval_ms(interval);
    }
    config
}

async fn serve_command(config: WebConfig, config_path: &Path) -> anyhow::Result<()> {
    info!("Starting statcast...");
    info!("  - Bind address: {}", config.bind_address());
    info!("  - Broadcast interval: {}ms", config.interval_ms);
    info!("  - CPU sample window: {}ms", config.cpu_sample_ms);
    info!("  - CORS on /info: {}", config.enable_cors);

    let provider = Arc::new(SystemCollector::new(config.cpu_window()));
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    start_web_server(config, provider, base_dir).await?;
    Ok(())
}

async fn snapshot_command(config: &WebConfig, args: &SnapshotArgs) -> anyhow::Result<()> {
    let sampler = StatusSampler::new(Arc::new(SystemCollector::new(config.cpu_window())));
    let snapshot = sampler.sample().await;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        "pretty" => print_pretty_snapshot(&snapshot),
        other => anyhow::bail!("Unsupported format: {}. Use 'json' or 'pretty'", other),
    }

    Ok(())
}

async fn info_command(config: &WebConfig) -> anyhow::Result<()> {
    let collector = SystemCollector::new(config.cpu_window());
    let info = tokio::task::spawn_blocking(move || collector.host_info()).await??;

    println!("Host Information");
    println!("================");
    println!("  OS: {} {}", info.os, info.platform);
    println!("  Kernel: {}", info.kernel);
    println!("  Uptime: {} seconds", info.uptime_seconds);
    println!("  CPU: {} ({})", info.cpu_model, info.cpu_specs);
    println!("  Memory: {:.1} GB total", info.mem_total_gb);
    println!("  Disk: {:.1} GB total", info.disk_total_gb);

    Ok(())
}

fn print_pretty_snapshot(snapshot: &statcast::StatusSnapshot) {
    println!(
        "Status Snapshot ({})",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("==========================================");
    println!("  CPU: {}% @ {} MHz", snapshot.cpu_usage, snapshot.cpu_frequency);
    println!("  Temperature: {}°C", snapshot.temperature);
    println!(
        "  Memory: {}% ({} / {} MB)",
        snapshot.memory_usage, snapshot.memory_used, snapshot.memory_total
    );
    println!(
        "  Storage: {}% ({:.1} / {:.1} GB)",
        snapshot.storage_usage, snapshot.storage_used, snapshot.storage_total
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["statcast", "--port", "9090"]).unwrap();
        assert_eq!(cli.port, Some(9090));
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::try_parse_from(["statcast"]).unwrap();
        assert!(cli.port.is_none());
        assert!(cli.interval.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let cli =
            Cli::try_parse_from(["statcast", "--host", "127.0.0.1", "-i", "500", "snapshot"])
                .unwrap();
        let config = apply_overrides(WebConfig::default(), &cli);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.interval_ms, 500);
        assert_eq!(config.port, statcast::DEFAULT_WEB_PORT);
        assert!(matches!(cli.command, Some(Commands::Snapshot(_))));
    }
}
