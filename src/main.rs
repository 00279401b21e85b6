use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cablemodem_lib::{CableModemStatus, RetrieverConfig, Scheme, StatusRetriever};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Protocol {
    Http,
    Https,
}

impl From<Protocol> for Scheme {
    fn from(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Http => Scheme::Http,
            Protocol::Https => Scheme::Https,
        }
    }
}

/// Query the status pages of a cable modem over HNAP.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Host name or IP address of the cable modem.
    #[arg(long, default_value = "192.168.100.1")]
    host: String,
    /// Protocol used to reach the device.
    #[arg(long, value_enum, default_value_t = Protocol::Https)]
    protocol: Protocol,
    /// Accept the device's self-signed certificate.
    #[arg(long)]
    skip_verify: bool,
    #[arg(short, long, default_value = "admin")]
    username: String,
    #[arg(short, long, env = "CABLEMODEM_PASSWORD", hide_env_values = true)]
    password: String,
    /// Per-call network timeout in seconds.
    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,
    /// Print the undecoded sub-responses instead of the decoded status.
    #[arg(long)]
    raw: bool,
    /// Print JSON instead of a text summary.
    #[arg(long)]
    json: bool,
    /// Keep polling at this interval until Ctrl+C is pressed.
    #[arg(short, long)]
    interval_secs: Option<u64>,
    /// Directory for a daily-rolling log file, in addition to the console.
    #[arg(long)]
    log_dir: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

fn setup_logging(log_dir: Option<&PathBuf>, verbosity: &Verbosity<InfoLevel>) -> Option<WorkerGuard> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "cablemodem.log");
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // RUST_LOG overrides -v/-q, e.g. RUST_LOG=cablemodem_lib::transport=trace
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let Some(dir) = log_dir {
        info!("Logging to directory: {:?}", dir);
    }
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_dir.as_ref(), &cli.verbose);

    tokio::select! {
        res = run(&cli) => {
            if let Err(e) = res {
                error!("Status retrieval failed: {:?}", e);
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Ctrl+C received, shutting down.");
        }
    }
    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    let config = RetrieverConfig::new(cli.host.as_str(), cli.username.as_str(), cli.password.as_str())
        .with_scheme(cli.protocol.into())
        .with_skip_verify_cert(cli.skip_verify)
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    info!(url = %config.url(), "Connecting to cable modem");
    let retriever = StatusRetriever::new(config).context("Failed to set up the HTTP client")?;

    let Some(interval_secs) = cli.interval_secs else {
        return report(&retriever, cli).await;
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        ticker.tick().await;
        // A failed poll is logged and the next one tries again
        if let Err(e) = report(&retriever, cli).await {
            error!("Poll failed: {:?}", e);
        }
    }
}

async fn report(retriever: &StatusRetriever, cli: &Cli) -> Result<()> {
    if cli.raw {
        let raw = retriever
            .retrieve_raw_status()
            .await
            .context("Failed to retrieve the raw status")?;
        println!("{}", serde_json::to_string_pretty(&raw)?);
        return Ok(());
    }

    let status = retriever
        .retrieve_status()
        .await
        .context("Failed to retrieve the status")?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(&status);
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn print_status(status: &CableModemStatus) {
    let conn = &status.connection;
    println!("Model:            {}", status.info.model);
    println!("Serial number:    {}", status.info.serial_number);
    println!("MAC address:      {}", status.info.mac_address);
    println!(
        "Firmware:         {} ({})",
        status.software.firmware_version, status.software.docsis_spec_version
    );
    println!("System time:      {}", conn.system_time.format("%Y-%m-%d %H:%M:%S"));
    println!("Up time:          {:?}", conn.up_time);
    println!("Connected since:  {}", conn.established_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Internet:         {}", yes_no(conn.internet_connected));
    println!("Network access:   {}", yes_no(conn.docsis_network_access_allowed));
    println!(
        "Boot:             {} / config file {} ({})",
        yes_no(status.startup.boot.operational),
        yes_no(status.startup.config_file.status),
        status.startup.config_file.comment
    );
    println!(
        "Security:         {} ({})",
        yes_no(status.startup.security.enabled),
        status.startup.security.comment
    );

    println!();
    println!(
        "Downstream: plan {}, primary {} Hz, {} dBmV, SNR {} dB",
        conn.downstream.plan,
        conn.downstream.frequency_hz,
        conn.downstream.signal_power_dbmv,
        conn.downstream.signal_snr_db
    );
    println!(
        "  {:>3} {:<11} {:<10} {:>12} {:>6} {:>6} {:>12} {:>12}",
        "ID", "Lock", "Modulation", "Freq (Hz)", "dBmV", "dB", "Corrected", "Uncorrected"
    );
    for ch in &conn.downstream.channels {
        println!(
            "  {:>3} {:<11} {:<10} {:>12} {:>6} {:>6} {:>12} {:>12}",
            ch.channel_id,
            ch.lock_status,
            ch.modulation,
            ch.frequency_hz,
            ch.signal_power_dbmv,
            ch.signal_snr_mer_db,
            ch.corrected_errors,
            ch.uncorrected_errors
        );
    }

    println!();
    println!("Upstream: primary channel {}", conn.upstream.channel_id);
    println!(
        "  {:>3} {:<11} {:<10} {:>10} {:>12} {:>6}",
        "ID", "Lock", "Modulation", "Width (Hz)", "Freq (Hz)", "dBmV"
    );
    for ch in &conn.upstream.channels {
        println!(
            "  {:>3} {:<11} {:<10} {:>10} {:>12} {:>6.1}",
            ch.channel_id, ch.lock_status, ch.modulation, ch.width_hz, ch.frequency_hz, ch.signal_power_dbmv
        );
    }

    if !status.logs.is_empty() {
        println!();
        println!("Event log:");
        for entry in &status.logs {
            println!("  {}  {}", entry.timestamp.format("%Y-%m-%d %H:%M:%S"), entry.message);
        }
    }
}
