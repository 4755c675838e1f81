//! l2switchd entry point.
//!
//! Loads `<config-dir>/switch<ID>.cfg`, opens the UDP-backed ports given on
//! the command line and runs the switch until Ctrl-C.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use l2switch_types::MacAddress;
use l2switchd::{
    daemon, LinkLayer, PortSpec, Switch, SwitchConfig, UdpLink, VlanTable, DEFAULT_CONFIG_DIR,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Compact,
    Json,
}

/// Software Ethernet switch with VLANs and spanning tree
#[derive(Parser, Debug)]
#[command(name = "l2switchd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Switch id; selects switch<ID>.cfg in the config directory
    switch_id: u32,

    /// Directory holding the per-switch configuration files
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_DIR)]
    config_dir: PathBuf,

    /// Port as <name>=<local-addr>,<peer-addr> (repeatable)
    #[arg(short = 'p', long = "port", required = true)]
    ports: Vec<PortSpec>,

    /// Source address for BPDUs (default 02:00:<switch id>)
    #[arg(short = 'm', long)]
    mac: Option<MacAddress>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level, args.log_format);

    match run(args).await {
        Ok(()) => {
            info!("l2switchd: exiting normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("l2switchd: exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(log_level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let layer = fmt::layer().with_target(true).with_thread_ids(false);

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact())
            .init(),
    }
}

/// Locally administered address derived from the switch id.
fn default_mac(switch_id: u32) -> MacAddress {
    let id = switch_id.to_be_bytes();
    MacAddress::new([0x02, 0x00, id[0], id[1], id[2], id[3]])
}

async fn run(args: Args) -> anyhow::Result<()> {
    let path = SwitchConfig::path_for(&args.config_dir, args.switch_id);
    let config = SwitchConfig::load(&path)
        .with_context(|| format!("failed to load configuration {}", path.display()))?;

    let mac = args.mac.unwrap_or_else(|| default_mac(args.switch_id));
    let link = UdpLink::bind(&args.ports, mac)
        .await
        .context("failed to open ports")?;

    let vlans = VlanTable::bind(&config, link.port_names())
        .with_context(|| format!("{} does not match the ports given", path.display()))?;
    info!(
        switch = args.switch_id,
        bridge = %config.priority,
        mac = %link.hardware_address(),
        "l2switchd: configuration loaded"
    );

    let switch = Switch::new(config.priority, link.hardware_address(), Arc::new(vlans));
    daemon::run(Arc::new(link), switch, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
}
