//! `netfleet` command-line entry point.
//!
//! ```bash
//! netfleet --inventory devices.yml --task configure --report report.txt --jobs 4
//! ```
//!
//! Per-device failures end up in the report; the process only exits
//! non-zero when the inventory cannot be loaded or the report cannot be
//! written.

use std::path::PathBuf;

use clap::Parser;
use log::warn;
use tokio_util::sync::CancellationToken;

use netfleet::fleet::{
    BatchOrchestrator, CommandRenderer, DescriptionRules, DeviceRunner, Inventory, ReportWriter, SshConnector, Task,
};

#[derive(Parser, Debug)]
#[command(name = "netfleet")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch configuration and backup of network devices over SSH", long_about = None)]
struct Args {
    /// Inventory file (YAML)
    #[arg(short, long)]
    inventory: PathBuf,

    /// What to do on every device
    #[arg(short, long, value_enum, default_value_t = Task::Backup)]
    task: Task,

    /// Report destination, replaced on every run
    #[arg(short, long, default_value = "network_backup.txt")]
    report: PathBuf,

    /// Devices in flight at once (overrides the inventory)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Skip `write memory` after configure/describe
    #[arg(long)]
    no_save: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let inventory = Inventory::load(&args.inventory)?;

    let renderer = match &inventory.template_dir {
        Some(dir) => CommandRenderer::from_dir(dir, inventory.defaults.clone())?,
        None => CommandRenderer::new(inventory.defaults.clone()),
    };
    let runner = DeviceRunner::new(
        args.task,
        renderer,
        DescriptionRules::new(inventory.wan_edges.clone()),
    )
    .with_save(!args.no_save);

    let cancel = CancellationToken::new();
    let batch = BatchOrchestrator::new(SshConnector::new(inventory.options.clone()), runner)
        .with_jobs(args.jobs.unwrap_or(inventory.options.jobs))
        .with_cancellation(cancel.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, closing open sessions");
            cancel.cancel();
        }
    });

    let report = batch
        .run(&inventory.devices, &inventory.credentials, &inventory.algorithms)
        .await;

    ReportWriter::new(&args.report).write(&report)?;
    Ok(())
}
