// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod mapper;
pub mod reload;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{
    BuildScheduler, IgnoreList, PendingChanges, Runtime, RuntimeEvent, RuntimeOptions,
};
use crate::mapper::CommandMapper;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - mapper / coalescer / scheduler
/// - executor
/// - file watcher (disabled in --once mode)
/// - reload notifier
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config from {config_path:?}"))?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let mapper = CommandMapper::from_config(&cfg.build);

    // --once: one unscoped build, exit with its status. No watching, no
    // reload notification.
    if args.once {
        let outcome = exec::execute(&mapper.full_build()).await;
        if !outcome.success() {
            error!("build output:\n{}", outcome.output);
            return Err(anyhow!("build failed with exit code {}", outcome.exit_code));
        }
        return Ok(());
    }

    let ignore = IgnoreList::from_suffixes(&cfg.ignore)?;
    let scheduler = BuildScheduler::new(mapper, PendingChanges::new(ignore));

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    // Build executor.
    let exec_tx = exec::spawn_executor(rt_tx.clone());

    // File watcher over the configured roots.
    let root_dir = config_root_dir(&config_path);
    if let Some(output_root) = &cfg.build.output_root {
        info!(output_root = %output_root, "build tool output directory");
    }
    let _watcher_handle = watch::spawn_watcher(root_dir, &cfg.watch, rt_tx.clone())?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let notifier = reload::from_config(&cfg.reload);

    let runtime = Runtime::new(
        scheduler,
        RuntimeOptions::default(),
        rt_rx,
        exec_tx,
        notifier,
    );
    runtime.run().await
}

/// Figure out a sensible project root for watching.
/// Currently: directory containing the config file, or `.`.
fn config_root_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(cfg: &ConfigFile) {
    println!("sitewatch dry-run");
    println!("  build.command = {}", cfg.build.command);
    if let Some(scoped) = &cfg.build.scoped_command {
        println!("  build.scoped_command = {scoped}");
    }
    println!("  build.source_root = {}", cfg.build.source_root);
    if let Some(output_root) = &cfg.build.output_root {
        println!("  build.output_root = {output_root}");
    }
    println!();

    println!("rewrite rules ({}):", cfg.build.rewrite.len());
    for rule in &cfg.build.rewrite {
        println!("  {} -> {}", rule.from, rule.to);
    }
    println!();

    println!("ignore suffixes: {:?}", cfg.ignore);
    println!();

    println!("watch entries ({}):", cfg.watch.len());
    for entry in &cfg.watch {
        println!("  - {} (recursive: {})", entry.path, entry.recursive);
    }

    if let Some(command) = &cfg.reload.command {
        println!();
        println!("reload.command = {command}");
    }
}
