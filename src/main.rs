//! procwarden - process monitor and controller CLI.
//!
//! Thin presentation layer over the engine: argument parsing, logging
//! setup, config resolution, and subcommand dispatch. All process logic
//! lives in the library.

mod cli;
mod config;

use std::cmp::Ordering;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn, Level};

use cli::{Args, Commands, LogLevel};
use config::{resolve_config, validate_effective_config, Config};
use procwarden::{EngineEvent, ProcessEngine, ProcessSnapshot, TerminationMethod};

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(args: &Args) {
    let log_level = match args.log_level {
        LogLevel::Off => Level::ERROR,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logging(&args);

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = resolve_config(&args)?;
    validate_effective_config(&config)?;

    if args.show_config {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }
    if args.check_config {
        println!("Configuration OK");
        return Ok(());
    }

    let engine = ProcessEngine::new(config.proc_root());

    match args.command.unwrap_or(Commands::Watch) {
        Commands::List { json } => run_list(&engine, json),
        Commands::Show { pid, json } => run_show(&engine, pid, json),
        Commands::Watch => run_watch(&engine, &config).await,
        Commands::Kill { pid, force } => {
            let method = if force {
                TerminationMethod::Force
            } else {
                TerminationMethod::Graceful
            };
            if !engine.terminate(pid, method) {
                bail!("Failed to terminate process {}", pid);
            }
            println!("Sent termination signal to process {}", pid);
            Ok(())
        }
        Commands::Suspend { pid } => {
            if !engine.suspend(pid) {
                bail!("Failed to suspend process {}", pid);
            }
            println!("Suspended process {}", pid);
            Ok(())
        }
        Commands::Resume { pid } => {
            if !engine.resume(pid) {
                bail!("Failed to resume process {}", pid);
            }
            println!("Resumed process {}", pid);
            Ok(())
        }
        Commands::Renice { pid, nice } => {
            if !engine.set_priority(pid, nice) {
                bail!("Failed to change priority of process {}", pid);
            }
            println!("Changed priority of process {}", pid);
            Ok(())
        }
    }
}

fn by_cpu_descending(a: &ProcessSnapshot, b: &ProcessSnapshot) -> Ordering {
    b.cpu_percent
        .partial_cmp(&a.cpu_percent)
        .unwrap_or(Ordering::Equal)
}

fn run_list(engine: &ProcessEngine, json: bool) -> Result<()> {
    let snapshots = engine.scan();
    let mut rows: Vec<&ProcessSnapshot> = snapshots.iter().collect();
    rows.sort_by(|a, b| by_cpu_descending(a, b));

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:>6} {:<24} {:>10} {:>7} {:>5} {:>10} {}",
        "PID", "NAME", "MEM(MB)", "CPU%", "NICE", "STATE", "LEAK"
    );
    for snap in rows {
        println!(
            "{:>6} {:<24} {:>10.1} {:>7.2} {:>5} {:>10} {}",
            snap.pid,
            snap.name,
            snap.memory_mb,
            snap.cpu_percent,
            snap.nice,
            snap.state,
            if snap.leak_suspected { "!" } else { "" }
        );
    }
    Ok(())
}

fn run_show(engine: &ProcessEngine, pid: i32, json: bool) -> Result<()> {
    let snap = match engine.get_process(pid) {
        Some(snap) => snap,
        None => bail!("Process {} not found", pid),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snap)?);
        return Ok(());
    }

    println!("pid:      {}", snap.pid);
    println!("name:     {}", snap.name);
    println!("memory:   {:.1} MB", snap.memory_mb);
    println!("cpu:      {:.2} %", snap.cpu_percent);
    println!("state:    {}", snap.state);
    println!("nice:     {}", snap.nice);
    println!("leak:     {}", if snap.leak_suspected { "suspected" } else { "no" });
    println!("history:  {} samples", snap.memory_history.len());
    for sample in &snap.memory_history {
        println!("  {} ms  {:.1} MB", sample.timestamp_ms, sample.memory_mb);
    }
    Ok(())
}

async fn run_watch(engine: &ProcessEngine, config: &Config) -> Result<()> {
    let mut events = engine.subscribe();

    if config.focus_mode() {
        engine.set_focus_mode(true);
    }
    engine.start(Duration::from_millis(config.refresh_interval_ms()));
    info!("Watching processes; press Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(EngineEvent::ProcessesUpdated(snapshots)) => {
                    match snapshots.iter().min_by(|a, b| by_cpu_descending(a, b)) {
                        Some(top) => info!(
                            "{} processes; top consumer {} (pid {}, {:.1}% cpu, {:.1} MB)",
                            snapshots.len(),
                            top.name,
                            top.pid,
                            top.cpu_percent,
                            top.memory_mb
                        ),
                        None => info!("No processes visible"),
                    }
                }
                Ok(EngineEvent::MemoryLeakDetected { pid, name, growth_mb }) => {
                    warn!(
                        "Possible memory leak: {} (pid {}) grew {:.1} MB inside the window",
                        name, pid, growth_mb
                    );
                }
                Ok(EngineEvent::ProcessTerminated { pid, success }) => {
                    info!("Termination of process {}: {}", pid, if success { "delivered" } else { "failed" });
                }
                Ok(EngineEvent::FocusModeChanged { enabled }) => {
                    info!("Focus mode {}", if enabled { "enabled" } else { "disabled" });
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Subscriber lagged, dropped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    engine.stop();
    if engine.focus_mode() {
        engine.set_focus_mode(false);
    }
    info!("Shutting down");
    Ok(())
}
