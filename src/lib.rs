// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod output;
pub mod reload;
pub mod rules;
pub mod tasks;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::cli::CliArgs;
use crate::config::{project_root, BuildSettings, ConfigFile};
use crate::engine::{Engine, EngineEvent, Runtime, RuntimeOptions};
use crate::exec::register_builtins;
use crate::fs::{FileSystem, RealFileSystem};
use crate::output::{is_complete, wait_for_completion};
use crate::reload::spawn_reload_server;
use crate::rules::{build_rule_table, Pattern};
use crate::tasks::HandlerRegistry;
use crate::watch::{NotifyWatchBackend, WatchRegistry};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - rule table and built-in task handlers
/// - the engine and its runtime loop
/// - initial scans and (in watch mode) directory watches
/// - the live reload server, started once the completion gate opens
/// - Ctrl-C handling
pub async fn run(args: CliArgs, cfg: ConfigFile) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let root = project_root(&config_path);
    let root = root
        .canonicalize()
        .with_context(|| format!("resolving project root {:?}", root))?;

    if args.dry_run {
        print_dry_run(&cfg, &root);
        return Ok(());
    }

    let settings = Arc::new(BuildSettings::from_config(&cfg, &root, !args.once, args.verbose));
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    std::fs::create_dir_all(&settings.output_dir)
        .with_context(|| format!("creating output dir {:?}", settings.output_dir))?;

    let rules = build_rule_table(&cfg)?;
    let mut handlers = HandlerRegistry::new();
    register_builtins(&mut handlers);
    info!(rules = rules.len(), watch = settings.watch, "rule table ready");

    let (event_tx, event_rx) = mpsc::unbounded_channel::<EngineEvent>();

    let watches = if settings.watch {
        WatchRegistry::new(Some(Box::new(NotifyWatchBackend::new(event_tx.clone()))))
    } else {
        WatchRegistry::disabled()
    };
    let mut engine = Engine::new(
        Arc::clone(&settings),
        rules,
        handlers,
        Arc::clone(&fs),
        event_tx.clone(),
    )
    .with_watches(watches)
    .with_options(RuntimeOptions {
        exit_when_idle: !settings.watch,
    });

    for scan in cfg.scans() {
        let dir = root.join(&scan.dir);
        let filter = scan.filter.as_ref().map(Pattern::compile).transpose()?;
        if scan.watch_only {
            engine.watch_dir(&dir, filter)?;
        } else {
            engine.scan(&dir, filter)?;
        }
    }

    // Ctrl-C → graceful shutdown.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(EngineEvent::ShutdownRequested);
        });
    }

    if settings.watch && cfg.reload.enabled {
        let fs = Arc::clone(&fs);
        let out_dir = settings.output_dir.clone();
        let gate = cfg.gate.clone();
        let reload = cfg.reload.clone();
        let tx = event_tx.clone();
        tokio::spawn(async move {
            let interval = Duration::from_millis(gate.poll_interval_ms);
            if let Err(err) = wait_for_completion(fs, &out_dir, &gate.required, interval).await {
                error!(error = %err, "completion gate failed; live reload disabled");
                return;
            }
            if let Err(err) = spawn_reload_server(&reload.addr, reload.path.clone(), tx).await {
                error!(error = %err, "live reload server failed to start");
            }
        });
    }

    Runtime::new(engine, event_tx, event_rx).run().await?;

    if !settings.watch && !cfg.gate.required.is_empty() {
        if is_complete(fs.as_ref(), &settings.output_dir, &cfg.gate.required)? {
            info!("all required artifacts present");
        } else {
            warn!(required = ?cfg.gate.required, "build finished without every required artifact");
        }
    }
    Ok(())
}

/// Print scans and rules without running anything.
fn print_dry_run(cfg: &ConfigFile, root: &Path) {
    println!("rulewatch dry-run");
    println!("  root = {}", root.display());
    println!("  output_dir = {}", cfg.build.output_dir);
    if !cfg.build.features.is_empty() {
        println!("  features = {:?}", cfg.build.features);
    }
    if !cfg.gate.required.is_empty() {
        println!("  gate.required = {:?}", cfg.gate.required);
    }
    println!();

    println!("scans ({}):", cfg.scans().len());
    for scan in cfg.scans() {
        println!("  - {}", scan.dir);
        if let Some(ref filter) = scan.filter {
            println!("      filter: {:?}", filter);
        }
        if scan.watch_only {
            println!("      watch_only: true");
        }
    }
    println!();

    let active: Vec<_> = cfg.active_rules().collect();
    println!("rules ({} active of {}):", active.len(), cfg.rules().len());
    for rule in active {
        println!("  - {:?} -> {:?}", rule.pattern, rule.action);
        if let Some(ref dest) = rule.dest {
            println!("      dest: {dest}");
        }
        if let Some(ref cmd) = rule.cmd {
            println!("      cmd: {:?}", cmd);
        }
        if let Some(ref feature) = rule.feature {
            println!("      feature: {feature}");
        }
    }

    debug!("dry-run complete (no execution)");
}
