// tests/watch_reload.rs

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rulewatch::engine::{CoreCommand, EngineEvent, Runtime};
use rulewatch::exec::builtin;
use rulewatch::fs::mock::MockFileSystem;
use rulewatch::fs::{FileSystem, RealFileSystem};
use rulewatch::rules::{Pattern, RuleTable};
use rulewatch::tasks::{HandlerRegistry, TaskArg, TaskContext};
use rulewatch::watch::{NotifyWatchBackend, WatchRegistry};

use crate::common::recording::RecordingWatchBackend;
use crate::common::{builtin_handlers, canonical, engine_at, init_tracing, with_timeout};

/// `src/<name>.css` compiles to `build/<name>.css`; anything changing under
/// `build/` is announced to live reload clients.
fn stylesheet_rules() -> RuleTable {
    RuleTable::new()
        .rule(Pattern::regex(r"src/(.*)\.css").unwrap(), |ctx, _abs, capture| {
            ctx.enqueue("compile", vec![TaskArg::from(capture.unwrap_or_default())]);
            Ok(())
        })
        .rule(Pattern::prefix("build/"), |ctx, _abs, capture| {
            ctx.enqueue(builtin::RELOAD, vec![TaskArg::from(capture.unwrap_or_default())]);
            Ok(())
        })
}

fn stylesheet_handlers() -> HandlerRegistry {
    let mut handlers = builtin_handlers();
    handlers.register_fn("compile", |ctx: &mut TaskContext<'_>, args: &[TaskArg]| {
        let name = args[0].as_str().unwrap_or_default();
        let out = ctx.settings.output_dir.join(format!("{name}.css"));
        ctx.fs.write(&out, b"/* compiled */")?;
        Ok(())
    });
    handlers
}

#[test]
fn change_compiles_then_notifies_exactly_once() {
    let fs = Arc::new(MockFileSystem::new());
    fs.add_file("/p/src/app.css", "body{}");
    fs.add_dir("/p/build");

    let backend = RecordingWatchBackend::new();
    let (engine, _tx, _rx) = engine_at(
        Path::new("/p"),
        stylesheet_rules(),
        stylesheet_handlers(),
        fs.clone(),
    );
    let mut engine = engine.with_watches(WatchRegistry::new(Some(Box::new(backend.clone()))));

    let src = engine.watch_dir(Path::new("/p/src"), None).unwrap().unwrap();
    let out = engine.watch_dir(Path::new("/p/build"), None).unwrap().unwrap();
    assert_eq!(backend.watched().len(), 2);
    let (_client, mut rx) = engine.reload_hub().subscribe();

    let step = engine
        .step(EngineEvent::PathChanged {
            watch: src,
            path: PathBuf::from("/p/src/app.css"),
        })
        .unwrap();
    assert_eq!(step.commands, vec![CoreCommand::ScheduleFlush]);
    engine.step(EngineEvent::Flush).unwrap();
    assert!(fs.is_file(Path::new("/p/build/app.css")));

    // Watchers usually report a write as several events.
    for _ in 0..3 {
        engine
            .step(EngineEvent::PathChanged {
                watch: out,
                path: PathBuf::from("/p/build/app.css"),
            })
            .unwrap();
    }
    engine.step(EngineEvent::Flush).unwrap();

    assert_eq!(rx.try_recv().unwrap(), "app.css");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn real_watch_recompiles_and_reloads() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let root = canonical(&tmp);
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::create_dir_all(root.join("build")).unwrap();
    std::fs::write(root.join("src/app.css"), "body{}").unwrap();

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let (engine, tx, rx) = engine_at(&root, stylesheet_rules(), stylesheet_handlers(), fs);
    let mut engine =
        engine.with_watches(WatchRegistry::new(Some(Box::new(NotifyWatchBackend::new(tx.clone())))));
    engine.watch_dir(&root.join("src"), None).unwrap();
    engine.watch_dir(&root.join("build"), None).unwrap();
    let (_client, mut reload_rx) = engine.reload_hub().subscribe();

    let runtime = tokio::spawn(Runtime::new(engine, tx.clone(), rx).run());

    // Give the OS watcher a moment before editing.
    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(root.join("src/app.css"), "body{color:red}").unwrap();

    let first = with_timeout(reload_rx.recv()).await;
    assert_eq!(first.as_deref(), Some("app.css"));
    assert!(root.join("build/app.css").is_file());

    tx.send(EngineEvent::ShutdownRequested).unwrap();
    with_timeout(runtime).await.unwrap().unwrap();

    // The OS may report the write more than once, so the count is not pinned
    // here; exactly-once per flush is checked by
    // `change_compiles_then_notifies_exactly_once`. Anything else that
    // arrived names the same file.
    while let Ok(extra) = reload_rx.try_recv() {
        assert_eq!(extra, "app.css");
    }
}

#[tokio::test]
async fn deleted_file_events_are_ignored() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let root = canonical(&tmp);
    std::fs::create_dir_all(root.join("src")).unwrap();

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let (engine, _tx, _rx) = engine_at(&root, stylesheet_rules(), stylesheet_handlers(), fs);
    let mut engine =
        engine.with_watches(WatchRegistry::new(Some(Box::new(RecordingWatchBackend::new()))));
    let src = engine.watch_dir(&root.join("src"), None).unwrap().unwrap();

    let step = engine
        .step(EngineEvent::PathChanged {
            watch: src,
            path: root.join("src/ghost.css"),
        })
        .unwrap();
    assert!(step.commands.is_empty());
    assert_eq!(engine.stats().enqueued, 0);
}
