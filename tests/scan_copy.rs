// tests/scan_copy.rs

mod common;

use std::path::Path;
use std::sync::Arc;

use rulewatch::cli::CliArgs;
use rulewatch::fs::mock::MockFileSystem;
use rulewatch::fs::FileSystem;
use rulewatch::rules::{build_rule_table, Pattern};

use crate::common::builders::{regex, suffix, ConfigFileBuilder, RuleSpecBuilder};
use crate::common::{builtin_handlers, canonical, engine_at, init_tracing, with_timeout};

fn once_args(config: &Path) -> CliArgs {
    CliArgs {
        config: config.to_string_lossy().into_owned(),
        once: true,
        log_level: None,
        verbose: false,
        dry_run: false,
    }
}

#[test]
fn scanning_assets_enqueues_one_copy_and_flush_writes_it() {
    let cfg = ConfigFileBuilder::new()
        .with_scan("assets")
        .with_rule(RuleSpecBuilder::copy(regex(r"assets/(.*\.png)"), "{capture}").build())
        .build();
    let fs = Arc::new(MockFileSystem::new());
    fs.add_file("/p/assets/logo.png", "PNG");
    fs.add_file("/p/assets/notes.txt", "skip me");

    let (mut engine, _tx, _rx) = engine_at(
        Path::new("/p"),
        build_rule_table(&cfg).unwrap(),
        builtin_handlers(),
        fs.clone(),
    );

    assert_eq!(engine.scan(Path::new("/p/assets"), None).unwrap(), 2);
    assert_eq!(engine.stats().enqueued, 1);

    assert_eq!(engine.flush().unwrap(), 1);
    assert_eq!(fs.read_bytes(Path::new("/p/build/logo.png")).unwrap(), b"PNG");
}

#[test]
fn rescanning_the_same_dir_does_not_duplicate_pending_work() {
    let cfg = ConfigFileBuilder::new()
        .with_scan("assets")
        .with_rule(RuleSpecBuilder::copy(suffix(".png"), "img/{capture}.png").build())
        .build();
    let fs = Arc::new(MockFileSystem::new());
    fs.add_file("/p/assets/a.png", "a");
    fs.add_file("/p/assets/b.png", "b");

    let (mut engine, _tx, _rx) = engine_at(
        Path::new("/p"),
        build_rule_table(&cfg).unwrap(),
        builtin_handlers(),
        fs.clone(),
    );
    engine.scan(Path::new("/p/assets"), None).unwrap();
    engine.scan(Path::new("/p/assets"), None).unwrap();
    assert_eq!(engine.stats().enqueued, 2);

    engine.flush().unwrap();
    assert!(fs.is_file(Path::new("/p/build/img/assets/a.png")));
    assert!(fs.is_file(Path::new("/p/build/img/assets/b.png")));
}

#[test]
fn scan_filter_limits_submitted_files() {
    let cfg = ConfigFileBuilder::new()
        .with_scan("assets")
        .with_rule(RuleSpecBuilder::copy(regex(r"assets/(.*)"), "{capture}").build())
        .build();
    let fs = Arc::new(MockFileSystem::new());
    fs.add_file("/p/assets/logo.png", "PNG");
    fs.add_file("/p/assets/raw/logo.psd", "PSD");

    let (mut engine, _tx, _rx) = engine_at(
        Path::new("/p"),
        build_rule_table(&cfg).unwrap(),
        builtin_handlers(),
        fs.clone(),
    );
    let submitted = engine
        .scan(Path::new("/p/assets"), Some(Pattern::suffix(".png")))
        .unwrap();
    assert_eq!(submitted, 1);
}

#[tokio::test]
async fn once_mode_builds_the_tree_and_exits() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let root = canonical(&tmp);
    std::fs::create_dir_all(root.join("assets/icons")).unwrap();
    std::fs::write(root.join("assets/logo.png"), "PNG").unwrap();
    std::fs::write(root.join("assets/icons/x.png"), "X").unwrap();
    std::fs::write(root.join("assets/readme.md"), "docs").unwrap();

    let cfg = ConfigFileBuilder::new()
        .output_dir("dist")
        .with_scan("assets")
        .with_rule(RuleSpecBuilder::copy(regex(r"assets/(.*\.png)"), "{capture}").build())
        .with_rule(RuleSpecBuilder::manifest(suffix(".png")).build())
        .require("logo.png")
        .require("icons/x.png")
        .build();

    with_timeout(rulewatch::run(once_args(&root.join("Rulewatch.toml")), cfg))
        .await
        .unwrap();

    assert_eq!(std::fs::read(root.join("dist/logo.png")).unwrap(), b"PNG");
    assert_eq!(std::fs::read(root.join("dist/icons/x.png")).unwrap(), b"X");
    assert!(!root.join("dist/readme.md").exists());
    assert!(root.join("dist/manifest.json").is_file());
}

#[cfg(unix)]
#[tokio::test]
async fn once_mode_waits_for_external_tools() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let root = canonical(&tmp);
    std::fs::create_dir_all(root.join("styles")).unwrap();
    std::fs::write(root.join("styles/site.scss"), "body{}").unwrap();

    let cfg = ConfigFileBuilder::new()
        .with_scan("styles")
        .with_rule(
            RuleSpecBuilder::command(
                regex(r"styles/(.*)\.scss"),
                &["sh", "-c", "sleep 0.1 && cp {path} {out}/{capture}.css"],
            )
            .description("compile {rel}")
            .build(),
        )
        .build();

    with_timeout(rulewatch::run(once_args(&root.join("Rulewatch.toml")), cfg))
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(root.join("build/site.css")).unwrap(), "body{}");
}

#[cfg(unix)]
#[tokio::test]
async fn failing_tool_fails_the_run() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let root = canonical(&tmp);
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::write(root.join("src/app.ts"), "let x = 1").unwrap();

    let cfg = ConfigFileBuilder::new()
        .with_scan("src")
        .with_rule(
            RuleSpecBuilder::command(suffix(".ts"), &["sh", "-c", "exit 4"])
                .description("tsc {rel}")
                .build(),
        )
        .build();

    let err = with_timeout(rulewatch::run(once_args(&root.join("Rulewatch.toml")), cfg))
        .await
        .unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("tsc src/app.ts"), "unexpected error: {msg}");
    assert!(msg.contains('4'), "unexpected error: {msg}");
}

#[tokio::test]
async fn absent_scan_dir_does_not_stop_the_build() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let root = canonical(&tmp);
    std::fs::create_dir_all(root.join("assets")).unwrap();
    std::fs::write(root.join("assets/logo.png"), "PNG").unwrap();

    let cfg = ConfigFileBuilder::new()
        .with_scan("protos")
        .with_scan("assets")
        .with_rule(RuleSpecBuilder::copy(regex(r"assets/(.*\.png)"), "{capture}").build())
        .build();

    with_timeout(rulewatch::run(once_args(&root.join("Rulewatch.toml")), cfg))
        .await
        .unwrap();

    assert_eq!(std::fs::read(root.join("build/logo.png")).unwrap(), b"PNG");
}
