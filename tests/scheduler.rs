// tests/scheduler.rs

mod common;

use std::path::Path;
use std::sync::Arc;

use proptest::prelude::*;

use rulewatch::engine::{CoreCommand, EngineEvent};
use rulewatch::fs::mock::MockFileSystem;
use rulewatch::rules::RuleTable;
use rulewatch::tasks::{HandlerRegistry, TaskArg, TaskContext, TaskQueue};

use crate::common::engine_at;
use crate::common::recording::{call_log, recording_handler, snapshot};

#[test]
fn duplicate_enqueues_run_once() {
    let log = call_log();
    let mut handlers = HandlerRegistry::new();
    handlers.register_fn("compile", recording_handler("compile", log.clone()));
    let (mut engine, _tx, _rx) = engine_at(
        Path::new("/p"),
        RuleTable::new(),
        handlers,
        Arc::new(MockFileSystem::new()),
    );

    assert!(engine.enqueue("compile", vec!["app.css".into()]));
    assert!(!engine.enqueue("compile", vec!["app.css".into()]));
    engine.flush().unwrap();

    assert_eq!(snapshot(&log), vec!["compile(\"app.css\")"]);
    let stats = engine.stats();
    assert_eq!((stats.enqueued, stats.run, stats.pending), (1, 1, 0));
}

#[test]
fn same_task_can_run_again_in_a_later_batch() {
    let log = call_log();
    let mut handlers = HandlerRegistry::new();
    handlers.register_fn("compile", recording_handler("compile", log.clone()));
    let (mut engine, _tx, _rx) = engine_at(
        Path::new("/p"),
        RuleTable::new(),
        handlers,
        Arc::new(MockFileSystem::new()),
    );

    engine.enqueue("compile", vec!["app.css".into()]);
    engine.flush().unwrap();
    assert!(engine.enqueue("compile", vec!["app.css".into()]));
    engine.flush().unwrap();

    assert_eq!(snapshot(&log).len(), 2);
}

#[test]
fn batch_runs_in_enqueue_order() {
    let log = call_log();
    let mut handlers = HandlerRegistry::new();
    for name in ["a", "b", "c"] {
        handlers.register_fn(name, recording_handler(name, log.clone()));
    }
    let (mut engine, _tx, _rx) = engine_at(
        Path::new("/p"),
        RuleTable::new(),
        handlers,
        Arc::new(MockFileSystem::new()),
    );

    engine.enqueue("a", Vec::new());
    engine.enqueue("b", Vec::new());
    engine.enqueue("c", Vec::new());
    engine.flush().unwrap();

    assert_eq!(snapshot(&log), vec!["a()", "b()", "c()"]);
}

#[test]
fn task_enqueued_during_batch_waits_for_the_next_one() {
    let log = call_log();
    let mut handlers = HandlerRegistry::new();
    handlers.register_fn("b", recording_handler("b", log.clone()));
    {
        let log = log.clone();
        handlers.register_fn("a", move |ctx: &mut TaskContext<'_>, _args: &[TaskArg]| {
            log.lock().unwrap().push("a()".to_string());
            ctx.enqueue("b", vec![TaskArg::Num(2)]);
            Ok(())
        });
    }
    let (mut engine, _tx, _rx) = engine_at(
        Path::new("/p"),
        RuleTable::new(),
        handlers,
        Arc::new(MockFileSystem::new()),
    );

    engine.enqueue("a", Vec::new());
    assert_eq!(engine.step(EngineEvent::Flush).unwrap().commands, vec![CoreCommand::ScheduleFlush]);
    assert_eq!(snapshot(&log), vec!["a()"]);

    engine.step(EngineEvent::Flush).unwrap();
    assert_eq!(snapshot(&log), vec!["a()", "b(2)"]);
}

#[tokio::test]
async fn deferred_flush_coalesces_a_burst() {
    use rulewatch::engine::Runtime;
    use rulewatch::engine::RuntimeOptions;

    common::init_tracing();
    let log = call_log();
    let mut handlers = HandlerRegistry::new();
    handlers.register_fn("compile", recording_handler("compile", log.clone()));
    let (mut engine, tx, rx) = engine_at(
        Path::new("/p"),
        RuleTable::new(),
        handlers,
        Arc::new(MockFileSystem::new()),
    );

    for _ in 0..10 {
        engine.enqueue("compile", vec!["app.css".into()]);
    }
    let engine = engine.with_options(RuntimeOptions {
        exit_when_idle: true,
    });

    common::with_timeout(Runtime::new(engine, tx, rx).run())
        .await
        .unwrap();
    assert_eq!(snapshot(&log), vec!["compile(\"app.css\")"]);
}

fn task_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["copy", "reload", "compile", "manifest"]).prop_map(String::from)
}

proptest! {
    #[test]
    fn batch_is_first_occurrence_order_without_duplicates(
        calls in prop::collection::vec((task_name(), 0i64..4), 0..40)
    ) {
        let mut queue = TaskQueue::new();
        let mut expected: Vec<(String, i64)> = Vec::new();
        for (name, n) in &calls {
            let fresh = queue.enqueue(name.clone(), vec![TaskArg::Num(*n)]);
            let seen = expected.iter().any(|(en, ev)| en == name && ev == n);
            prop_assert_eq!(fresh, !seen);
            if !seen {
                expected.push((name.clone(), *n));
            }
        }

        // One schedule request per burst, however long.
        prop_assert_eq!(queue.take_schedule_request(), !calls.is_empty());
        prop_assert!(!queue.take_schedule_request());

        let batch: Vec<(String, i64)> = queue
            .take_batch()
            .iter()
            .map(|t| (t.handler().to_string(), match t.args()[0] { TaskArg::Num(n) => n, _ => -1 }))
            .collect();
        prop_assert_eq!(batch, expected);
        prop_assert!(queue.is_empty());
        prop_assert!(!queue.flush_armed());
    }
}
