//! Dispatch tests: filtering, lazy formatting, delivery and failure handling.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use grouplog::config::schema::{ConfigDocument, GroupDecl, SinkDecl};
use grouplog::sink::MemorySink;
use grouplog::{log_debug, log_error, log_info, log_warn, DocumentConfigurator, Level, LoggingSystem};

mod common;

use common::{FailingSink, InstanceConfigurator, PanickingSink};

fn warn_system() -> LoggingSystem {
    let system = LoggingSystem::new();
    common::configure_ok(
        &system,
        &DocumentConfigurator::new(
            ConfigDocument::new()
                .with_sink(SinkDecl::memory("mem", 64))
                .with_group(
                    GroupDecl::new("main")
                        .level(Level::Warn)
                        .sink("mem")
                        .child(GroupDecl::new("net")),
                ),
        ),
    );
    system
}

#[test]
fn test_disabled_level_never_formats() {
    let system = warn_system();
    let logger = system.get_logger("test", "main").unwrap();

    let calls = AtomicUsize::new(0);
    let expensive = || {
        calls.fetch_add(1, Ordering::SeqCst);
        "expensive"
    };

    log_debug!(logger, "{}", expensive());
    logger.log_with(Level::Debug, || expensive().to_string());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(common::memory_entries(&system, "mem").is_empty());

    log_warn!(logger, "{}", expensive());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        common::memory_entries(&system, "mem"),
        vec![(Level::Warn, "expensive".to_string())]
    );
}

#[test]
fn test_set_level_applies_immediately() {
    let system = warn_system();
    let logger = system.get_logger("test", "main").unwrap();

    log_debug!(logger, "before");
    logger.set_level(Level::Debug);
    assert_eq!(logger.effective_level(), Level::Debug);
    log_debug!(logger, "after");

    assert_eq!(
        common::memory_entries(&system, "mem"),
        vec![(Level::Debug, "after".to_string())]
    );
}

#[test]
fn test_group_level_change_reaches_bound_loggers() {
    let system = warn_system();
    let net = system.get_logger("net.client", "net").unwrap();
    log_info!(net, "dropped");

    system.set_group_level("main", Level::Info).unwrap();
    log_info!(net, "kept");

    assert_eq!(
        common::memory_entries(&system, "mem"),
        vec![(Level::Info, "kept".to_string())]
    );
}

#[test]
fn test_same_thread_order_is_preserved() {
    let system = warn_system();
    let logger = system.get_logger("ordered", "main").unwrap();
    for i in 0..20 {
        log_error!(logger, "record {}", i);
    }

    let texts: Vec<String> = common::memory_entries(&system, "mem")
        .into_iter()
        .map(|(_, text)| text)
        .collect();
    let expected: Vec<String> = (0..20).map(|i| format!("record {}", i)).collect();
    assert_eq!(texts, expected);
}

#[test]
fn test_sink_failures_are_counted_not_raised() {
    let failing = Arc::new(FailingSink::default());
    let system = LoggingSystem::new();
    common::configure_ok(
        &system,
        &InstanceConfigurator::new(
            ConfigDocument::new().with_group(GroupDecl::new("main").level(Level::Info).sink("bad")),
        )
        .with_sink("bad", failing.clone()),
    );

    let logger = system.get_logger("x", "main").unwrap();
    log_info!(logger, "one");
    log_error!(logger, "two");
    log_debug!(logger, "filtered");

    assert_eq!(failing.calls.load(Ordering::SeqCst), 2);
    let stats = system.delivery_stats();
    assert_eq!(stats.failures, 2);
    let last = stats.last_error.unwrap();
    assert!(last.contains("sink 'bad'"), "{}", last);
    assert!(last.contains("disk full"), "{}", last);
}

#[test]
fn test_panicking_sink_is_contained() {
    let system = LoggingSystem::new();
    common::configure_ok(
        &system,
        &InstanceConfigurator::new(
            ConfigDocument::new().with_group(GroupDecl::new("main").level(Level::Info).sink("boom")),
        )
        .with_sink("boom", Arc::new(PanickingSink)),
    );

    let logger = system.get_logger("x", "main").unwrap();
    log_info!(logger, "still alive");

    let stats = system.delivery_stats();
    assert_eq!(stats.failures, 1);
    assert!(stats.last_error.unwrap().contains("sink exploded"));
}

#[test]
fn test_multisink_delivers_to_every_member() {
    let failing = Arc::new(FailingSink::default());
    let system = LoggingSystem::new();
    common::configure_ok(
        &system,
        &InstanceConfigurator::new(
            ConfigDocument::new()
                .with_sink(SinkDecl::memory("a", 8))
                .with_sink(SinkDecl::memory("b", 8))
                .with_sink(SinkDecl::multisink("both", ["a", "bad", "b"]))
                .with_group(GroupDecl::new("main").level(Level::Info).sink("both")),
        )
        .with_sink("bad", failing.clone()),
    );

    let logger = system.get_logger("x", "main").unwrap();
    log_warn!(logger, "fan out");

    let expected = vec![(Level::Warn, "fan out".to_string())];
    assert_eq!(common::memory_entries(&system, "a"), expected);
    assert_eq!(common::memory_entries(&system, "b"), expected);
    assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    assert_eq!(system.delivery_stats().failures, 1);
}

#[test]
fn test_file_sink_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let system = LoggingSystem::new();
    common::configure_ok(
        &system,
        &DocumentConfigurator::new(
            ConfigDocument::new()
                .with_sink(SinkDecl::file("file", &path))
                .with_group(GroupDecl::new("main").level(Level::Info).sink("file")),
        ),
    );

    let logger = system.get_logger("writer", "main").unwrap();
    log_info!(logger, "persisted {}", 42);
    system.flush();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("Info"), "{}", content);
    assert!(content.contains("writer"), "{}", content);
    assert!(content.contains("persisted 42"), "{}", content);
}

#[test]
fn test_concurrent_dispatch_during_reconfiguration() {
    let system = Arc::new(warn_system());
    let stop = Arc::new(AtomicBool::new(false));

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let system = system.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                let logger = system.get_logger(&format!("worker{}", i), "net").unwrap();
                let mut sent = 0u64;
                while !stop.load(Ordering::Relaxed) {
                    log_error!(logger, "worker {} record {}", i, sent);
                    sent += 1;
                }
                sent
            })
        })
        .collect();

    for round in 0..50 {
        let level = if round % 2 == 0 { Level::Trace } else { Level::Error };
        let capacity = 16 + round;
        common::configure_ok(
            &*system,
            &DocumentConfigurator::new(
                ConfigDocument::new()
                    .with_sink(SinkDecl::memory("mem", capacity))
                    .with_group(
                        GroupDecl::new("main")
                            .level(level)
                            .sink("mem")
                            .child(GroupDecl::new("net")),
                    ),
            ),
        );
    }
    stop.store(true, Ordering::Relaxed);

    for worker in workers {
        worker.join().expect("worker panicked");
    }
    assert_eq!(system.delivery_stats().failures, 0);
    assert_eq!(system.loggers().len(), 4);

    let sink = system.sink("mem").unwrap();
    let memory = sink.as_any().downcast_ref::<MemorySink>().unwrap();
    assert!(memory.len() <= memory.capacity());
}
