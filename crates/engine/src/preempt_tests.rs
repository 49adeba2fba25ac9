// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::Harness;
use sprig_adapters::{FakeCatalog, Scripted};
use sprig_core::{SessionKind, SessionStatus};
use sprig_storage::SessionStore;
use std::sync::Arc;

fn feed_and_ph() -> FakeCatalog {
    FakeCatalog::new()
        .with_program("tomatoes")
        .with_cycle("tomatoes", "morning", "08:00", &["mix-nutrients"])
        .with_monitor("ph", "read-ph", 5)
}

/// Start the ph flow at 07:55 in its own tick, then move the clock to 08:00
async fn ph_running_at_eight(h: &Harness) -> tokio::task::JoinHandle<()> {
    h.set_time(7, 55);
    let scheduler = Arc::clone(&h.scheduler);
    let first = tokio::spawn(async move {
        scheduler.tick().await.unwrap();
    });
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(h.store.active_session().is_some_and(|s| s.is_monitoring()));
    h.set_time(8, 0);
    first
}

#[tokio::test(start_paused = true)]
async fn monitoring_that_finishes_in_time_is_not_preempted() {
    let h = Harness::at(feed_and_ph(), 7, 50);
    h.interpreter
        .script("read-ph", Scripted::RunFor(Duration::from_secs(10)));
    let first = ph_running_at_eight(&h).await;

    h.tick().await;
    h.scheduler.wait_idle().await;
    first.await.unwrap();

    assert_eq!(h.executed(), vec!["read-ph", "mix-nutrients"]);
    assert_eq!(
        h.sessions(SessionKind::Monitoring)[0].status,
        SessionStatus::Completed
    );
    assert!(h.queue().is_empty());
    assert!(!h.notify.titles().contains(&"Monitoring preempted".to_string()));
}

#[tokio::test(start_paused = true)]
async fn long_monitoring_is_preempted_and_requeued() {
    let h = Harness::at(feed_and_ph(), 7, 50);
    h.interpreter.script("read-ph", Scripted::UntilCancelled);
    let first = ph_running_at_eight(&h).await;

    let started = tokio::time::Instant::now();
    h.tick().await;
    h.scheduler.wait_idle().await;
    first.await.unwrap();

    let config = h.scheduler.config();
    assert!(started.elapsed() >= config.preempt_timeout);
    assert!(started.elapsed() <= config.preempt_timeout + config.graceful_stop + config.preempt_poll);

    let monitoring = h.sessions(SessionKind::Monitoring);
    assert_eq!(monitoring[0].status, SessionStatus::Failed);
    assert_eq!(monitoring[0].error.as_deref(), Some(PREEMPTED_REASON));

    // preempted run, the cycle, then the requeued run once the cycle finished
    assert_eq!(h.executed(), vec!["read-ph", "mix-nutrients", "read-ph"]);
    assert_eq!(h.interpreter.max_concurrent(), 1);
    assert!(h.queue().is_empty());
    assert_eq!(h.monitor("ph").execution_count, 1);
    assert!(h.notify.titles().contains(&"Monitoring preempted".to_string()));
}

#[tokio::test(start_paused = true)]
async fn monitoring_ignoring_cancellation_is_failed_within_the_bound() {
    let h = Harness::at(feed_and_ph(), 7, 50);
    h.interpreter
        .script("read-ph", Scripted::IgnoreCancel(Duration::from_secs(600)));
    let first = ph_running_at_eight(&h).await;
    let config = h.scheduler.config().clone();

    h.tick().await;
    tokio::time::sleep(config.preempt_timeout + config.graceful_stop + config.preempt_poll).await;

    assert!(h.executed().contains(&"mix-nutrients".to_string()));
    let monitoring = h.sessions(SessionKind::Monitoring);
    assert_eq!(monitoring[0].status, SessionStatus::Failed);
    assert_eq!(monitoring[0].error.as_deref(), Some(PREEMPTED_REASON));

    h.scheduler.wait_idle().await;
    first.await.unwrap();

    assert!(h.queue().is_empty());
    assert_eq!(
        h.sessions(SessionKind::Program)[0].status,
        SessionStatus::Completed
    );
}
