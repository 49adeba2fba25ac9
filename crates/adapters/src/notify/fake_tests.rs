// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_notify_records_calls() {
    let adapter = FakeNotifyAdapter::new();

    adapter.send("Cycle started", "Tomato feed / morning").await.unwrap();
    adapter.send("Cycle succeeded", "Tomato feed / morning").await.unwrap();

    let calls = adapter.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].title, "Cycle started");
    assert_eq!(calls[0].message, "Tomato feed / morning");
}

#[tokio::test]
async fn failing_fake_still_records() {
    let adapter = FakeNotifyAdapter::new();
    adapter.fail_sends();

    assert!(adapter.send("Cycle failed", "pump stalled").await.is_err());
    assert_eq!(adapter.titles(), vec!["Cycle failed".to_string()]);
}
