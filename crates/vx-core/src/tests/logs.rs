use crate::LogAggregator;
use crate::logs::LineQueue;

use std::time::Duration;

use googletest::assert_that;
use googletest::prelude::{eq, len};
use vx_config::LogBufferConfig;

// =========================================================================
// LineQueue
// =========================================================================

#[test]
fn given_empty_queue_when_append_batch_then_flush_requested_once() {
    // Given
    let queue = LineQueue::new();

    // When
    let first = queue.append_batch(vec!["a".to_string()]);
    let second = queue.append_batch(vec!["b".to_string()]);

    // Then
    assert!(first);
    assert!(!second);
    assert_that!(queue.len(), eq(2));
}

#[test]
fn given_drained_queue_when_append_batch_then_flush_requested_again() {
    // Given
    let queue = LineQueue::new();
    queue.append_batch(vec!["a".to_string()]);
    let drained = queue.drain_all();

    // When
    let requested = queue.append_batch(vec!["b".to_string()]);

    // Then
    assert_eq!(drained, vec!["a".to_string()]);
    assert!(requested);
}

#[test]
fn given_large_batch_when_drain_all_then_every_line_returned_in_order() {
    // Given
    let queue = LineQueue::new();
    let lines: Vec<String> = (0..500).map(|i| i.to_string()).collect();

    // When
    queue.append_batch(lines.clone());

    // Then
    assert_eq!(queue.drain_all(), lines);
    assert!(queue.is_empty());
}

// =========================================================================
// LogAggregator
// =========================================================================

#[tokio::test]
async fn given_five_lines_within_interval_when_flushed_then_one_batch_with_same_timestamp() {
    // Given
    let logs = LogAggregator::default();
    let flushes = logs.subscribe();

    // When
    for i in 0..5 {
        logs.add_line(format!("line {i}"));
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    // Then
    let entries = logs.entries();
    assert_that!(entries, len(eq(5)));
    assert_that!(*flushes.borrow(), eq(1));
    assert!(entries.iter().all(|e| e.timestamp == entries[0].timestamp));
    assert_that!(entries[4].text.as_str(), eq("line 4"));
}

#[tokio::test]
async fn given_lines_when_interval_not_elapsed_then_nothing_visible() {
    // Given
    let logs = LogAggregator::new(&LogBufferConfig {
        flush_interval_ms: 5_000,
        ..LogBufferConfig::default()
    });

    // When
    logs.add_line("pending");

    // Then
    assert!(logs.is_empty());
    assert_that!(logs.flush(), eq(1));
    assert_that!(logs.len(), eq(1));
}

#[test]
fn given_no_runtime_when_more_than_max_entries_then_200_most_recent_remain() {
    // Given
    let logs = LogAggregator::default();

    // When
    for i in 0..301 {
        logs.add_line(format!("line {i}"));
    }

    // Then
    let entries = logs.entries();
    assert_that!(entries, len(eq(200)));
    assert_that!(entries[0].text.as_str(), eq("line 101"));
    assert_that!(entries[199].text.as_str(), eq("line 300"));
}

#[tokio::test]
async fn given_burst_over_max_entries_within_interval_when_flushed_then_200_most_recent_remain() {
    // Given
    let logs = LogAggregator::default();
    let flushes = logs.subscribe();

    // When
    for i in 0..301 {
        logs.add_line(format!("line {i}"));
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    // Then
    let entries = logs.entries();
    assert_that!(entries, len(eq(200)));
    assert_that!(*flushes.borrow(), eq(1));
    assert_that!(entries[0].text.as_str(), eq("line 101"));
    assert_that!(entries[199].text.as_str(), eq("line 300"));
}

#[test]
fn given_invalid_utf8_chunk_when_pushed_then_lines_kept_with_replacement() {
    // Given
    let logs = LogAggregator::default();

    // When
    logs.push_chunk(b"ok\xffbad\r\nsecond\n\n");

    // Then
    let texts: Vec<String> = logs.entries().into_iter().map(|e| e.text).collect();
    assert_eq!(texts, vec!["ok\u{FFFD}bad".to_string(), "second".to_string()]);
}

#[test]
fn given_entries_when_clear_then_empty_and_subscribers_notified() {
    // Given
    let logs = LogAggregator::default();
    logs.add_line("one");
    let flushes = logs.subscribe();

    // When
    logs.clear();

    // Then
    assert!(logs.is_empty());
    assert!(flushes.has_changed().unwrap());
}

#[test]
fn given_entry_when_displayed_then_bracketed_timestamp_prefix() {
    // Given
    let logs = LogAggregator::default();
    logs.add_line("hello");

    // When
    let rendered = logs.entries()[0].to_string();

    // Then
    assert!(rendered.starts_with('['));
    assert!(rendered.ends_with("] hello"));
}

#[test]
fn given_cursor_when_entries_since_then_only_newer_entries_returned() {
    // Given
    let logs = LogAggregator::default();
    logs.add_line("first");
    let (initial, cursor) = logs.entries_since(0);

    // When
    logs.add_line("second");
    logs.add_line("third");
    let (fresh, next) = logs.entries_since(cursor);

    // Then
    assert_that!(initial, len(eq(1)));
    let texts: Vec<String> = fresh.into_iter().map(|e| e.text).collect();
    assert_eq!(texts, vec!["second".to_string(), "third".to_string()]);
    assert_that!(next, eq(3));
    assert_that!(logs.entries_since(next).0, len(eq(0)));
}

#[test]
fn given_cleared_list_when_entries_since_old_cursor_then_nothing_replayed() {
    // Given
    let logs = LogAggregator::default();
    logs.add_line("old");
    let (_, cursor) = logs.entries_since(0);

    // When
    logs.clear();
    logs.add_line("new");
    let (fresh, _) = logs.entries_since(cursor);

    // Then
    assert_that!(fresh, len(eq(1)));
    assert_that!(fresh[0].text.as_str(), eq("new"));
}
