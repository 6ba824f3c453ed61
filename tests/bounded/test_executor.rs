//! Tests for the bounded executor (`for_each` / `try_for_each`).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use kodegen_async_iter::{
    BoundedIter, CancellationSignal, CancellationToken, IterError, StopReason, for_each,
};
use tokio::time::{sleep, timeout};

use super::common::{InFlightTracker, init_logging};

#[tokio::test]
async fn test_for_each_limit_two_over_five() {
    init_logging();
    let tracker = InFlightTracker::default();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let summary = for_each(
        1..=5,
        |n| {
            let tracker = tracker.clone();
            let seen = seen.clone();
            async move {
                tracker.enter();
                sleep(Duration::from_millis(10)).await;
                seen.lock().unwrap().push(n);
                tracker.exit();
            }
        },
        2,
    )
    .await;

    let mut seen = seen.lock().unwrap().clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    assert_eq!(tracker.runs(), 5);
    assert!(tracker.peak() <= 2);
    assert_eq!(summary.admitted, 5);
    assert_eq!(summary.settled, 5);
    assert_eq!(summary.stop, StopReason::Completed);
    assert!(summary.peak_in_flight <= 2);
}

#[tokio::test]
async fn test_window_never_exceeds_limit() {
    for limit in [1usize, 2, 3, 8] {
        let tracker = InFlightTracker::default();
        let summary = for_each(
            0..8u64,
            |n| {
                let tracker = tracker.clone();
                async move {
                    tracker.enter();
                    // Uneven delays so slots free up out of order
                    sleep(Duration::from_millis(2 + (n * 7) % 5)).await;
                    tracker.exit();
                }
            },
            limit,
        )
        .await;

        assert!(tracker.peak() <= limit, "limit {limit}, peak {}", tracker.peak());
        assert_eq!(tracker.runs(), 8);
        assert_eq!(summary.peak_in_flight, limit);
    }
}

#[tokio::test]
async fn test_unbounded_admits_everything_at_once() {
    let tracker = InFlightTracker::default();
    let summary = for_each(
        0..6,
        |_| {
            let tracker = tracker.clone();
            async move {
                tracker.enter();
                sleep(Duration::from_millis(10)).await;
                tracker.exit();
            }
        },
        0,
    )
    .await;

    assert_eq!(tracker.peak(), 6);
    assert_eq!(summary.peak_in_flight, 6);
}

#[tokio::test]
async fn test_empty_input_completes() {
    let summary = for_each(Vec::<u32>::new(), |_| async {}, 3).await;
    assert_eq!(summary.total, 0);
    assert_eq!(summary.admitted, 0);
    assert_eq!(summary.stop, StopReason::Completed);
    assert!(!summary.stopped_early());
}

#[tokio::test]
async fn test_signal_stops_admission_after_third_item() {
    init_logging();
    let signal = CancellationSignal::new();
    let ran = Arc::new(Mutex::new(Vec::new()));

    let summary = BoundedIter::new(1)
        .until(&signal)
        .for_each(1..=5, |n| {
            let signal = signal.clone();
            let ran = ran.clone();
            async move {
                sleep(Duration::from_millis(2)).await;
                ran.lock().unwrap().push(n);
                if n == 3 {
                    signal.cancel();
                }
            }
        })
        .await;

    assert_eq!(*ran.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(summary.admitted, 3);
    assert_eq!(summary.settled, 3);
    assert_eq!(summary.skipped(), 2);
    assert_eq!(summary.stop, StopReason::Cancelled);
    assert!(summary.stopped_early());
}

#[tokio::test]
async fn test_admitted_items_finish_after_signal() {
    let signal = CancellationSignal::new();
    let finished = Arc::new(Mutex::new(Vec::new()));

    let summary = BoundedIter::new(3)
        .until(&signal)
        .for_each(1..=6u64, |n| {
            let signal = signal.clone();
            let finished = finished.clone();
            async move {
                if n == 1 {
                    signal.cancel();
                } else {
                    sleep(Duration::from_millis(20)).await;
                }
                finished.lock().unwrap().push(n);
            }
        })
        .await;

    let mut finished = finished.lock().unwrap().clone();
    finished.sort_unstable();
    assert_eq!(finished, vec![1, 2, 3]);
    assert_eq!(summary.admitted, 3);
    assert_eq!(summary.abandoned, 0);
    assert_eq!(summary.stop, StopReason::Cancelled);
}

#[tokio::test]
async fn test_signal_set_before_run_admits_nothing() {
    let signal = CancellationSignal::new();
    signal.cancel();
    let tracker = InFlightTracker::default();

    let summary = BoundedIter::new(2)
        .until(&signal)
        .for_each(0..4, |_| {
            let tracker = tracker.clone();
            async move {
                tracker.enter();
                tracker.exit();
            }
        })
        .await;

    assert_eq!(tracker.runs(), 0);
    assert_eq!(summary.admitted, 0);
    assert_eq!(summary.stop, StopReason::Cancelled);
}

#[tokio::test]
async fn test_failure_does_not_stop_admission() {
    init_logging();
    let tracker = InFlightTracker::default();

    let result = BoundedIter::new(1)
        .try_for_each(0..5, |n| {
            let tracker = tracker.clone();
            async move {
                tracker.enter();
                tracker.exit();
                if n == 1 {
                    Err(format!("item {n} rejected"))
                } else {
                    Ok(())
                }
            }
        })
        .await;

    assert_eq!(tracker.runs(), 5);
    match result {
        Err(IterError::Item { index, error }) => {
            assert_eq!(index, 1);
            assert_eq!(error, "item 1 rejected");
        }
        other => panic!("expected item failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_first_observed_failure_is_reported() {
    let result = BoundedIter::new(1)
        .try_for_each(0..5, |n| async move {
            if n % 2 == 1 { Err(n) } else { Ok(()) }
        })
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.index(), Some(1));
    assert_eq!(err.into_item_error(), Some(1));
}

#[tokio::test]
async fn test_try_for_each_success_returns_summary() {
    let summary = BoundedIter::new(2)
        .try_for_each(0..4, |_| async { Ok::<(), String>(()) })
        .await
        .unwrap();
    assert_eq!(summary.settled, 4);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_abort_token_stops_waiting() {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let summary = timeout(
        Duration::from_secs(2),
        BoundedIter::new(2)
            .abort_on(&token)
            .for_each(0..4, |_| sleep(Duration::from_secs(30))),
    )
    .await
    .expect("run should return once aborted");

    assert_eq!(summary.stop, StopReason::Aborted);
    assert_eq!(summary.admitted, 2);
    assert_eq!(summary.settled, 0);
    assert_eq!(summary.abandoned, 2);
}
