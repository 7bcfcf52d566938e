use std::time::Duration;

use hfp_consumer::{SessionDuration, SessionError};
use hfp_core::{
    FeedError, FeedMessage,
    test_helper::{AckBehaviour, TEST_TOPIC, TEST_TOPIC_FILTER},
};
use serde_json::json;
use tokio::time::{Instant, sleep};

use crate::helper::{ACK_TIMEOUT, TestHelper, payload};

#[tokio::test(start_paused = true)]
async fn test_session_without_duration_runs_for_ten_seconds() {
    let helper = TestHelper::new();

    let start = Instant::now();
    let report = helper.ingestor.ingest(None).await.unwrap();

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(10), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(11), "{elapsed:?}");
    assert_eq!(report.duration, Duration::from_secs(10));
    assert_eq!(helper.feed.subscribe_calls(), vec![TEST_TOPIC_FILTER]);
    assert_eq!(helper.feed.unsubscribe_calls(), vec![TEST_TOPIC_FILTER]);
}

#[tokio::test(start_paused = true)]
async fn test_valid_messages_are_stored() {
    let helper = TestHelper::new();
    helper
        .feed
        .publish_on_subscribe([payload(1, 0).message(), payload(2, 0).message()]);

    let report = helper.ingestor.ingest(Some("1")).await.unwrap();

    assert_eq!(report.received, 2);
    assert_eq!(report.stored, 2);
    assert_eq!(report.rejected, 0);

    let mut vehicles: Vec<String> = helper
        .store
        .all_positions()
        .into_iter()
        .map(|p| p.vehicle_id.into_inner())
        .collect();
    vehicles.sort();
    assert_eq!(vehicles, vec!["1", "2"]);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_messages_are_counted_and_not_stored() {
    let helper = TestHelper::new();
    helper.feed.publish_on_subscribe([
        FeedMessage::new(TEST_TOPIC, "not json"),
        payload(1, 0).without("lat").message(),
        payload(2, 0).with("tst", json!("yesterday")).message(),
        payload(3, 0).with("spd", json!("fast")).message(),
        payload(4, 0).message(),
    ]);

    let report = helper.ingestor.ingest(Some("1")).await.unwrap();

    assert_eq!(report.received, 5);
    assert_eq!(report.rejected, 4);
    assert_eq!(report.stored, 1);
    assert_eq!(helper.store.all_positions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_messages_on_other_topics_are_ignored() {
    let helper = TestHelper::new();
    helper.feed.publish_on_subscribe([
        FeedMessage::new("/hfp/v2/journey/ongoing/dep/bus", payload(1, 0).build()),
        payload(2, 0).message(),
    ]);

    let report = helper.ingestor.ingest(Some("1")).await.unwrap();

    assert_eq!(report.received, 1);
    assert_eq!(helper.store.all_positions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_reports_are_stored_once() {
    let helper = TestHelper::new();
    helper
        .feed
        .publish_on_subscribe([payload(1, 0).message(), payload(1, 0).message()]);

    helper.ingestor.ingest(Some("1")).await.unwrap();

    assert_eq!(helper.store.all_positions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_duration_does_not_subscribe() {
    let helper = TestHelper::new();

    let err = helper.ingestor.ingest(Some("xyz")).await.unwrap_err();

    assert!(matches!(err, SessionError::InvalidDuration { .. }));
    assert!(helper.feed.subscribe_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rejected_subscription_fails_without_starting_a_window() {
    let helper = TestHelper::new();
    helper.feed.set_subscribe_behaviour(AckBehaviour::Reject);

    let start = Instant::now();
    let err = helper.ingestor.ingest(Some("30")).await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::SubscriptionFailed {
            source: FeedError::Rejected { .. },
            ..
        }
    ));
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(helper.feed.unsubscribe_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unacknowledged_subscription_times_out() {
    let helper = TestHelper::new();
    helper.feed.set_subscribe_behaviour(AckBehaviour::Never);

    let start = Instant::now();
    let err = helper.ingestor.ingest(Some("30")).await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::SubscriptionFailed {
            source: FeedError::AckTimeout { .. },
            ..
        }
    ));
    let elapsed = start.elapsed();
    assert!(elapsed >= ACK_TIMEOUT, "{elapsed:?}");
    assert!(elapsed < ACK_TIMEOUT + Duration::from_secs(1), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_failed_unsubscribe_keeps_stored_positions() {
    let helper = TestHelper::new();
    helper.feed.set_unsubscribe_behaviour(AckBehaviour::Reject);
    helper
        .feed
        .publish_on_subscribe([payload(1, 0).message(), payload(2, 0).message()]);

    let err = helper.ingestor.ingest(Some("1")).await.unwrap_err();

    assert!(matches!(err, SessionError::UnsubscriptionFailed { .. }));
    assert_eq!(err.report().unwrap().stored, 2);
    assert_eq!(helper.store.all_positions().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_writes_are_counted() {
    let helper = TestHelper::new();
    helper.store.set_failing(true);
    helper
        .feed
        .publish_on_subscribe([payload(1, 0).message(), payload(2, 0).message()]);

    let report = helper.ingestor.ingest(Some("1")).await.unwrap();

    assert_eq!(report.received, 2);
    assert_eq!(report.stored, 0);
    assert_eq!(report.failed_writes, 2);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_sessions_unsubscribe_after_the_last_window() {
    let helper = TestHelper::new();

    let first = helper.ingestor.clone();
    let first = tokio::spawn(async move {
        first
            .run(SessionDuration::from(Duration::from_secs(10)))
            .await
    });

    sleep(Duration::from_secs(5)).await;

    let second = helper.ingestor.clone();
    let second = tokio::spawn(async move {
        second
            .run(SessionDuration::from(Duration::from_secs(10)))
            .await
    });

    sleep(Duration::from_secs(7)).await;

    // The first window has ended, the second is still running.
    assert!(first.is_finished());
    assert!(helper.feed.unsubscribe_calls().is_empty());
    assert_eq!(helper.feed.subscribe_calls().len(), 1);

    helper.feed.publish(payload(1, 12).message());

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    assert_eq!(first.received, 0);
    assert_eq!(second.received, 1);
    assert_eq!(second.stored, 1);
    assert_eq!(helper.store.all_positions().len(), 1);
    assert_eq!(helper.feed.unsubscribe_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_session_still_runs_its_window_and_unsubscribes() {
    let helper = TestHelper::new();

    let dropped = tokio::time::timeout(
        Duration::from_secs(2),
        helper
            .ingestor
            .run(SessionDuration::from(Duration::from_secs(10))),
    )
    .await;
    assert!(dropped.is_err());

    helper.feed.publish(payload(1, 2).message());
    helper.ingestor.ingest(Some("1")).await.unwrap();

    let subscriptions = helper.ingestor.subscriptions();
    assert_eq!(subscriptions.live_handles(TEST_TOPIC_FILTER).await, 1);
    assert!(helper.feed.unsubscribe_calls().is_empty());

    sleep(Duration::from_secs(8)).await;

    assert_eq!(subscriptions.live_handles(TEST_TOPIC_FILTER).await, 0);
    assert_eq!(helper.feed.subscribe_calls(), vec![TEST_TOPIC_FILTER]);
    assert_eq!(helper.feed.unsubscribe_calls(), vec![TEST_TOPIC_FILTER]);
    assert_eq!(helper.store.all_positions().len(), 1);
}
