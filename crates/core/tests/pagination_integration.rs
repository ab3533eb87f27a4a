//! Integration tests for cursor pagination

mod support;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use support::{fast_config, init_tracing, paginator, remote_error, FakeRemote};
use tidesync_core::{Paginator, TokenSource};
use tidesync_domain::TideSyncError;

fn three_pages() -> Arc<FakeRemote<u32>> {
    Arc::new(
        FakeRemote::new()
            .page("/events", vec![1, 2], Some("c2"))
            .page("c2", vec![3, 4], Some("c3"))
            .page("c3", vec![5, 6], None),
    )
}

#[tokio::test]
async fn test_fetch_all_returns_every_item_in_page_order() {
    init_tracing();
    let remote = three_pages();

    let items = paginator(&remote).fetch_all("/events").await.unwrap();

    assert_eq!(items, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(remote.requests(), vec!["/events", "c2", "c3"]);
}

#[tokio::test]
async fn test_fetch_each_streams_pages_as_they_arrive() {
    let remote = three_pages();
    let pages = Arc::new(Mutex::new(Vec::new()));

    let delivered = paginator(&remote)
        .fetch_each("/events", |items| {
            let pages = Arc::clone(&pages);
            async move {
                pages.lock().unwrap().push(items);
                Ok(())
            }
        })
        .await
        .unwrap();

    assert_eq!(delivered, 6);
    assert_eq!(*pages.lock().unwrap(), vec![vec![1, 2], vec![3, 4], vec![5, 6]]);
}

#[tokio::test]
async fn test_empty_listing() {
    let remote = Arc::new(FakeRemote::<u32>::new().page("/events", vec![], None));
    assert!(paginator(&remote).fetch_all("/events").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_page_delay_only_between_pages() {
    let delay = Duration::from_millis(40);

    let remote = three_pages();
    let start = Instant::now();
    paginator(&remote).with_page_delay(delay).fetch_all("/events").await.unwrap();
    assert!(start.elapsed() >= delay * 2);

    let single = Arc::new(FakeRemote::new().page("/one", vec![1u32], None));
    let start = Instant::now();
    paginator(&single).with_page_delay(Duration::from_secs(5)).fetch_all("/one").await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_terminal_failure_mid_stream_propagates_unchanged() {
    let remote = Arc::new(
        FakeRemote::new()
            .page("/events", vec![1u32], Some("c2"))
            .fail("c2", remote_error(400)),
    );

    let result = paginator(&remote).fetch_all("/events").await;

    assert_eq!(result, Err(remote_error(400)));
    assert_eq!(remote.requests(), vec!["/events", "c2"]);
}

#[tokio::test]
async fn test_rate_limit_is_absorbed() {
    let remote = Arc::new(
        FakeRemote::new()
            .fail("/events", TideSyncError::RateLimited { retry_after: Some(Duration::ZERO) })
            .page("/events", vec![7u32], None),
    );

    assert_eq!(paginator(&remote).fetch_all("/events").await.unwrap(), vec![7]);
    assert_eq!(remote.requests().len(), 2);
}

#[tokio::test]
async fn test_token_failure_propagates_without_request() {
    let remote = three_pages();
    let tokens = TokenSource::from_fn(|| async { Err(TideSyncError::Auth("revoked".into())) });
    let paginator = Paginator::from_config(remote.clone(), tokens, &fast_config());

    assert_eq!(
        paginator.fetch_all("/events").await,
        Err(TideSyncError::Auth("revoked".into()))
    );
    assert!(remote.requests().is_empty());
}
