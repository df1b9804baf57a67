mod common;

use common::Backend;
use daymark_core::availability::HttpAvailabilityFetcher;
use daymark_core::{AvailabilityFetcher, DayStamp, FetchError, MonthKey, NamespaceKey, NamespaceSet};

#[tokio::test]
async fn test_fetch_sends_one_based_month_and_parses_namespaces() {
    let backend = Backend::start().await;
    backend.reply_with(
        200,
        r#"{
            "data": {"all": ["2025-08-01", "2025-08-03"], "news": ["2025-08-01"]},
            "sync_status": {
                "overall_complete": false,
                "overall_in_progress": true,
                "completed_count": 1,
                "total_count": 2,
                "sources": {"news": {"status": "completed", "percent_complete": 100}}
            }
        }"#,
    );
    let settings = backend
        .settings()
        .with_namespaces(NamespaceSet::new(["news", "social"]));
    let fetcher = HttpAvailabilityFetcher::new(&settings).unwrap();

    let page = fetcher.fetch(MonthKey::new(2025, 8).unwrap()).await.unwrap();

    let query = &backend.queries()[0];
    assert_eq!(query["year"], "2025");
    assert_eq!(query["month"], "08");

    let aug_1 = DayStamp::parse("2025-08-01").unwrap();
    let aug_3 = DayStamp::parse("2025-08-03").unwrap();
    assert!(page.snapshot.has_data(&NamespaceKey::union(), &aug_3));
    assert!(page.snapshot.has_data(&NamespaceKey::new("news"), &aug_1));
    assert!(!page.snapshot.has_data(&NamespaceKey::new("news"), &aug_3));
    // Configured but absent from the response.
    assert!(page.snapshot.days(&NamespaceKey::new("social")).is_empty());

    let sync = page.sync_status.unwrap();
    assert!(!sync.overall_complete);
    assert_eq!(sync.total_count, 2);
    assert_eq!(sync.failed_count, 0);
}

#[tokio::test]
async fn test_january_and_december_boundaries() {
    let backend = Backend::start().await;
    let fetcher = HttpAvailabilityFetcher::new(&backend.settings()).unwrap();

    fetcher.fetch(MonthKey::from_zero_based(2024, 0).unwrap()).await.unwrap();
    fetcher.fetch(MonthKey::from_zero_based(2024, 11).unwrap()).await.unwrap();

    let months: Vec<String> = backend.queries().iter().map(|q| q["month"].clone()).collect();
    assert_eq!(months, vec!["01", "12"]);
}

#[tokio::test]
async fn test_http_errors_are_classified() {
    let backend = Backend::start().await;
    let fetcher = HttpAvailabilityFetcher::new(&backend.settings()).unwrap();
    let aug = MonthKey::new(2025, 8).unwrap();

    backend.reply_with(503, "unavailable");
    let err = fetcher.fetch(aug).await.unwrap_err();
    assert_eq!(err, FetchError::Http { status: 503 });
    assert!(err.is_transient());

    backend.reply_with(404, "not found");
    let err = fetcher.fetch(aug).await.unwrap_err();
    assert_eq!(err, FetchError::Http { status: 404 });
    assert!(!err.is_transient());

    backend.reply_with(200, "<html>oops</html>");
    let err = fetcher.fetch(aug).await.unwrap_err();
    assert!(matches!(err, FetchError::Parse(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_a_transient_failure() {
    // Bind then drop to get a port nobody listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let settings =
        daymark_core::SyncSettings::new(url::Url::parse(&format!("http://{addr}")).unwrap()).unwrap();
    let fetcher = HttpAvailabilityFetcher::new(&settings).unwrap();
    let err = fetcher.fetch(MonthKey::new(2025, 8).unwrap()).await.unwrap_err();
    assert!(err.is_transient(), "unexpected error: {err:?}");
}
