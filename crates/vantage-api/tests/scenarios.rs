//! End-to-end checks over the public API: registry -> URL, and raw feed JSON -> daily buckets.

use std::collections::BTreeSet;
use vantage_api::schema::news::NewsFeed;
use vantage_api::sentiment::{aggregate, daily_overall, densify, requested_window};
use vantage_api::{build_url, Error, ParameterSet, Registry};

const FEED: &str = r#"{
    "items": "3",
    "sentiment_score_definition": "x <= -0.35: Bearish; -0.35 < x <= -0.15: Somewhat-Bearish; ...",
    "relevance_score_definition": "0 < x <= 1, with a higher score indicating higher relevance.",
    "feed": [
        {
            "title": "Chipmaker rallies",
            "time_published": "20250628T101500",
            "overall_sentiment_score": 0.31,
            "overall_sentiment_label": "Somewhat-Bullish",
            "ticker_sentiment": [
                { "ticker": "NVDA", "relevance_score": "1.0", "ticker_sentiment_score": "0.2", "ticker_sentiment_label": "Neutral" },
                { "ticker": "AMD", "relevance_score": "0.1", "ticker_sentiment_score": "0.9", "ticker_sentiment_label": "Bullish" }
            ]
        },
        {
            "title": "Chipmaker extends gains",
            "time_published": "20250628T170000",
            "overall_sentiment_score": 0.41,
            "overall_sentiment_label": "Bullish",
            "ticker_sentiment": [
                { "ticker": "NVDA", "relevance_score": "0.5", "ticker_sentiment_score": "0.8", "ticker_sentiment_label": "Bullish" }
            ]
        },
        {
            "title": "Quiet week",
            "time_published": "20250626T080000",
            "overall_sentiment_score": 0.0,
            "overall_sentiment_label": "Neutral",
            "ticker_sentiment": [
                { "ticker": "NVDA", "relevance_score": "0.3", "ticker_sentiment_score": "-0.1", "ticker_sentiment_label": "Neutral" }
            ]
        }
    ]
}"#;

#[test]
fn global_quote_url_from_builtin_registry() {
    let registry = Registry::builtin();
    let url = build_url(&registry, "alpha_vantage", "GLOBAL_QUOTE", "DEMOKEY", &ParameterSet::new())
        .unwrap();

    let (base, query) = url.split_once('?').unwrap();
    assert_eq!(base, "https://www.alphavantage.co/query");

    let pairs: Vec<&str> = query.split('&').collect();
    for expected in ["function=GLOBAL_QUOTE", "symbol=NVDA", "datatype=json", "apikey=DEMOKEY"] {
        assert!(pairs.contains(&expected), "{expected} missing from {url}");
    }

    let keys: BTreeSet<&str> = pairs.iter().map(|p| p.split('=').next().unwrap()).collect();
    assert_eq!(keys.len(), pairs.len(), "duplicate keys in {url}");

    // same inputs, same URL
    let again = build_url(&registry, "alpha_vantage", "GLOBAL_QUOTE", "DEMOKEY", &ParameterSet::new())
        .unwrap();
    assert_eq!(url, again);
}

#[test]
fn updated_current_values_flow_into_url_but_overrides_still_win() {
    let mut registry = Registry::builtin();
    registry
        .update_current_values("alpha_vantage", "NEWS_SENTIMENT", [("tickers", "MSFT"), ("sort", "EARLIEST")])
        .unwrap();

    let url = build_url(&registry, "alpha_vantage", "NEWS_SENTIMENT", "K", &ParameterSet::new()).unwrap();
    assert!(url.contains("tickers=MSFT"));
    assert!(url.contains("sort=EARLIEST"));

    let overrides = ParameterSet::from([("tickers", "NVDA")]);
    let url = build_url(&registry, "alpha_vantage", "NEWS_SENTIMENT", "K", &overrides).unwrap();
    assert!(url.contains("tickers=NVDA"));
    assert!(!url.contains("tickers=MSFT"));
}

#[test]
fn unknown_function_is_not_found() {
    let registry = Registry::builtin();
    let err = build_url(&registry, "alpha_vantage", "X", "key", &ParameterSet::new()).unwrap_err();
    assert!(matches!(err, Error::NotFound { kind: "function", .. }));
}

#[test]
fn feed_to_sparse_and_dense_buckets() {
    let feed: NewsFeed = serde_json::from_str(FEED).unwrap();
    let targets: BTreeSet<String> = ["NVDA".to_string()].into();

    let sparse = aggregate(&feed.feed, &targets).unwrap();
    assert_eq!(sparse.len(), 2);
    assert_eq!(sparse[0].date.to_string(), "2025-06-26");
    assert_eq!(sparse[1].date.to_string(), "2025-06-28");

    let day = &sparse[1];
    assert_eq!(day.article_count, 2);
    assert!((day.avg_sentiment_score - 0.5).abs() < 1e-9);
    assert!((day.weighted_sentiment_score - 0.4).abs() < 1e-9);
    assert_eq!((day.bullish_count, day.neutral_count), (1, 1));

    let dense = densify(sparse, &targets, None);
    assert_eq!(dense.len(), 3);
    assert_eq!(dense[1].date.to_string(), "2025-06-27");
    assert_eq!(dense[1].article_count, 0);
    assert_eq!(dense[1].weighted_sentiment_score, 0.0);
}

#[test]
fn dense_series_spans_the_requested_window() {
    let feed: NewsFeed = serde_json::from_str(FEED).unwrap();
    let targets: BTreeSet<String> = ["NVDA".to_string()].into();

    let window = requested_window(Some("20250625T0000"), Some("20250630T2359")).unwrap();
    let dense = densify(aggregate(&feed.feed, &targets).unwrap(), &targets, window);
    assert_eq!(dense.len(), 6);
    assert_eq!(dense[0].date.to_string(), "2025-06-25");
    assert_eq!(dense[5].date.to_string(), "2025-06-30");
    assert_eq!(dense.iter().map(|b| b.article_count).sum::<usize>(), 3);
}

#[test]
fn overall_sentiment_per_day() {
    let feed: NewsFeed = serde_json::from_str(FEED).unwrap();
    let days = daily_overall(&feed.feed).unwrap();

    assert_eq!(days.len(), 2);
    assert_eq!(days[0].date.to_string(), "2025-06-26");
    assert_eq!(days[0].article_count, 1);
    assert_eq!(days[1].article_count, 2);
    assert!((days[1].overall_sentiment_avg - 0.36).abs() < 1e-9);
}
