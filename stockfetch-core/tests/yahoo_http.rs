//! Yahoo provider against a local mock server: status mapping, breaker
//! feedback and response parsing over real HTTP.

use chrono::NaiveDate;
use mockito::{Matcher, Server};
use std::sync::Arc;
use std::time::Duration;
use stockfetch_core::data::{
    BackoffPolicy, BatchFetcher, CircuitBreaker, DataError, DataProvider, FetchError,
    FetchOptions, FetchRequest, FetchResult, RateLimiter, RetryPolicy, YahooProvider,
};
use stockfetch_core::domain::{Interval, Ticker, TickerList};

const AAPL_DAILY: &str = r#"{"chart":{"result":[{
    "meta":{"symbol":"AAPL","gmtoffset":-18000},
    "timestamp":[1704205800,1704292200],
    "indicators":{"quote":[{
        "open":[187.15,184.22],
        "high":[188.44,185.88],
        "low":[183.89,183.43],
        "close":[185.64,184.25],
        "volume":[82488700,58414500]
    }]}
}],"error":null}}"#;

const NOT_FOUND: &str = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;

fn provider(server: &Server, breaker: Arc<CircuitBreaker>) -> YahooProvider {
    YahooProvider::with_base_url(breaker, &server.url(), Duration::from_secs(5)).unwrap()
}

fn request(symbol: &str) -> FetchRequest {
    FetchRequest {
        ticker: Ticker::new(symbol).unwrap(),
        interval: Interval::D1,
        start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
    }
}

fn chart_path(symbol: &str) -> Matcher {
    Matcher::Regex(format!(r"^/v8/finance/chart/{symbol}(\?.*)?$"))
}

#[test]
fn ok_response_yields_bars() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", chart_path("AAPL"))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("interval".into(), "1d".into()),
            Matcher::UrlEncoded("includePrePost".into(), "false".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(AAPL_DAILY)
        .create();

    let breaker = Arc::new(CircuitBreaker::default_provider());
    let bars = provider(&server, breaker).fetch(&request("AAPL")).unwrap();

    mock.assert();
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].label(Interval::D1), "2024-01-02");
    assert!((bars[1].close - 184.25).abs() < 1e-9);
}

#[test]
fn http_404_is_symbol_not_found() {
    let mut server = Server::new();
    server
        .mock("GET", chart_path("ZZZZINVALID"))
        .with_status(404)
        .with_body(NOT_FOUND)
        .create();

    let breaker = Arc::new(CircuitBreaker::default_provider());
    let err = provider(&server, breaker)
        .fetch(&request("ZZZZINVALID"))
        .unwrap_err();
    assert_eq!(
        err,
        DataError::SymbolNotFound {
            symbol: "ZZZZINVALID".into()
        }
    );
    assert!(!err.is_transient());
}

#[test]
fn http_429_is_rate_limited_with_retry_after() {
    let mut server = Server::new();
    server
        .mock("GET", chart_path("AAPL"))
        .with_status(429)
        .with_header("retry-after", "7")
        .create();

    let breaker = Arc::new(CircuitBreaker::default_provider());
    let err = provider(&server, breaker).fetch(&request("AAPL")).unwrap_err();
    assert_eq!(err, DataError::RateLimited { retry_after_secs: 7 });
    assert!(err.is_transient());
}

#[test]
fn http_503_is_transient_server_error() {
    let mut server = Server::new();
    server.mock("GET", chart_path("AAPL")).with_status(503).create();

    let breaker = Arc::new(CircuitBreaker::default_provider());
    let err = provider(&server, breaker).fetch(&request("AAPL")).unwrap_err();
    assert_eq!(err, DataError::ServerError { status: 503 });
}

#[test]
fn http_403_trips_breaker_and_stops_requests() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", chart_path("AAPL"))
        .with_status(403)
        .expect(1)
        .create();

    let breaker = Arc::new(CircuitBreaker::default_provider());
    let yahoo = provider(&server, breaker.clone());

    assert_eq!(
        yahoo.fetch(&request("AAPL")).unwrap_err(),
        DataError::CircuitBreakerTripped
    );
    assert!(!yahoo.is_available());
    assert!(breaker.remaining_cooldown() > Duration::ZERO);
    // refused locally, the server sees no second request
    assert_eq!(
        yahoo.fetch(&request("AAPL")).unwrap_err(),
        DataError::CircuitBreakerTripped
    );
    mock.assert();
}

#[test]
fn batch_over_http_exhausts_retries_on_server_errors() {
    let mut server = Server::new();
    let failing = server
        .mock("GET", chart_path("AAPL"))
        .with_status(502)
        .expect(2)
        .create();

    let breaker = Arc::new(CircuitBreaker::default_provider());
    let yahoo = provider(&server, breaker);
    let limiter = RateLimiter::unlimited();
    let options = FetchOptions {
        retry: RetryPolicy {
            max_retries: 1,
            backoff: BackoffPolicy::none(),
        },
        workers: 1,
    };

    let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
    let batch = BatchFetcher::new(&yahoo, &limiter)
        .with_options(options)
        .fetch_all(
            &TickerList::parse_csv("AAPL").unwrap(),
            Interval::D1,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            today,
            today,
        );

    failing.assert();
    assert_eq!(
        batch.get("AAPL"),
        Some(&FetchResult::Failed(FetchError::ExhaustedRetries {
            attempts: 2,
            last: DataError::ServerError { status: 502 },
        }))
    );
}
