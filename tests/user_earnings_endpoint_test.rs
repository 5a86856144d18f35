use axum::http::StatusCode;
use booking_earnings::api;
use booking_earnings::currency::{CurrencyConverter, StaticRateSource};
use booking_earnings::db::{init_db, NewBooking, NewVenue};
use booking_earnings::domain::{BookingStatus, Currency, Rate, TimeMs, UserId};
use booking_earnings::engine::{EarningsEngine, PlatformRates, PromotionWindow};
use booking_earnings::{BookingCalculationService, Repository};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

const JUNE_2024: i64 = 1_717_200_000_000;
const JULY_2024: i64 = 1_719_792_000_000;

struct TestApp {
    app: axum::Router,
    venue_user: UserId,
    _temp: TempDir,
}

/// Two prime bookings for the same venue: 20000 USD in June, 10000 EUR in July.
async fn setup_test_app(source: StaticRateSource) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let venue_user = repo.insert_user("Venue Operator").await.unwrap();
    let concierge_user = repo.insert_user("Concierge").await.unwrap();
    let venue_id = repo
        .insert_venue(
            venue_user,
            &NewVenue {
                name: "Venue".to_string(),
                payout_venue: Some(Rate::parse_percent("60").unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let concierge_id = repo
        .insert_concierge(concierge_user, Some(Rate::parse_percent("10").unwrap()))
        .await
        .unwrap();

    let engine = EarningsEngine::new(
        PlatformRates::default(),
        PromotionWindow::new(TimeMs::new(0), TimeMs::new(1)),
    );
    let service = Arc::new(BookingCalculationService::new(repo.clone(), engine));

    for (currency, total_fee, booking_at) in
        [("USD", 20000, JUNE_2024), ("EUR", 10000, JULY_2024)]
    {
        let id = repo
            .insert_booking(&NewBooking {
                venue_id,
                concierge_id,
                partner_venue_id: None,
                partner_concierge_id: None,
                guest_count: 2,
                currency: Currency::from_str(currency).unwrap(),
                total_fee,
                is_prime: true,
                status: BookingStatus::Confirmed,
                booking_at: Some(TimeMs::new(booking_at)),
            })
            .await
            .unwrap();
        service.calculate_earnings(id).await.unwrap();
    }

    let converter = CurrencyConverter::new(Arc::new(source));
    let app = api::create_router(api::AppState::new(repo, service, converter));

    TestApp {
        app,
        venue_user,
        _temp: temp_dir,
    }
}

async fn request(app: axum::Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, content_type, body)
}

#[tokio::test]
async fn test_user_earnings_converts_totals_to_usd() {
    let source = StaticRateSource::new().with_rate("EUR", Decimal::from_str("0.5").unwrap());
    let test_app = setup_test_app(source).await;

    let (status, _, body) = request(
        test_app.app,
        &format!("/v1/users/{}/earnings", test_app.venue_user),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["userId"], test_app.venue_user.as_i64());
    assert_eq!(json["earnings"].as_array().unwrap().len(), 2);

    let totals = json["totals"].as_array().unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0]["currency"], "EUR");
    assert_eq!(totals[0]["amount"], 6000);
    assert_eq!(totals[0]["entryCount"], 1);
    assert_eq!(totals[1]["currency"], "USD");
    assert_eq!(totals[1]["amount"], 12000);

    // 6000 EUR at 0.5 EUR per USD is 12000 USD.
    assert_eq!(json["totalUsd"], 24000);
}

#[tokio::test]
async fn test_rate_outage_falls_back_to_one_to_one() {
    let test_app = setup_test_app(StaticRateSource::failing()).await;

    let (status, _, body) = request(
        test_app.app,
        &format!("/v1/users/{}/earnings", test_app.venue_user),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["totalUsd"], 18000);
}

#[tokio::test]
async fn test_user_earnings_window() {
    let test_app = setup_test_app(StaticRateSource::new()).await;

    let (status, _, body) = request(
        test_app.app.clone(),
        &format!(
            "/v1/users/{}/earnings?fromMs={}&toMs={}",
            test_app.venue_user,
            JUNE_2024,
            JULY_2024 - 1
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let earnings = json["earnings"].as_array().unwrap();
    assert_eq!(earnings.len(), 1);
    assert_eq!(earnings[0]["currency"], "USD");
    assert_eq!(json["totalUsd"], 12000);

    let (status, _, _) = request(
        test_app.app,
        &format!(
            "/v1/users/{}/earnings?fromMs=10&toMs=5",
            test_app.venue_user
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_user_has_no_earnings() {
    let test_app = setup_test_app(StaticRateSource::new()).await;

    let (status, _, body) = request(test_app.app, "/v1/users/999/earnings").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["earnings"].as_array().unwrap().is_empty());
    assert_eq!(json["totalUsd"], 0);
}

#[tokio::test]
async fn test_user_earnings_csv_export() {
    let test_app = setup_test_app(StaticRateSource::new()).await;

    let (status, content_type, body) = request(
        test_app.app,
        &format!("/v1/users/{}/earnings.csv", test_app.venue_user),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/csv"));

    let mut reader = csv::ReaderBuilder::new().from_reader(body.as_slice());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.get(2), Some("type"));
    assert_eq!(headers.get(4), Some("amount"));

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get(2), Some("venue"));
    assert_eq!(rows[0].get(4), Some("12000"));
    assert_eq!(rows[0].get(5), Some("USD"));
    assert_eq!(rows[1].get(4), Some("6000"));
    assert_eq!(rows[1].get(5), Some("EUR"));
}
