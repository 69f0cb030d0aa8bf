//! Integration tests for the search-history API.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{NaiveDate, TimeZone, Utc};
use comunica_hub::repositories::SearchHistoryRepository;
use comunica_hub::repositories::search_history::NewSearchRun;
use comunica_hub::server::create_app;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::MockServer;

#[path = "test_utils/mod.rs"]
mod test_utils;

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn seed_run(
    db: &DatabaseConnection,
    day: u32,
    tribunals: &[&str],
    total_found: i32,
    duration: f64,
) -> uuid::Uuid {
    let date = NaiveDate::from_ymd_opt(2026, 2, day).unwrap();
    let executed = Utc
        .with_ymd_and_hms(2026, 2, day, 12, 0, 0)
        .unwrap()
        .into();
    let run = SearchHistoryRepository::new(db)
        .record(NewSearchRun {
            executed_at: executed,
            period_start: date,
            period_end: date,
            tribunals: tribunals.iter().map(|t| t.to_string()).collect(),
            total_found,
            total_new: total_found,
            duration_seconds: Some(duration),
            run_parameters: json!({"queriesPerTribunal": 2}),
        })
        .await
        .unwrap();
    run.id
}

#[tokio::test]
async fn listing_paginates_with_count_and_cursors() {
    let server = MockServer::start().await;
    let db = test_utils::setup_test_db().await.unwrap();
    for day in 1..=15 {
        seed_run(&db, day, &["TJSP"], day as i32, day as f64).await;
    }
    let app = create_app(test_utils::build_state(db, &server.uri()));

    // Default page size covers everything.
    let (status, body) = get_json(&app, "/history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(15));
    assert_eq!(body["next"], Value::Null);
    assert_eq!(body["previous"], Value::Null);
    assert_eq!(body["results"].as_array().unwrap().len(), 15);

    // Middle page carries both cursors.
    let (_, body) = get_json(&app, "/history?limit=5&offset=10").await;
    assert_eq!(body["count"], json!(15));
    assert_eq!(body["next"], Value::Null);
    assert_eq!(body["previous"], json!(5));
    assert_eq!(body["results"].as_array().unwrap().len(), 5);

    let (_, body) = get_json(&app, "/history?limit=5").await;
    assert_eq!(body["next"], json!(5));
    assert_eq!(body["previous"], Value::Null);
}

#[tokio::test]
async fn oversized_limit_is_clamped_not_rejected() {
    let server = MockServer::start().await;
    let db = test_utils::setup_test_db().await.unwrap();
    for i in 0..105u32 {
        seed_run(&db, (i % 28) + 1, &["TJSP"], i as i32, 1.0).await;
    }
    let app = create_app(test_utils::build_state(db, &server.uri()));

    let (status, body) = get_json(&app, "/history?limit=500").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(105));
    assert_eq!(body["results"].as_array().unwrap().len(), 100);
    assert_eq!(body["next"], json!(100));

    // A zero limit is raised to the minimum page size, not rejected.
    let (status, body) = get_json(&app, "/history?limit=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn listing_orders_by_requested_key() {
    let server = MockServer::start().await;
    let db = test_utils::setup_test_db().await.unwrap();
    seed_run(&db, 1, &["TJSP"], 30, 1.0).await;
    seed_run(&db, 2, &["TJSP"], 10, 3.0).await;
    seed_run(&db, 3, &["TJSP"], 20, 2.0).await;
    let app = create_app(test_utils::build_state(db, &server.uri()));

    // Default: newest first.
    let (_, body) = get_json(&app, "/history").await;
    let days: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["period_start"].as_str().unwrap())
        .collect();
    assert_eq!(days, vec!["2026-02-03", "2026-02-02", "2026-02-01"]);

    let (_, body) = get_json(&app, "/history?order_by=total_found").await;
    let found: Vec<i64> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["total_found"].as_i64().unwrap())
        .collect();
    assert_eq!(found, vec![10, 20, 30]);

    let (_, body) = get_json(&app, "/history?order_by=-duration_seconds").await;
    let durations: Vec<f64> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["duration_seconds"].as_f64().unwrap())
        .collect();
    assert_eq!(durations, vec![3.0, 2.0, 1.0]);

    // Unknown ordering silently falls back to newest first.
    let (status, body) = get_json(&app, "/history?order_by=bogus").await;
    assert_eq!(status, StatusCode::OK);
    let days: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["period_start"].as_str().unwrap())
        .collect();
    assert_eq!(days, vec!["2026-02-03", "2026-02-02", "2026-02-01"]);
}

#[tokio::test]
async fn text_query_restricts_runs_to_matching_publications() {
    let server = MockServer::start().await;
    let db = test_utils::setup_test_db().await.unwrap();

    // Run 1 covers the publication's tribunal and date; run 2 is a different
    // tribunal, run 3 a different date.
    seed_run(&db, 10, &["TJSP", "TRF3"], 1, 1.0).await;
    seed_run(&db, 10, &["TRT2"], 0, 1.0).await;
    seed_run(&db, 20, &["TJSP"], 0, 1.0).await;

    test_utils::insert_publication(
        &db,
        100,
        "TJSP",
        NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
        Some("1003498-11.2021.8.26.0533"),
        "Intimação da advogada Vitória Rocha",
    )
    .await
    .unwrap();

    let app = create_app(test_utils::build_state(db, &server.uri()));

    let (status, body) = get_json(&app, "/history?q=vitoria").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));
    let run = &body["results"][0];
    assert_eq!(run["period_start"], json!("2026-02-10"));
    assert_eq!(run["tribunals"], json!(["TJSP", "TRF3"]));

    // No matching publication means no runs at all.
    let (_, body) = get_json(&app, "/history?q=inexistente").await;
    assert_eq!(body["count"], json!(0));
    assert_eq!(body["results"].as_array().unwrap().len(), 0);

    // Process-number query correlates the same way.
    let (_, body) = get_json(&app, "/history?q=1003498").await;
    assert_eq!(body["count"], json!(1));
}

#[tokio::test]
async fn detail_returns_run_with_live_publications() {
    let server = MockServer::start().await;
    let db = test_utils::setup_test_db().await.unwrap();

    let run_id = seed_run(&db, 10, &["TJSP"], 2, 1.0).await;
    let date = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
    test_utils::insert_publication(&db, 1, "TJSP", date, None, "texto um")
        .await
        .unwrap();
    test_utils::insert_publication(&db, 2, "TJSP", date, None, "texto dois")
        .await
        .unwrap();
    // Out of scope: wrong tribunal.
    test_utils::insert_publication(&db, 3, "TRF3", date, None, "texto três")
        .await
        .unwrap();

    let app = create_app(test_utils::build_state(db, &server.uri()));

    let (status, body) = get_json(&app, &format!("/history/{}", run_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!(run_id.to_string()));
    assert_eq!(body["publications"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn detail_of_unknown_run_is_not_found() {
    let server = MockServer::start().await;
    let db = test_utils::setup_test_db().await.unwrap();
    let app = create_app(test_utils::build_state(db, &server.uri()));

    let (status, body) =
        get_json(&app, &format!("/history/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn clear_empties_the_ledger() {
    let server = MockServer::start().await;
    let db = test_utils::setup_test_db().await.unwrap();
    seed_run(&db, 1, &["TJSP"], 1, 1.0).await;
    seed_run(&db, 2, &["TJSP"], 1, 1.0).await;
    let app = create_app(test_utils::build_state(db, &server.uri()));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, body) = get_json(&app, "/history").await;
    assert_eq!(body["count"], json!(0));
}
