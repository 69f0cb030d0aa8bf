//! Test utilities for database and app testing.
//!
//! Sets up in-memory SQLite databases with migrations applied and builds the
//! axum app against a mock upstream source.

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use comunica_hub::comunica::PjeComunicaClient;
use comunica_hub::config::AppConfig;
use comunica_hub::migration::{Migrator, MigratorTrait};
use comunica_hub::normalization::PublicationDraft;
use comunica_hub::repositories::PublicationRepository;
use comunica_hub::server::AppState;
use sea_orm::{Database, DatabaseConnection};
use serde_json::json;

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Builds the application state against the given upstream base URL.
#[allow(dead_code)]
pub fn build_state(db: DatabaseConnection, source_base_url: &str) -> AppState {
    let config = AppConfig {
        oab_number: "507553".to_string(),
        advocate_name: "Vitoria Rocha".to_string(),
        source_api_base: source_base_url.to_string(),
        ..Default::default()
    };

    let source = Arc::new(
        PjeComunicaClient::new(config.source_api_base.clone(), config.source_timeout_seconds)
            .expect("client builds"),
    );

    AppState {
        config: Arc::new(config),
        db,
        source,
    }
}

/// Stores one publication fixture and returns whether it was newly created.
#[allow(dead_code)]
pub async fn insert_publication(
    db: &DatabaseConnection,
    external_id: i64,
    tribunal: &str,
    availability_date: NaiveDate,
    process_number: Option<&str>,
    full_text: &str,
) -> Result<bool> {
    let draft = PublicationDraft {
        external_id,
        process_number: process_number.map(str::to_string),
        tribunal: tribunal.to_string(),
        communication_type: "Intimação".to_string(),
        issuing_body: "2ª Vara Cível".to_string(),
        channel: "D".to_string(),
        availability_date: Some(availability_date),
        summary_text: full_text.chars().take(500).collect(),
        full_text: full_text.to_string(),
        official_link: None,
        content_hash: None,
        raw_source_payload: json!({ "id": external_id }),
    };

    let created = PublicationRepository::new(db)
        .upsert_if_new(&draft, availability_date)
        .await?;
    Ok(created)
}
