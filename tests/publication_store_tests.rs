//! Integration tests for publication storage, soft deletion, and search.

use chrono::NaiveDate;
use comunica_hub::models::{NotificationKind, NotificationPriority};
use comunica_hub::repositories::notification::NotificationDraft;
use comunica_hub::repositories::{
    NotificationRepository, PublicationRepository, SearchHistoryRepository,
};
use comunica_hub::notifier::NotificationDeriver;
use comunica_hub::repositories::search_history::NewSearchRun;
use comunica_hub::search::filter_publications;
use serde_json::json;

#[path = "test_utils/mod.rs"]
mod test_utils;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
}

#[tokio::test]
async fn upsert_is_idempotent_on_external_id() {
    let db = test_utils::setup_test_db().await.unwrap();

    let first = test_utils::insert_publication(&db, 42, "TJSP", date(10), None, "texto")
        .await
        .unwrap();
    let second = test_utils::insert_publication(&db, 42, "TJSP", date(10), None, "texto")
        .await
        .unwrap();

    assert!(first);
    assert!(!second);

    let repo = PublicationRepository::new(&db);
    let all = repo.all_active().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].external_id, 42);
}

#[tokio::test]
async fn date_range_listing_excludes_deleted_and_orders_newest_first() {
    let db = test_utils::setup_test_db().await.unwrap();
    test_utils::insert_publication(&db, 1, "TJSP", date(5), None, "a")
        .await
        .unwrap();
    test_utils::insert_publication(&db, 2, "TJSP", date(8), None, "b")
        .await
        .unwrap();
    test_utils::insert_publication(&db, 3, "TJSP", date(7), None, "c")
        .await
        .unwrap();

    let repo = PublicationRepository::new(&db);
    repo.soft_delete(3, Some("duplicada".to_string()))
        .await
        .unwrap();

    let tribunals = vec!["TJSP".to_string()];
    let rows = repo
        .find_by_date_range_and_tribunals(&tribunals, date(1), date(28), false)
        .await
        .unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.external_id).collect();
    assert_eq!(ids, vec![2, 1]);

    let rows = repo
        .find_by_date_range_and_tribunals(&tribunals, date(1), date(28), true)
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn soft_delete_twice_reports_not_found() {
    let db = test_utils::setup_test_db().await.unwrap();
    test_utils::insert_publication(&db, 7, "TJSP", date(10), None, "texto")
        .await
        .unwrap();

    let repo = PublicationRepository::new(&db);
    repo.soft_delete(7, None).await.unwrap();

    let err = repo.soft_delete(7, None).await.unwrap_err();
    assert!(matches!(
        err,
        comunica_hub::error::RepositoryError::NotFound(_)
    ));

    let missing = repo.soft_delete(999, None).await;
    assert!(missing.is_err());
}

#[tokio::test]
async fn get_by_external_id_resolves_deleted_rows_by_default() {
    let db = test_utils::setup_test_db().await.unwrap();
    test_utils::insert_publication(&db, 7, "TJSP", date(10), None, "texto")
        .await
        .unwrap();

    let repo = PublicationRepository::new(&db);
    repo.soft_delete(7, Some("limpeza".to_string())).await.unwrap();

    let found = repo.get_by_external_id(7, true).await.unwrap();
    assert!(found.is_some());
    let model = found.unwrap();
    assert!(model.deleted);
    assert_eq!(model.deleted_reason.as_deref(), Some("limpeza"));
    assert!(model.deleted_at.is_some());

    let hidden = repo.get_by_external_id(7, false).await.unwrap();
    assert!(hidden.is_none());
}

#[tokio::test]
async fn soft_delete_marks_correlated_notifications_read() {
    let db = test_utils::setup_test_db().await.unwrap();
    test_utils::insert_publication(&db, 50, "TJSP", date(10), None, "texto")
        .await
        .unwrap();

    let notifications = NotificationRepository::new(&db);
    notifications
        .create(NotificationDraft {
            kind: NotificationKind::Publication,
            priority: NotificationPriority::High,
            title: "Nova Publicação - TJSP".to_string(),
            message: "Processo: X".to_string(),
            link: None,
            source_external_id: Some(50),
            correlation_metadata: Some(json!({"externalId": 50})),
        })
        .await
        .unwrap();

    PublicationRepository::new(&db)
        .soft_delete(50, None)
        .await
        .unwrap();

    let all = notifications.list(false).await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].read);
    assert!(all[0].read_at.is_some());

    let unread = notifications.list(true).await.unwrap();
    assert!(unread.is_empty());
}

#[tokio::test]
async fn soft_delete_many_counts_only_active_rows() {
    let db = test_utils::setup_test_db().await.unwrap();
    for id in 1..=3 {
        test_utils::insert_publication(&db, id, "TJSP", date(10), None, "texto")
            .await
            .unwrap();
    }

    let repo = PublicationRepository::new(&db);
    repo.soft_delete(2, None).await.unwrap();

    let deleted = repo
        .soft_delete_many(&[1, 2, 3], Some("lote".to_string()))
        .await
        .unwrap();
    assert_eq!(deleted, 2);

    let err = repo.soft_delete_many(&[1, 2, 3], None).await;
    assert!(err.is_err());
}

#[tokio::test]
async fn soft_delete_all_truncates_the_run_ledger() {
    let db = test_utils::setup_test_db().await.unwrap();
    test_utils::insert_publication(&db, 1, "TJSP", date(10), None, "texto")
        .await
        .unwrap();

    let history = SearchHistoryRepository::new(&db);
    history
        .record(NewSearchRun {
            executed_at: chrono::Utc::now().into(),
            period_start: date(10),
            period_end: date(10),
            tribunals: vec!["TJSP".to_string()],
            total_found: 1,
            total_new: 1,
            duration_seconds: Some(0.5),
            run_parameters: json!({}),
        })
        .await
        .unwrap();

    let deleted = PublicationRepository::new(&db)
        .soft_delete_all(Some("reset".to_string()))
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    let (count, _) = history
        .list(
            20,
            0,
            comunica_hub::repositories::search_history::HistoryOrdering::default(),
            None,
        )
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn derivation_cutoff_is_inclusive_and_skips_older_rows() {
    let db = test_utils::setup_test_db().await.unwrap();
    test_utils::insert_publication(&db, 1, "TJSP", date(10), None, "texto antigo")
        .await
        .unwrap();
    test_utils::insert_publication(&db, 2, "TJSP", date(13), None, "texto no limite")
        .await
        .unwrap();
    test_utils::insert_publication(&db, 3, "TJSP", date(15), None, "texto recente")
        .await
        .unwrap();

    let stored = PublicationRepository::new(&db).all_active().await.unwrap();

    // Cutoff is Feb 13: the Feb 10 row is out, the cutoff-day row is in.
    let created = NotificationDeriver::new(&db)
        .derive(&stored, 7, date(20))
        .await
        .unwrap();
    assert_eq!(created, 2);

    let notifications = NotificationRepository::new(&db).list(false).await.unwrap();
    let mut ids: Vec<i64> = notifications
        .iter()
        .filter_map(|n| n.source_external_id)
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![2, 3]);
}

#[tokio::test]
async fn search_is_diacritic_insensitive_over_stored_rows() {
    let db = test_utils::setup_test_db().await.unwrap();
    test_utils::insert_publication(
        &db,
        1,
        "TJSP",
        date(10),
        None,
        "Intimação da advogada Vitória Rocha",
    )
    .await
    .unwrap();
    test_utils::insert_publication(&db, 2, "TJSP", date(10), None, "Despacho ordinário")
        .await
        .unwrap();

    let repo = PublicationRepository::new(&db);
    let active = repo.all_active().await.unwrap();

    let found = filter_publications(active.clone(), "vitoria");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].external_id, 1);

    let found = filter_publications(active, "DESPACHO");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].external_id, 2);
}

#[tokio::test]
async fn unformatted_process_number_search_finds_formatted_row() {
    let db = test_utils::setup_test_db().await.unwrap();
    test_utils::insert_publication(
        &db,
        1,
        "TJSP",
        date(10),
        Some("0000623-69.2026.8.26.0320"),
        "texto",
    )
    .await
    .unwrap();

    let repo = PublicationRepository::new(&db);
    let active = repo.all_active().await.unwrap();

    let found = filter_publications(active.clone(), "00006236920268260320");
    assert_eq!(found.len(), 1);

    // Formatted fragment still matches directly.
    let found = filter_publications(active.clone(), "0000623");
    assert_eq!(found.len(), 1);

    // Deleted rows drop out of the searchable set.
    repo.soft_delete(1, None).await.unwrap();
    let active = repo.all_active().await.unwrap();
    assert!(filter_publications(active, "0000623").is_empty());
}
