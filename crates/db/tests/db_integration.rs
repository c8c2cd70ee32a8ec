//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored --test-threads=1`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `dishfeed_test`)
//!   `TEST_DB_PASSWORD` (default: `dishfeed_test`)
//!   `TEST_DB_NAME` (default: `dishfeed_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use dishfeed_common::{GeoPoint, Metrics};
use dishfeed_db::repositories::{
    DiscoveryFilter, DiscoveryOrder, DishLikeRepository, DishMediaRepository, DishReviewRepository,
    ReactionRepository, TimeBound,
};
use dishfeed_db::entities::reaction::{ActionType, TargetType};
use dishfeed_db::test_utils::{Fixtures, TestDatabase, TestDbConfig};
use sea_orm::DatabaseConnection;

async fn setup() -> (TestDatabase, Arc<DatabaseConnection>) {
    let db = TestDatabase::new().await.expect("Failed to connect");
    db.cleanup().await.expect("Failed to clean");
    let conn = Arc::new(
        sea_orm::Database::connect(&db.config.database_url())
            .await
            .expect("Failed to open second connection"),
    );
    (db, conn)
}

/// Three restaurants inside 1 km of (35.0, 139.0) and two outside.
async fn seed_neighbourhood(fx: &Fixtures<'_>) {
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    fx.category("c1", "Ramen").await.unwrap();

    let places = [
        ("near1", 35.001, 139.0),
        ("near2", 35.0, 139.004),
        ("near3", 34.996, 138.998),
        ("far1", 35.05, 139.0),
        ("far2", 35.0, 139.2),
    ];
    for (i, (id, lat, lng)) in places.iter().enumerate() {
        fx.restaurant(id, *lat, *lng).await.unwrap();
        let dish = format!("d-{id}");
        fx.dish(&dish, id, "c1").await.unwrap();
        fx.media(&format!("m-{id}"), &dish, base + Duration::minutes(i as i64))
            .await
            .unwrap();
    }
}

fn nearby(order: DiscoveryOrder, limit: u64) -> DiscoveryFilter {
    DiscoveryFilter {
        origin: GeoPoint::new(35.0, 139.0).unwrap(),
        radius_m: 1000.0,
        category_id: None,
        viewer_id: None,
        order,
        limit,
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_discovery_returns_only_in_range_newest_first() {
    let (db, conn) = setup().await;
    let fx = Fixtures::new(db.connection());
    seed_neighbourhood(&fx).await;

    let repo = DishMediaRepository::new(conn, Arc::new(Metrics::new()));
    let rows = repo
        .discover(&nearby(DiscoveryOrder::Newest { before: None }, 10))
        .await
        .unwrap();

    let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["m-near3", "m-near2", "m-near1"]);
    for row in &rows {
        assert!(row.distance_m <= 1000.0);
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_discovery_keeps_latest_media_per_dish() {
    let (db, conn) = setup().await;
    let fx = Fixtures::new(db.connection());
    seed_neighbourhood(&fx).await;
    let later = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
    fx.media("m-near1-new", "d-near1", later).await.unwrap();

    let repo = DishMediaRepository::new(conn, Arc::new(Metrics::new()));
    let rows = repo
        .discover(&nearby(DiscoveryOrder::Newest { before: None }, 10))
        .await
        .unwrap();

    let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids[0], "m-near1-new");
    assert!(!ids.contains(&"m-near1"));
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_discovery_excludes_seen_for_viewer() {
    let (db, conn) = setup().await;
    let fx = Fixtures::new(db.connection());
    seed_neighbourhood(&fx).await;
    fx.user("u1", "viewer").await.unwrap();

    let metrics = Arc::new(Metrics::new());
    dishfeed_db::repositories::UserSeenRepository::new(conn.clone(), metrics.clone())
        .mark_seen("u1", &[("s1".to_string(), "m-near2".to_string())])
        .await
        .unwrap();

    let repo = DishMediaRepository::new(conn, metrics);
    let mut filter = nearby(DiscoveryOrder::Newest { before: None }, 10);
    filter.viewer_id = Some("u1".to_string());
    let ids: Vec<_> = repo
        .discover(&filter)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();

    assert_eq!(ids, vec!["m-near3".to_string(), "m-near1".to_string()]);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_distance_pages_do_not_overlap() {
    let (db, conn) = setup().await;
    let fx = Fixtures::new(db.connection());
    seed_neighbourhood(&fx).await;

    let repo = DishMediaRepository::new(conn, Arc::new(Metrics::new()));
    let mut seen = HashSet::new();
    let mut after = None;
    let mut last_distance = 0.0;
    loop {
        let rows = repo
            .discover(&nearby(DiscoveryOrder::Nearest { after: after.clone() }, 1))
            .await
            .unwrap();
        let Some(row) = rows.last() else { break };
        assert!(row.distance_m >= last_distance);
        assert!(seen.insert(row.id.clone()), "duplicate {}", row.id);
        last_distance = row.distance_m;
        after = Some((row.distance_m, Some(row.id.clone())));
    }
    assert_eq!(seen.len(), 3);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_ranked_feed_breaks_ties_by_id() {
    let (db, conn) = setup().await;
    let fx = Fixtures::new(db.connection());
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    fx.category("c1", "Ramen").await.unwrap();
    fx.restaurant("r1", 35.0, 139.0).await.unwrap();
    for dish in ["da", "db", "dc"] {
        fx.dish(dish, "r1", "c1").await.unwrap();
    }
    fx.media("ma", "da", at).await.unwrap();
    fx.media("mb", "db", at).await.unwrap();
    fx.media("mc", "dc", at).await.unwrap();
    for i in 0..5 {
        let user = format!("u{i}");
        fx.user(&user, &user).await.unwrap();
        fx.like(&format!("la{i}"), "ma", &user).await.unwrap();
        fx.like(&format!("lb{i}"), "mb", &user).await.unwrap();
    }

    let repo = DishMediaRepository::new(conn, Arc::new(Metrics::new()));
    let first = repo.ranked_for_restaurant("r1", None, 1).await.unwrap();
    assert_eq!(first[0].id, "mb");
    assert_eq!(first[0].like_count, 5);

    let second = repo
        .ranked_for_restaurant("r1", Some((5, "mb")), 1)
        .await
        .unwrap();
    assert_eq!(second[0].id, "ma");

    let third = repo
        .ranked_for_restaurant("r1", Some((5, "ma")), 5)
        .await
        .unwrap();
    assert_eq!(third.len(), 1);
    assert_eq!(third[0].id, "mc");
    assert_eq!(third[0].like_count, 0);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_ranked_feed_keeps_most_liked_media_per_dish() {
    let (db, conn) = setup().await;
    let fx = Fixtures::new(db.connection());
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    fx.category("c1", "Ramen").await.unwrap();
    fx.restaurant("r1", 35.0, 139.0).await.unwrap();
    for dish in ["da", "db", "dc"] {
        fx.dish(dish, "r1", "c1").await.unwrap();
    }
    let media = [
        ("ma0", "da", 0),
        ("ma1", "da", 3),
        ("ma2", "da", 1),
        ("mb0", "db", 2),
        ("mb1", "db", 2),
        ("mc0", "dc", 0),
    ];
    for i in 0..3 {
        let user = format!("u{i}");
        fx.user(&user, &user).await.unwrap();
    }
    for (id, dish, likes) in media {
        fx.media(id, dish, at).await.unwrap();
        for i in 0..likes {
            fx.like(&format!("l-{id}-{i}"), id, &format!("u{i}"))
                .await
                .unwrap();
        }
    }

    let repo = DishMediaRepository::new(conn, Arc::new(Metrics::new()));
    let mut chain = Vec::new();
    let mut after: Option<(i64, String)> = None;
    loop {
        let rows = repo
            .ranked_for_restaurant("r1", after.as_ref().map(|(c, id)| (*c, id.as_str())), 1)
            .await
            .unwrap();
        let Some(row) = rows.into_iter().next() else { break };
        after = Some((row.like_count, row.id.clone()));
        chain.push((row.id, row.like_count));
    }

    assert_eq!(
        chain,
        vec![
            ("ma1".to_string(), 3),
            ("mb1".to_string(), 2),
            ("mc0".to_string(), 0)
        ]
    );
}

/// Three dishes whose latest media share one timestamp, plus one newer and
/// one older dish, all at the same restaurant.
async fn seed_tied_timestamps(fx: &Fixtures<'_>) {
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    fx.category("c1", "Ramen").await.unwrap();
    fx.restaurant("r1", 35.0, 139.0).await.unwrap();
    let media = [
        ("m_old", at - Duration::hours(1)),
        ("m_da", at),
        ("m_db", at),
        ("m_dc", at),
        ("m_new", at + Duration::hours(1)),
    ];
    for (id, created_at) in media {
        let dish = format!("d-{id}");
        fx.dish(&dish, "r1", "c1").await.unwrap();
        fx.media(id, &dish, created_at).await.unwrap();
    }
}

async fn walk_by_time(repo: &DishMediaRepository, newest: bool) -> Vec<String> {
    let mut ids = Vec::new();
    let mut bound: Option<TimeBound> = None;
    loop {
        let order = if newest {
            DiscoveryOrder::Newest { before: bound.clone() }
        } else {
            DiscoveryOrder::Oldest { after: bound.clone() }
        };
        let rows = repo.discover(&nearby(order, 1)).await.unwrap();
        let Some(row) = rows.into_iter().next() else { break };
        assert!(!ids.contains(&row.id), "duplicate {}", row.id);
        bound = Some(TimeBound {
            at: row.created_at.with_timezone(&Utc),
            id: Some(row.id.clone()),
        });
        ids.push(row.id);
    }
    ids
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_time_pages_keep_tied_rows() {
    let (db, conn) = setup().await;
    let fx = Fixtures::new(db.connection());
    seed_tied_timestamps(&fx).await;

    let repo = DishMediaRepository::new(conn, Arc::new(Metrics::new()));

    assert_eq!(
        walk_by_time(&repo, true).await,
        vec!["m_new", "m_dc", "m_db", "m_da", "m_old"]
    );
    assert_eq!(
        walk_by_time(&repo, false).await,
        vec!["m_old", "m_da", "m_db", "m_dc", "m_new"]
    );
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_like_is_dual_written_and_idempotent() {
    let (db, conn) = setup().await;
    let fx = Fixtures::new(db.connection());
    seed_neighbourhood(&fx).await;
    fx.user("u1", "viewer").await.unwrap();

    let metrics = Arc::new(Metrics::new());
    let likes = DishLikeRepository::new(conn.clone(), metrics.clone());
    assert!(likes.like("u1", "m-near1", "l1", "rx1").await.unwrap());
    assert!(!likes.like("u1", "m-near1", "l2", "rx2").await.unwrap());

    let counts = likes.count_by_media(&["m-near1".to_string()]).await.unwrap();
    assert_eq!(counts.get("m-near1"), Some(&1));

    let reactions = ReactionRepository::new(conn, metrics)
        .find_by_user_and_targets("u1", &["m-near1".to_string()])
        .await
        .unwrap();
    assert_eq!(reactions.len(), 1);
    assert_eq!(reactions[0].target_type, TargetType::DishMedia);
    assert_eq!(reactions[0].action_type, ActionType::Like);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_review_stats_cover_all_reviews() {
    let (db, conn) = setup().await;
    let fx = Fixtures::new(db.connection());
    seed_neighbourhood(&fx).await;
    for (i, rating) in [5, 4, 4, 3, 5, 4, 2, 5].iter().enumerate() {
        fx.review(&format!("rv{i}"), "d-near1", None, *rating)
            .await
            .unwrap();
    }

    let repo = DishReviewRepository::new(conn, Arc::new(Metrics::new()));
    let stats = repo.stats_by_dishes(&["d-near1".to_string()]).await.unwrap();
    assert_eq!(stats[0].review_count, 8);
    assert_eq!(stats[0].average_rating, Some(4.0));

    let embedded = repo
        .latest_by_dishes(&["d-near1".to_string()], 6)
        .await
        .unwrap();
    assert_eq!(embedded.len(), 6);
    assert_eq!(embedded[0].username.as_deref(), Some("imported"));
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(config.database_url().starts_with("postgres://"));
}
