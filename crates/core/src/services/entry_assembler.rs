//! Hydration of ordered media IDs into feed entries.
//!
//! A page is assembled in three rounds regardless of its size: media with
//! their dishes, then every per-dish and per-media batch concurrently, then
//! one reaction aggregation. IDs that stopped resolving between discovery
//! and assembly are logged and dropped; the survivors keep input order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dishfeed_common::{AppResult, MediaUrlSigner, Metrics};
use dishfeed_db::entities::dish_media::MediaType;
use dishfeed_db::entities::reaction::{ActionType, TargetType};
use dishfeed_db::entities::{dish, dish_category, dish_media, restaurant};
use dishfeed_db::repositories::{ReviewStats, ReviewWithAuthor};
use futures::future::try_join_all;
use serde::Serialize;
use tracing::{debug, warn};

use super::reaction_aggregator::{ReactionAggregator, ReactionSummary, aggregation_failure, unique_ids};
use super::repositories::Repositories;

/// Restaurant part of an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantView {
    /// Restaurant ID.
    pub id: String,
    /// Restaurant name.
    pub name: String,
    /// Google Places identifier.
    pub google_place_id: Option<String>,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Cover image.
    pub image_url: Option<String>,
}

impl From<&restaurant::Model> for RestaurantView {
    fn from(r: &restaurant::Model) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            google_place_id: r.google_place_id.clone(),
            lat: r.lat,
            lng: r.lng,
            image_url: r.image_url.clone(),
        }
    }
}

/// Category of a dish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    /// Category ID.
    pub id: String,
    /// English label.
    pub label_en: String,
    /// Category artwork.
    pub image_url: Option<String>,
}

impl From<&dish_category::Model> for CategoryView {
    fn from(c: &dish_category::Model) -> Self {
        Self {
            id: c.id.clone(),
            label_en: c.label_en.clone(),
            image_url: c.image_url.clone(),
        }
    }
}

/// Dish part of an entry. Review statistics cover every review of the
/// dish, not only the embedded ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DishView {
    /// Dish ID.
    pub id: String,
    /// Dish name.
    pub name: String,
    /// Category, when it still exists.
    pub category: Option<CategoryView>,
    /// Number of reviews of the dish.
    pub review_count: i64,
    /// Mean rating; `None` without reviews.
    pub average_rating: Option<f64>,
}

/// Media part of an entry, with the viewer's flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaView {
    /// Media ID.
    pub id: String,
    /// Object path in the media bucket.
    pub media_path: String,
    /// Photo or video.
    pub media_type: MediaType,
    /// Thumbnail object path.
    pub thumbnail_path: Option<String>,
    /// Public URL of the media.
    pub media_url: String,
    /// Public URL of the thumbnail.
    pub thumbnail_url: Option<String>,
    /// Whether the viewer liked the media.
    pub is_liked: bool,
    /// Whether the viewer saved the media.
    pub is_saved: bool,
    /// Likes recorded in `dish_likes` only.
    pub like_count: u64,
    /// Upload time.
    pub created_at: DateTime<Utc>,
}

/// An embedded review, with the viewer's flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    /// Review ID.
    pub id: String,
    pub user_id: Option<String>,
    pub username: Option<String>,
    /// Review text.
    pub comment: String,
    /// Rating from 1 to 5.
    pub rating: i32,
    /// Price paid, in minor units.
    pub price_cents: Option<i32>,
    /// ISO 4217 currency code.
    pub currency_code: Option<String>,
    /// When the review was written.
    pub created_at: DateTime<Utc>,
    /// Whether the viewer liked the review.
    pub is_liked: bool,
    /// Likes on the review.
    pub like_count: u64,
}

/// A fully hydrated feed entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DishMediaEntry {
    /// Where the dish is served.
    pub restaurant: RestaurantView,
    /// The dish itself.
    pub dish: DishView,
    /// The photo or video.
    pub dish_media: MediaView,
    /// Newest reviews of the dish.
    pub dish_reviews: Vec<ReviewView>,
}

/// Hydrates media IDs into [`DishMediaEntry`] values.
#[derive(Clone)]
pub struct EntryAssembler {
    repos: Repositories,
    aggregator: ReactionAggregator,
    signer: Arc<dyn MediaUrlSigner>,
    metrics: Arc<Metrics>,
    review_limit: u64,
}

impl EntryAssembler {
    /// Create a new assembler embedding at most `review_limit` reviews per entry.
    #[must_use]
    pub fn new(
        repos: Repositories,
        signer: Arc<dyn MediaUrlSigner>,
        metrics: Arc<Metrics>,
        review_limit: u64,
    ) -> Self {
        let aggregator = ReactionAggregator::new(repos.reactions.clone(), metrics.clone());
        Self {
            repos,
            aggregator,
            signer,
            metrics,
            review_limit,
        }
    }

    /// Hydrate `media_ids` in order for `viewer_id`.
    ///
    /// The result is a subsequence of the input: IDs that no longer resolve
    /// are skipped, repeated IDs appear once.
    pub async fn assemble(
        &self,
        media_ids: &[String],
        viewer_id: Option<&str>,
    ) -> AppResult<Vec<DishMediaEntry>> {
        let ids = unique_ids(media_ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let pairs = self.repos.media.find_with_dish_by_ids(&ids).await?;
        let by_id: HashMap<String, (dish_media::Model, dish::Model)> = pairs
            .into_iter()
            .filter_map(|(media, dish)| dish.map(|dish| (media.id.clone(), (media, dish))))
            .collect();
        let resolved: Vec<&(dish_media::Model, dish::Model)> =
            ids.iter().filter_map(|id| by_id.get(id)).collect();

        let found_ids: Vec<String> = resolved.iter().map(|(m, _)| m.id.clone()).collect();
        let dish_ids = distinct(resolved.iter().map(|(_, d)| &d.id));
        let restaurant_ids = distinct(resolved.iter().map(|(_, d)| &d.restaurant_id));
        let category_ids = distinct(resolved.iter().map(|(_, d)| &d.category_id));

        let batches = self.load_batches(&found_ids, &dish_ids, &restaurant_ids, &category_ids, viewer_id);
        let signing = try_join_all(resolved.iter().map(|(media, _)| {
            self.signer
                .sign_media(&media.media_path, media.thumbnail_path.as_deref())
        }));
        let (batches, signed) = tokio::try_join!(batches, signing)?;

        let review_ids: Vec<String> = batches.reviews.iter().map(|r| r.id.clone()).collect();
        let summary = self
            .aggregator
            .aggregate(&found_ids, &review_ids, viewer_id)
            .await?;

        let mut reviews_by_dish: HashMap<&str, Vec<&ReviewWithAuthor>> = HashMap::new();
        for review in &batches.reviews {
            reviews_by_dish.entry(review.dish_id.as_str()).or_default().push(review);
        }

        let mut entries = Vec::with_capacity(resolved.len());
        for ((media, dish), urls) in resolved.into_iter().zip(signed) {
            let Some(restaurant) = batches.restaurants.get(&dish.restaurant_id) else {
                warn!(media_id = %media.id, restaurant_id = %dish.restaurant_id, "Dropping media whose restaurant no longer resolves");
                continue;
            };
            let stats = batches.stats.get(&dish.id);
            let reviews = reviews_by_dish
                .get(dish.id.as_str())
                .map(|list| list.iter().map(|r| review_view(r, &summary)).collect())
                .unwrap_or_default();

            entries.push(DishMediaEntry {
                restaurant: restaurant.into(),
                dish: DishView {
                    id: dish.id.clone(),
                    name: dish.name.clone(),
                    category: batches.categories.get(&dish.category_id).map(Into::into),
                    review_count: stats.map_or(0, |s| s.review_count),
                    average_rating: stats.and_then(|s| s.average_rating),
                },
                dish_media: MediaView {
                    id: media.id.clone(),
                    media_path: media.media_path.clone(),
                    media_type: media.media_type,
                    thumbnail_path: media.thumbnail_path.clone(),
                    media_url: urls.media_url,
                    thumbnail_url: urls.thumbnail_url,
                    // A like in either store counts while both are written.
                    is_liked: batches.viewer_likes.contains(&media.id)
                        || summary.has(TargetType::DishMedia, &media.id, ActionType::Like),
                    is_saved: summary.has(TargetType::DishMedia, &media.id, ActionType::Save),
                    like_count: batches.like_counts.get(&media.id).copied().unwrap_or(0),
                    created_at: media.created_at.with_timezone(&Utc),
                },
                dish_reviews: reviews,
            });
        }

        let gaps = ids.len() - entries.len();
        if gaps > 0 {
            let returned: HashSet<&str> = entries.iter().map(|e| e.dish_media.id.as_str()).collect();
            for id in ids.iter().filter(|id| !returned.contains(id.as_str())) {
                warn!(media_id = %id, "Media no longer resolves, skipped");
            }
            self.metrics.record_hydration_gaps(gaps);
        }

        debug!(
            requested = ids.len(),
            returned = entries.len(),
            anonymous = viewer_id.is_none(),
            "Assembled entries"
        );
        Ok(entries)
    }

    async fn load_batches(
        &self,
        media_ids: &[String],
        dish_ids: &[String],
        restaurant_ids: &[String],
        category_ids: &[String],
        viewer_id: Option<&str>,
    ) -> AppResult<Batches> {
        let stats = async {
            self.repos
                .reviews
                .stats_by_dishes(dish_ids)
                .await
                .map_err(aggregation_failure)
        };
        let like_counts = async {
            self.repos
                .likes
                .count_by_media(media_ids)
                .await
                .map_err(aggregation_failure)
        };
        let viewer_likes = async {
            match viewer_id {
                Some(viewer_id) => self
                    .repos
                    .likes
                    .find_liked_media_ids(viewer_id, media_ids)
                    .await
                    .map_err(aggregation_failure),
                None => Ok(HashSet::new()),
            }
        };

        let (restaurants, categories, reviews, stats, like_counts, viewer_likes) = tokio::try_join!(
            self.repos.restaurants.find_by_ids(restaurant_ids),
            self.repos.categories.find_by_ids(category_ids),
            self.repos.reviews.latest_by_dishes(dish_ids, self.review_limit),
            stats,
            like_counts,
            viewer_likes,
        )?;

        Ok(Batches {
            restaurants: restaurants.into_iter().map(|r| (r.id.clone(), r)).collect(),
            categories: categories.into_iter().map(|c| (c.id.clone(), c)).collect(),
            reviews,
            stats: stats.into_iter().map(|s| (s.dish_id.clone(), s)).collect(),
            like_counts,
            viewer_likes,
        })
    }
}

struct Batches {
    restaurants: HashMap<String, restaurant::Model>,
    categories: HashMap<String, dish_category::Model>,
    reviews: Vec<ReviewWithAuthor>,
    stats: HashMap<String, ReviewStats>,
    like_counts: HashMap<String, u64>,
    viewer_likes: HashSet<String>,
}

fn review_view(review: &ReviewWithAuthor, summary: &ReactionSummary) -> ReviewView {
    ReviewView {
        id: review.id.clone(),
        user_id: review.user_id.clone(),
        username: review.username.clone(),
        comment: review.comment.clone(),
        rating: review.rating,
        price_cents: review.price_cents,
        currency_code: review.currency_code.clone(),
        created_at: review.created_at.with_timezone(&Utc),
        is_liked: summary.has(TargetType::DishReviews, &review.id, ActionType::Like),
        like_count: summary.review_like_count(&review.id),
    }
}

fn distinct<'a>(ids: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).cloned().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{MockDbs, mock, signer};
    use chrono::Duration;
    use dishfeed_db::entities::dish_like;
    use dishfeed_db::test_utils::rows;
    use sea_orm::{DbErr, Value};
    use std::collections::BTreeMap;

    fn assembler(dbs: MockDbs, metrics: &Arc<Metrics>) -> EntryAssembler {
        EntryAssembler::new(dbs.into_repositories(metrics), signer(), metrics.clone(), 6)
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    /// m1 (dish d1, restaurant r1) and m3 (dish d3, restaurant r3) exist; m2
    /// was deleted after discovery.
    fn scripted(viewer: bool) -> MockDbs {
        let at = rows::epoch();
        let mut likes = mock().append_query_results([[rows::count("dish_media_id", "m1", 5)]]);
        if viewer {
            likes = likes.append_query_results([[rows::like("l1", "m3", "u1", at)]]);
        }
        let mut reactions = mock().append_query_results([[rows::count("target_id", "rv1", 2)]]);
        if viewer {
            reactions = reactions.append_query_results([[
                rows::reaction("x1", "u1", TargetType::DishMedia, "m1", ActionType::Like),
                rows::reaction("x2", "u1", TargetType::DishMedia, "m1", ActionType::Save),
                rows::reaction("x3", "u1", TargetType::DishReviews, "rv1", ActionType::Like),
            ]]);
        }

        MockDbs {
            media: mock().append_query_results([[
                (rows::media("m3", "d3", at + Duration::minutes(3)), rows::dish("d3", "r3", "c1")),
                (rows::media("m1", "d1", at + Duration::minutes(1)), rows::dish("d1", "r1", "c1")),
            ]]),
            restaurants: mock().append_query_results([[
                rows::restaurant("r1", 35.0, 139.0),
                rows::restaurant("r3", 35.001, 139.0),
            ]]),
            categories: mock().append_query_results([[rows::category("c1", "Ramen")]]),
            reviews: mock()
                .append_query_results([[rows::review("rv1", "d1", Some("alice"), 5)]])
                .append_query_results([[rows::review_stats("d1", 8, Some(4.1))]]),
            likes,
            reactions,
            ..MockDbs::default()
        }
    }

    #[tokio::test]
    async fn test_preserves_order_and_drops_missing() {
        let metrics = Arc::new(Metrics::new());
        let entries = assembler(scripted(true), &metrics)
            .assemble(&ids(&["m1", "m2", "m3"]), Some("u1"))
            .await
            .unwrap();

        let order: Vec<&str> = entries.iter().map(|e| e.dish_media.id.as_str()).collect();
        assert_eq!(order, vec!["m1", "m3"]);
        assert_eq!(metrics.snapshot().hydration_gaps, 1);
    }

    #[tokio::test]
    async fn test_viewer_flags_and_counts() {
        let metrics = Arc::new(Metrics::new());
        let entries = assembler(scripted(true), &metrics)
            .assemble(&ids(&["m1", "m2", "m3"]), Some("u1"))
            .await
            .unwrap();

        let m1 = &entries[0];
        assert!(m1.dish_media.is_liked, "reaction-table like");
        assert!(m1.dish_media.is_saved);
        assert_eq!(m1.dish_media.like_count, 5);
        assert_eq!(m1.dish.review_count, 8);
        assert_eq!(m1.dish.average_rating, Some(4.1));
        assert_eq!(m1.dish.category.as_ref().unwrap().label_en, "Ramen");
        assert_eq!(m1.dish_reviews.len(), 1);
        assert_eq!(m1.dish_reviews[0].username.as_deref(), Some("alice"));
        assert!(m1.dish_reviews[0].is_liked);
        assert_eq!(m1.dish_reviews[0].like_count, 2);
        assert_eq!(
            m1.dish_media.media_url,
            "https://cdn.example.com/dish-media/m1.jpg"
        );
        assert_eq!(
            m1.dish_media.thumbnail_url.as_deref(),
            Some("https://cdn.example.com/dish-media/m1_thumb.jpg")
        );

        let m3 = &entries[1];
        assert!(m3.dish_media.is_liked, "dish_likes like");
        assert!(!m3.dish_media.is_saved);
        assert_eq!(m3.dish_media.like_count, 0);
        assert_eq!(m3.dish.review_count, 0);
        assert_eq!(m3.dish.average_rating, None);
        assert!(m3.dish_reviews.is_empty());
    }

    #[tokio::test]
    async fn test_statement_count_is_constant() {
        let metrics = Arc::new(Metrics::new());
        assembler(scripted(true), &metrics)
            .assemble(&ids(&["m1", "m2", "m3"]), Some("u1"))
            .await
            .unwrap();

        // media, restaurants, categories, reviews, stats, like counts,
        // viewer likes, review like counts, viewer reactions
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.db_queries_total, 9);
        // only the reaction aggregator's own statements
        assert_eq!(snapshot.aggregation_queries, 2);
    }

    #[tokio::test]
    async fn test_anonymous_viewer_sees_no_flags() {
        let metrics = Arc::new(Metrics::new());
        let entries = assembler(scripted(false), &metrics)
            .assemble(&ids(&["m1", "m2", "m3"]), None)
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        for entry in &entries {
            assert!(!entry.dish_media.is_liked);
            assert!(!entry.dish_media.is_saved);
            assert!(entry.dish_reviews.iter().all(|r| !r.is_liked));
        }
        assert_eq!(entries[0].dish_media.like_count, 5);
        assert_eq!(entries[0].dish_reviews[0].like_count, 2);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.db_queries_total, 7);
        assert_eq!(snapshot.aggregation_queries, 1);
    }

    #[tokio::test]
    async fn test_nothing_resolves() {
        let metrics = Arc::new(Metrics::new());
        let dbs = MockDbs {
            media: mock().append_query_results([Vec::<(dish_media::Model, dish::Model)>::new()]),
            ..MockDbs::default()
        };

        let entries = assembler(dbs, &metrics)
            .assemble(&ids(&["gone"]), Some("u1"))
            .await
            .unwrap();

        assert!(entries.is_empty());
        assert_eq!(metrics.snapshot().hydration_gaps, 1);
        assert_eq!(metrics.snapshot().db_queries_total, 1);
    }

    #[tokio::test]
    async fn test_empty_input_issues_nothing() {
        let metrics = Arc::new(Metrics::new());
        let entries = assembler(MockDbs::default(), &metrics)
            .assemble(&[], None)
            .await
            .unwrap();
        assert!(entries.is_empty());
        assert_eq!(metrics.snapshot().db_queries_total, 0);
    }

    #[tokio::test]
    async fn test_failed_statistics_is_aggregation_failure() {
        let metrics = Arc::new(Metrics::new());
        let mut dbs = scripted(false);
        dbs.reviews = mock()
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .append_query_errors([DbErr::Custom("timeout".to_string())]);

        let result = assembler(dbs, &metrics)
            .assemble(&ids(&["m1"]), None)
            .await;

        assert!(matches!(
            result,
            Err(dishfeed_common::AppError::AggregationFailure(_))
        ));
    }

    #[test]
    fn test_entry_serializes_source_shape() {
        let entry = DishMediaEntry {
            restaurant: (&rows::restaurant("r1", 35.0, 139.0)).into(),
            dish: DishView {
                id: "d1".to_string(),
                name: "Shoyu".to_string(),
                category: None,
                review_count: 3,
                average_rating: Some(4.3),
            },
            dish_media: MediaView {
                id: "m1".to_string(),
                media_path: "dish-media/m1.jpg".to_string(),
                media_type: MediaType::Image,
                thumbnail_path: None,
                media_url: "https://cdn.example.com/dish-media/m1.jpg".to_string(),
                thumbnail_url: None,
                is_liked: true,
                is_saved: false,
                like_count: 7,
                created_at: rows::epoch(),
            },
            dish_reviews: Vec::new(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["dish"]["reviewCount"], 3);
        assert_eq!(json["dish_media"]["isLiked"], true);
        assert_eq!(json["dish_media"]["likeCount"], 7);
        assert_eq!(json["dish_media"]["mediaType"], "image");
        assert!(json["dish_reviews"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_like_rows_are_models() {
        // `rows::like` feeds `find_liked_media_ids`, which selects whole models.
        let like: dish_like::Model = rows::like("l1", "m1", "u1", rows::epoch());
        assert_eq!(like.dish_media_id, "m1");
    }
}
