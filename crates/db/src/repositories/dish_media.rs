//! Dish media repository.
//!
//! Hosts the two candidate queries behind the feeds: radius discovery over
//! the latest media of each dish, and the engagement-ranked restaurant feed
//! over the most-liked media of each dish.

use std::sync::Arc;

use dishfeed_common::{AppResult, GeoPoint, Metrics, Timer};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QuerySelect, prelude::DateTimeWithTimeZone,
};
use tracing::debug;

use super::{TimeBound, observe};
use crate::entities::{DishMedia, dish, dish_media};
use crate::query::{SqlParams, TopNPerGroup, haversine_sql};

/// Ordering of a discovery page together with its exclusive lower bound.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryOrder {
    /// Newest first; only rows that sort strictly after `before`.
    Newest {
        /// Bound from the previous page.
        before: Option<TimeBound>,
    },
    /// Oldest first; only rows that sort strictly after `after`.
    Oldest {
        /// Bound from the previous page.
        after: Option<TimeBound>,
    },
    /// Nearest first; only rows strictly farther than `after`.
    Nearest {
        /// Distance in meters and tie-break media ID of the previous page's last row.
        after: Option<(f64, Option<String>)>,
    },
}

/// Radius discovery parameters.
#[derive(Debug, Clone)]
pub struct DiscoveryFilter {
    /// Search center.
    pub origin: GeoPoint,
    /// Search radius in meters.
    pub radius_m: f64,
    /// Restrict to dishes of this category.
    pub category_id: Option<String>,
    /// Exclude media this user has already seen.
    pub viewer_id: Option<String>,
    /// Sort key and cursor bound.
    pub order: DiscoveryOrder,
    /// Maximum rows to return.
    pub limit: u64,
}

/// A discovery candidate.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct DiscoveryRow {
    /// Dish media ID.
    pub id: String,
    /// Creation time of the media.
    pub created_at: DateTimeWithTimeZone,
    /// Great-circle distance from the search center.
    pub distance_m: f64,
}

/// A ranked restaurant feed candidate.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct RankedRow {
    /// Dish media ID.
    pub id: String,
    /// Rows in `dish_likes` for this media.
    pub like_count: i64,
}

/// Dish media repository for database operations.
#[derive(Clone)]
pub struct DishMediaRepository {
    db: Arc<DatabaseConnection>,
    metrics: Arc<Metrics>,
}

impl DishMediaRepository {
    /// Create a new dish media repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, metrics: Arc<Metrics>) -> Self {
        Self { db, metrics }
    }

    /// Find a dish media row by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<dish_media::Model>> {
        let timer = Timer::start();
        let result = DishMedia::find_by_id(id).one(self.db.as_ref()).await;
        observe(&self.metrics, &timer, result)
    }

    /// Return the subset of `ids` that exist.
    pub async fn find_existing_ids(&self, ids: &[String]) -> AppResult<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        #[derive(FromQueryResult)]
        struct IdRow {
            id: String,
        }

        let timer = Timer::start();
        let result = DishMedia::find()
            .select_only()
            .column(dish_media::Column::Id)
            .filter(dish_media::Column::Id.is_in(ids.iter().cloned()))
            .into_model::<IdRow>()
            .all(self.db.as_ref())
            .await;

        Ok(observe(&self.metrics, &timer, result)?
            .into_iter()
            .map(|r| r.id)
            .collect())
    }

    /// Fetch media rows with their dish in one query. Order is unspecified.
    pub async fn find_with_dish_by_ids(
        &self,
        ids: &[String],
    ) -> AppResult<Vec<(dish_media::Model, Option<dish::Model>)>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let timer = Timer::start();
        let result = DishMedia::find()
            .filter(dish_media::Column::Id.is_in(ids.iter().cloned()))
            .find_also_related(crate::entities::Dish)
            .all(self.db.as_ref())
            .await;
        observe(&self.metrics, &timer, result)
    }

    /// Latest media of every dish within the radius, ordered and bounded per
    /// `filter.order`.
    pub async fn discover(&self, filter: &DiscoveryFilter) -> AppResult<Vec<DiscoveryRow>> {
        let statement = discovery_statement(filter);
        debug!(
            origin = %filter.origin,
            radius_m = filter.radius_m,
            limit = filter.limit,
            "Running discovery query"
        );

        let timer = Timer::start();
        let result = DiscoveryRow::find_by_statement(statement)
            .all(self.db.as_ref())
            .await;
        observe(&self.metrics, &timer, result)
    }

    /// Most-liked media of every dish of a restaurant, ordered by
    /// `(like_count DESC, id DESC)` and starting strictly after `after`.
    pub async fn ranked_for_restaurant(
        &self,
        restaurant_id: &str,
        after: Option<(i64, &str)>,
        limit: u64,
    ) -> AppResult<Vec<RankedRow>> {
        let statement = ranked_statement(restaurant_id, after, limit);

        let timer = Timer::start();
        let result = RankedRow::find_by_statement(statement)
            .all(self.db.as_ref())
            .await;
        observe(&self.metrics, &timer, result)
    }
}

/// Statement behind [`DishMediaRepository::discover`].
///
/// The bounding box and category narrow the window's source, so only dishes
/// of candidate restaurants are ranked.
#[must_use]
pub fn discovery_statement(filter: &DiscoveryFilter) -> sea_orm::Statement {
    let mut params = SqlParams::new();
    let lat = params.push(filter.origin.lat);
    let lng = params.push(filter.origin.lng);

    let bbox = filter.origin.bounding_box(filter.radius_m);
    let mut candidates = vec![format!(
        "r.lat BETWEEN {} AND {}",
        params.push(bbox.lat.0),
        params.push(bbox.lat.1)
    )];
    if let Some((min_lng, max_lng)) = bbox.lng {
        candidates.push(format!(
            "r.lng BETWEEN {} AND {}",
            params.push(min_lng),
            params.push(max_lng)
        ));
    }
    if let Some(category_id) = &filter.category_id {
        candidates.push(format!("d.category_id = {}", params.push(category_id.clone())));
    }

    let source = format!(
        "SELECT dm.id, dm.dish_id, dm.created_at, r.lat, r.lng \
         FROM dish_media dm \
         INNER JOIN dishes d ON d.id = dm.dish_id \
         INNER JOIN restaurants r ON r.id = d.restaurant_id \
         WHERE {}",
        candidates.join(" AND ")
    );
    let latest = TopNPerGroup {
        source: &source,
        partition_by: "src.dish_id",
        order_by: "src.created_at DESC, src.id DESC",
        n: 1,
    }
    .to_sql();
    let distance = haversine_sql(&lat, &lng, "latest.lat", "latest.lng");

    let unseen = match &filter.viewer_id {
        Some(viewer_id) => format!(
            "WHERE NOT EXISTS (SELECT 1 FROM user_seen_dish_media s \
             WHERE s.dish_media_id = latest.id AND s.user_id = {})",
            params.push(viewer_id.clone())
        ),
        None => String::new(),
    };

    let mut outer = vec![format!("c.distance_m <= {}", params.push(filter.radius_m))];
    let order_by = match &filter.order {
        DiscoveryOrder::Newest { before } => {
            if let Some(bound) = before {
                outer.push(time_predicate(&mut params, bound, '<'));
            }
            "c.created_at DESC, c.id DESC"
        }
        DiscoveryOrder::Oldest { after } => {
            if let Some(bound) = after {
                outer.push(time_predicate(&mut params, bound, '>'));
            }
            "c.created_at ASC, c.id ASC"
        }
        DiscoveryOrder::Nearest { after } => {
            match after {
                Some((meters, Some(id))) => {
                    let d = params.push(*meters);
                    let id = params.push(id.clone());
                    outer.push(format!(
                        "(c.distance_m > {d} OR (c.distance_m = {d} AND c.id > {id}))"
                    ));
                }
                Some((meters, None)) => {
                    outer.push(format!("c.distance_m > {}", params.push(*meters)));
                }
                None => {}
            }
            "c.distance_m ASC, c.id ASC"
        }
    };
    let limit = params.push(filter.limit as i64);

    let sql = format!(
        r"
        SELECT c.id, c.created_at, c.distance_m
        FROM (
            SELECT latest.id, latest.created_at, {distance} AS distance_m
            FROM ({latest}) latest
            {unseen}
        ) c
        WHERE {outer}
        ORDER BY {order_by}
        LIMIT {limit}
        ",
        outer = outer.join(" AND "),
    );

    params.into_statement(&sql)
}

/// Keyset predicate past a time bound; `op` is `<` for newest-first pages
/// and `>` for oldest-first ones.
fn time_predicate(params: &mut SqlParams, bound: &TimeBound, op: char) -> String {
    let at = params.push(bound.at);
    match &bound.id {
        Some(id) => {
            let id = params.push(id.clone());
            format!("(c.created_at {op} {at} OR (c.created_at = {at} AND c.id {op} {id}))")
        }
        None => format!("c.created_at {op} {at}"),
    }
}

/// Statement behind [`DishMediaRepository::ranked_for_restaurant`].
#[must_use]
pub fn ranked_statement(
    restaurant_id: &str,
    after: Option<(i64, &str)>,
    limit: u64,
) -> sea_orm::Statement {
    let mut params = SqlParams::new();
    let restaurant = params.push(restaurant_id);

    let source = format!(
        "SELECT dm.id, dm.dish_id, dm.created_at, \
         (SELECT COUNT(*) FROM dish_likes dl WHERE dl.dish_media_id = dm.id) AS like_count \
         FROM dish_media dm \
         INNER JOIN dishes d ON d.id = dm.dish_id \
         WHERE d.restaurant_id = {restaurant}"
    );
    let most_liked = TopNPerGroup {
        source: &source,
        partition_by: "src.dish_id",
        order_by: "src.like_count DESC, src.id DESC",
        n: 1,
    }
    .to_sql();

    let predicate = match after {
        Some((like_count, id)) => {
            let count = params.push(like_count);
            let id = params.push(id);
            format!(
                "WHERE (best.like_count < {count} OR (best.like_count = {count} AND best.id < {id}))"
            )
        }
        None => String::new(),
    };
    let limit = params.push(limit as i64);

    let sql = format!(
        r"
        SELECT best.id, best.like_count
        FROM ({most_liked}) best
        {predicate}
        ORDER BY best.like_count DESC, best.id DESC
        LIMIT {limit}
        "
    );

    params.into_statement(&sql)
}
