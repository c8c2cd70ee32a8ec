//! Raw SQL building blocks shared by the feed repositories.
//!
//! Feed queries need window functions and computed distances that the
//! sea-orm query builder cannot express, so they are written as SQL. Values
//! are always bound through [`SqlParams`]; only identifiers and fixed
//! fragments are spliced into the text.

use dishfeed_common::EARTH_RADIUS_METERS;
use sea_orm::{DbBackend, Statement, Value};

/// Positional parameter collector for Postgres `$n` placeholders.
#[derive(Debug, Default)]
pub struct SqlParams {
    values: Vec<Value>,
}

impl SqlParams {
    /// Create an empty parameter list.
    #[must_use]
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Bind a value and return its placeholder.
    pub fn push(&mut self, value: impl Into<Value>) -> String {
        self.values.push(value.into());
        format!("${}", self.values.len())
    }

    /// Bind every value and return a comma separated placeholder list.
    ///
    /// Callers must not pass an empty iterator: `IN ()` is not valid SQL.
    pub fn push_list<I, V>(&mut self, values: I) -> String
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        values
            .into_iter()
            .map(|v| self.push(v))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Number of bound values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been bound yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Finish into a Postgres statement.
    #[must_use]
    pub fn into_statement(self, sql: &str) -> Statement {
        Statement::from_sql_and_values(DbBackend::Postgres, sql, self.values)
    }
}

/// Keeps the first `n` rows of every partition of a source query.
///
/// Renders a `ROW_NUMBER()` window over `source`; the result exposes every
/// source column plus `group_rank` (1-based).
#[derive(Debug, Clone, Copy)]
pub struct TopNPerGroup<'a> {
    /// Inner `SELECT` producing the candidate rows.
    pub source: &'a str,
    /// Column list to partition by.
    pub partition_by: &'a str,
    /// Ordering inside each partition; must be total for stable results.
    pub order_by: &'a str,
    /// Rows kept per partition.
    pub n: u64,
}

impl TopNPerGroup<'_> {
    /// Render the query.
    #[must_use]
    pub fn to_sql(&self) -> String {
        format!(
            "SELECT * FROM (\
                SELECT src.*, ROW_NUMBER() OVER (PARTITION BY {partition} ORDER BY {order}) AS group_rank \
                FROM ({source}) src\
            ) ranked WHERE ranked.group_rank <= {n}",
            partition = self.partition_by,
            order = self.order_by,
            source = self.source.trim(),
            n = self.n.max(1),
        )
    }
}

/// Haversine distance in meters between two lat/lng expressions.
///
/// Uses the same Earth radius as [`dishfeed_common::GeoPoint::distance_meters`]
/// so the SQL filter and in-process checks agree. `LEAST` keeps rounding
/// error from pushing `ASIN` out of its domain.
#[must_use]
pub fn haversine_sql(lat_a: &str, lng_a: &str, lat_b: &str, lng_b: &str) -> String {
    format!(
        "(2 * {EARTH_RADIUS_METERS:.1} * ASIN(LEAST(1.0, SQRT(\
            POWER(SIN(RADIANS({lat_b} - {lat_a}) / 2), 2) + \
            COS(RADIANS({lat_a})) * COS(RADIANS({lat_b})) * \
            POWER(SIN(RADIANS({lng_b} - {lng_a}) / 2), 2)\
        ))))"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_number_placeholders() {
        let mut params = SqlParams::new();
        assert_eq!(params.push("a"), "$1");
        assert_eq!(params.push_list(["b", "c", "d"]), "$2, $3, $4");
        assert_eq!(params.push(5_i64), "$5");
        assert_eq!(params.len(), 5);
    }

    #[test]
    fn test_params_into_statement_keeps_values() {
        let mut params = SqlParams::new();
        let p = params.push("m1");
        let stmt = params.into_statement(&format!("SELECT 1 WHERE id = {p}"));
        assert_eq!(stmt.sql, "SELECT 1 WHERE id = $1");
        assert_eq!(stmt.values.map(|v| v.0.len()), Some(1));
    }

    #[test]
    fn test_top_n_per_group_sql() {
        let sql = TopNPerGroup {
            source: "SELECT id, dish_id, created_at FROM dish_media",
            partition_by: "src.dish_id",
            order_by: "src.created_at DESC, src.id DESC",
            n: 1,
        }
        .to_sql();

        assert!(sql.contains(
            "ROW_NUMBER() OVER (PARTITION BY src.dish_id ORDER BY src.created_at DESC, src.id DESC)"
        ));
        assert!(sql.contains("FROM (SELECT id, dish_id, created_at FROM dish_media) src"));
        assert!(sql.ends_with("WHERE ranked.group_rank <= 1"));
    }

    #[test]
    fn test_top_n_never_renders_zero() {
        let sql = TopNPerGroup {
            source: "SELECT 1",
            partition_by: "x",
            order_by: "y",
            n: 0,
        }
        .to_sql();
        assert!(sql.ends_with("<= 1"));
    }

    #[test]
    fn test_haversine_uses_shared_radius() {
        let sql = haversine_sql("$1", "$2", "r.lat", "r.lng");
        assert!(sql.starts_with("(2 * 6371000.0 * ASIN(LEAST(1.0, SQRT("));
        assert!(sql.contains("RADIANS(r.lat - $1)"));
        assert!(sql.contains("RADIANS(r.lng - $2)"));
    }
}
