//! Pagination cursors.
//!
//! A cursor is the exclusive bound of the next page, in one of three shapes
//! that can never be mistaken for each other:
//!
//! | kind       | wire shape                          | example                        |
//! |------------|-------------------------------------|--------------------------------|
//! | `Time`     | RFC 3339 (micros), optional `@{id}` | `2025-03-01T12:00:00.000000Z@m1` |
//! | `Rank`     | `{likeCount}_{mediaId}`             | `5_0195a3c4-…`                 |
//! | `Distance` | `{meters}` or `{meters}@{mediaId}`  | `120.5@0195a3c4-…`             |

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use dishfeed_common::{AppError, Metrics};
use thiserror::Error;
use tracing::warn;

/// Cursor family expected by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    /// Creation-time bound.
    Time,
    /// Like-count and media ID bound.
    Rank,
    /// Distance and media ID bound.
    Distance,
}

impl fmt::Display for CursorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Time => "time",
            Self::Rank => "rank",
            Self::Distance => "distance",
        })
    }
}

/// Cursor decoding error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    /// The cursor text does not decode.
    #[error("malformed cursor: {0}")]
    Malformed(String),

    /// The cursor decodes but belongs to another ordering.
    #[error("expected a {expected} cursor, got a {found} cursor")]
    WrongKind {
        /// Ordering the request asked for.
        expected: CursorKind,
        /// Ordering the cursor was issued for.
        found: CursorKind,
    },
}

impl From<CursorError> for AppError {
    fn from(err: CursorError) -> Self {
        Self::InvalidCursor(err.to_string())
    }
}

/// A decoded pagination cursor.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedCursor {
    /// `created_at` and ID of the last item of the previous page. The ID is
    /// absent in cursors written by older clients.
    Time { at: DateTime<Utc>, id: Option<String> },
    /// Like count and ID of the last item of the previous page.
    Rank { like_count: i64, id: String },
    /// Distance and ID of the last item of the previous page. The ID is
    /// absent only in cursors written by older clients.
    Distance { meters: f64, id: Option<String> },
}

impl FeedCursor {
    /// The family this cursor belongs to.
    #[must_use]
    pub const fn kind(&self) -> CursorKind {
        match self {
            Self::Time { .. } => CursorKind::Time,
            Self::Rank { .. } => CursorKind::Rank,
            Self::Distance { .. } => CursorKind::Distance,
        }
    }

    /// Encode into the opaque wire form.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Time { at, id: Some(id) } => {
                format!("{}@{id}", at.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            Self::Time { at, id: None } => at.to_rfc3339_opts(SecondsFormat::Micros, true),
            Self::Rank { like_count, id } => format!("{like_count}_{id}"),
            Self::Distance { meters, id: Some(id) } => format!("{meters}@{id}"),
            Self::Distance { meters, id: None } => meters.to_string(),
        }
    }

    /// Decode any cursor shape.
    pub fn decode(raw: &str) -> Result<Self, CursorError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CursorError::Malformed("empty cursor".to_string()));
        }

        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Self::Time {
                at: at.with_timezone(&Utc),
                id: None,
            });
        }
        if let Some((at, id)) = raw.split_once('@') {
            if let Ok(at) = DateTime::parse_from_rfc3339(at) {
                if id.is_empty() {
                    return Err(CursorError::Malformed(raw.to_string()));
                }
                return Ok(Self::Time {
                    at: at.with_timezone(&Utc),
                    id: Some(id.to_string()),
                });
            }
        }

        if let Some((count, id)) = raw.split_once('_') {
            if let Ok(like_count) = count.parse::<i64>() {
                if like_count < 0 || id.is_empty() {
                    return Err(CursorError::Malformed(raw.to_string()));
                }
                return Ok(Self::Rank {
                    like_count,
                    id: id.to_string(),
                });
            }
        }

        let (meters, id) = match raw.split_once('@') {
            Some((meters, id)) if !id.is_empty() => (meters, Some(id.to_string())),
            Some(_) => return Err(CursorError::Malformed(raw.to_string())),
            None => (raw, None),
        };
        match meters.parse::<f64>() {
            Ok(meters) if meters.is_finite() && meters >= 0.0 => Ok(Self::Distance { meters, id }),
            _ => Err(CursorError::Malformed(raw.to_string())),
        }
    }

    /// Decode a cursor and require it to be of `expected` kind.
    pub fn decode_as(raw: &str, expected: CursorKind) -> Result<Self, CursorError> {
        let cursor = Self::decode(raw)?;
        if cursor.kind() == expected {
            Ok(cursor)
        } else {
            Err(CursorError::WrongKind {
                expected,
                found: cursor.kind(),
            })
        }
    }
}

impl fmt::Display for FeedCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Decode a client-supplied cursor, falling back to the first page when it
/// is missing or unusable. Stale cursors are common across app versions, so
/// a bad one is logged and counted instead of failing the request.
pub fn decode_or_first_page(
    raw: Option<&str>,
    expected: CursorKind,
    metrics: &Metrics,
) -> Option<FeedCursor> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match FeedCursor::decode_as(raw, expected) {
        Ok(cursor) => Some(cursor),
        Err(e) => {
            warn!(cursor = raw, error = %e, "Unusable cursor, serving first page");
            metrics.record_cursor_recovered();
            None
        }
    }
}

/// Split a `limit + 1` fetch into the page and whether another page exists.
#[must_use]
pub fn take_page<T>(mut rows: Vec<T>, limit: u64) -> (Vec<T>, bool) {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    let has_more = rows.len() > limit;
    rows.truncate(limit);
    (rows, has_more)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_time_cursor_round_trip() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
            + chrono::Duration::microseconds(123_456);
        let encoded = FeedCursor::Time { at, id: None }.encode();

        assert_eq!(encoded, "2025-03-01T12:00:00.123456Z");
        assert_eq!(
            FeedCursor::decode(&encoded).unwrap(),
            FeedCursor::Time { at, id: None }
        );
    }

    #[test]
    fn test_time_cursor_carries_tie_break_id() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let cursor = FeedCursor::Time {
            at,
            id: Some("m_dc".to_string()),
        };
        let encoded = cursor.encode();

        assert_eq!(encoded, "2025-01-01T00:00:00.000000Z@m_dc");
        assert_eq!(FeedCursor::decode(&encoded).unwrap(), cursor);
        assert_eq!(
            FeedCursor::decode_as(&encoded, CursorKind::Time).unwrap().kind(),
            CursorKind::Time
        );
        assert!(matches!(
            FeedCursor::decode("2025-01-01T00:00:00Z@"),
            Err(CursorError::Malformed(_))
        ));
    }

    #[test]
    fn test_time_cursor_accepts_offsets() {
        let cursor = FeedCursor::decode("2025-03-01T21:00:00+09:00").unwrap();
        assert_eq!(
            cursor,
            FeedCursor::Time {
                at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
                id: None
            }
        );
    }

    #[test]
    fn test_rank_cursor_splits_on_first_underscore() {
        let cursor = FeedCursor::decode("5_media_with_underscores").unwrap();
        assert_eq!(
            cursor,
            FeedCursor::Rank {
                like_count: 5,
                id: "media_with_underscores".to_string()
            }
        );
        assert_eq!(cursor.encode(), "5_media_with_underscores");
    }

    #[test]
    fn test_rank_cursor_rejects_bad_prefix() {
        assert!(matches!(
            FeedCursor::decode("five_m1"),
            Err(CursorError::Malformed(_))
        ));
        assert!(matches!(
            FeedCursor::decode("-1_m1"),
            Err(CursorError::Malformed(_))
        ));
        assert!(matches!(
            FeedCursor::decode("5_"),
            Err(CursorError::Malformed(_))
        ));
    }

    #[test]
    fn test_distance_cursor_round_trip() {
        let cursor = FeedCursor::Distance {
            meters: 120.517_3,
            id: Some("m9".to_string()),
        };
        let encoded = cursor.encode();
        assert_eq!(encoded, "120.5173@m9");
        assert_eq!(FeedCursor::decode(&encoded).unwrap(), cursor);

        assert_eq!(
            FeedCursor::decode("87.25").unwrap(),
            FeedCursor::Distance {
                meters: 87.25,
                id: None
            }
        );
    }

    #[test]
    fn test_distance_cursor_rejects_non_finite() {
        for raw in ["NaN", "inf", "-3.5", "12@", "garbage"] {
            assert!(
                matches!(FeedCursor::decode(raw), Err(CursorError::Malformed(_))),
                "{raw} should be malformed"
            );
        }
    }

    #[test]
    fn test_decode_as_rejects_other_families() {
        let rank = FeedCursor::decode_as("3_m1", CursorKind::Time);
        assert_eq!(
            rank,
            Err(CursorError::WrongKind {
                expected: CursorKind::Time,
                found: CursorKind::Rank
            })
        );

        let time = FeedCursor::decode_as("2025-03-01T12:00:00Z", CursorKind::Rank);
        assert!(matches!(time, Err(CursorError::WrongKind { .. })));

        let distance = FeedCursor::decode_as("42", CursorKind::Rank);
        assert!(matches!(
            distance,
            Err(CursorError::WrongKind {
                found: CursorKind::Distance,
                ..
            })
        ));
    }

    #[test]
    fn test_cursor_error_maps_to_invalid_cursor() {
        let err: AppError = CursorError::Malformed("x".to_string()).into();
        assert!(matches!(err, AppError::InvalidCursor(_)));
        assert_eq!(err.error_code(), "INVALID_CURSOR");
    }

    #[test]
    fn test_take_page() {
        let (page, more) = take_page(vec![1, 2, 3], 2);
        assert_eq!(page, vec![1, 2]);
        assert!(more);

        let (page, more) = take_page(vec![1, 2], 2);
        assert_eq!(page, vec![1, 2]);
        assert!(!more);
    }

    #[test]
    fn test_decode_or_first_page_recovers() {
        let metrics = Metrics::new();

        assert!(decode_or_first_page(None, CursorKind::Time, &metrics).is_none());
        assert!(decode_or_first_page(Some("  "), CursorKind::Time, &metrics).is_none());
        assert_eq!(metrics.snapshot().cursors_recovered, 0);

        assert!(decode_or_first_page(Some("7_m1"), CursorKind::Time, &metrics).is_none());
        assert!(decode_or_first_page(Some("not-a-cursor"), CursorKind::Rank, &metrics).is_none());
        assert_eq!(metrics.snapshot().cursors_recovered, 2);

        let ok = decode_or_first_page(Some("7_m1"), CursorKind::Rank, &metrics);
        assert_eq!(
            ok,
            Some(FeedCursor::Rank {
                like_count: 7,
                id: "m1".to_string()
            })
        );
    }
}
