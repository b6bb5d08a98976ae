//! Result-size limits for the HTTP adapter
//!
//! Every ranked endpoint takes an optional `limit`. A missing value uses the
//! endpoint default; any integer is clamped into `[1, max]`; anything else is
//! a 400.

use crate::error::{QueryError, QueryResult};

/// Bounds of one endpoint's `limit` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitSpec {
    pub default: i64,
    pub max: i64,
}

pub const TRENDING: LimitSpec = LimitSpec { default: 200, max: 200 };
pub const TOP: LimitSpec = LimitSpec { default: 20, max: 50 };
pub const CHANNELS: LimitSpec = LimitSpec { default: 20, max: 100 };
pub const CHANNEL_VIDEOS: LimitSpec = LimitSpec { default: 200, max: 200 };
pub const TAGS: LimitSpec = LimitSpec { default: 50, max: 200 };
pub const TAG_VIDEOS: LimitSpec = LimitSpec { default: 20, max: 50 };
pub const SEARCH: LimitSpec = LimitSpec { default: 20, max: 50 };

/// Clamp `value` into `[1, max]`
pub fn clamp_limit(value: i64, max: i64) -> i64 {
    value.max(1).min(max.max(1))
}

impl LimitSpec {
    /// Resolve a raw `limit` query value
    ///
    /// # Examples
    /// ```
    /// use ytt_query::limits::TOP;
    ///
    /// assert_eq!(TOP.resolve(None).unwrap(), 20);
    /// assert_eq!(TOP.resolve(Some("500")).unwrap(), 50);
    /// assert_eq!(TOP.resolve(Some("0")).unwrap(), 1);
    /// assert!(TOP.resolve(Some("ten")).is_err());
    /// ```
    pub fn resolve(&self, raw: Option<&str>) -> QueryResult<i64> {
        match raw.map(str::trim) {
            None | Some("") => Ok(self.default),
            Some(text) => text
                .parse::<i64>()
                .map(|value| clamp_limit(value, self.max))
                .map_err(|_| QueryError::InvalidParameter("limit must be an integer".to_string())),
        }
    }
}
