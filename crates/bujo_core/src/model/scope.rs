//! Ordering scopes.
//!
//! A scope is the container that owns one total order of bullets: either a
//! named collection or one user's daily log for a calendar date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable user identifier.
pub type UserId = Uuid;

/// Stable collection identifier.
pub type CollectionId = Uuid;

/// Container holding a single total order of bullets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Scope {
    /// Named collection, possibly shared with other users.
    Collection { collection_id: CollectionId },
    /// Rolling daily log of one user for one date.
    DailyLog { user_id: UserId, date: NaiveDate },
}

impl Scope {
    pub fn collection(collection_id: CollectionId) -> Self {
        Self::Collection { collection_id }
    }

    pub fn daily_log(user_id: UserId, date: NaiveDate) -> Self {
        Self::DailyLog { user_id, date }
    }

    /// Returns the collection id when this scope is a collection.
    pub fn collection_id(&self) -> Option<CollectionId> {
        match self {
            Self::Collection { collection_id } => Some(*collection_id),
            Self::DailyLog { .. } => None,
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collection { collection_id } => write!(f, "collection:{collection_id}"),
            Self::DailyLog { user_id, date } => write!(f, "daily_log:{user_id}:{date}"),
        }
    }
}

/// Storage text form for daily log dates.
pub(crate) fn date_to_db(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_db_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::{date_to_db, parse_db_date, Scope};
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn display_is_stable_for_logging() {
        let user_id = Uuid::nil();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            Scope::daily_log(user_id, date).to_string(),
            format!("daily_log:{user_id}:2024-03-09")
        );
    }

    #[test]
    fn db_date_text_is_zero_padded_and_parses_back() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(date_to_db(date), "2024-01-02");
        assert_eq!(parse_db_date("2024-01-02"), Some(date));
        assert_eq!(parse_db_date("02/01/2024"), None);
    }

    #[test]
    fn serializes_with_type_tag() {
        let scope = Scope::collection(Uuid::nil());
        let value = serde_json::to_value(scope).unwrap();
        assert_eq!(value["type"], "collection");
        assert_eq!(value["collection_id"], Uuid::nil().to_string());
    }
}
