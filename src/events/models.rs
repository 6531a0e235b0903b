//! Data models for the listening-event pipeline.
//!
//! An [`EventRecord`] is one playback event from the music app history,
//! validated and type-coerced, independent of any projection.

/// Subscription level of the user at the time of the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Free,
    Paid,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Free => "free",
            Level::Paid => "paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "free" => Some(Level::Free),
            "paid" => Some(Level::Paid),
            _ => None,
        }
    }
}

/// One canonical listening event.
///
/// Records are transient: produced by one consolidation pass and consumed
/// immediately by the projection loader.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub artist: String,
    pub first_name: String,
    pub gender: String,
    pub item_in_session: i64,
    pub last_name: String,
    /// Song length in seconds.
    pub length: f64,
    pub level: Level,
    pub location: String,
    pub session_id: i64,
    pub song: String,
    pub user_id: i64,
}

/// Positional layout of a raw event row, matching the consolidated event
/// file column order. All fields are text until the consolidator coerces
/// them.
pub mod raw {
    pub const ARTIST: usize = 0;
    pub const FIRST_NAME: usize = 1;
    pub const GENDER: usize = 2;
    pub const ITEM_IN_SESSION: usize = 3;
    pub const LAST_NAME: usize = 4;
    pub const LENGTH: usize = 5;
    pub const LEVEL: usize = 6;
    pub const LOCATION: usize = 7;
    pub const SESSION_ID: usize = 8;
    pub const SONG: usize = 9;
    pub const USER_ID: usize = 10;

    pub const FIELD_COUNT: usize = 11;

    /// Header row of the consolidated event file. Column spellings follow
    /// the upstream event export.
    pub const HEADER: [&str; FIELD_COUNT] = [
        "artist",
        "firstName",
        "gender",
        "itemInSession",
        "lastName",
        "length",
        "level",
        "location",
        "sessionId",
        "song",
        "userId",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_round_trip() {
        assert_eq!(Level::from_str("free"), Some(Level::Free));
        assert_eq!(Level::from_str("paid"), Some(Level::Paid));
        assert_eq!(Level::from_str(Level::Free.as_str()), Some(Level::Free));
        assert_eq!(Level::from_str(Level::Paid.as_str()), Some(Level::Paid));
    }

    #[test]
    fn test_level_is_case_insensitive() {
        assert_eq!(Level::from_str("Paid"), Some(Level::Paid));
        assert_eq!(Level::from_str("FREE"), Some(Level::Free));
    }

    #[test]
    fn test_level_rejects_unknown() {
        assert_eq!(Level::from_str("premium"), None);
        assert_eq!(Level::from_str(""), None);
    }
}
