//! Time entry model.
//!
//! Time entries are the append-only audit trail of clock transitions,
//! distinct from the mutable [`Shift`](super::Shift) summary row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of clock transition an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeEntryType {
    /// The worker started a shift.
    ClockIn,
    /// The worker ended a shift.
    ClockOut,
}

impl TimeEntryType {
    /// Returns the storage form of the entry type.
    pub fn as_str(self) -> &'static str {
        match self {
            TimeEntryType::ClockIn => "clock_in",
            TimeEntryType::ClockOut => "clock_out",
        }
    }
}

impl std::str::FromStr for TimeEntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clock_in" => Ok(TimeEntryType::ClockIn),
            "clock_out" => Ok(TimeEntryType::ClockOut),
            other => Err(format!("unknown time entry type: {}", other)),
        }
    }
}

/// A latitude/longitude pair captured at clock time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

/// An immutable audit event attached to a shift transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    /// Unique identifier for the entry.
    pub id: String,
    /// The shift the transition belongs to.
    pub shift_id: String,
    /// Whether this was a clock-in or clock-out.
    #[serde(rename = "type")]
    pub entry_type: TimeEntryType,
    /// When the transition happened.
    pub timestamp: DateTime<Utc>,
    /// Where the worker was, if the device reported it.
    #[serde(default)]
    pub location: Option<GeoLocation>,
}

impl TimeEntry {
    /// Creates a new entry with a fresh id.
    pub fn new(
        shift_id: impl Into<String>,
        entry_type: TimeEntryType,
        timestamp: DateTime<Utc>,
        location: Option<GeoLocation>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            shift_id: shift_id.into(),
            entry_type,
            timestamp,
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entry_serializes_type_field() {
        let entry = TimeEntry::new(
            "s_001",
            TimeEntryType::ClockIn,
            Utc.with_ymd_and_hms(2026, 1, 20, 9, 0, 0).unwrap(),
            Some(GeoLocation {
                lat: -33.86,
                lng: 151.21,
            }),
        );

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "clock_in");
        assert_eq!(json["shift_id"], "s_001");
        assert_eq!(json["location"]["lat"], -33.86);
    }

    #[test]
    fn test_entry_type_parse() {
        use std::str::FromStr;
        assert_eq!(
            TimeEntryType::from_str("clock_out").unwrap(),
            TimeEntryType::ClockOut
        );
        assert!(TimeEntryType::from_str("break").is_err());
    }
}
