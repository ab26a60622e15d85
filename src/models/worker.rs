//! Worker model and related types.
//!
//! This module defines the Worker struct, the Role enum and the
//! RecurringTemplate used to auto-generate schedules.

use std::collections::BTreeMap;

use chrono::Weekday;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The role a worker holds within their organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Can edit shifts, manage schedules and export reports.
    Manager,
    /// Can only clock in/out and read their own records.
    Employee,
}

impl Role {
    /// Returns true for the manager role.
    pub fn is_manager(self) -> bool {
        self == Role::Manager
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Manager => write!(f, "manager"),
            Role::Employee => write!(f, "employee"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manager" | "admin" => Ok(Role::Manager),
            "employee" | "user" => Ok(Role::Employee),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A weekly availability template: weekday name to a `{start, end}` pair.
///
/// Entries are kept as raw JSON values so that a single malformed entry
/// never prevents the rest of the template from being read. Interpretation
/// happens during expansion, see
/// [`expand_templates`](crate::calculation::expand_templates).
///
/// # Example
///
/// ```
/// use shift_engine::models::RecurringTemplate;
/// use chrono::Weekday;
///
/// let template = RecurringTemplate::parse(r#"{"Monday": {"start": "09:00", "end": "17:00"}}"#).unwrap();
/// assert!(template.entry(Weekday::Mon).is_some());
/// assert!(template.entry(Weekday::Tue).is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecurringTemplate {
    entries: BTreeMap<String, Value>,
}

impl RecurringTemplate {
    /// Creates a template from raw entries.
    pub fn new(entries: BTreeMap<String, Value>) -> Self {
        Self { entries }
    }

    /// Parses a template from its JSON text form.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Renders the template as JSON text.
    pub fn to_json(&self) -> String {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
        .to_string()
    }

    /// Returns true if the template has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the raw entry for a weekday.
    ///
    /// Keys are matched against the full English weekday name without
    /// regard to case, so `"Monday"` and `"monday"` both match.
    pub fn entry(&self, weekday: Weekday) -> Option<&Value> {
        let name = weekday_name(weekday);
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

/// Returns the full English name of a weekday (e.g. `"Monday"`).
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Represents a worker who clocks shifts and receives schedules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    /// Unique identifier for the worker.
    pub id: String,
    /// The organization the worker belongs to.
    pub org_id: String,
    /// Display name, used in payroll rows and calendar summaries.
    pub name: String,
    /// The worker's role within the organization.
    pub role: Role,
    /// Inactive workers are skipped by schedule generation.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Optional kiosk PIN. Never serialized.
    #[serde(default, skip_serializing)]
    pub pin: Option<String>,
    /// Hourly pay rate, if one is recorded.
    #[serde(default)]
    pub pay_rate: Option<Decimal>,
    /// Weekly template used for schedule generation.
    #[serde(default)]
    pub recurring_template: Option<RecurringTemplate>,
}

fn default_active() -> bool {
    true
}

impl Worker {
    /// Creates an active worker with no PIN, pay rate or template.
    pub fn new(
        id: impl Into<String>,
        org_id: impl Into<String>,
        name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            org_id: org_id.into(),
            name: name.into(),
            role,
            is_active: true,
            pin: None,
            pay_rate: None,
            recurring_template: None,
        }
    }

    /// Returns the pay rate, treating a missing rate as zero.
    pub fn effective_pay_rate(&self) -> Decimal {
        self.pay_rate.unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_from_str_accepts_legacy_names() {
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Manager);
        assert_eq!(Role::from_str("manager").unwrap(), Role::Manager);
        assert_eq!(Role::from_str("USER").unwrap(), Role::Employee);
        assert!(Role::from_str("owner").is_err());
    }

    #[test]
    fn test_template_entry_is_case_insensitive() {
        let template =
            RecurringTemplate::parse(r#"{"friday": {"start": "08:00", "end": "12:00"}}"#).unwrap();
        assert!(template.entry(Weekday::Fri).is_some());
        assert!(template.entry(Weekday::Thu).is_none());
    }

    #[test]
    fn test_template_keeps_malformed_entries_readable() {
        let template =
            RecurringTemplate::parse(r#"{"Monday": 42, "Tuesday": {"start": "09:00"}}"#).unwrap();
        assert_eq!(template.entry(Weekday::Mon), Some(&Value::from(42)));
        assert!(template.entry(Weekday::Tue).is_some());
    }

    #[test]
    fn test_template_json_round_trip() {
        let text = r#"{"Monday":{"end":"17:00","start":"09:00"}}"#;
        let template = RecurringTemplate::parse(text).unwrap();
        assert_eq!(RecurringTemplate::parse(&template.to_json()).unwrap(), template);
    }

    #[test]
    fn test_deserialize_worker_defaults() {
        let json = r#"{
            "id": "w_001",
            "org_id": "org_1",
            "name": "Dana Smith",
            "role": "employee"
        }"#;

        let worker: Worker = serde_json::from_str(json).unwrap();
        assert!(worker.is_active);
        assert_eq!(worker.pay_rate, None);
        assert_eq!(worker.effective_pay_rate(), Decimal::ZERO);
        assert!(worker.recurring_template.is_none());
    }

    #[test]
    fn test_deserialize_worker_with_template_and_rate() {
        let json = r#"{
            "id": "w_002",
            "org_id": "org_1",
            "name": "Lee Chen",
            "role": "manager",
            "pay_rate": "31.25",
            "recurring_template": {"Monday": {"start": "09:00", "end": "17:00"}}
        }"#;

        let worker: Worker = serde_json::from_str(json).unwrap();
        assert_eq!(worker.role, Role::Manager);
        assert_eq!(worker.effective_pay_rate(), Decimal::new(3125, 2));
        assert!(worker.recurring_template.unwrap().entry(Weekday::Mon).is_some());
    }
}
