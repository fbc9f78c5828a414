//! Incidents, their timeline and comments.
//!
//! Status progression (`OPEN -> ACKNOWLEDGED -> RESOLVED`) is enforced by
//! the backend. The client only uses [`IncidentStatus::next_action`] to
//! decide which action to offer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::alerts::AlertEvent;
use crate::error::CoreError;
use crate::types::{DbId, Tick, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IncidentStatus {
    Open,
    Acknowledged,
    Resolved,
}

/// Action that moves an incident to its next status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentAction {
    Acknowledge,
    Resolve,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "OPEN",
            IncidentStatus::Acknowledged => "ACKNOWLEDGED",
            IncidentStatus::Resolved => "RESOLVED",
        }
    }

    /// The single forward action available from this status, if any.
    pub fn next_action(&self) -> Option<IncidentAction> {
        match self {
            IncidentStatus::Open => Some(IncidentAction::Acknowledge),
            IncidentStatus::Acknowledged => Some(IncidentAction::Resolve),
            IncidentStatus::Resolved => None,
        }
    }

    /// Check a requested action against the one-way progression.
    ///
    /// Resolving straight from `OPEN` is allowed; the backend acknowledges
    /// implicitly.
    pub fn check(&self, action: IncidentAction) -> Result<(), CoreError> {
        match (self, action) {
            (IncidentStatus::Open, _) => Ok(()),
            (IncidentStatus::Acknowledged, IncidentAction::Resolve) => Ok(()),
            (status, action) => Err(CoreError::InvalidTransition(format!(
                "cannot {action:?} an incident that is {status}"
            ))),
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Ok(IncidentStatus::Open),
            "ACKNOWLEDGED" => Ok(IncidentStatus::Acknowledged),
            "RESOLVED" => Ok(IncidentStatus::Resolved),
            other => Err(CoreError::Validation(format!(
                "unknown incident status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: DbId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: IncidentStatus,
    /// `INFO`, `WARNING` or `CRITICAL`.
    pub severity: String,
    pub opened_at: Timestamp,
    #[serde(default)]
    pub resolved_at: Option<Timestamp>,
    #[serde(default)]
    pub resolution_note: Option<String>,
    #[serde(default)]
    pub collapse_risk: Option<f64>,
    #[serde(default)]
    pub affected_components: Vec<String>,
    #[serde(default)]
    pub linked_alerts: Vec<AlertEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentTimelineEvent {
    pub tick: Tick,
    pub event: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub signal: Option<String>,
}

/// `GET /api/incidents/{id}/timeline` wraps its events.
#[derive(Debug, Clone, Deserialize)]
pub struct IncidentTimeline {
    pub timeline: Vec<IncidentTimelineEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentComment {
    pub id: DbId,
    pub incident_id: DbId,
    pub user_id: DbId,
    pub comment: String,
    pub created_at: Timestamp,
}

/// Result of `POST /api/incidents/group-alerts`.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupedIncidents {
    pub grouped_incidents: i64,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn status_progression_is_one_way() {
        assert_eq!(IncidentStatus::Open.next_action(), Some(IncidentAction::Acknowledge));
        assert_eq!(IncidentStatus::Acknowledged.next_action(), Some(IncidentAction::Resolve));
        assert_eq!(IncidentStatus::Resolved.next_action(), None);

        assert!(IncidentStatus::Acknowledged.check(IncidentAction::Resolve).is_ok());
        assert_matches!(
            IncidentStatus::Acknowledged.check(IncidentAction::Acknowledge),
            Err(CoreError::InvalidTransition(_))
        );
        assert_matches!(
            IncidentStatus::Resolved.check(IncidentAction::Resolve),
            Err(CoreError::InvalidTransition(_))
        );
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("acknowledged".parse::<IncidentStatus>().unwrap(), IncidentStatus::Acknowledged);
        assert!("closed".parse::<IncidentStatus>().is_err());
    }

    #[test]
    fn incident_decodes_with_optional_fields_missing() {
        let incident: Incident = serde_json::from_value(json!({
            "id": 7,
            "title": "C1 latency regression",
            "status": "OPEN",
            "severity": "CRITICAL",
            "opened_at": "2026-01-05T10:00:00Z",
            "resolved_at": null,
            "affected_components": ["C1", "C2"]
        }))
        .unwrap();

        assert_eq!(incident.status, IncidentStatus::Open);
        assert_eq!(incident.resolved_at, None);
        assert!(incident.linked_alerts.is_empty());
        assert_eq!(incident.affected_components.len(), 2);
    }
}
