//! Incident list and incident detail, with the status actions.

use std::fmt;

use platformops_core::incidents::{
    Incident, IncidentAction, IncidentComment, IncidentStatus, IncidentTimelineEvent,
};
use platformops_core::types::DbId;

use super::{heading, queries, section, QueryState};
use crate::context::AppContext;
use crate::error::ApiError;
use crate::mutation::Mutation;

pub struct IncidentListView {
    pub status: IncidentStatus,
    pub incidents: QueryState<Vec<Incident>>,
}

impl IncidentListView {
    pub async fn load(ctx: &AppContext, status: IncidentStatus) -> Self {
        Self {
            status,
            incidents: QueryState::from_result("incidents", queries::incidents(ctx, status).await),
        }
    }
}

impl fmt::Display for IncidentListView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, &format!("Incidents ({})", self.status))?;
        section(f, "List", &self.incidents, |f, incidents| {
            if incidents.is_empty() {
                return writeln!(f, "  none");
            }
            for i in incidents {
                writeln!(
                    f,
                    "  #{:<4} {:<12} {:<8} {}  opened {}",
                    i.id,
                    i.status,
                    i.severity,
                    i.title,
                    i.opened_at.format("%Y-%m-%d %H:%M"),
                )?;
            }
            Ok(())
        })
    }
}

pub struct IncidentDetailView {
    pub id: DbId,
    pub incident: QueryState<Incident>,
    pub timeline: QueryState<Vec<IncidentTimelineEvent>>,
    pub comments: QueryState<Vec<IncidentComment>>,
}

impl IncidentDetailView {
    pub async fn load(ctx: &AppContext, id: DbId) -> Self {
        let (incident, timeline, comments) = futures::join!(
            queries::incident(ctx, id),
            queries::incident_timeline(ctx, id),
            queries::incident_comments(ctx, id),
        );
        Self {
            id,
            incident: QueryState::from_result("incident", incident),
            timeline: QueryState::from_result("incidentTimeline", timeline),
            comments: QueryState::from_result("incidentComments", comments),
        }
    }

    /// The action to offer next, when the incident has loaded.
    pub fn next_action(&self) -> Option<IncidentAction> {
        self.incident.value().and_then(|i| i.status.next_action())
    }

    /// Acknowledge the incident. Checked against its cached status first
    /// when that is known.
    pub async fn acknowledge(ctx: &AppContext, id: DbId) -> Result<Incident, ApiError> {
        check_known_status(ctx, id, IncidentAction::Acknowledge).await?;
        ctx.mutate(Mutation::AcknowledgeIncident(id), ctx.api().acknowledge_incident(id))
            .await
    }

    pub async fn resolve(ctx: &AppContext, id: DbId, note: &str) -> Result<Incident, ApiError> {
        check_known_status(ctx, id, IncidentAction::Resolve).await?;
        ctx.mutate(Mutation::ResolveIncident(id), ctx.api().resolve_incident(id, note))
            .await
    }

    pub async fn comment(ctx: &AppContext, id: DbId, comment: &str) -> Result<IncidentComment, ApiError> {
        ctx.mutate(
            Mutation::AddIncidentComment(id),
            ctx.api().add_incident_comment(id, comment),
        )
        .await
    }
}

/// Reject an action the incident's cached status rules out. An incident
/// that is not cached is left for the backend to judge.
async fn check_known_status(ctx: &AppContext, id: DbId, action: IncidentAction) -> Result<(), ApiError> {
    let key = crate::cache::QueryKey::new(crate::cache::Resource::Incident).with(id);
    if ctx.cache().contains(&key).await {
        let incident = queries::incident(ctx, id).await?;
        incident.status.check(action)?;
    }
    Ok(())
}

impl fmt::Display for IncidentDetailView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, &format!("Incident #{}", self.id))?;
        section(f, "Summary", &self.incident, |f, i| {
            writeln!(f, "  {}", i.title)?;
            writeln!(f, "  status: {}  severity: {}", i.status, i.severity)?;
            if let Some(description) = &i.description {
                writeln!(f, "  {description}")?;
            }
            if let Some(risk) = i.collapse_risk {
                writeln!(f, "  collapse risk: {risk:.2}")?;
            }
            if !i.affected_components.is_empty() {
                writeln!(f, "  components: {}", i.affected_components.join(", "))?;
            }
            writeln!(f, "  linked alerts: {}", i.linked_alerts.len())?;
            if let Some(resolved) = i.resolved_at {
                writeln!(f, "  resolved at {}", resolved.format("%Y-%m-%d %H:%M"))?;
            }
            if let Some(note) = &i.resolution_note {
                writeln!(f, "  note: {note}")?;
            }
            match i.status.next_action() {
                Some(action) => writeln!(f, "  next: {action:?}"),
                None => Ok(()),
            }
        })?;
        section(f, "Timeline", &self.timeline, |f, events| {
            if events.is_empty() {
                return writeln!(f, "  (empty)");
            }
            for e in events {
                writeln!(
                    f,
                    "  tick {:>6}  {:<9} {} {}",
                    e.tick,
                    e.severity.as_deref().unwrap_or("-"),
                    e.event,
                    e.signal.as_deref().unwrap_or(""),
                )?;
            }
            Ok(())
        })?;
        section(f, "Comments", &self.comments, |f, comments| {
            if comments.is_empty() {
                return writeln!(f, "  (none)");
            }
            for c in comments {
                writeln!(
                    f,
                    "  [{}] user {}: {}",
                    c.created_at.format("%Y-%m-%d %H:%M"),
                    c.user_id,
                    c.comment
                )?;
            }
            Ok(())
        })
    }
}
