//! The landing dashboard: component grid, alert counters, anomaly status
//! and open incidents.

use std::fmt;

use platformops_core::alerts::AlertSummary;
use platformops_core::anomalies::{ActiveAnomalies, AnomalyAnalysis, AnomalyImpact};
use platformops_core::components::ComponentOverview;
use platformops_core::incidents::{Incident, IncidentStatus};
use platformops_core::presentation::{gauge, HealthBand};

use super::{heading, queries, section, QueryState};
use crate::context::AppContext;
use crate::error::ApiError;
use crate::mutation::Mutation;

pub struct ControlRoom {
    pub overview: QueryState<Vec<ComponentOverview>>,
    pub summary: QueryState<AlertSummary>,
    pub anomaly: QueryState<ActiveAnomalies>,
    /// Only queried while an anomaly is active.
    pub impact: QueryState<AnomalyImpact>,
    /// Only queried while an anomaly is active.
    pub analysis: QueryState<AnomalyAnalysis>,
    pub incidents: QueryState<Vec<Incident>>,
}

impl ControlRoom {
    pub async fn load(ctx: &AppContext) -> Self {
        let (overview, summary, anomaly, incidents) = futures::join!(
            queries::system_overview(ctx),
            queries::alert_summary(ctx),
            queries::active_anomaly(ctx),
            queries::incidents(ctx, IncidentStatus::Open),
        );

        let active = anomaly.as_ref().map(|a| a.active).unwrap_or(false);
        let (impact, analysis) = if active {
            let (impact, analysis) =
                futures::join!(queries::anomaly_impact(ctx), queries::anomaly_analysis(ctx));
            (
                QueryState::from_result("anomalyImpact", impact),
                QueryState::from_result("anomalyAnalysis", analysis),
            )
        } else {
            (QueryState::Disabled, QueryState::Disabled)
        };

        Self {
            overview: QueryState::from_result("systemOverview", overview),
            summary: QueryState::from_result("alertSummary", summary),
            anomaly: QueryState::from_result("activeAnomaly", anomaly),
            impact,
            analysis,
            incidents: QueryState::from_result("incidents", incidents),
        }
    }

    /// Quick action: evaluate alerts with the default lookback.
    pub async fn evaluate(ctx: &AppContext) -> Result<(), ApiError> {
        ctx.mutate(
            Mutation::EvaluateAlerts,
            ctx.api().evaluate_alerts(Default::default()),
        )
        .await?;
        Ok(())
    }

    /// Quick action: group open alerts into incidents.
    pub async fn group_alerts(ctx: &AppContext) -> Result<i64, ApiError> {
        ctx.mutate(Mutation::GroupAlerts, ctx.api().group_alerts_into_incidents())
            .await
    }
}

impl fmt::Display for ControlRoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, "Control Room")?;

        section(f, "System", &self.overview, |f, rows| {
            if rows.is_empty() {
                return writeln!(f, "  (no components)");
            }
            for row in rows {
                writeln!(
                    f,
                    "  {:<6} {} {:<9} {:<8} alerts={}",
                    row.component_code,
                    gauge(row.health_score, 20),
                    HealthBand::for_score(row.health_score),
                    row.status,
                    row.active_alerts,
                )?;
            }
            Ok(())
        })?;

        section(f, "Alerts", &self.summary, |f, summary| {
            writeln!(
                f,
                "  critical={}  warning={}  info={}",
                summary.critical(),
                summary.warning(),
                summary.info()
            )
        })?;

        section(f, "Anomaly", &self.anomaly, |f, anomaly| match anomaly.current() {
            Some(current) => {
                writeln!(
                    f,
                    "  ACTIVE {} from tick {}{}",
                    current.anomaly_type,
                    current.from_tick,
                    current
                        .to_tick
                        .map(|t| format!(" to {t}"))
                        .unwrap_or_default()
                )?;
                writeln!(
                    f,
                    "  points modified={}  components={}",
                    anomaly.total_points_modified,
                    anomaly.affected_components.join(", ")
                )
            }
            None => writeln!(f, "  no active anomaly"),
        })?;

        if !self.impact.is_disabled() {
            section(f, "Anomaly impact", &self.impact, |f, impact| {
                if let Some(count) = impact.alert_count() {
                    let critical = impact.alerts_by_severity().get("critical").copied().unwrap_or(0);
                    writeln!(f, "  alerts: {count} (critical: {critical})")?;
                }
                if let Some(status) = impact.global_health.as_ref().and_then(|h| h.status.as_deref()) {
                    writeln!(f, "  global status: {status}")?;
                } else if let Some(health) = impact.global_health_during_anomaly {
                    writeln!(f, "  global health during anomaly: {health:.1}")?;
                }
                let impacted = impact.impacted_components();
                if !impacted.is_empty() {
                    writeln!(f, "  most impacted: {}", impacted.join(", "))?;
                }
                Ok(())
            })?;
        }
        if !self.analysis.is_disabled() {
            section(f, "Anomaly analysis", &self.analysis, |f, analysis| {
                if let Some(narrative) = &analysis.narrative {
                    writeln!(f, "  {narrative}")?;
                }
                if let Some(changed) = &analysis.what_changed {
                    writeln!(f, "  what changed: {changed}")?;
                }
                if let Some(propagated) = &analysis.where_propagated {
                    writeln!(f, "  propagation: {propagated}")?;
                }
                if !analysis.degraded_components.is_empty() {
                    writeln!(f, "  degraded: {}", analysis.degraded_components.join(", "))?;
                }
                writeln!(
                    f,
                    "  status: {}  cascading: {}",
                    analysis.status(),
                    if analysis.system_state.cascading_behavior { "yes" } else { "no" }
                )
            })?;
        }

        section(f, "Open incidents", &self.incidents, |f, incidents| {
            if incidents.is_empty() {
                return writeln!(f, "  none");
            }
            for incident in incidents {
                writeln!(
                    f,
                    "  #{:<4} [{}] {}",
                    incident.id, incident.severity, incident.title
                )?;
            }
            Ok(())
        })
    }
}
