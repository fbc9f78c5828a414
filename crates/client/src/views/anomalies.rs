//! Anomaly page: the active anomaly, its analysis and the injection action.

use std::fmt;

use platformops_core::anomalies::{
    ActiveAnomalies, AnomalyAnalysis, AnomalyImpact, AnomalyInjection, InjectionResult,
};

use super::{heading, queries, section, QueryState};
use crate::context::AppContext;
use crate::error::ApiError;
use crate::mutation::Mutation;

pub struct AnomaliesView {
    pub active: QueryState<ActiveAnomalies>,
    pub impact: QueryState<AnomalyImpact>,
    pub analysis: QueryState<AnomalyAnalysis>,
}

impl AnomaliesView {
    /// Impact and analysis are only requested while an anomaly is active.
    pub async fn load(ctx: &AppContext) -> Self {
        let active = queries::active_anomaly(ctx).await;
        let is_active = active.as_ref().map(|a| a.active).unwrap_or(false);

        let (impact, analysis) = if is_active {
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
            active: QueryState::from_result("activeAnomaly", active),
            impact,
            analysis,
        }
    }

    /// Validate and inject an anomaly. Nothing is sent when validation
    /// fails.
    pub async fn inject(ctx: &AppContext, injection: &AnomalyInjection) -> Result<InjectionResult, ApiError> {
        injection.check()?;
        ctx.mutate(Mutation::InjectAnomaly, ctx.api().inject_anomaly(injection))
            .await
    }
}

impl fmt::Display for AnomaliesView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, "Anomalies")?;
        section(f, "Active anomaly", &self.active, |f, report| match report.current() {
            Some(a) => {
                writeln!(f, "  type: {}", a.anomaly_type)?;
                if let Some(pipeline) = &a.pipeline {
                    writeln!(f, "  pipeline: {pipeline}")?;
                }
                if let Some(component) = &a.component_code {
                    writeln!(f, "  component: {component}")?;
                }
                match a.to_tick {
                    Some(to) => writeln!(f, "  ticks: {}-{}", a.from_tick, to)?,
                    None => writeln!(f, "  ticks: {}- (ongoing)", a.from_tick)?,
                }
                writeln!(f, "  points modified: {}", report.total_points_modified)
            }
            None => writeln!(f, "  no active anomaly"),
        })?;

        if self.impact.is_disabled() && self.analysis.is_disabled() {
            return Ok(());
        }

        section(f, "Impact", &self.impact, |f, impact| {
            if let Some(count) = impact.alert_count() {
                writeln!(f, "  simulated alerts: {count}")?;
            }
            for (severity, count) in impact.alerts_by_severity() {
                writeln!(f, "  {severity}: {count}")?;
            }
            for c in &impact.components {
                writeln!(
                    f,
                    "  {:<6} health={} open alerts={}",
                    c.component_code,
                    fmt_score(c.health_score),
                    c.open_alerts
                )?;
            }
            for d in &impact.metric_deviation {
                writeln!(
                    f,
                    "  {} avg {:.1}% max {:.1}%",
                    d.signal_code, d.avg_delta_pct, d.max_delta_pct
                )?;
            }
            if let Some(health) = &impact.global_health {
                writeln!(
                    f,
                    "  global: risk={} status={}",
                    fmt_risk(health.collapse_risk),
                    health.status.as_deref().unwrap_or("UNKNOWN")
                )?;
            } else if let Some(health) = impact.global_health_during_anomaly {
                writeln!(f, "  global health during anomaly: {health:.1}")?;
            }
            Ok(())
        })?;

        section(f, "Analysis", &self.analysis, |f, analysis| {
            if let Some(anomaly) = &analysis.anomaly {
                if let Some(title) = &anomaly.title {
                    writeln!(f, "  {title}")?;
                }
                writeln!(
                    f,
                    "  type: {}  pipeline: {}",
                    anomaly.kind.as_deref().unwrap_or("-"),
                    anomaly.pipeline.as_deref().unwrap_or("-")
                )?;
                if let Some(w) = anomaly.window() {
                    writeln!(f, "  window: {} -> {} ({} ticks)", w.from_tick, w.to_tick, w.duration())?;
                }
            }
            writeln!(
                f,
                "  collapse risk: {}  status: {}  cascading: {}",
                fmt_risk(analysis.collapse_risk()),
                analysis.status(),
                if analysis.system_state.cascading_behavior { "yes" } else { "no" }
            )?;
            for (label, text) in [
                ("narrative", &analysis.narrative),
                ("what changed", &analysis.what_changed),
                ("propagation", &analysis.where_propagated),
            ] {
                if let Some(text) = text {
                    writeln!(f, "  {label}: {text}")?;
                }
            }
            for observation in &analysis.observations {
                writeln!(f, "  - {observation}")?;
            }
            if let Some(anomaly) = &analysis.anomaly {
                for expected in &anomaly.expected_behavior {
                    writeln!(f, "  -> {expected}")?;
                }
            }
            let ranking = analysis.health_ranking();
            if !ranking.is_empty() {
                writeln!(f, "  health ranking:")?;
                for c in ranking {
                    let name = match &c.component_label {
                        Some(label) => format!("{label} ({})", c.component_code),
                        None => c.component_code.clone(),
                    };
                    writeln!(
                        f,
                        "    {:<20} open alerts={:<3} health={}%",
                        name,
                        c.open_alerts,
                        fmt_score(c.health_score)
                    )?;
                }
            }
            Ok(())
        })
    }
}

fn fmt_score(score: Option<f64>) -> String {
    score.map(|v| format!("{v:.1}")).unwrap_or_else(|| "N/A".into())
}

fn fmt_risk(risk: Option<f64>) -> String {
    risk.map(|v| format!("{v:.2}")).unwrap_or_else(|| "N/A".into())
}
