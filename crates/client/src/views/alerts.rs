//! Active alerts, alert history and the per-tick activity timeline.

use std::collections::BTreeSet;
use std::fmt;

use platformops_core::alerts::{AlertEvent, AlertRule, EvaluateRequest, ResetEvaluateRequest};
use platformops_core::types::Tick;

use super::{heading, queries, section, QueryState};
use crate::context::AppContext;
use crate::error::ApiError;
use crate::mutation::Mutation;

/// Open events per severity at one tick of the timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimelineBucket {
    pub tick: Tick,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

/// Count the events spanning each distinct start tick.
///
/// An event without an end tick counts at every tick from its start on.
/// Severities match the backend's lowercase names exactly; any other
/// spelling is not counted.
pub fn timeline_buckets(events: &[AlertEvent]) -> Vec<TimelineBucket> {
    let ticks: BTreeSet<Tick> = events.iter().filter_map(|e| e.tick_start).collect();

    ticks
        .into_iter()
        .map(|tick| {
            let mut bucket = TimelineBucket {
                tick,
                ..Default::default()
            };
            let spanning = events.iter().filter(|e| match e.tick_start {
                Some(start) => start <= tick && e.tick_end.unwrap_or(tick) >= tick,
                None => false,
            });
            for event in spanning {
                match event.severity.as_deref() {
                    Some("critical") => bucket.critical += 1,
                    Some("warning") => bucket.warning += 1,
                    Some("info") => bucket.info += 1,
                    _ => {}
                }
            }
            bucket
        })
        .collect()
}

pub struct AlertsView {
    pub signal: Option<String>,
    pub active: QueryState<Vec<AlertEvent>>,
    pub history: QueryState<Vec<AlertEvent>>,
    pub timeline: QueryState<Vec<TimelineBucket>>,
    pub rules: QueryState<Vec<AlertRule>>,
}

impl AlertsView {
    /// Load the alerts page, optionally filtered to one signal.
    pub async fn load(ctx: &AppContext, signal: Option<&str>) -> Self {
        let signal = signal.filter(|s| !s.is_empty());
        let (active, history, timeline, rules) = futures::join!(
            queries::active_alerts(ctx, signal),
            queries::alert_history(ctx, signal),
            queries::alert_timeline(ctx, signal),
            queries::alert_rules(ctx),
        );

        Self {
            signal: signal.map(str::to_string),
            active: QueryState::from_result("activeAlerts", active),
            history: QueryState::from_result("alertHistory", history),
            timeline: QueryState::from_result(
                "alertEventsForTimeline",
                timeline.map(|events| timeline_buckets(&events)),
            ),
            rules: QueryState::from_result("alertRules", rules),
        }
    }

    pub async fn evaluate(ctx: &AppContext, request: EvaluateRequest) -> Result<serde_json::Value, ApiError> {
        ctx.mutate(Mutation::EvaluateAlerts, ctx.api().evaluate_alerts(request))
            .await
    }

    pub async fn reset_and_evaluate(
        ctx: &AppContext,
        request: ResetEvaluateRequest,
    ) -> Result<serde_json::Value, ApiError> {
        ctx.mutate(Mutation::ResetAndEvaluate, ctx.api().reset_and_evaluate(request))
            .await
    }

    /// Returns the number of rules created.
    pub async fn generate_rules(ctx: &AppContext) -> Result<i64, ApiError> {
        let generated = ctx
            .mutate(Mutation::GenerateRules, ctx.api().generate_all_rules())
            .await?;
        Ok(generated.created_rules)
    }
}

fn event_rows(f: &mut fmt::Formatter<'_>, events: &[AlertEvent]) -> fmt::Result {
    if events.is_empty() {
        return writeln!(f, "  (none)");
    }
    for event in events {
        let span = match (event.tick_start, event.tick_end) {
            (Some(start), Some(end)) => format!("{start}-{end}"),
            (Some(start), None) => format!("{start}-"),
            _ => "?".to_string(),
        };
        writeln!(
            f,
            "  #{:<5} {:<9} {:<24} ticks {:<11} peak={}",
            event.id,
            event.severity.as_deref().unwrap_or("-"),
            event.signal_code.as_deref().unwrap_or("-"),
            span,
            event
                .peak_value
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "-".into()),
        )?;
    }
    Ok(())
}

impl fmt::Display for AlertsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, "Alerts")?;
        if let Some(signal) = &self.signal {
            writeln!(f, "signal: {signal}")?;
        }
        section(f, "Active", &self.active, |f, events| event_rows(f, events))?;
        section(f, "History", &self.history, |f, events| event_rows(f, events))?;
        section(f, "Activity timeline", &self.timeline, |f, buckets| {
            if buckets.is_empty() {
                return writeln!(f, "  (no events)");
            }
            for b in buckets {
                writeln!(
                    f,
                    "  tick {:>6}  critical={} warning={} info={}",
                    b.tick, b.critical, b.warning, b.info
                )?;
            }
            Ok(())
        })?;
        section(f, "Rules", &self.rules, |f, rules| {
            writeln!(
                f,
                "  {} rules, {} enabled",
                rules.len(),
                rules.iter().filter(|r| r.enabled).count()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(start: Tick, end: Option<Tick>, severity: &str) -> AlertEvent {
        serde_json::from_value(json!({
            "id": start,
            "rule_id": 1,
            "tick_start": start,
            "tick_end": end,
            "severity": severity,
        }))
        .unwrap()
    }

    #[test]
    fn buckets_count_overlapping_events() {
        let events = vec![
            event(10, Some(30), "critical"),
            event(20, None, "warning"),
            event(40, Some(40), "info"),
        ];

        let buckets = timeline_buckets(&events);
        let ticks: Vec<Tick> = buckets.iter().map(|b| b.tick).collect();
        assert_eq!(ticks, vec![10, 20, 40]);

        assert_eq!(buckets[0], TimelineBucket { tick: 10, critical: 1, warning: 0, info: 0 });
        assert_eq!(buckets[1], TimelineBucket { tick: 20, critical: 1, warning: 1, info: 0 });
        assert_eq!(buckets[2], TimelineBucket { tick: 40, critical: 0, warning: 1, info: 1 });
    }

    #[test]
    fn severity_match_is_case_sensitive() {
        let events = vec![event(5, Some(5), "CRITICAL"), event(5, Some(5), "critical")];

        let buckets = timeline_buckets(&events);
        assert_eq!(buckets, vec![TimelineBucket { tick: 5, critical: 1, warning: 0, info: 0 }]);
    }
}
