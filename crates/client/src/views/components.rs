//! Component detail page: signals, alerts, time analysis, regimes, stress
//! and charts of selected signals.

use std::fmt;

use serde_json::{Map, Value};

use platformops_core::alerts::AlertEvent;
use platformops_core::analytics::{Regime, StressPoint};
use platformops_core::anomalies::ActiveAnomalies;
use platformops_core::components::{merge_series, ComponentDetails, TimeseriesSet, Transform};
use platformops_core::presentation::HealthBand;
use platformops_core::types::Tick;
use platformops_core::window::TimeWindow;

use super::{heading, json_map, queries, section, QueryState};
use crate::cache::{QueryKey, Resource};
use crate::context::AppContext;
use crate::error::ApiError;
use crate::mutation::Mutation;

/// Window size of the aggregate transform.
pub const AGGREGATE_WINDOW: i64 = 10;
pub const AGGREGATE_FN: &str = "avg";

/// Signals to chart and how to transform them.
#[derive(Debug, Clone, Default)]
pub struct ChartSelection {
    pub signals: Vec<String>,
    pub transform: Transform,
}

pub struct ComponentView {
    pub code: String,
    pub details: QueryState<ComponentDetails>,
    pub alerts: QueryState<Vec<AlertEvent>>,
    pub time_analysis: QueryState<Map<String, Value>>,
    pub regimes: QueryState<Vec<Regime>>,
    pub stress: QueryState<Vec<StressPoint>>,
    pub anomaly: QueryState<ActiveAnomalies>,
    pub transform: Transform,
    pub window: TimeWindow,
    /// Disabled until at least one signal is selected.
    pub series: QueryState<TimeseriesSet>,
}

impl ComponentView {
    pub async fn load(ctx: &AppContext, code: &str, chart: &ChartSelection) -> Self {
        let window = ctx.time_window().get();
        let (details, alerts, time_analysis, regimes, stress, anomaly, series) = futures::join!(
            queries::component_details(ctx, code),
            queries::alerts_by_component(ctx, code),
            queries::component_time_analysis(ctx, code),
            queries::component_regimes(ctx, code),
            queries::component_stress(ctx, code),
            queries::active_anomaly(ctx),
            load_series(ctx, chart, window),
        );

        Self {
            code: code.to_string(),
            details: QueryState::from_result("componentDetails", details),
            alerts: QueryState::from_result("alertsByComponent", alerts),
            time_analysis: QueryState::from_result("componentTimeAnalysis", time_analysis),
            regimes: QueryState::from_result("componentRegimes", regimes),
            stress: QueryState::from_result("componentStress", stress),
            anomaly: QueryState::from_result("activeAnomaly", anomaly),
            transform: chart.transform,
            window,
            series,
        }
    }

    /// Drop this component's cached queries so the next load refetches.
    pub async fn refresh(ctx: &AppContext, code: &str) -> usize {
        ctx.cache()
            .apply(&Mutation::RefreshComponent(code.to_string()))
            .await
    }

    /// Tick range to shade on charts while an anomaly is active.
    pub fn anomaly_window(&self) -> Option<(Tick, Tick)> {
        self.anomaly.value().and_then(ActiveAnomalies::window)
    }
}

async fn load_series(
    ctx: &AppContext,
    chart: &ChartSelection,
    window: TimeWindow,
) -> QueryState<TimeseriesSet> {
    if chart.signals.is_empty() {
        return QueryState::Disabled;
    }

    let key = QueryKey::new(Resource::Timeseries)
        .with(chart.signals.join(","))
        .with(chart.transform.as_str())
        .with(window.from_tick)
        .with(window.to_tick);
    let result = ctx
        .query(key, fetch_series(ctx, &chart.signals, chart.transform))
        .await
        .map(|set| clip_to_window(set, window));
    QueryState::from_result("timeseries", result)
}

/// Raw series come from the multi endpoint in one request. Transformed
/// series are fetched per signal; a signal whose request fails charts as
/// an empty series instead of failing the whole chart.
async fn fetch_series(
    ctx: &AppContext,
    signals: &[String],
    transform: Transform,
) -> Result<TimeseriesSet, ApiError> {
    let api = ctx.api();
    if transform == Transform::Raw {
        return api.fetch_multi_timeseries(signals).await;
    }

    let fetches = signals.iter().map(|signal| async move {
        let result = match transform {
            Transform::Aggregate => api.fetch_aggregate(signal, AGGREGATE_WINDOW, AGGREGATE_FN).await,
            Transform::Derivative => api.fetch_derivative(signal).await,
            Transform::Normalized | Transform::Raw => api.fetch_normalized(signal).await,
        };
        let series = result.unwrap_or_else(|e| {
            tracing::warn!(signal = %signal, transform = %transform, error = %e, "Series fetch failed, charting empty");
            Vec::new()
        });
        (signal.clone(), series)
    });

    Ok(futures::future::join_all(fetches).await.into_iter().collect())
}

/// Keep only the points inside `window`.
pub fn clip_to_window(mut set: TimeseriesSet, window: TimeWindow) -> TimeseriesSet {
    for series in set.values_mut() {
        series.retain(|p| window.contains(p.tick));
    }
    set
}

impl fmt::Display for ComponentView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, &format!("{} Details", self.code))?;

        section(f, "Signals", &self.details, |f, details| {
            match details.health_score {
                Some(score) => writeln!(f, "  health: {score:.1}% ({})", HealthBand::for_score(score))?,
                None => writeln!(f, "  health: N/A")?,
            }
            for s in &details.signals {
                writeln!(
                    f,
                    "  {:<28} {:<8} {:<10} {}",
                    s.signal_code,
                    s.unit.as_deref().unwrap_or(""),
                    s.polarity.as_deref().unwrap_or(""),
                    s.description.as_deref().unwrap_or(""),
                )?;
            }
            Ok(())
        })?;

        section(f, "Alerts", &self.alerts, |f, alerts| {
            if alerts.is_empty() {
                return writeln!(f, "  (none)");
            }
            for a in alerts {
                writeln!(
                    f,
                    "  #{:<5} {:<9} {:<24} {}",
                    a.id,
                    a.severity.as_deref().unwrap_or("-"),
                    a.signal_code.as_deref().unwrap_or("-"),
                    if a.is_open() { "open" } else { "closed" },
                )?;
            }
            Ok(())
        })?;

        section(f, "Time analysis", &self.time_analysis, json_map)?;

        section(f, "Regimes", &self.regimes, |f, regimes| {
            for r in regimes {
                writeln!(f, "  {:>6}-{:<6} {}", r.start_tick, r.end_tick, r.kind)?;
            }
            Ok(())
        })?;

        section(f, "Stress", &self.stress, |f, points| {
            for p in points {
                writeln!(f, "  tick {:>6}  {:.2}", p.tick, p.stress_level)?;
            }
            Ok(())
        })?;

        if let QueryState::Disabled = self.series {
            return Ok(());
        }
        let anomaly = self.anomaly_window();
        section(
            f,
            &format!("Series ({}, ticks {}-{})", self.transform, self.window.from_tick, self.window.to_tick),
            &self.series,
            |f, set| {
                if set.values().all(Vec::is_empty) {
                    return writeln!(f, "  No timeseries data available for selected signals");
                }
                writeln!(f, "  tick    {}", set.keys().cloned().collect::<Vec<_>>().join("  "))?;
                for (tick, values) in merge_series(set) {
                    let marker = match anomaly {
                        Some((from, to)) if (from..=to).contains(&tick) => "*",
                        _ => " ",
                    };
                    let cells: Vec<String> = values
                        .iter()
                        .map(|v| v.map(|v| format!("{v:.3}")).unwrap_or_else(|| "-".into()))
                        .collect();
                    writeln!(f, " {marker}{tick:<6} {}", cells.join("  "))?;
                }
                Ok(())
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platformops_core::components::TimeseriesPoint;

    #[test]
    fn clip_keeps_points_inside_window() {
        let mut set = TimeseriesSet::new();
        set.insert(
            "C1.api_qps".into(),
            (0..10).map(|t| TimeseriesPoint { tick: t * 100, value: 1.0 }).collect(),
        );

        let clipped = clip_to_window(set, TimeWindow::new(200, 500).unwrap());
        let ticks: Vec<Tick> = clipped["C1.api_qps"].iter().map(|p| p.tick).collect();
        assert_eq!(ticks, vec![200, 300, 400, 500]);
    }
}
