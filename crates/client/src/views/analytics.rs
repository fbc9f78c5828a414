//! Analytics page. Each tab maps to one or more analytics queries; tabs
//! that are not selected stay [`QueryState::Disabled`].

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use platformops_core::analytics::{ChangeImpact, ForecastPoint, Regime, StressPoint};
use platformops_core::error::CoreError;
use platformops_core::presentation::{gauge, HealthBand};

use super::{heading, json_map, json_rows, queries, section, QueryState};
use crate::context::AppContext;

pub const DEFAULT_SIGNAL: &str = "C1.api_qps";
pub const DEFAULT_COMPONENT: &str = "C1";

/// Tick range the alerts statistics tab covers.
pub const ALERTS_STATS_RANGE: (i64, i64) = (1000, 2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsTab {
    Health,
    Volatility,
    Forecast,
    Regimes,
    Stress,
    ChangeImpact,
    SystemStats,
    AlertsStats,
    ComponentRankings,
    SignalCoverage,
    ActiveHotspots,
    TimeAnalysis,
    SignalEnvelope,
}

impl AnalyticsTab {
    pub const ALL: [AnalyticsTab; 13] = [
        AnalyticsTab::Health,
        AnalyticsTab::Volatility,
        AnalyticsTab::Forecast,
        AnalyticsTab::Regimes,
        AnalyticsTab::Stress,
        AnalyticsTab::ChangeImpact,
        AnalyticsTab::SystemStats,
        AnalyticsTab::AlertsStats,
        AnalyticsTab::ComponentRankings,
        AnalyticsTab::SignalCoverage,
        AnalyticsTab::ActiveHotspots,
        AnalyticsTab::TimeAnalysis,
        AnalyticsTab::SignalEnvelope,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsTab::Health => "health",
            AnalyticsTab::Volatility => "volatility",
            AnalyticsTab::Forecast => "forecast",
            AnalyticsTab::Regimes => "regimes",
            AnalyticsTab::Stress => "stress",
            AnalyticsTab::ChangeImpact => "change-impact",
            AnalyticsTab::SystemStats => "system-stats",
            AnalyticsTab::AlertsStats => "alerts-stats",
            AnalyticsTab::ComponentRankings => "component-rankings",
            AnalyticsTab::SignalCoverage => "signal-coverage",
            AnalyticsTab::ActiveHotspots => "active-hotspots",
            AnalyticsTab::TimeAnalysis => "time-analysis",
            AnalyticsTab::SignalEnvelope => "signal-envelope",
        }
    }
}

impl FromStr for AnalyticsTab {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalyticsTab::ALL
            .into_iter()
            .find(|tab| tab.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("unknown analytics tab '{s}'")))
    }
}

/// What the analytics page is looking at.
#[derive(Debug, Clone)]
pub struct AnalyticsSelection {
    pub signal: String,
    pub component: String,
    /// `None` loads every tab.
    pub tab: Option<AnalyticsTab>,
}

impl Default for AnalyticsSelection {
    fn default() -> Self {
        Self {
            signal: DEFAULT_SIGNAL.into(),
            component: DEFAULT_COMPONENT.into(),
            tab: None,
        }
    }
}

impl AnalyticsSelection {
    fn shows(&self, tab: AnalyticsTab) -> bool {
        self.tab.map_or(true, |selected| selected == tab)
    }
}

pub struct AnalyticsView {
    pub selection: AnalyticsSelection,
    pub global_health: QueryState<f64>,
    /// Health per configured component, in configuration order.
    pub component_health: Vec<(String, QueryState<f64>)>,
    pub volatility: QueryState<f64>,
    pub forecast: QueryState<Vec<ForecastPoint>>,
    pub regimes: QueryState<Vec<Regime>>,
    pub stress: QueryState<Vec<StressPoint>>,
    pub change_impact: QueryState<Vec<ChangeImpact>>,
    pub system_stats: QueryState<Map<String, Value>>,
    pub alerts_stats: QueryState<Vec<Value>>,
    pub rankings: QueryState<Vec<Value>>,
    pub coverage: QueryState<Vec<Value>>,
    pub hotspots: QueryState<Vec<Value>>,
    pub time_analysis: QueryState<Map<String, Value>>,
    pub envelope: QueryState<Vec<Value>>,
}

/// Run `fut` only when `enabled`, otherwise report the query as disabled.
async fn when<T, F>(enabled: bool, what: &'static str, fut: F) -> QueryState<T>
where
    F: std::future::Future<Output = Result<T, crate::error::ApiError>>,
{
    if enabled {
        QueryState::from_result(what, fut.await)
    } else {
        QueryState::Disabled
    }
}

impl AnalyticsView {
    pub async fn load(ctx: &AppContext, selection: AnalyticsSelection) -> Self {
        use AnalyticsTab as T;
        let s = &selection;
        let signal = s.signal.as_str();
        let component = s.component.as_str();
        let (from_tick, to_tick) = ALERTS_STATS_RANGE;

        let health_components = &ctx.config().health_components;
        let component_health = futures::future::join_all(health_components.iter().map(|code| async move {
            let state = when(s.shows(T::Health), "componentHealth", queries::component_health(ctx, code)).await;
            (code.clone(), state)
        }));

        let (
            global_health,
            component_health,
            volatility,
            forecast,
            regimes,
            stress,
            change_impact,
            system_stats,
        ) = futures::join!(
            when(s.shows(T::Health), "globalHealth", queries::global_health(ctx)),
            component_health,
            when(s.shows(T::Volatility), "volatility", queries::volatility(ctx, signal)),
            when(s.shows(T::Forecast), "forecast", queries::forecast(ctx, signal)),
            when(s.shows(T::Regimes), "regimes", queries::component_regimes(ctx, component)),
            when(s.shows(T::Stress), "stress", queries::component_stress(ctx, component)),
            when(
                s.shows(T::ChangeImpact),
                "changeImpact",
                queries::change_impact(ctx, Some(signal))
            ),
            when(s.shows(T::SystemStats), "systemStats", queries::system_stats(ctx)),
        );

        let (alerts_stats, rankings, coverage, hotspots, time_analysis, envelope) = futures::join!(
            when(
                s.shows(T::AlertsStats),
                "alertsStats",
                queries::alerts_stats(ctx, from_tick, to_tick)
            ),
            when(
                s.shows(T::ComponentRankings),
                "componentRankings",
                queries::component_rankings(ctx)
            ),
            when(s.shows(T::SignalCoverage), "signalCoverage", queries::signal_coverage(ctx)),
            when(s.shows(T::ActiveHotspots), "activeHotspots", queries::active_hotspots(ctx)),
            when(
                s.shows(T::TimeAnalysis),
                "timeAnalysis",
                queries::component_time_analysis(ctx, component)
            ),
            when(
                s.shows(T::SignalEnvelope),
                "signalEnvelope",
                queries::signal_envelope(ctx, signal)
            ),
        );

        Self {
            selection,
            global_health,
            component_health,
            volatility,
            forecast,
            regimes,
            stress,
            change_impact,
            system_stats,
            alerts_stats,
            rankings,
            coverage,
            hotspots,
            time_analysis,
            envelope,
        }
    }
}

fn health_line(f: &mut fmt::Formatter<'_>, label: &str, score: f64) -> fmt::Result {
    writeln!(
        f,
        "  {label:<8} {} {}",
        gauge(score, 20),
        HealthBand::for_score(score)
    )
}

impl fmt::Display for AnalyticsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, "Analytics")?;
        writeln!(
            f,
            "signal: {}  component: {}",
            self.selection.signal, self.selection.component
        )?;
        let shows = |tab| self.selection.shows(tab);

        if shows(AnalyticsTab::Health) {
            section(f, "Global health", &self.global_health, |f, score| {
                health_line(f, "global", *score)
            })?;
            for (code, state) in &self.component_health {
                section(f, &format!("{code} health"), state, |f, score| {
                    health_line(f, code, *score)
                })?;
            }
        }
        if shows(AnalyticsTab::Volatility) {
            section(f, "Volatility", &self.volatility, |f, v| writeln!(f, "  {v:.4}"))?;
        }
        if shows(AnalyticsTab::Forecast) {
            section(f, "Forecast", &self.forecast, |f, points| {
                if points.is_empty() {
                    return writeln!(f, "  (no data)");
                }
                for p in points {
                    let band = match (p.lower, p.upper) {
                        (Some(lo), Some(hi)) => format!("  [{lo:.2}, {hi:.2}]"),
                        _ => String::new(),
                    };
                    writeln!(f, "  tick {:>6}  {:.2}{band}", p.tick, p.value)?;
                }
                Ok(())
            })?;
        }
        if shows(AnalyticsTab::Regimes) {
            section(f, "Regimes", &self.regimes, |f, regimes| {
                if regimes.is_empty() {
                    return writeln!(f, "  (no data)");
                }
                for r in regimes {
                    writeln!(f, "  {:>6}-{:<6} {}", r.start_tick, r.end_tick, r.kind)?;
                }
                Ok(())
            })?;
        }
        if shows(AnalyticsTab::Stress) {
            section(f, "Stress", &self.stress, |f, points| {
                if points.is_empty() {
                    return writeln!(f, "  (no data)");
                }
                for p in points {
                    writeln!(f, "  tick {:>6}  {:.2}", p.tick, p.stress_level)?;
                }
                Ok(())
            })?;
        }
        if shows(AnalyticsTab::ChangeImpact) {
            section(f, "Change impact", &self.change_impact, |f, impacts| {
                if impacts.is_empty() {
                    return writeln!(f, "  (no data)");
                }
                for i in impacts {
                    writeln!(
                        f,
                        "  tick {:>6}  impact={:.2}  {}",
                        i.change_tick,
                        i.impact_score,
                        i.affected_signals.join(", ")
                    )?;
                }
                Ok(())
            })?;
        }
        if shows(AnalyticsTab::SystemStats) {
            section(f, "System stats", &self.system_stats, json_map)?;
        }
        if shows(AnalyticsTab::AlertsStats) {
            section(f, "Alerts stats", &self.alerts_stats, |f, rows| json_rows(f, rows))?;
        }
        if shows(AnalyticsTab::ComponentRankings) {
            section(f, "Component rankings", &self.rankings, |f, rows| json_rows(f, rows))?;
        }
        if shows(AnalyticsTab::SignalCoverage) {
            section(f, "Signal coverage", &self.coverage, |f, rows| json_rows(f, rows))?;
        }
        if shows(AnalyticsTab::ActiveHotspots) {
            section(f, "Active hotspots", &self.hotspots, |f, rows| json_rows(f, rows))?;
        }
        if shows(AnalyticsTab::TimeAnalysis) {
            section(f, "Time analysis", &self.time_analysis, json_map)?;
        }
        if shows(AnalyticsTab::SignalEnvelope) {
            section(f, "Signal envelope", &self.envelope, |f, rows| json_rows(f, rows))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_parse_from_their_names() {
        for tab in AnalyticsTab::ALL {
            assert_eq!(tab.as_str().parse::<AnalyticsTab>().unwrap(), tab);
        }
        assert!("heatmap".parse::<AnalyticsTab>().is_err());
    }

    #[test]
    fn no_tab_selected_shows_everything() {
        let selection = AnalyticsSelection::default();
        assert!(AnalyticsTab::ALL.iter().all(|t| selection.shows(*t)));

        let selection = AnalyticsSelection {
            tab: Some(AnalyticsTab::Stress),
            ..Default::default()
        };
        assert!(selection.shows(AnalyticsTab::Stress));
        assert!(!selection.shows(AnalyticsTab::Health));
    }
}
