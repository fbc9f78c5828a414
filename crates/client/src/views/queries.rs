//! Declared queries: one function per cached query, pairing its key with
//! the request that fills it. Views share these so that the same key
//! always maps to the same request.

use serde_json::{Map, Value};

use platformops_core::alerts::{AlertEvent, AlertRule, AlertSummary, STATUS_OPEN};
use platformops_core::analytics::{ChangeImpact, ForecastPoint, Regime, StressPoint};
use platformops_core::anomalies::{ActiveAnomalies, AnomalyAnalysis, AnomalyImpact};
use platformops_core::components::{ComponentDetails, ComponentOverview};
use platformops_core::incidents::{Incident, IncidentComment, IncidentStatus, IncidentTimelineEvent};
use platformops_core::types::{DbId, Tick};

use crate::cache::{QueryKey, Resource};
use crate::context::AppContext;
use crate::error::ApiError;

pub const ACTIVE_ALERTS_LIMIT: i64 = 100;
pub const ALERT_HISTORY_LIMIT: i64 = 200;
pub const ALERT_TIMELINE_LIMIT: i64 = 500;

// ---- alerts ----

pub async fn system_overview(ctx: &AppContext) -> Result<Vec<ComponentOverview>, ApiError> {
    ctx.query(QueryKey::new(Resource::SystemOverview), ctx.api().fetch_system_overview())
        .await
}

pub async fn alert_summary(ctx: &AppContext) -> Result<AlertSummary, ApiError> {
    ctx.query(QueryKey::new(Resource::AlertSummary), ctx.api().fetch_alert_summary())
        .await
}

pub async fn active_alerts(ctx: &AppContext, signal: Option<&str>) -> Result<Vec<AlertEvent>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::ActiveAlerts).with(signal),
        ctx.api()
            .fetch_alert_events(signal, Some(STATUS_OPEN), ACTIVE_ALERTS_LIMIT),
    )
    .await
}

pub async fn alert_history(ctx: &AppContext, signal: Option<&str>) -> Result<Vec<AlertEvent>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::AlertHistory).with(signal),
        ctx.api().fetch_alert_events(signal, None, ALERT_HISTORY_LIMIT),
    )
    .await
}

pub async fn alert_timeline(ctx: &AppContext, signal: Option<&str>) -> Result<Vec<AlertEvent>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::AlertTimeline).with(signal),
        ctx.api().fetch_alert_events(signal, None, ALERT_TIMELINE_LIMIT),
    )
    .await
}

pub async fn alert_rules(ctx: &AppContext) -> Result<Vec<AlertRule>, ApiError> {
    ctx.query(QueryKey::new(Resource::AlertRules), ctx.api().fetch_alert_rules())
        .await
}

pub async fn alerts_by_component(ctx: &AppContext, code: &str) -> Result<Vec<AlertEvent>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::AlertsByComponent).with(code),
        ctx.api().fetch_alerts_by_component(code),
    )
    .await
}

pub async fn alert_spikes(ctx: &AppContext) -> Result<Value, ApiError> {
    ctx.query(QueryKey::new(Resource::AlertSpikes), ctx.api().fetch_alert_spikes())
        .await
}

// ---- analytics ----

pub async fn global_health(ctx: &AppContext) -> Result<f64, ApiError> {
    ctx.query(QueryKey::new(Resource::GlobalHealth), ctx.api().fetch_global_health())
        .await
}

pub async fn component_health(ctx: &AppContext, code: &str) -> Result<f64, ApiError> {
    ctx.query(
        QueryKey::new(Resource::ComponentHealth).with(code),
        ctx.api().fetch_component_health(code),
    )
    .await
}

pub async fn volatility(ctx: &AppContext, signal: &str) -> Result<f64, ApiError> {
    ctx.query(
        QueryKey::new(Resource::Volatility).with(signal),
        ctx.api().fetch_volatility(signal, 10),
    )
    .await
}

pub async fn forecast(ctx: &AppContext, signal: &str) -> Result<Vec<ForecastPoint>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::Forecast).with(signal),
        ctx.api().fetch_forecast(signal, 30),
    )
    .await
}

pub async fn component_regimes(ctx: &AppContext, code: &str) -> Result<Vec<Regime>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::ComponentRegimes).with(code),
        ctx.api().fetch_regimes(code, 1440, 60),
    )
    .await
}

pub async fn component_stress(ctx: &AppContext, code: &str) -> Result<Vec<StressPoint>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::ComponentStress).with(code),
        ctx.api().fetch_stress_curve(code, 600, 20),
    )
    .await
}

pub async fn change_impact(ctx: &AppContext, signal: Option<&str>) -> Result<Vec<ChangeImpact>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::ChangeImpact).with(signal),
        ctx.api().fetch_change_impact(signal, 1000, 200),
    )
    .await
}

pub async fn system_stats(ctx: &AppContext) -> Result<Map<String, Value>, ApiError> {
    ctx.query(QueryKey::new(Resource::SystemStats), ctx.api().fetch_system_stats())
        .await
}

pub async fn alerts_stats(ctx: &AppContext, from_tick: Tick, to_tick: Tick) -> Result<Vec<Value>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::AlertsStats).with(from_tick).with(to_tick),
        ctx.api()
            .fetch_alerts_stats(Some(from_tick), Some(to_tick), 10),
    )
    .await
}

pub async fn component_rankings(ctx: &AppContext) -> Result<Vec<Value>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::ComponentRankings),
        ctx.api().fetch_component_rankings(10),
    )
    .await
}

pub async fn signal_coverage(ctx: &AppContext) -> Result<Vec<Value>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::SignalCoverage),
        ctx.api().fetch_signal_coverage(200, 20),
    )
    .await
}

pub async fn active_hotspots(ctx: &AppContext) -> Result<Vec<Value>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::ActiveHotspots),
        ctx.api().fetch_active_hotspots(15),
    )
    .await
}

pub async fn component_time_analysis(ctx: &AppContext, code: &str) -> Result<Map<String, Value>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::ComponentTimeAnalysis).with(code),
        ctx.api().fetch_component_time_analysis(code, 500),
    )
    .await
}

pub async fn signal_envelope(ctx: &AppContext, signal: &str) -> Result<Vec<Value>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::SignalEnvelope).with(signal),
        ctx.api().fetch_signal_envelope(signal, 300, 10),
    )
    .await
}

// ---- incidents ----

pub async fn incidents(ctx: &AppContext, status: IncidentStatus) -> Result<Vec<Incident>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::Incidents).with(status.as_str()),
        ctx.api().fetch_incidents(status),
    )
    .await
}

pub async fn incident(ctx: &AppContext, id: DbId) -> Result<Incident, ApiError> {
    ctx.query(QueryKey::new(Resource::Incident).with(id), ctx.api().fetch_incident(id))
        .await
}

pub async fn incident_timeline(ctx: &AppContext, id: DbId) -> Result<Vec<IncidentTimelineEvent>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::IncidentTimeline).with(id),
        ctx.api().fetch_incident_timeline(id),
    )
    .await
}

pub async fn incident_comments(ctx: &AppContext, id: DbId) -> Result<Vec<IncidentComment>, ApiError> {
    ctx.query(
        QueryKey::new(Resource::IncidentComments).with(id),
        ctx.api().fetch_incident_comments(id),
    )
    .await
}

// ---- anomalies ----

pub async fn active_anomaly(ctx: &AppContext) -> Result<ActiveAnomalies, ApiError> {
    ctx.query(QueryKey::new(Resource::ActiveAnomaly), ctx.api().fetch_active_anomaly())
        .await
}

pub async fn anomaly_impact(ctx: &AppContext) -> Result<AnomalyImpact, ApiError> {
    ctx.query(QueryKey::new(Resource::AnomalyImpact), ctx.api().fetch_anomaly_impact())
        .await
}

pub async fn anomaly_analysis(ctx: &AppContext) -> Result<AnomalyAnalysis, ApiError> {
    ctx.query(
        QueryKey::new(Resource::AnomalyAnalysis),
        ctx.api().fetch_anomaly_analysis(),
    )
    .await
}

// ---- components ----

pub async fn component_details(ctx: &AppContext, code: &str) -> Result<ComponentDetails, ApiError> {
    ctx.query(
        QueryKey::new(Resource::ComponentDetails).with(code),
        ctx.api().fetch_component_details(code),
    )
    .await
}
