//! Command-line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use platformops_core::anomalies::AnomalyInjection;
use platformops_core::components::Transform;
use platformops_core::incidents::IncidentStatus;
use platformops_core::types::{DbId, Tick};

/// PlatformOPS operations console
#[derive(Parser, Debug)]
#[command(name = "platformops", author, version, about)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, global = true, env = "PLATFORMOPS_API_URL")]
    pub api_url: Option<String>,

    /// Directory holding the persisted session
    #[arg(long, global = true, env = "PLATFORMOPS_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// First tick of the time window
    #[arg(long, global = true)]
    pub from_tick: Option<Tick>,

    /// Last tick of the time window
    #[arg(long, global = true)]
    pub to_tick: Option<Tick>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        username: String,
        /// Read from PLATFORMOPS_PASSWORD when omitted
        #[arg(short, long, env = "PLATFORMOPS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Check that the backend is reachable
    Ping,
    /// System overview, alert counters, anomaly status and open incidents
    ControlRoom {
        /// Redraw every N seconds until interrupted
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },
    /// Alert events and evaluation
    Alerts {
        #[command(subcommand)]
        action: Option<AlertsAction>,
        /// Restrict to one signal code
        #[arg(long, global = true)]
        signal: Option<String>,
    },
    /// Analytics tabs
    Analytics {
        #[arg(long, default_value = "C1.api_qps")]
        signal: String,
        #[arg(long, default_value = "C1")]
        component: String,
        /// Show a single tab instead of all of them
        #[arg(long, value_enum)]
        tab: Option<TabArg>,
    },
    /// Incident management
    Incidents {
        #[command(subcommand)]
        action: IncidentsAction,
    },
    /// Anomaly status and injection
    Anomalies {
        #[command(subcommand)]
        action: Option<AnomaliesAction>,
    },
    /// Component detail page
    Component {
        /// Component code, e.g. C1
        code: String,
        /// Signals to chart (comma separated)
        #[arg(long, value_delimiter = ',')]
        signals: Vec<String>,
        #[arg(long, value_enum, default_value = "raw")]
        transform: TransformArg,
        /// Drop this component's cached data before loading
        #[arg(long)]
        refresh: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum AlertsAction {
    /// Active alerts, history and activity timeline
    Show,
    /// Evaluate alert rules
    Evaluate {
        #[arg(long, default_value_t = 200)]
        lookback_ticks: i64,
        #[arg(long)]
        simulation: bool,
    },
    /// Delete alert events and evaluate from scratch
    Reset {
        #[arg(long, default_value_t = 200)]
        lookback_ticks: i64,
    },
    /// List alert rules
    Rules,
    /// Generate default rules for every signal
    GenerateRules,
}

#[derive(Subcommand, Debug)]
pub enum IncidentsAction {
    /// List incidents by status
    List {
        #[arg(long, value_enum, default_value = "open")]
        status: StatusArg,
    },
    /// Incident detail with timeline and comments
    Show { id: DbId },
    /// Acknowledge an open incident
    Ack { id: DbId },
    /// Resolve an incident
    Resolve {
        id: DbId,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Add a comment
    Comment { id: DbId, text: String },
    /// Group open alerts into incidents
    Group,
}

#[derive(Subcommand, Debug)]
pub enum AnomaliesAction {
    /// Active anomaly, impact and analysis
    Show,
    /// Inject a synthetic anomaly
    Inject(InjectArgs),
}

#[derive(Args, Debug)]
pub struct InjectArgs {
    #[arg(long, default_value = "stream_lane")]
    pub pipeline: String,
    #[arg(long, default_value = "backlog_growth")]
    pub anomaly_type: String,
    #[arg(long, default_value_t = 100)]
    pub from_tick: Tick,
    #[arg(long, default_value_t = 200)]
    pub to_tick: Tick,
    /// 0.1 to 5.0; 1.0 is normal strength
    #[arg(long, default_value_t = 1.0)]
    pub strength: f64,
}

impl From<InjectArgs> for AnomalyInjection {
    fn from(args: InjectArgs) -> Self {
        AnomalyInjection {
            pipeline: args.pipeline,
            anomaly_type: args.anomaly_type,
            from_tick: args.from_tick,
            to_tick: args.to_tick,
            strength: Some(args.strength),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Open,
    Acknowledged,
    Resolved,
}

impl From<StatusArg> for IncidentStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Open => IncidentStatus::Open,
            StatusArg::Acknowledged => IncidentStatus::Acknowledged,
            StatusArg::Resolved => IncidentStatus::Resolved,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TransformArg {
    Raw,
    Aggregate,
    Derivative,
    Normalized,
}

impl From<TransformArg> for Transform {
    fn from(arg: TransformArg) -> Self {
        match arg {
            TransformArg::Raw => Transform::Raw,
            TransformArg::Aggregate => Transform::Aggregate,
            TransformArg::Derivative => Transform::Derivative,
            TransformArg::Normalized => Transform::Normalized,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TabArg {
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

impl TabArg {
    /// The analytics tab of the same name; both use kebab-case names.
    pub fn name(&self) -> String {
        self.to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use platformops_client::views::analytics::AnalyticsTab;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn every_tab_arg_names_an_analytics_tab() {
        for arg in TabArg::value_variants() {
            assert!(arg.name().parse::<AnalyticsTab>().is_ok(), "{}", arg.name());
        }
    }

    #[test]
    fn inject_defaults_are_valid() {
        let cli = Cli::try_parse_from(["platformops", "anomalies", "inject"]).unwrap();
        let Command::Anomalies {
            action: Some(AnomaliesAction::Inject(args)),
        } = cli.command
        else {
            panic!("expected anomalies inject");
        };
        let injection = AnomalyInjection::from(args);
        assert_eq!(injection, AnomalyInjection::default());
    }

    #[test]
    fn signals_split_on_commas() {
        let cli = Cli::try_parse_from([
            "platformops",
            "component",
            "C1",
            "--signals",
            "C1.api_qps,C1.cpu",
            "--transform",
            "derivative",
        ])
        .unwrap();
        let Command::Component { signals, transform, .. } = cli.command else {
            panic!("expected component");
        };
        assert_eq!(signals, vec!["C1.api_qps", "C1.cpu"]);
        assert!(matches!(transform, TransformArg::Derivative));
    }
}
