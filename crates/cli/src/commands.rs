//! Command dispatch: build the context, run the view or action, print.

use std::time::Duration;

use anyhow::{bail, Context};

use platformops_client::config::ClientConfig;
use platformops_client::views::alerts::AlertsView;
use platformops_client::views::analytics::{AnalyticsSelection, AnalyticsTab, AnalyticsView};
use platformops_client::views::anomalies::AnomaliesView;
use platformops_client::views::components::{ChartSelection, ComponentView};
use platformops_client::views::control_room::ControlRoom;
use platformops_client::views::incidents::{IncidentDetailView, IncidentListView};
use platformops_client::views::queries;
use platformops_client::AppContext;
use platformops_core::alerts::{EvaluateRequest, ResetEvaluateRequest};
use platformops_core::anomalies::AnomalyInjection;
use platformops_core::window::TimeWindow;

use crate::cli::{AlertsAction, AnomaliesAction, Cli, Command, IncidentsAction};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(state_dir) = cli.state_dir {
        config.state_dir = state_dir;
    }

    tracing::debug!(
        api_url = %config.api_url,
        state_dir = %config.state_dir.display(),
        "Starting",
    );
    let ctx = AppContext::init(config).context("failed to initialize client")?;

    if cli.from_tick.is_some() || cli.to_tick.is_some() {
        let default = TimeWindow::default();
        let window = TimeWindow::new(
            cli.from_tick.unwrap_or(default.from_tick),
            cli.to_tick.unwrap_or(default.to_tick),
        )?;
        ctx.time_window().set(window);
    }

    let result = dispatch(&ctx, cli.command).await;
    ctx.shutdown().await;
    result
}

async fn dispatch(ctx: &AppContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { username, password } => {
            let user = ctx.login(&username, &password).await.context("login failed")?;
            println!("Logged in as {} ({})", user.username, user.roles.join(", "));
        }
        Command::Logout => {
            ctx.logout().await?;
            println!("Logged out");
        }
        Command::Whoami => match ctx.session().user() {
            Some(user) => println!(
                "{} roles=[{}] active={}",
                user.username,
                user.roles.join(", "),
                user.is_active
            ),
            None => bail!("not logged in"),
        },
        Command::Ping => {
            let body = ctx.api().ping().await.context("backend unreachable")?;
            println!("{body}");
        }
        Command::ControlRoom { watch } => match watch {
            None => println!("{}", ControlRoom::load(ctx).await),
            Some(secs) => {
                let period = Duration::from_secs(secs.max(1));
                loop {
                    println!("{}", ControlRoom::load(ctx).await);
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => break,
                        _ = tokio::time::sleep(period) => {}
                    }
                    ctx.cache().clear().await;
                }
            }
        },
        Command::Alerts { action, signal } => {
            alerts(ctx, action.unwrap_or(AlertsAction::Show), signal.as_deref()).await?
        }
        Command::Analytics {
            signal,
            component,
            tab,
        } => {
            let tab = tab.map(|t| t.name().parse::<AnalyticsTab>()).transpose()?;
            let selection = AnalyticsSelection {
                signal,
                component,
                tab,
            };
            println!("{}", AnalyticsView::load(ctx, selection).await);
        }
        Command::Incidents { action } => incidents(ctx, action).await?,
        Command::Anomalies { action } => match action.unwrap_or(AnomaliesAction::Show) {
            AnomaliesAction::Show => println!("{}", AnomaliesView::load(ctx).await),
            AnomaliesAction::Inject(args) => {
                let injection = AnomalyInjection::from(args);
                let result = AnomaliesView::inject(ctx, &injection).await?;
                match result.affected_points {
                    Some(points) => println!("Injected {} ({points} points)", injection.anomaly_type),
                    None => println!("Injected {}", injection.anomaly_type),
                }
            }
        },
        Command::Component {
            code,
            signals,
            transform,
            refresh,
        } => {
            if refresh {
                ComponentView::refresh(ctx, &code).await;
            }
            let chart = ChartSelection {
                signals,
                transform: transform.into(),
            };
            println!("{}", ComponentView::load(ctx, &code, &chart).await);
        }
    }
    Ok(())
}

async fn alerts(ctx: &AppContext, action: AlertsAction, signal: Option<&str>) -> anyhow::Result<()> {
    match action {
        AlertsAction::Show => println!("{}", AlertsView::load(ctx, signal).await),
        AlertsAction::Evaluate {
            lookback_ticks,
            simulation,
        } => {
            let request = EvaluateRequest {
                lookback_ticks,
                simulation_mode: simulation,
            };
            let result = AlertsView::evaluate(ctx, request).await?;
            println!("Evaluation complete: {result}");
        }
        AlertsAction::Reset { lookback_ticks } => {
            let result =
                AlertsView::reset_and_evaluate(ctx, ResetEvaluateRequest { lookback_ticks }).await?;
            println!("Reset and re-evaluated: {result}");
        }
        AlertsAction::Rules => {
            for rule in queries::alert_rules(ctx).await? {
                println!(
                    "#{:<4} {:<28} {} {:<10} for {} ticks  {:<8} {}",
                    rule.id,
                    rule.signal_code,
                    rule.operator,
                    rule.threshold,
                    rule.min_duration_ticks,
                    rule.severity,
                    if rule.enabled { "enabled" } else { "disabled" },
                );
            }
        }
        AlertsAction::GenerateRules => {
            let created = AlertsView::generate_rules(ctx).await?;
            println!("Created {created} rules");
        }
    }
    Ok(())
}

async fn incidents(ctx: &AppContext, action: IncidentsAction) -> anyhow::Result<()> {
    match action {
        IncidentsAction::List { status } => {
            println!("{}", IncidentListView::load(ctx, status.into()).await)
        }
        IncidentsAction::Show { id } => println!("{}", IncidentDetailView::load(ctx, id).await),
        IncidentsAction::Ack { id } => {
            IncidentDetailView::load(ctx, id).await;
            let incident = IncidentDetailView::acknowledge(ctx, id).await?;
            println!("Incident #{} is {}", incident.id, incident.status);
        }
        IncidentsAction::Resolve { id, note } => {
            IncidentDetailView::load(ctx, id).await;
            let incident = IncidentDetailView::resolve(ctx, id, &note).await?;
            println!("Incident #{} is {}", incident.id, incident.status);
        }
        IncidentsAction::Comment { id, text } => {
            let comment = IncidentDetailView::comment(ctx, id, &text).await?;
            println!("Comment #{} added", comment.id);
        }
        IncidentsAction::Group => {
            let grouped = ControlRoom::group_alerts(ctx).await?;
            println!("Grouped alerts into {grouped} incidents");
        }
    }
    Ok(())
}
