//! Spending insight CLI commands

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::insights::{
    format_anomalies, format_clusters, format_health_score, format_trends,
};
use crate::error::FintrackResult;
use crate::models::User;
use crate::services::InsightService;
use crate::storage::Storage;

use super::{parse_date, parse_month, print_json};

/// Insight subcommands
#[derive(Subcommand)]
pub enum InsightCommands {
    /// Expenses that are unusually large for their category
    Anomalies {
        /// Only flag transactions on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Monthly spending per category with a linear trend and forecast
    Trends {
        /// Last month of the window (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,
        /// Window length (defaults to the configured trend window)
        #[arg(short = 'n', long)]
        months: Option<usize>,
        #[arg(long)]
        json: bool,
    },

    /// Group recent expenses into spending patterns
    Clusters {
        #[arg(short, long)]
        month: Option<String>,
        #[arg(short = 'n', long, default_value = "3")]
        months: usize,
        #[arg(long)]
        json: bool,
    },

    /// Financial health score for a month
    Health {
        #[arg(short, long)]
        month: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Suggestions based on the other insights
    Tips {
        #[arg(short, long)]
        month: Option<String>,
    },
}

/// Handle an insights command
pub fn handle_insights_command(
    storage: &Storage,
    settings: &Settings,
    user: &User,
    cmd: InsightCommands,
) -> FintrackResult<()> {
    let service = InsightService::new(storage, settings);

    match cmd {
        InsightCommands::Anomalies { since, json } => {
            let since = since.as_deref().map(|d| parse_date(Some(d))).transpose()?;
            let anomalies = service.anomalies(user.id, since)?;
            if json {
                print_json(&anomalies)?;
            } else {
                print!("{}", format_anomalies(&anomalies));
            }
        }

        InsightCommands::Trends {
            month,
            months,
            json,
        } => {
            let months = months.unwrap_or(settings.insights.trend_months);
            let trends = service.category_trends(user.id, parse_month(month.as_deref())?, months)?;
            if json {
                print_json(&trends)?;
            } else {
                print!("{}", format_trends(&trends));
            }
        }

        InsightCommands::Clusters {
            month,
            months,
            json,
        } => {
            let clusters =
                service.spending_clusters(user.id, parse_month(month.as_deref())?, months)?;
            if json {
                print_json(&clusters)?;
            } else {
                print!("{}", format_clusters(&clusters));
            }
        }

        InsightCommands::Health { month, json } => {
            let health = service.health_score(user.id, parse_month(month.as_deref())?)?;
            if json {
                print_json(&health)?;
            } else {
                print!("{}", format_health_score(&health));
            }
        }

        InsightCommands::Tips { month } => {
            let tips = service.recommendations(user.id, parse_month(month.as_deref())?)?;
            if tips.is_empty() {
                println!("Nothing to suggest; keep it up.");
            }
            for tip in tips {
                println!("  * {}", tip);
            }
        }
    }

    Ok(())
}
