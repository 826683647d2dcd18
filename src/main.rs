use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fintrack::cli::{
    handle_audit_command, handle_auth_command, handle_budget_command, handle_category_command,
    handle_debt_command, handle_export_command, handle_family_command, handle_goal_command,
    handle_insights_command, handle_report_command, handle_transaction_command, require_user,
};
use fintrack::config::{paths::FintrackPaths, settings::Settings};
use fintrack::storage::Storage;

#[derive(Parser)]
#[command(
    name = "fintrack",
    version,
    about = "Personal finance tracker: budgets, goals, debts and spending insights",
    long_about = "fintrack records income and expenses, tracks them against monthly \
                  category budgets (personal or shared with a family group), follows \
                  savings goals and debts, and flags unusual spending."
)]
struct Cli {
    /// Emit diagnostic logs as JSON (filter with FINTRACK_LOG)
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory
    Init,

    /// Show current configuration and paths
    Config,

    /// Register, log in and manage your account
    #[command(subcommand)]
    Auth(fintrack::cli::AuthCommands),

    /// Category management commands
    #[command(subcommand)]
    Category(fintrack::cli::CategoryCommands),

    /// Transaction management commands
    #[command(subcommand, alias = "transaction")]
    Txn(fintrack::cli::TransactionCommands),

    /// Budget management commands
    #[command(subcommand)]
    Budget(fintrack::cli::BudgetCommands),

    /// Savings goal commands
    #[command(subcommand)]
    Goal(fintrack::cli::GoalCommands),

    /// Debt tracking and payoff planning
    #[command(subcommand, alias = "liability")]
    Debt(fintrack::cli::DebtCommands),

    /// Family group commands
    #[command(subcommand)]
    Family(fintrack::cli::FamilyCommands),

    /// Spending anomalies, trends, clusters and health score
    #[command(subcommand)]
    Insights(fintrack::cli::InsightCommands),

    /// Generate reports
    #[command(subcommand)]
    Report(fintrack::cli::ReportCommands),

    /// Export your data
    #[command(subcommand)]
    Export(fintrack::cli::ExportCommands),

    /// Show your audit log
    Audit(fintrack::cli::AuditArgs),

    /// Launch the interactive dashboard
    #[command(alias = "ui")]
    Tui,

    /// Run the HTTP API
    #[cfg(feature = "server")]
    Serve {
        /// Address to listen on (defaults to the configured bind address)
        #[arg(long, env = "FINTRACK_BIND")]
        bind: Option<String>,
    },
}

fn init_tracing(json: bool, default_level: &str) {
    let filter = EnvFilter::try_from_env("FINTRACK_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "server")]
    let default_level = if matches!(cli.command, Some(Commands::Serve { .. })) {
        "info"
    } else {
        "warn"
    };
    #[cfg(not(feature = "server"))]
    let default_level = "warn";
    init_tracing(cli.log_json, default_level);

    // Initialize paths and settings
    let paths = FintrackPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    let Some(command) = cli.command else {
        println!("fintrack - personal finance tracking");
        println!();
        println!("Run 'fintrack --help' for usage information.");
        println!("Run 'fintrack auth register <username> --email <email>' to get started.");
        return Ok(());
    };

    match command {
        Commands::Init => {
            println!("Initializing fintrack at: {}", paths.base_dir().display());
            let seeded = fintrack::storage::initialize_storage(&paths)?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            if seeded > 0 {
                println!("Seeded {} built-in categories.", seeded);
            }
            println!();
            println!("Run 'fintrack auth register <username> --email <email>' to create an account.");
        }

        Commands::Config => {
            println!("fintrack Configuration");
            println!("======================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Currency symbol:     {}", settings.currency_symbol);
            println!("  Alert threshold:     {}%", settings.default_alert_threshold);
            println!("  Session lifetime:    {}h", settings.session_ttl_hours);
            println!("  Anomaly z-score:     {}", settings.insights.zscore_threshold);
            println!("  Forecast horizon:    {} months", settings.insights.forecast_months);
            println!("  Server bind address: {}", settings.server.bind_address);
        }

        Commands::Auth(cmd) => {
            let storage = Storage::open(paths.clone())?;
            handle_auth_command(&storage, &settings, &paths, cmd)?;
        }

        Commands::Tui => {
            let storage = Storage::open(paths.clone())?;
            let user = require_user(&storage, &settings, &paths)?;
            fintrack::tui::run_tui(&storage, &settings, &user)?;
        }

        #[cfg(feature = "server")]
        Commands::Serve { bind } => {
            let storage = Storage::open(paths)?;
            let bind = bind.unwrap_or_else(|| settings.server.bind_address.clone());
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(fintrack::api::serve(storage, settings, &bind))?;
        }

        command => {
            let storage = Storage::open(paths.clone())?;
            let user = require_user(&storage, &settings, &paths)?;
            tracing::debug!(user = %user.id, "authenticated from session file");

            match command {
                Commands::Category(cmd) => handle_category_command(&storage, &user, cmd)?,
                Commands::Txn(cmd) => handle_transaction_command(&storage, &user, cmd)?,
                Commands::Budget(cmd) => handle_budget_command(&storage, &settings, &user, cmd)?,
                Commands::Goal(cmd) => handle_goal_command(&storage, &user, cmd)?,
                Commands::Debt(cmd) => handle_debt_command(&storage, &user, cmd)?,
                Commands::Family(cmd) => handle_family_command(&storage, &user, cmd)?,
                Commands::Insights(cmd) => {
                    handle_insights_command(&storage, &settings, &user, cmd)?
                }
                Commands::Report(cmd) => handle_report_command(&storage, &user, cmd)?,
                Commands::Export(cmd) => handle_export_command(&storage, &user, cmd)?,
                Commands::Audit(args) => handle_audit_command(&storage, &user, args)?,
                Commands::Init | Commands::Config | Commands::Auth(_) | Commands::Tui => {}
                #[cfg(feature = "server")]
                Commands::Serve { .. } => {}
            }
        }
    }

    Ok(())
}
