//! Subdesk CLI: operator commands for users, companies, plans and
//! company subscriptions on the vendor API.
//!
//! Settings come from SUBDESK_* environment variables over the saved settings
//! file (`subdesk settings path`).

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use subdesk_api_client::api::SubscriptionAction;
use subdesk_api_client::probe::default_templates;
use subdesk_api_client::ApiClient;
use subdesk_cli::output;
use subdesk_cli::{
    init_tracing, log_error, parse_grant, parse_preset, print_json, render_error, OutputFormat,
};
use subdesk_core::config::{mask_api_key, ClientConfig, Settings};
use subdesk_core::validation::{ResourceGrant, SubscriptionDraft, DEFAULT_DURATION_DAYS};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "subdesk", about = "Subscription desk for the vendor API", version)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Settings file (defaults to $SUBDESK_SETTINGS or the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change the saved connection settings
    Settings {
        #[command(subcommand)]
        sub: SettingsCommands,
    },
    /// User operations
    User {
        #[command(subcommand)]
        sub: UserCommands,
    },
    /// Company operations
    Company {
        #[command(subcommand)]
        sub: CompanyCommands,
    },
    /// Subscription plan templates
    Plans {
        #[command(subcommand)]
        sub: PlanCommands,
    },
    /// Flow and asset lookup
    Resources {
        #[command(subcommand)]
        sub: ResourceCommands,
    },
    /// Company subscriptions
    Subscription {
        #[command(subcommand)]
        sub: SubscriptionCommands,
    },
    /// Try candidate endpoint paths and report which respond
    Probe {
        /// Pause between requests in milliseconds
        #[arg(long, default_value = "500")]
        delay_ms: u64,
    },
    /// Single request against the plans endpoint
    QuickTest,
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print the effective settings
    Show {
        /// Print the API key unmasked
        #[arg(long)]
        reveal: bool,
    },
    /// Save the API key and optional base URL
    Set {
        #[arg(long)]
        api_key: String,
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Print the settings file location
    Path,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user placeholder, then look up its company
    Create {
        email: String,
        /// Skip the company lookup
        #[arg(long)]
        no_lookup: bool,
    },
}

#[derive(Subcommand)]
enum CompanyCommands {
    /// Find the company of an email address
    Find { email: String },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// List plan templates of the workspace
    List,
    /// Show one plan template
    Get { id: String },
}

#[derive(Subcommand)]
enum ResourceCommands {
    /// Search flows and assets by name
    Search { query: String },
}

#[derive(Subcommand)]
enum SubscriptionCommands {
    /// Create a plan for a company and assign it
    Create {
        /// Company UUID
        #[arg(long)]
        company: Uuid,
        /// Subscription display name
        #[arg(long)]
        name: String,
        /// Duration in days
        #[arg(long, conflicts_with = "preset")]
        days: Option<u32>,
        /// Duration preset: 30, 90, 180 or 365
        #[arg(long, value_parser = parse_preset)]
        preset: Option<u32>,
        /// Resource grant as Type:originId[:features], repeatable
        #[arg(long = "resource", value_name = "TYPE:ID[:FEATURES]", value_parser = parse_grant)]
        resources: Vec<ResourceGrant>,
    },
    /// Assign an existing plan to a company
    Assign {
        plan_id: String,
        #[arg(long)]
        company: Uuid,
        #[arg(long, default_value_t = DEFAULT_DURATION_DAYS)]
        days: u32,
    },
    /// List a company's subscriptions
    List {
        #[arg(long)]
        company: Uuid,
    },
    /// Plans with the company's subscription to each
    Overview {
        #[arg(long)]
        company: Uuid,
    },
    /// Cancel a subscription
    Cancel {
        id: String,
        /// Print the company overview afterwards
        #[arg(long)]
        company: Option<Uuid>,
    },
    /// Re-activate a subscription
    Activate {
        id: String,
        /// Print the company overview afterwards
        #[arg(long)]
        company: Option<Uuid>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let format = cli.format;
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log_error(&err);
            eprintln!("{}", render_error(&err, format));
            ExitCode::FAILURE
        }
    }
}

fn settings_path(cli_path: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match cli_path {
        Some(path) => Ok(path),
        None => Ok(Settings::default_path()?),
    }
}

/// Print `value` as JSON or through its table renderer.
fn emit<T: serde::Serialize>(
    format: OutputFormat,
    value: &T,
    table: impl FnOnce(&T) -> String,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => {
            print!("{}", table(value));
            Ok(())
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let path = settings_path(cli.settings)?;
    let connect = || ApiClient::from_settings_file(path.clone());
    let now = Utc::now();

    match cli.command {
        Commands::Settings { sub } => run_settings(sub, &path, format)?,
        Commands::User {
            sub: UserCommands::Create { email, no_lookup },
        } => {
            let client = connect()?;
            if no_lookup {
                let created = client.create_user_placeholder(&email).await?;
                emit(format, &created, |_| format!("User created: {}\n", email.trim()))?;
            } else {
                let onboarding = client.onboard_user(&email).await?;
                emit(format, &onboarding, |o| {
                    format!("User created: {}\n{}", o.email, output::render_company(&o.company))
                })?;
            }
        }
        Commands::Company {
            sub: CompanyCommands::Find { email },
        } => {
            let company = connect()?.find_company(&email).await?;
            emit(format, &company, output::render_company)?;
        }
        Commands::Plans { sub } => {
            let client = connect()?;
            match sub {
                PlanCommands::List => {
                    let plans = client.list_plans().await?;
                    emit(format, &plans, |p| output::render_plans(p))?;
                }
                PlanCommands::Get { id } => {
                    let plan = client.get_plan(&id).await?;
                    emit(format, &plan, output::render_plan)?;
                }
            }
        }
        Commands::Resources {
            sub: ResourceCommands::Search { query },
        } => {
            let matches = connect()?.search_resources(&query).await;
            emit(format, &matches, |m| output::render_resources(m))?;
        }
        Commands::Subscription { sub } => run_subscription(&connect()?, sub, format, now).await?,
        Commands::Probe { delay_ms } => {
            let report = connect()?
                .probe_all(&default_templates(), Duration::from_millis(delay_ms))
                .await;
            emit(format, &report, output::render_probe_report)?;
        }
        Commands::QuickTest => {
            let report = connect()?.quick_test().await?;
            emit(format, &report, output::render_quick_test)?;
        }
    }

    Ok(())
}

fn run_settings(
    sub: SettingsCommands,
    path: &std::path::Path,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match sub {
        SettingsCommands::Show { reveal } => {
            let settings = Settings::load(path)?;
            let config = ClientConfig::from_env(&settings)?;
            let api_key = config.api_key.as_deref().map(|k| {
                if reveal {
                    k.to_string()
                } else {
                    mask_api_key(k)
                }
            });
            let view = serde_json::json!({
                "apiKey": api_key,
                "baseUrl": config.base_url,
                "workspace": config.workspace,
                "environmentId": config.environment_id,
                "timeoutSecs": config.timeout.as_secs(),
                "settingsFile": path.display().to_string(),
            });
            emit(format, &view, |_| {
                format!(
                    "API key:        {}\nBase URL:       {}\nWorkspace:      {}\nEnvironment ID: {}\nTimeout:        {}s\nSettings file:  {}\n",
                    api_key.as_deref().unwrap_or("(not set)"),
                    config.base_url,
                    config.workspace,
                    config.environment_id,
                    config.timeout.as_secs(),
                    path.display()
                )
            })
        }
        SettingsCommands::Set { api_key, base_url } => {
            let settings = Settings::with_values(&api_key, base_url.as_deref());
            settings
                .save(path)
                .context("Failed to save settings")?;
            println!("Settings saved successfully!");
            Ok(())
        }
        SettingsCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

async fn run_subscription(
    client: &ApiClient,
    sub: SubscriptionCommands,
    format: OutputFormat,
    now: chrono::DateTime<Utc>,
) -> anyhow::Result<()> {
    match sub {
        SubscriptionCommands::Create {
            company,
            name,
            days,
            preset,
            resources,
        } => {
            let duration = days.or(preset).unwrap_or(DEFAULT_DURATION_DAYS);
            let draft = SubscriptionDraft::new(company, &name, duration, resources);
            let outcome = client.create_subscription(&draft).await?;
            emit(format, &outcome, output::render_outcome)?;
        }
        SubscriptionCommands::Assign {
            plan_id,
            company,
            days,
        } => {
            let assigned = client.assign_plan(&plan_id, company, days).await?;
            emit(format, &assigned, |_| {
                format!("Plan {} assigned to {} for {} days.\n", plan_id, company, days)
            })?;
        }
        SubscriptionCommands::List { company } => {
            let subs = client.list_company_subscriptions(company).await?;
            emit(format, &subs, |s| output::render_subscriptions(s, now))?;
        }
        SubscriptionCommands::Overview { company } => {
            let overview = client.company_overview(company).await?;
            emit(format, &overview, |o| output::render_overview(o, now))?;
        }
        SubscriptionCommands::Cancel { id, company } => {
            change_status(client, &id, SubscriptionAction::Cancel, company, format, now).await?;
        }
        SubscriptionCommands::Activate { id, company } => {
            change_status(client, &id, SubscriptionAction::Activate, company, format, now).await?;
        }
    }
    Ok(())
}

async fn change_status(
    client: &ApiClient,
    id: &str,
    action: SubscriptionAction,
    company: Option<Uuid>,
    format: OutputFormat,
    now: chrono::DateTime<Utc>,
) -> anyhow::Result<()> {
    let verb = match action {
        SubscriptionAction::Cancel => "cancelled",
        SubscriptionAction::Activate => "activated",
    };

    match company {
        Some(company) => {
            let overview = client
                .change_status_with_overview(id, action, company)
                .await?;
            emit(format, &overview, |o| {
                format!("Subscription {} {}.\n\n{}", id, verb, output::render_overview(o, now))
            })
        }
        None => {
            let result = client.change_subscription_status(id, action).await?;
            emit(format, &result, |_| format!("Subscription {} {}.\n", id, verb))
        }
    }
}
