use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use subdesk_api_client::probe::default_templates;
use subdesk_api_client::ApiClient;
use subdesk_cli::output::render_probe_report;
use subdesk_cli::{init_tracing, print_json, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "probe_endpoints")]
#[command(about = "Probe candidate endpoint paths of the vendor API")]
struct Args {
    /// Extra candidate path, `{ecosystem}` is replaced by the workspace (repeatable)
    #[arg(long = "template", value_name = "PATH")]
    templates: Vec<String>,

    /// Probe only the given templates, not the built-in list
    #[arg(long)]
    only: bool,

    /// Pause between requests in milliseconds
    #[arg(long, default_value = "500")]
    delay_ms: u64,

    /// Output format: json or table (default: table)
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    let client = ApiClient::from_env().context(
        "Failed to create API client. Set SUBDESK_API_KEY or run `subdesk settings set`",
    )?;

    let mut templates = if args.only {
        Vec::new()
    } else {
        default_templates()
    };
    templates.extend(args.templates);

    if templates.is_empty() {
        return Err(anyhow::anyhow!("No templates to probe. Pass --template or drop --only"));
    }

    tracing::info!(
        base_url = client.base_url(),
        workspace = client.workspace(),
        templates = templates.len(),
        "Probing endpoints"
    );

    let report = client
        .probe_all(&templates, Duration::from_millis(args.delay_ms))
        .await;

    match args.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print!("{}", render_probe_report(&report)),
    }

    Ok(())
}
