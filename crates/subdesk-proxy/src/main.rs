use subdesk_core::config::ProxyConfig;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = ProxyConfig::from_env()?;

    let router = subdesk_proxy::setup::initialize_app(&config)?;

    subdesk_proxy::setup::server::start_server(&config, router).await?;

    Ok(())
}
