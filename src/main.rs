use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tech_helper::ai::OpenAiChatClient;
use tech_helper::helper::Helper;
use tech_helper::models::Config;
use tech_helper::server;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "tech-helper")]
#[command(about = "Serve plain-language tech help backed by a multimodal chat model")]
struct CliArgs {
    /// Address to listen on.
    #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:3000", value_parser = parse_listen_arg)]
    listen: SocketAddr,
}

fn parse_listen_arg(input: &str) -> std::result::Result<SocketAddr, String> {
    input
        .parse()
        .map_err(|_| format!("Invalid address '{}'. Expected format: HOST:PORT", input))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tech_helper=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tech-helper");

    let args = CliArgs::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Provider: OpenAI (model: {}, base url: {})",
        config.openai_model, config.openai_base_url
    );

    let chat = OpenAiChatClient::from_config(&config).context("Failed to build OpenAI client")?;
    let app = server::router(Helper::new(Box::new(chat)), config.max_upload_bytes);

    if let Err(e) = server::run(args.listen, app).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }

    info!("Server stopped");
    Ok(())
}
