pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;
pub mod widget;

use cli::Args;
use llm::LlmConfig;
use llm::chat::new_client as new_chat_client;
use log::{info, warn};
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr());
    info!("Working Directory: {}", std::env::current_dir().map(|p| p.display().to_string()).unwrap_or_default());
    info!("Chat Endpoint: {}", args.chat_base_url);
    info!("Chat Model: {}", args.model);
    info!("Temperature: {}", args.temperature);
    info!("Max Tokens: {}", args.max_tokens);
    info!("Has API Key: {}", !args.api_key.is_empty());
    info!("Custom Persona: {}", args.system_prompt.is_some());
    info!("Static Dir: {}", args.static_dir);
    info!("Rate Limit: {} requests / {}s", args.rate_limit_max, args.rate_limit_window_secs);
    info!("-------------------------");

    if args.api_key.is_empty() {
        warn!("OPENAI_API_KEY is not set. Upstream calls will be refused and clients will fall back to local replies.");
    }

    let chat_client = new_chat_client(&LlmConfig::from(&args))?;
    info!(
        "Chat client ready: {} at {}",
        chat_client.get_model(),
        chat_client.get_base_url().unwrap_or_default()
    );
    let addr = args.server_addr();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, chat_client, args.clone());
    server.run().await?;

    Ok(())
}
