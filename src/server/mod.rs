pub mod api;
pub mod rate_limit;

use crate::cli::Args;
use crate::config::prompt::PromptConfig;
use crate::llm::chat::ChatClient;
use self::api::{build_router, AppState};
use self::rate_limit::ApiRateLimiter;

use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use axum::Router;
use log::info;

pub struct Server {
    addr: String,
    chat_client: Arc<dyn ChatClient>,
    args: Args,
}

impl Server {
    pub fn new(
        addr: String,
        chat_client: Arc<dyn ChatClient>,
        args: Args,
    ) -> Self {
        Self {
            addr,
            chat_client,
            args,
        }
    }

    pub fn router(&self) -> Result<Router, Box<dyn Error + Send + Sync>> {
        let limiter = ApiRateLimiter::new(
            Duration::from_secs(self.args.rate_limit_window_secs),
            self.args.rate_limit_max,
        )?;
        let state = AppState {
            chat_client: self.chat_client.clone(),
            prompts: Arc::new(PromptConfig::new(self.args.system_prompt.clone())),
            static_dir: PathBuf::from(&self.args.static_dir),
        };
        Ok(build_router(state, Arc::new(limiter)))
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let app = self.router()?;
        let listener = tokio::net::TcpListener::bind(&self.addr).await
            .map_err(|e| format!("Failed to bind HTTP server to {}: {}. Try a different port.", self.addr, e))?;
        info!("Running at http://{}", listener.local_addr()?);

        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
        Ok(())
    }
}
