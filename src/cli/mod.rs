use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Upstream Completion Args ---
    /// API key for the upstream completion service. Required for any real reply.
    #[arg(long, env = "OPENAI_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Model name for chat completion (e.g., gpt-4o-mini, gpt-4o)
    #[arg(long, env = "MODEL", default_value = "gpt-4o-mini")]
    pub model: String,

    /// Sampling temperature sent upstream
    #[arg(long, env = "TEMPERATURE", default_value = "0.2")]
    pub temperature: f32,

    /// Upper bound on generated tokens per reply
    #[arg(long, env = "MAX_TOKENS", default_value = "300")]
    pub max_tokens: u32,

    /// Full URL of the chat completions endpoint
    #[arg(long, env = "CHAT_BASE_URL", default_value = "https://api.openai.com/v1/chat/completions")]
    pub chat_base_url: String,

    /// Persona instruction used when the caller does not send one. Falls back to the built-in Kazakh history persona.
    #[arg(long, env = "SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,

    // --- HTTP Server Args ---
    /// Interface the HTTP server binds to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port the HTTP server listens on
    #[arg(long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// Directory holding the widget entry page (index.html)
    #[arg(long, env = "STATIC_DIR", default_value = "public")]
    pub static_dir: String,

    // --- Rate Limit Args ---
    /// Length of the rate limit window in seconds for /api routes
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value = "60")]
    pub rate_limit_window_secs: u64,

    /// Requests allowed per client within one window
    #[arg(long, env = "RATE_LIMIT_MAX", default_value = "30")]
    pub rate_limit_max: u32,
}

impl Args {
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Terminal front end for the chat widget.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct WidgetArgs {
    /// Base URL of the proxy server
    #[arg(long, env = "WIDGET_SERVER_URL", default_value = "http://127.0.0.1:3001")]
    pub server_url: String,

    /// Directory where the conversation snapshot is kept
    #[arg(long, env = "WIDGET_STORAGE_DIR", default_value = ".qazaq-widget")]
    pub storage_dir: String,

    /// Optional system prompt sent with every request. The server persona is used when unset.
    #[arg(long, env = "WIDGET_SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,
}
