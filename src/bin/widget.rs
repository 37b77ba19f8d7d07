use clap::Parser;
use dotenv::dotenv;
use log::info;
use qazaq_chat::cli::WidgetArgs;
use qazaq_chat::widget::conversation::Role;
use qazaq_chat::widget::render::format_time;
use qazaq_chat::widget::storage::FileStore;
use qazaq_chat::widget::transport::HttpTransport;
use qazaq_chat::widget::{SendOutcome, Widget, WidgetConfig};
use std::error::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = WidgetArgs::parse();

    let transport = HttpTransport::new(&args.server_url)?;
    info!("Proxy endpoint: {}", transport.endpoint());
    let store = FileStore::new(&args.storage_dir);
    let config = WidgetConfig { system_prompt: args.system_prompt.clone() };
    let mut widget = Widget::load(store, transport, config)?;

    for message in widget.conversation().messages() {
        let who = if message.role == Role::User { "you" } else { "bot" };
        println!("[{}] {}: {}", format_time(message.ts), who, message.content);
    }
    println!("Commands: /clear, /toggle, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/clear" => {
                widget.clear()?;
                if let Some(greeting) = widget.conversation().last() {
                    println!("[{}] bot: {}", format_time(greeting.ts), greeting.content);
                }
            }
            "/toggle" => {
                println!("{}", widget.toggle_panel());
            }
            _ => {
                if let SendOutcome::Replied(_) = widget.send(&line).await? {
                    if let Some(reply) = widget.conversation().last() {
                        println!("[{}] bot: {}", format_time(reply.ts), reply.content);
                    }
                }
            }
        }
    }

    Ok(())
}
