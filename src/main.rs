use anyhow::Result;
use clap::{Parser, Subcommand};
use strum::IntoEnumIterator;

mod app;
mod attachment;
mod client;
mod config;
mod events;
mod tui;
mod ui;

use client::RecommendClient;
use config::Config;
use events::ColorTag;

#[derive(Parser)]
#[command(name = "moodlist")]
#[command(version)]
#[command(about = "Chat with a mood playlist recommendation service", long_about = None)]
struct Cli {
    /// Override the configured backend URL
    #[arg(long)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the selectable mood colors
    Colors,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Colors) => {
            println!("🎨 Mood colors:\n");
            for tag in ColorTag::iter() {
                println!("  • {} (/color {})", tag.display_name(), tag.wire_name());
            }
            Ok(())
        }
        None => {
            let mut config = Config::load()?;
            if let Some(backend) = cli.backend {
                config.backend_url = backend;
            }

            let client = RecommendClient::new(config.backend_url.clone());
            app::run(config, client).await
        }
    }
}
