use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use speedrunner::{ClientConfig, SearchClient};

#[derive(Parser, Debug)]
#[command(name = "speedrunner")]
#[command(about = "Search speedrun.com games and runners")]
struct Args {
    #[command(subcommand)]
    search: Search,
}

#[derive(Subcommand, Debug)]
enum Search {
    /// Search games by name
    Games { query: String },
    /// Search users by name or lookup key
    Users { query: String },
}

fn setup_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main] // Marks the main function as asynchronous
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    setup_logging();

    let args = Args::parse();
    let config = ClientConfig::from_env().context("loading configuration")?;
    info!(base_url = %config.base_url, "API client created");

    let client = SearchClient::with_config(config)?;

    match args.search {
        Search::Games { query } => {
            let games = client
                .search_games(&query)
                .await
                .with_context(|| format!("searching games for {:?}", query))?;
            println!("Found {} results", games.len());
            for game in games {
                println!("- {} {}", game.summary(), game.weblink);
            }
        }
        Search::Users { query } => {
            let users = client
                .search_users(&query)
                .await
                .with_context(|| format!("searching users for {:?}", query))?;
            println!("Found {} results", users.len());
            for user in users {
                match user.location_label() {
                    Some(country) => println!("- {} [{}] {}", user.names.international, country, user.weblink),
                    None => println!("- {} {}", user.names.international, user.weblink),
                }
            }
        }
    }

    Ok(())
}
