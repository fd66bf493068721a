use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use royale_meta::analysis::MetaAnalyzer;
use royale_meta::api::state::AppState;
use royale_meta::calculate;
use royale_meta::client::{ClientConfig, RoyaleApi, RoyaleClient};
use royale_meta::config::AppConfig;
use royale_meta::models::{CardCatalog, PlayerProfile, PlayerTag};

#[derive(Parser)]
#[command(name = "royale-meta")]
#[command(about = "Clash Royale meta-deck tracker and collection affinity scorer")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and display a player profile
    Profile {
        /// Player tag (with or without the leading '#')
        tag: String,
    },

    /// Run a meta analysis against a player's collection
    Analyze {
        /// Player tag (with or without the leading '#')
        tag: String,

        /// Override how many top players to sample
        #[arg(long)]
        sample_size: Option<usize>,

        /// Override concurrent deck fetches per batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// How many archetypes to print
        #[arg(long, default_value = "20")]
        top: usize,
    },

    /// Start the API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn load_config(path: &PathBuf) -> Result<AppConfig> {
    if path.exists() {
        AppConfig::from_file(path).with_context(|| format!("Loading {}", path.display()))
    } else {
        Ok(AppConfig::default())
    }
}

fn build_client(config: &AppConfig) -> Result<RoyaleClient> {
    let token = std::env::var(&config.api.token_env)
        .with_context(|| format!("API token missing; set {}", config.api.token_env))?;

    let client = RoyaleClient::new(ClientConfig {
        base_url: config.api.base_url.clone(),
        token,
        timeout: Duration::from_secs(config.api.timeout_seconds),
    })?;
    Ok(client)
}

async fn load_catalog(api: &dyn RoyaleApi) -> Result<CardCatalog> {
    let cards = api.fetch_card_catalog().await?;
    tracing::info!("Loaded card catalog ({} cards)", cards.len());
    Ok(CardCatalog::new(cards))
}

fn print_profile(profile: &PlayerProfile, catalog: &CardCatalog) {
    println!("\n{} ({})", profile.name, profile.tag);
    println!("Trophies:   {}", profile.trophies);
    println!("King level: {}", profile.exp_level);
    println!("Collection: {} cards", profile.cards.len());

    let mut cards: Vec<_> = profile.cards.iter().collect();
    cards.sort_by_key(|c| std::cmp::Reverse(calculate::display_level(c, catalog)));

    let elite = cards
        .iter()
        .filter(|c| calculate::display_level(c, catalog) >= calculate::ELITE_LEVEL)
        .count();
    println!("Elite:      {} cards at level 15", elite);

    for card in cards {
        let display = calculate::display_level(card, catalog);
        let evo = if card.evolution_unlocked() { " [evo]" } else { "" };
        println!("  lvl {:>2}  {}{}", display, card.name, evo);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting royale-meta v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Profile { tag } => {
            let tag = PlayerTag::parse(&tag)?;
            let client = build_client(&config)?;
            let catalog = load_catalog(&client).await?;
            let profile = client.fetch_profile(&tag).await?;
            print_profile(&profile, &catalog);
        }

        Commands::Analyze {
            tag,
            sample_size,
            batch_size,
            top,
        } => {
            let tag = PlayerTag::parse(&tag)?;
            let client: Arc<dyn RoyaleApi> = Arc::new(build_client(&config)?);
            let catalog = load_catalog(client.as_ref()).await?;
            let profile = client.fetch_profile(&tag).await?;
            println!(
                "Analyzing the meta for {} ({})...",
                profile.name, profile.tag
            );

            let analyzer = MetaAnalyzer::new(Arc::clone(&client), catalog)
                .with_weights(config.analysis.weights)
                .with_sample_size(sample_size.unwrap_or(config.analysis.sample_size))
                .with_batch_size(batch_size.unwrap_or(config.analysis.batch_size));

            let (tx, mut rx) = watch::channel(0u8);
            let ticker = tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    let pct = *rx.borrow();
                    print!("\r  sampling decks... {pct:>3}%");
                    use std::io::Write;
                    let _ = std::io::stdout().flush();
                }
                println!();
            });

            let generation = analyzer.begin();
            let report = analyzer.run(generation, &profile, Some(&tx)).await?;
            drop(tx);
            let _ = ticker.await;

            println!(
                "Sampled {} players, recovered {} decks, {} unique archetypes ({:.1?})",
                report.sampled_players,
                report.decks_recovered,
                report.archetypes.len(),
                report.duration
            );

            let catalog = analyzer.catalog();
            for (rank, scored) in report.archetypes.iter().take(top).enumerate() {
                let names: Vec<String> = scored
                    .archetype
                    .cards
                    .iter()
                    .map(|id| {
                        catalog
                            .get(*id)
                            .map(|c| c.name.clone())
                            .unwrap_or_else(|| id.to_string())
                    })
                    .collect();
                let synergy = if scored.is_best_synergy { " ★" } else { "" };
                println!(
                    "\n#{:<3} score {:>6.1}  avg lvl {:>4.1}  elite {}  seen {}x{}",
                    rank + 1,
                    scored.score,
                    scored.avg_level,
                    scored.elite_count,
                    scored.archetype.count,
                    synergy
                );
                println!("     {}", names.join(", "));
                for missing in &scored.missing_evolutions {
                    println!("     missing evolution: {}", missing.name);
                }
            }
        }

        Commands::Serve { host, port } => {
            let client = build_client(&config)?;
            let state = AppState::new(Arc::new(client), config.analysis.clone());
            let app = royale_meta::api::build_router(state);

            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
