use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use inkwell::auth::{issue_token, CurrentUser};
use inkwell::seed::{self, Faker};
use inkwell::{AppState, Config};

#[derive(Parser)]
#[command(name = "inkwell")]
#[command(about = "Inkwell - a small blog CMS for authors and posts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start the HTTP server")]
    Serve {
        #[arg(short, long, help = "Path to Inkwell.toml")]
        config: Option<PathBuf>,
    },

    #[command(about = "Fill the database with sample authors and posts")]
    Seed {
        #[arg(short, long, help = "Path to Inkwell.toml")]
        config: Option<PathBuf>,

        #[arg(long, help = "Random seed for reproducible data")]
        seed: Option<u64>,
    },

    #[command(about = "Issue a bearer token for a user")]
    Token {
        #[arg(long, help = "User id")]
        id: i64,

        #[arg(long, help = "Display name")]
        name: String,

        #[arg(long, help = "Email address")]
        email: String,

        #[arg(long, help = "Mark the email address as not yet verified")]
        unverified: bool,

        #[arg(short, long, help = "Path to Inkwell.toml")]
        config: Option<PathBuf>,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("inkwell=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<Config, Box<dyn std::error::Error>> {
    let config = Config::load(path.as_deref())?;
    if config.auth.uses_dev_secret() {
        tracing::warn!("using the built-in development secret; set [auth] secret in Inkwell.toml");
    }
    Ok(config)
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let address = config.bind_address();
    let state = AppState::bootstrap(config).await?;
    let app = inkwell::router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(%address, "inkwell listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            serve(load_config(config)?).await?;
        }
        Commands::Seed { config, seed } => {
            let state = AppState::bootstrap(load_config(config)?).await?;
            let rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let summary = seed::run(&state.db, &mut Faker::new(rng)).await?;
            println!("Seeded {} authors and {} posts.", summary.authors, summary.posts);
        }
        Commands::Token {
            id,
            name,
            email,
            unverified,
            config,
        } => {
            let config = load_config(config)?;
            let user = CurrentUser {
                id,
                name,
                email,
                email_verified: !unverified,
            };
            println!("{}", issue_token(&user, &config.auth)?);
        }
    }

    Ok(())
}
