use std::path::PathBuf;

use clap::{Parser, Subcommand};

use hms::{app, config, db, provision, state::AppState};

#[derive(Parser)]
#[command(name = "hms", about = "Hospital management backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Create the database, rewrite the config file and apply migrations.
    Provision {
        #[arg(long)]
        name: String,
        /// JSON array of doctors to create accounts for.
        #[arg(long)]
        seed: Option<PathBuf>,
    },
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "hms=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    match Cli::parse().command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let state = AppState::init().await?;
            if let Err(e) = db::migrate(&state.db).await {
                tracing::warn!(error = %e, "migration failed; continuing");
            }
            app::serve(app::build_app(state)).await
        }
        Command::Provision { name, seed } => {
            let config_path = config::db_config_path();
            let accounts = provision::run(&config_path, &name, seed.as_deref()).await?;
            for a in &accounts {
                println!("{}\t{}\t{}\t{}", a.doctor_id, a.name, a.email, a.password);
            }
            Ok(())
        }
    }
}
