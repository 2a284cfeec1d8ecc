// src/main.rs
// Evaluation service: serves the pendulum core over JSON on a single actix-web server.

use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use impact_pendulum::{ui, SimConfig};

#[derive(Parser)]
#[command(name = "impact-pendulum")]
#[command(version, about = "Double pendulum with unilateral contacts, served over JSON")]
struct Cli {
    /// Address to bind.
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// JSON config used when a request carries none.
    #[arg(short, long)]
    config: Option<String>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => SimConfig::load(path).map_err(std::io::Error::other)?,
        None => SimConfig::default(),
    };
    // reject a bad default up front rather than on every request
    config.parameters().map_err(std::io::Error::other)?;

    info!(bind = %cli.bind, symbolic = config.symbolic, "starting evaluation service");
    let config = web::Data::new(config);
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(config.clone())
            .configure(ui::configure)
    })
    .bind(&cli.bind)?
    .run()
    .await
}
