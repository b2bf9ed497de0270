use std::sync::Arc;

#[macro_use]
extern crate diesel;

use anyhow::Context;
use clap::Parser;

use api::api::start_server;
use config::Config;
use store::{MemoryTodoStore, PgTodoStore, TodoStore};

mod api;
mod config;
mod errors;
mod models;
mod schema;
mod store;

const DEFAULT_LOG_FILTER: &str = "todo_api=debug,actix_web=info,actix_server=info";

#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = "REST API for managing todos")]
struct ServerArgs {
    /// Port to listen on, overrides PORT
    #[clap(short = 'p', long = "port")]
    port: Option<u16>,

    /// Interface to bind, overrides HOST
    #[clap(long = "host")]
    host: Option<String>,

    /// Keep todos in process memory instead of PostgreSQL
    #[clap(long = "in-memory")]
    in_memory: bool,
}

fn open_store(config: &Config, in_memory: bool) -> anyhow::Result<Arc<dyn TodoStore>> {
    if in_memory {
        log::warn!("Using the in-memory store, todos are lost on exit");
        return Ok(Arc::new(MemoryTodoStore::new()));
    }

    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set (or start with --in-memory)")?;

    let store = PgTodoStore::connect(database_url, config.pool_size)
        .context("Failed to connect to PG database")?;

    log::info!("Database connected successfully");

    Ok(Arc::new(store))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER))
        .init();

    let args = ServerArgs::parse();

    let mut config = Config::from_env()?;

    if let Some(port) = args.port {
        config.port = port;
    }

    if let Some(host) = args.host {
        config.host = host;
    }

    let store = open_store(&config, args.in_memory).map_err(|e| {
        log::error!("{:#}", e);
        e
    })?;

    start_server(config, store).await?;

    Ok(())
}
