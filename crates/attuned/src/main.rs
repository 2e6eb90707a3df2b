use anyhow::{Context, Result};
use attune_core::PlaylistTable;
use tracing_subscriber::EnvFilter;

mod config;
mod dbus_interface;
mod engine;
mod spotify;

const BUS_NAME: &str = "org.freedesktop.Attune1";
const OBJECT_PATH: &str = "/org/freedesktop/Attune1";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("attuned starting");

    let config = config::Config::from_env();

    let playlists = match &config.playlists_path {
        Some(path) => PlaylistTable::from_file(path)
            .with_context(|| format!("loading playlist table {}", path.display()))?,
        None => PlaylistTable::default(),
    };

    if let (Some(id), Some(secret)) = (
        config.spotify_client_id.clone(),
        config.spotify_client_secret.clone(),
    ) {
        let exchange =
            tokio::task::spawn_blocking(move || spotify::request_token(&id, &secret)).await?;
        match exchange {
            Ok(grant) => tracing::info!(token_type = %grant.token_type, expires_in = grant.expires_in, "streaming service credentials accepted"),
            Err(e) => tracing::warn!(error = %e, "streaming service token exchange failed; embeds still work"),
        }
    }

    let engine = engine::spawn_engine(&config, playlists).context("starting engine")?;

    let service = dbus_interface::AttuneService { engine };
    let _conn = zbus::connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, service)?
        .build()
        .await
        .context("registering on the session bus")?;

    tracing::info!(bus = BUS_NAME, path = OBJECT_PATH, "attuned ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("attuned shutting down");

    Ok(())
}
