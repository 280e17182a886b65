use std::net::SocketAddr;

mod app;
mod auth;
mod config;
mod error;
mod extract;
mod products;
mod reports;
mod sales;
mod state;
mod store;
#[cfg(test)]
mod test_support;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "stockroom=debug,axum=info,tower_http=info".to_string());
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

    let state = state::AppState::init().await?;
    auth::services::ensure_bootstrap_admin(&state).await?;

    let addr: SocketAddr = format!("{}:{}", state.config.host, state.config.port).parse()?;
    app::serve(app::build_app(state), addr).await
}
