use blind_judge::config;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = config::init::init().await?;

    let app = config::routes::config_routes(state);
    let addr = config::env::addr();
    let listener = tokio::net::TcpListener::bind(addr.as_str()).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
