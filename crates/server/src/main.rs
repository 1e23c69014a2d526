//! normrag Server - HTTP query service for ISO/IEC 17025:2017 consulting

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (.env, server.toml, NORMRAG_SERVER__* env vars)
    let config = ServerConfig::load()?;

    // Start server
    server::start_server(config).await?;

    Ok(())
}
