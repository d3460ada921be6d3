//! pdfchat server binary
//!
//! Loads the PDF text and both chat models, then serves the chat UI.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    server::start_server(config).await?;
    Ok(())
}
