//! Server command implementation

use std::path::Path;

use anyhow::Result;

use warroom_server::ServerConfig;

pub async fn cmd_serve(
    source: &str,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting the war room server...");
    println!("   Source: {}", source);
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }

    // Comma-separated list of allowed CORS origins
    let allowed_origins: Vec<String> = std::env::var("WARROOM_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let config = ServerConfig {
        source: source.to_string(),
        allowed_origins,
    };

    let static_dir = static_dir.and_then(Path::to_str);
    warroom_server::serve(config, host, port, static_dir).await
}
