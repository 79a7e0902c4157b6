#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists; settings read the environment afterwards
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    secrets_config::cli::run_cli().await
}
