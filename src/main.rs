use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use notion_web_clipper::config::Config;
use notion_web_clipper::pipeline::{parse_url_list, Pipeline};

const DEFAULT_URL_LIST: &str = "url_list.txt";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting notion-web-clipper");

    // Load and validate configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let list_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_URL_LIST.to_string());

    let raw = tokio::fs::read_to_string(&list_path)
        .await
        .with_context(|| format!("Failed to read URL list: {list_path}"))?;
    let urls = parse_url_list(&raw);

    if urls.is_empty() {
        anyhow::bail!("No URLs to process in {list_path}");
    }

    info!(count = urls.len(), file = %list_path, "URL list loaded");

    let pipeline = Pipeline::from_config(&config).context("Failed to initialize pipeline")?;

    let total = urls.len();
    let mut succeeded = 0usize;
    let mut failed_urls: Vec<String> = Vec::new();

    for (idx, url) in urls.iter().enumerate() {
        match pipeline.process_url(url).await {
            Ok(outcome) => {
                succeeded += 1;
                info!(
                    title = %outcome.title,
                    page_url = %outcome.page_url,
                    handler = outcome.handler,
                    "Clip succeeded"
                );
            }
            Err(e) => {
                error!(url = %url, error = format!("{e:#}"), "Clip failed");
                failed_urls.push(url.clone());
            }
        }

        info!(done = idx + 1, total, "Progress");

        // Pause between URLs to stay under upstream rate limits
        if idx + 1 < total {
            tokio::time::sleep(config.batch_delay).await;
        }
    }

    info!(
        processed = total,
        succeeded,
        failed = failed_urls.len(),
        "Batch finished"
    );

    if !failed_urls.is_empty() {
        for url in &failed_urls {
            warn!(url = %url, "Failed URL");
        }
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,notion_web_clipper=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        // Pretty-printed logging for development
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
