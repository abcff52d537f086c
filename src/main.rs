use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use newsfeed::config::FeedConfig;
use newsfeed::feed::{ArticleSource, NewsFeedService};
use newsfeed::util::format_with_ordinal;

#[derive(Parser, Debug)]
#[command(name = "newsfeed", about = "Fetch an RSS feed and list its articles, newest first")]
struct Args {
    /// Feed URL to fetch
    url: String,

    /// TOML config file (missing file means defaults)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Print articles as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => FeedConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => FeedConfig::default(),
    };
    if let Some(secs) = args.timeout {
        config.timeout_secs = secs;
    }
    config.validate().context("Invalid configuration")?;

    let service = NewsFeedService::new(config).context("Failed to build HTTP client")?;

    // Ctrl+C abandons the request
    let cancel = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    let articles = service.get_articles(&args.url, cancel).await;

    if args.json {
        let json = serde_json::to_string_pretty(&*articles).context("Failed to encode articles")?;
        println!("{}", json);
        return Ok(());
    }

    if articles.is_empty() {
        eprintln!("No articles (set RUST_LOG=newsfeed=debug for details)");
        return Ok(());
    }

    for article in articles.iter() {
        let date = format_with_ordinal(article.published_at_utc);
        if date.is_empty() {
            println!("{}", article.title);
        } else {
            println!("{}  ({})", article.title, date);
        }
        if !article.link.is_empty() {
            println!("  {}", article.link);
        }
        if !article.description.is_empty() {
            println!("  {}", article.description);
        }
        println!();
    }

    Ok(())
}
