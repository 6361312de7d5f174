use grapnel::{Pattern, Scraper, ScraperConfig, logger};
use log::info;
use std::error::Error;
use std::io::{self, Write};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Install rustls crypto provider before any TLS operations
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install rustls crypto provider")?;

    logger::init(log::LevelFilter::Info)
        .map_err(|e| format!("Failed to initialize logger: {}", e))?;

    let scraper = Scraper::new(ScraperConfig::default());

    println!("Grapnel scraping engine");
    info!(target: "scraper", "engine initialized");

    print!("Enter URL (default: https://example.com): ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let url = normalize_url(input.trim());

    print!("Enter selector (default: a[href]): ");
    io::stdout().flush()?;
    let mut selector = String::new();
    io::stdin().read_line(&mut selector)?;
    let selector = selector.trim();
    let pattern = Pattern::compile(if selector.is_empty() { "a[href]" } else { selector })?;

    let start = std::time::Instant::now();
    let tree = scraper.load_document(&url).await?;
    let root = tree.root().ok_or("document has no root")?;

    let mut count = 0usize;
    for node in pattern.matches(root) {
        count += 1;
        let text = node.text();
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        println!("[{:>3}] <{}> {}", count, node.tag_name().unwrap_or("?"), text);
    }

    let duration = start.elapsed();
    println!("\n[+] {} match(es) for '{}' in {:.2?}", count, pattern, duration);
    info!(target: "scraper", "query completed in {:?}", duration);

    Ok(())
}

fn normalize_url(input: &str) -> String {
    if input.is_empty() {
        String::from("https://example.com")
    } else if !input.starts_with("http://") && !input.starts_with("https://") {
        format!("https://{}", input)
    } else {
        input.to_string()
    }
}
