//! Simple example of using the icp-lookup library
//!
//! Run with: cargo run --example simple_lookup --no-default-features -- https://www.example.com/

use icp_lookup::{Config, LookupPipeline, RecordSource};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("icp_lookup=info")
        .init();

    let config = Config::load()?;
    let pipeline = LookupPipeline::from_config(&config)?;

    let mut targets: Vec<String> = std::env::args().skip(1).collect();
    if targets.is_empty() {
        targets = vec![
            "https://www.baidu.com/".to_string(),
            "https://news.qq.com/".to_string(),
        ];
    }

    for target in &targets {
        println!("\nLooking up: {}", target);
        println!("{}", "-".repeat(50));

        let outcome = match pipeline.lookup_url(target).await {
            Ok(outcome) => outcome,
            Err(e) => {
                println!("Cannot look up {}: {}", target, e);
                println!("Query the API directly: {}", pipeline.provider_url());
                continue;
            }
        };

        let source = match outcome.source {
            RecordSource::Cache => "cache".to_string(),
            RecordSource::Provider(id) => id.to_string(),
            RecordSource::NotFound => "no provider".to_string(),
        };

        let record = &outcome.record;
        println!("   Domain:  {} (from {})", outcome.domain, source);
        println!("   Company: {}", record.company_name);
        println!("   Site:    {}", record.site_name);
        println!("   Nature:  {}", record.nature);
        println!("   ICP:     {}", record.icp);
        println!("   Checked: {}", record.time);
    }

    Ok(())
}
