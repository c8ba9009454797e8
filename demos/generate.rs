use std::sync::Arc;

use futures::StreamExt;
use imagegen_proxy::{
    GenerateParams, GenerateRequest, GenerationApi, PollConfig, Poller, ProxyClient,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_loaded = dotenv::dotenv().is_ok();
    imagegen_proxy::logger::init()?;
    if env_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("⚠️  No .env file found");
    }

    let base_url = std::env::var("PROXY_URL")
        .unwrap_or_else(|_| imagegen_proxy::client::proxy::DEFAULT_PROXY_URL.to_string());
    let template = std::env::var("TEMPLATE_UUID")?;
    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "a watercolor lighthouse on a cliff at dusk".to_string());

    let client = Arc::new(ProxyClient::new(base_url));
    let health = client.health().await?;
    log::info!("🩺 {} v{} is {}", health.service, health.version, health.status);

    let request = GenerateRequest::new(template)
        .with_params(GenerateParams::new(prompt).with_aspect_ratio("square"));
    let handle = client.submit(&request).await?;
    log::info!("🎨 Task submitted: {}", handle.generate_uuid);

    let poller = Poller::new(client, PollConfig::from_env().policy());
    let mut updates = poller.watch(&handle.generate_uuid);
    while let Some(update) = updates.next().await {
        let snapshot = update?;
        log::info!(
            "⏳ {} {:.0}%",
            snapshot.generate_status,
            snapshot.percent_completed * 100.0
        );
        for image in &snapshot.images {
            log::info!("🖼️  {} (seed {})", image.image_url, image.seed);
        }
    }

    Ok(())
}
