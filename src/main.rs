use std::sync::Arc;

use imagegen_proxy::{
    logger::{self, LoggerConfig},
    server, Config, LiblibClient,
};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    logger::init_with_config(LoggerConfig::from_env())?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = Config::from_env();
    logger::log_startup_info(
        server::SERVICE_NAME,
        env!("CARGO_PKG_VERSION"),
        &config.server.host,
        config.server.port,
    );
    logger::log_config_info(&config);

    let client = match LiblibClient::new(config.api.clone()) {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Failed to initialize downstream client: {}", e);
            log::error!("   Set LIBLIB_ACCESS_KEY and LIBLIB_SECRET_KEY");
            return Err(e.into());
        }
    };

    if let Err(e) = server::run(&config.server, Arc::new(client)).await {
        log::error!("❌ Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
