use interior_gen::{
    logger::{self, LoggerConfig},
    server, AppState, Config,
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
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        &config.host,
        config.port(),
    );
    logger::log_config_info(&config);

    if config.credentials.is_empty() {
        log::warn!("⚠️  No STABILITY_API_KEYS or STABILITY_API_KEY set, generation requests will fail");
    }
    if !config.openai.is_configured() {
        log::warn!("⚠️  OPENAI_API_KEY is not set, the chat assistant is disabled");
    }

    for dir in [&config.upload_dir, &config.result_dir] {
        tokio::fs::create_dir_all(dir).await?;
    }

    log::info!("🔄 Initializing application state...");
    let state = match AppState::from_config(config).await {
        Ok(state) => {
            log::info!("✅ Application state ready");
            state
        }
        Err(e) => {
            log::error!("❌ Failed to initialize application: {}", e);
            return Err(e.into());
        }
    };

    server::run(state).await?;
    Ok(())
}
