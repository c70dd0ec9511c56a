pub mod handlers;
pub mod state;
pub mod views;


use crate::{
    config::Config,
    error::{AppError, Result},
};
use actix_files::Files;
use actix_web::{middleware::Logger, web, App, HttpServer};
use handlers::{accounts, chat, contact, generate, pages, subscribe};

pub use state::AppState;

/// Registers every route. Stored uploads and results are served read-only
/// without directory listings.
pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    cfg.route("/", web::get().to(pages::index))
        .route("/health", web::get().to(pages::health))
        .service(
            web::resource("/register")
                .route(web::get().to(accounts::register_form))
                .route(web::post().to(accounts::register)),
        )
        .service(
            web::resource("/login")
                .route(web::get().to(accounts::login_form))
                .route(web::post().to(accounts::login)),
        )
        .route("/logout", web::get().to(accounts::logout))
        .service(
            web::resource("/forgot-password")
                .route(web::get().to(accounts::forgot_password_form))
                .route(web::post().to(accounts::forgot_password)),
        )
        .service(
            web::resource("/subscribe")
                .route(web::get().to(subscribe::subscribe_form))
                .route(web::post().to(subscribe::subscribe)),
        )
        .service(
            web::resource("/contact")
                .route(web::get().to(contact::contact_form))
                .route(web::post().to(contact::contact)),
        )
        .route("/chat", web::post().to(chat::chat))
        .service(
            web::resource("/generate")
                .route(web::get().to(generate::generate_form))
                .route(web::post().to(generate::generate)),
        )
        .service(Files::new("/uploads", &config.upload_dir))
        .service(Files::new("/results", &config.result_dir));
}

/// Binds `HOST:PORT` and serves until shutdown.
pub async fn run(state: AppState) -> Result<()> {
    let bind_addr = format!("{}:{}", state.config.host, state.config.port());
    let state = web::Data::new(state);

    log::info!("🌐 Starting HTTP server on {}", bind_addr);

    let server = HttpServer::new(move || {
        let config = state.config.clone();
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(|cfg| configure(cfg, &config))
    })
    .bind(&bind_addr)
    .map_err(|e| AppError::ConfigError(format!("Failed to bind {}: {}", bind_addr, e)))?
    .run();

    server.await?;

    log::info!("🛑 HTTP server stopped");
    Ok(())
}
