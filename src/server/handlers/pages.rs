use crate::server::{
    handlers::{current_user, page},
    state::AppState,
    views,
};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

pub async fn index(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<NoticeQuery>,
) -> HttpResponse {
    let user = current_user(&state, &req).await;
    let notices: Vec<_> = query
        .notice
        .as_deref()
        .and_then(views::notice_from_code)
        .into_iter()
        .collect();
    page(views::index_page(user.as_ref(), &notices))
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let storage = match state.storage.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            log::warn!("Account storage health check failed: {}", e);
            false
        }
    };

    HttpResponse::Ok().json(json!({
        "status": if storage { "ok" } else { "degraded" },
        "storage": storage,
        "image_keys": state.generator.credentials().len(),
        "assistant": state.chat.is_configured(),
    }))
}
