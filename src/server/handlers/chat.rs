use crate::{
    models::{ChatReply, ChatRequest},
    server::state::AppState,
};
use actix_web::{web, HttpResponse};
use serde_json::json;

pub const EMPTY_MESSAGE: &str = "The message must not be empty.";
pub const NOT_CONFIGURED: &str = "Assistant is not configured.";
pub const ASSISTANT_FAILED: &str = "Could not get a reply from the assistant. Try again later.";

/// Accepts any body; anything that is not a JSON object with messages is a 400.
pub async fn chat(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let request: ChatRequest = serde_json::from_slice(&body).unwrap_or_default();

    let messages = match request.messages {
        Some(messages) if !messages.is_empty() => messages,
        _ => return HttpResponse::BadRequest().json(json!({ "error": EMPTY_MESSAGE })),
    };

    if !state.chat.is_configured() {
        return HttpResponse::InternalServerError().json(json!({ "error": NOT_CONFIGURED }));
    }

    match state.chat.complete(&messages).await {
        Ok(reply) => HttpResponse::Ok().json(ChatReply { reply }),
        Err(e) => {
            log::error!("Assistant request failed: {}", e);
            HttpResponse::InternalServerError().json(json!({ "error": ASSISTANT_FAILED }))
        }
    }
}
