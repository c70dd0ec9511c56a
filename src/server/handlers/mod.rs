pub mod accounts;
pub mod chat;
pub mod contact;
pub mod generate;
pub mod pages;
pub mod subscribe;

use crate::{accounts::SESSION_COOKIE, models::User, server::state::AppState};
use actix_web::{
    http::{header, StatusCode},
    HttpRequest, HttpResponse,
};
use reqwest::Url;

pub fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

pub fn page(body: String) -> HttpResponse {
    html(StatusCode::OK, body)
}

/// 303 so a POST is followed by a GET.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Percent-encodes `value` for use as a query parameter value.
pub fn encode_query(value: &str) -> String {
    Url::parse_with_params("http://localhost/", &[("v", value)])
        .ok()
        .and_then(|url| url.query().map(|query| query.trim_start_matches("v=").to_string()))
        .unwrap_or_default()
}

/// Only same-site absolute paths are accepted as post-login targets.
pub fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

/// The user behind the request's session cookie, if any.
pub async fn current_user(state: &AppState, req: &HttpRequest) -> Option<User> {
    let cookie = req.cookie(SESSION_COOKIE)?;
    let user_id = state.sessions.user_id(cookie.value()).await?;

    match state.storage.get_user(user_id).await {
        Ok(user) => user,
        Err(e) => {
            log::error!("Failed to load user {} for session: {}", user_id, e);
            None
        }
    }
}

/// Resolves the logged-in user or builds the redirect to the login page.
pub async fn require_user(state: &AppState, req: &HttpRequest) -> Result<User, HttpResponse> {
    match current_user(state, req).await {
        Some(user) => Ok(user),
        None => {
            let next = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            Err(redirect(&format!("/login?next={}", encode_query(next))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_query() {
        assert_eq!(encode_query("/subscribe?plan=max"), "%2Fsubscribe%3Fplan%3Dmax");
        assert_eq!(encode_query("/contact"), "%2Fcontact");
    }

    #[test]
    fn test_local_paths() {
        assert!(is_local_path("/contact"));
        assert!(is_local_path("/subscribe?plan=basic"));
        assert!(!is_local_path("https://evil.example"));
        assert!(!is_local_path("//evil.example"));
        assert!(!is_local_path("/\\evil.example"));
        assert!(!is_local_path(""));
    }
}
