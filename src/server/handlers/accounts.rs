use crate::{
    accounts::{hash_password, validate_password, verify_password, SESSION_COOKIE},
    error::StorageError,
    models::{NewUser, Notice},
    server::{
        handlers::{current_user, is_local_path, page, redirect, require_user},
        state::AppState,
        views,
    },
};
use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    web, HttpRequest, HttpResponse,
};
use serde::Deserialize;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";
const REGISTRATION_FAILED: &str = "Registration failed. Try again later.";

#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
    pub notice: Option<String>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::ZERO)
        .finish()
}

pub async fn register_form(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if current_user(&state, &req).await.is_some() {
        return redirect("/");
    }
    page(views::register_page(&[]))
}

pub async fn register(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<RegisterForm>,
) -> HttpResponse {
    if current_user(&state, &req).await.is_some() {
        return redirect("/");
    }

    let form = form.into_inner();
    let first_name = form.first_name.trim().to_string();
    let last_name = form.last_name.trim().to_string();
    let email = normalize_email(&form.email);
    let retry = |message: &str| page(views::register_page(&[Notice::error(message)]));

    if first_name.is_empty()
        || email.is_empty()
        || form.password.is_empty()
        || form.confirm_password.is_empty()
    {
        return retry("Fill in the required fields.");
    }
    if form.password != form.confirm_password {
        return retry("Passwords do not match.");
    }
    if !validate_password(&form.password) {
        return retry(
            "The password must be at least 8 characters long and use only Latin letters and digits.",
        );
    }

    match state.storage.find_user_by_email(&email).await {
        Ok(Some(_)) => return retry("A user with this email already exists."),
        Ok(None) => {}
        Err(e) => {
            log::error!("Failed to look up {} during registration: {}", email, e);
            return retry(REGISTRATION_FAILED);
        }
    }

    let password_hash = match hash_password(&form.password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("Failed to hash password for {}: {}", email, e);
            return retry(REGISTRATION_FAILED);
        }
    };

    let new_user = NewUser {
        first_name,
        last_name: Some(last_name).filter(|name| !name.is_empty()),
        email,
        password_hash,
    };

    match state.storage.create_user(new_user).await {
        Ok(user) => {
            log::info!("👤 Registered user {} ({})", user.id, user.email);
            page(views::login_page(
                None,
                &[Notice::success("Registration successful! You can now log in.")],
            ))
        }
        Err(StorageError::Conflict(_)) => retry("A user with this email already exists."),
        Err(e) => {
            log::error!("Failed to save user: {}", e);
            retry(REGISTRATION_FAILED)
        }
    }
}

pub async fn login_form(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<LoginQuery>,
) -> HttpResponse {
    if current_user(&state, &req).await.is_some() {
        return redirect("/");
    }
    let notices: Vec<Notice> = query
        .notice
        .as_deref()
        .and_then(views::notice_from_code)
        .into_iter()
        .collect();
    page(views::login_page(query.next.as_deref(), &notices))
}

pub async fn login(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<LoginQuery>,
    form: web::Form<LoginForm>,
) -> HttpResponse {
    if current_user(&state, &req).await.is_some() {
        return redirect("/");
    }

    let email = normalize_email(&form.email);
    let user = match state.storage.find_user_by_email(&email).await {
        Ok(user) => user,
        Err(e) => {
            log::error!("Failed to look up {} during login: {}", email, e);
            None
        }
    };

    let verified = user.filter(|user| {
        verify_password(&form.password, &user.password_hash).unwrap_or_else(|e| {
            log::error!("Password check failed for user {}: {}", user.id, e);
            false
        })
    });

    let Some(user) = verified else {
        log::debug!("Rejected login for {}", email);
        return page(views::login_page(
            query.next.as_deref(),
            &[Notice::error(INVALID_CREDENTIALS)],
        ));
    };

    let token = state.sessions.create(user.id).await;
    log::info!("🔑 User {} logged in", user.id);

    let target = query
        .next
        .as_deref()
        .filter(|next| is_local_path(next))
        .unwrap_or("/?notice=logged-in");

    let mut response = redirect(target);
    if let Err(e) = response.add_cookie(&session_cookie(token)) {
        log::error!("Failed to set session cookie: {}", e);
    }
    response
}

pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Err(login) = require_user(&state, &req).await {
        return login;
    }
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        state.sessions.remove(cookie.value()).await;
    }

    let mut response = redirect("/?notice=logged-out");
    if let Err(e) = response.add_cookie(&expired_session_cookie()) {
        log::error!("Failed to clear session cookie: {}", e);
    }
    response
}

pub async fn forgot_password_form(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let user = current_user(&state, &req).await;
    page(views::forgot_password_page(user.as_ref()))
}

/// No reset mail is sent; the page always reports success.
pub async fn forgot_password() -> HttpResponse {
    redirect("/login?notice=reset-sent")
}
