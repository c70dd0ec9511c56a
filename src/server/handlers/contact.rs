use crate::{
    mail::ContactMessage,
    models::Notice,
    server::{
        handlers::{page, require_user},
        state::AppState,
        views,
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

pub const MESSAGE_SENT: &str = "Your message was sent! We will get back to you soon.";
pub const SEND_FAILED: &str =
    "Could not send the message. Check the mail settings and try again.";

#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub message: String,
}

pub async fn contact_form(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    match require_user(&state, &req).await {
        Ok(user) => page(views::contact_page(Some(&user), &[])),
        Err(login) => login,
    }
}

pub async fn contact(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<ContactForm>,
) -> HttpResponse {
    let user = match require_user(&state, &req).await {
        Ok(user) => user,
        Err(login) => return login,
    };

    let text = form.message.trim();
    if text.is_empty() {
        return page(views::contact_page(
            Some(&user),
            &[Notice::error("Please write a message.")],
        ));
    }

    let message = ContactMessage {
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        message: text.to_string(),
    };

    let notice = match state.mailer.send_contact(&message).await {
        Ok(()) => Notice::success(MESSAGE_SENT),
        Err(e) => {
            log::error!("Failed to send contact message from user {}: {}", user.id, e);
            Notice::error(SEND_FAILED)
        }
    };
    page(views::contact_page(Some(&user), &[notice]))
}
