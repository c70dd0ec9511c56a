use crate::{
    accounts::{plan_by_slug, CardForm, Plan},
    models::{NewSubscription, Notice, User},
    server::{
        handlers::{page, redirect, require_user},
        state::AppState,
        views,
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct PlanQuery {
    pub plan: Option<String>,
}

const PLAN_REQUIRED: &str = "/?notice=plan-required";

async fn plan_and_user(
    state: &AppState,
    req: &HttpRequest,
    slug: Option<&str>,
) -> Result<(User, &'static Plan), HttpResponse> {
    let user = require_user(state, req).await?;
    match slug.and_then(plan_by_slug) {
        Some(plan) => Ok((user, plan)),
        None => Err(redirect(PLAN_REQUIRED)),
    }
}

pub async fn subscribe_form(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<PlanQuery>,
) -> HttpResponse {
    match plan_and_user(&state, &req, query.plan.as_deref()).await {
        Ok((user, plan)) => page(views::subscribe_page(Some(&user), plan, None, &[])),
        Err(response) => response,
    }
}

pub async fn subscribe(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<PlanQuery>,
    form: web::Form<CardForm>,
) -> HttpResponse {
    let slug = query.plan.as_deref().or(form.plan.as_deref());
    let (user, plan) = match plan_and_user(&state, &req, slug).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    let card = form.trimmed();
    let errors = card.validate();
    if !errors.is_empty() {
        let notices: Vec<Notice> = errors.into_iter().map(Notice::error).collect();
        return page(views::subscribe_page(Some(&user), plan, Some(&card), &notices));
    }

    let subscription = NewSubscription {
        user_id: user.id,
        plan_slug: plan.slug.to_string(),
        plan_name: plan.name.to_string(),
        card_holder: card.card_holder.clone(),
        card_number: card.card_number.clone(),
        expiry_month: card.expiry_month.clone(),
        expiry_year: card.expiry_year.clone(),
        cvv: card.cvv.clone(),
    };

    match state.storage.create_subscription(subscription).await {
        Ok(saved) => {
            log::info!(
                "💳 Captured {} subscription {} for user {}",
                saved.plan_slug,
                saved.id,
                user.id
            );
            redirect("/?notice=subscribed")
        }
        Err(e) => {
            log::error!("Failed to save subscription for user {}: {}", user.id, e);
            page(views::subscribe_page(
                Some(&user),
                plan,
                Some(&card),
                &[Notice::error("Could not complete the subscription. Try again later.")],
            ))
        }
    }
}
