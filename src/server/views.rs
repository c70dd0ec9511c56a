//! Server-rendered HTML pages.

use crate::{
    accounts::{CardForm, Plan, PLANS},
    generation::{StyleCatalog, DEFAULT_STYLE},
    models::{Notice, NoticeKind, User},
};
use std::fmt::Write;

/// Escapes text for use in HTML bodies and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Notices carried across a redirect as `?notice=<code>`.
pub fn notice_from_code(code: &str) -> Option<Notice> {
    match code {
        "logged-in" => Some(Notice::success("You are logged in.")),
        "logged-out" => Some(Notice::success("You have logged out.")),
        "plan-required" => Some(Notice::error("Choose a plan before subscribing.")),
        "subscribed" => Some(Notice::success(
            "We are checking your details, we will contact you.",
        )),
        "reset-sent" => Some(Notice::success(
            "Password recovery instructions were sent to your email.",
        )),
        _ => None,
    }
}

fn notices_html(notices: &[Notice]) -> String {
    notices.iter().fold(String::new(), |mut out, notice| {
        let class = match notice.kind {
            NoticeKind::Success => "notice success",
            NoticeKind::Error => "notice error",
        };
        let _ = write!(out, r#"<p class="{}">{}</p>"#, class, escape(&notice.message));
        out
    })
}

fn nav_html(user: Option<&User>) -> String {
    let account = match user {
        Some(user) => format!(
            r#"<span>{}</span> <a href="/contact">Contact</a> <a href="/logout">Log out</a>"#,
            escape(&user.first_name)
        ),
        None => r#"<a href="/login">Log in</a> <a href="/register">Register</a>"#.to_string(),
    };
    format!(
        r#"<nav><a href="/">Home</a> <a href="/generate">Generate</a> {}</nav>"#,
        account
    )
}

pub fn layout(title: &str, user: Option<&User>, notices: &[Notice], body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
</head>
<body>
{nav}
<main>
{notices}
{body}
</main>
</body>
</html>"#,
        title = escape(title),
        nav = nav_html(user),
        notices = notices_html(notices),
        body = body,
    )
}

fn plan_card(plan: &Plan) -> String {
    format!(
        r#"<article class="plan"><h3>{}</h3><p>{}</p><p class="price">{}</p><a href="/subscribe?plan={}">Subscribe</a></article>"#,
        escape(plan.name),
        escape(plan.description),
        escape(plan.price),
        plan.slug
    )
}

pub fn index_page(user: Option<&User>, notices: &[Notice]) -> String {
    let styles: String = StyleCatalog::all()
        .iter()
        .map(|style| format!("<li>{}</li>", escape(style.label)))
        .collect();
    let plans: String = PLANS.iter().map(plan_card).collect();
    let body = format!(
        r#"<h1>Interior renders from your floor plan</h1>
<p>Upload a blueprint, pick a style and get a furnished top-down render.</p>
<p><a href="/generate">Try it now</a></p>
<h2>Styles</h2><ul>{}</ul>
<h2>Plans</h2><section class="plans">{}</section>"#,
        styles, plans
    );
    layout("Interior generator", user, notices, &body)
}

pub fn register_page(notices: &[Notice]) -> String {
    let body = r#"<h1>Register</h1>
<form method="post" action="/register">
<label>First name <input name="first_name" required></label>
<label>Last name <input name="last_name"></label>
<label>Email <input type="email" name="email" required></label>
<label>Password <input type="password" name="password" required></label>
<label>Confirm password <input type="password" name="confirm_password" required></label>
<button type="submit">Create account</button>
</form>
<p>Already registered? <a href="/login">Log in</a></p>"#;
    layout("Register", None, notices, body)
}

pub fn login_page(next: Option<&str>, notices: &[Notice]) -> String {
    let action = match next {
        Some(next) => format!("/login?next={}", escape(&super::handlers::encode_query(next))),
        None => "/login".to_string(),
    };
    let body = format!(
        r#"<h1>Log in</h1>
<form method="post" action="{}">
<label>Email <input type="email" name="email" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Log in</button>
</form>
<p><a href="/forgot-password">Forgot your password?</a> <a href="/register">Register</a></p>"#,
        action
    );
    layout("Log in", None, notices, &body)
}

pub fn forgot_password_page(user: Option<&User>) -> String {
    let body = r#"<h1>Reset password</h1>
<form method="post" action="/forgot-password">
<label>Email <input type="email" name="email" required></label>
<button type="submit">Send instructions</button>
</form>"#;
    layout("Reset password", user, &[], body)
}

pub fn generate_page(user: Option<&User>, error: Option<&str>) -> String {
    let options: String = StyleCatalog::all()
        .iter()
        .map(|style| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                style.id,
                if style.id == DEFAULT_STYLE { " selected" } else { "" },
                escape(style.label)
            )
        })
        .collect();
    let notices: Vec<Notice> = error.map(Notice::error).into_iter().collect();
    let body = format!(
        r#"<h1>Generate an interior</h1>
<form method="post" action="/generate" enctype="multipart/form-data">
<label>Floor plan <input type="file" name="blueprint" accept="image/*" required></label>
<label>Style <select name="style">{}</select></label>
<label>Additional requirements <textarea name="prompt"></textarea></label>
<button type="submit">Generate</button>
</form>"#,
        options
    );
    layout("Generate", user, &notices, &body)
}

pub fn result_page(user: Option<&User>, result_url: &str, source_url: &str) -> String {
    let body = format!(
        r#"<h1>Your interior</h1>
<figure><img src="{result}" alt="Generated interior"><figcaption><a href="{result}" download>Download</a></figcaption></figure>
<figure><img src="{source}" alt="Uploaded floor plan"><figcaption>Floor plan</figcaption></figure>
<p><a href="/generate">Generate another</a></p>"#,
        result = escape(result_url),
        source = escape(source_url)
    );
    layout("Result", user, &[], &body)
}

pub fn subscribe_page(
    user: Option<&User>,
    plan: &Plan,
    form: Option<&CardForm>,
    notices: &[Notice],
) -> String {
    let form = form.cloned().unwrap_or_default();
    let body = format!(
        r#"<h1>Subscribe: {name}</h1>
<p>{description} <strong>{price}</strong></p>
<form method="post" action="/subscribe?plan={slug}">
<input type="hidden" name="plan" value="{slug}">
<label>Card holder <input name="card_holder" value="{holder}"></label>
<label>Card number <input name="card_number" inputmode="numeric" value="{number}"></label>
<label>Month <input name="expiry_month" placeholder="MM" value="{month}"></label>
<label>Year <input name="expiry_year" placeholder="YYYY" value="{year}"></label>
<label>CVV <input name="cvv" inputmode="numeric" value="{cvv}"></label>
<button type="submit">Subscribe</button>
</form>"#,
        name = escape(plan.name),
        description = escape(plan.description),
        price = escape(plan.price),
        slug = plan.slug,
        holder = escape(&form.card_holder),
        number = escape(&form.card_number),
        month = escape(&form.expiry_month),
        year = escape(&form.expiry_year),
        cvv = escape(&form.cvv),
    );
    layout("Subscribe", user, notices, &body)
}

pub fn contact_page(user: Option<&User>, notices: &[Notice]) -> String {
    let body = r#"<h1>Contact us</h1>
<form method="post" action="/contact">
<label>Message <textarea name="message" required></textarea></label>
<button type="submit">Send</button>
</form>"#;
    layout("Contact", user, notices, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::plan_by_slug;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<img src="x" onerror='y'>&"#),
            "&lt;img src=&quot;x&quot; onerror=&#39;y&#39;&gt;&amp;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_notice_codes() {
        assert_eq!(
            notice_from_code("plan-required").map(|n| n.kind),
            Some(NoticeKind::Error)
        );
        assert!(notice_from_code("<script>").is_none());
    }

    #[test]
    fn test_generate_page_preselects_default_style() {
        let page = generate_page(None, Some("No file was selected."));
        assert!(page.contains(r#"<option value="scandinavian" selected>"#));
        assert!(page.contains("No file was selected."));
        assert!(page.contains(r#"name="blueprint""#));
    }

    #[test]
    fn test_subscribe_page_keeps_escaped_input() {
        let plan = plan_by_slug("basic").unwrap();
        let form = CardForm {
            card_holder: "<b>".into(),
            ..Default::default()
        };
        let page = subscribe_page(None, plan, Some(&form), &[]);
        assert!(page.contains(r#"value="&lt;b&gt;""#));
        assert!(page.contains("Basic Set"));
    }
}
