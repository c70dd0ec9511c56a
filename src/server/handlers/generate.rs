use crate::{
    error::GenerationError,
    generation::DEFAULT_STYLE,
    server::{
        handlers::{current_user, html, page},
        state::AppState,
        views,
    },
};
use actix_multipart::{Field, Multipart};
use actix_web::{
    http::{header, StatusCode},
    web, HttpRequest, HttpResponse,
};
use futures::StreamExt;
use std::path::Path;
use uuid::Uuid;

pub const NO_FILE_UPLOADED: &str = "No file was uploaded.";
pub const NO_FILE_SELECTED: &str = "No file was selected.";
pub const GENERATION_FAILED: &str = "Generation failed. Check the API key configuration.";
pub const NOT_CONFIGURED: &str = "Image generation service is not configured.";
pub const UPLOAD_TOO_LARGE: &str = "The uploaded file is too large.";

/// The parsed `POST /generate` form.
#[derive(Debug, Default)]
struct GenerateForm {
    blueprint: Option<Blueprint>,
    style: Option<String>,
    prompt: Option<String>,
}

#[derive(Debug)]
struct Blueprint {
    filename: String,
    data: Vec<u8>,
}

enum FormError {
    TooLarge,
    Malformed(String),
}

/// Keeps the extension only when it is plain alphanumeric.
fn upload_name(token: &str, original: &str) -> String {
    let extension = Path::new(original)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("blueprint_{}.{}", token, ext),
        None => format!("blueprint_{}", token),
    }
}

fn result_name(token: &str) -> String {
    format!("result_{}.webp", token)
}

fn declared_length(req: &HttpRequest) -> Option<usize> {
    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

async fn read_field(field: &mut Field, budget: &mut usize) -> Result<Vec<u8>, FormError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| FormError::Malformed(e.to_string()))?;
        if bytes.len() > *budget {
            return Err(FormError::TooLarge);
        }
        *budget -= bytes.len();
        data.extend_from_slice(&bytes);
    }
    Ok(data)
}

async fn read_form(payload: &mut Multipart, limit: usize) -> Result<GenerateForm, FormError> {
    let mut form = GenerateForm::default();
    let mut budget = limit;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| FormError::Malformed(e.to_string()))?;
        let name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        match name.as_str() {
            "blueprint" => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .unwrap_or_default()
                    .to_string();
                let data = read_field(&mut field, &mut budget).await?;
                form.blueprint = Some(Blueprint { filename, data });
            }
            "style" | "prompt" => {
                let data = read_field(&mut field, &mut budget).await?;
                let value = String::from_utf8_lossy(&data).into_owned();
                if name == "style" {
                    form.style = Some(value);
                } else {
                    form.prompt = Some(value);
                }
            }
            _ => {
                read_field(&mut field, &mut budget).await?;
            }
        }
    }

    Ok(form)
}

pub async fn generate_form(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Err(e) = ensure_dirs(&state).await {
        log::error!("Failed to create upload/result directories: {}", e);
    }
    let user = current_user(&state, &req).await;
    page(views::generate_page(user.as_ref(), None))
}

async fn ensure_dirs(state: &AppState) -> std::io::Result<()> {
    tokio::fs::create_dir_all(&state.config.upload_dir).await?;
    tokio::fs::create_dir_all(&state.config.result_dir).await
}

pub async fn generate(
    state: web::Data<AppState>,
    req: HttpRequest,
    mut payload: Multipart,
) -> HttpResponse {
    let user = current_user(&state, &req).await;
    let failure = |status: StatusCode, message: &str| {
        html(status, views::generate_page(user.as_ref(), Some(message)))
    };

    let limit = state.config.max_content_length;
    if declared_length(&req).map_or(false, |len| len > limit) {
        return failure(StatusCode::PAYLOAD_TOO_LARGE, UPLOAD_TOO_LARGE);
    }

    if let Err(e) = ensure_dirs(&state).await {
        log::error!("Failed to create upload/result directories: {}", e);
        return failure(StatusCode::OK, &format!("Generation failed: {}", e));
    }

    let form = match read_form(&mut payload, limit).await {
        Ok(form) => form,
        Err(FormError::TooLarge) => {
            log::warn!("Rejected upload larger than {} bytes", limit);
            return failure(StatusCode::PAYLOAD_TOO_LARGE, UPLOAD_TOO_LARGE);
        }
        Err(FormError::Malformed(e)) => {
            log::warn!("Malformed generation form: {}", e);
            return failure(StatusCode::BAD_REQUEST, NO_FILE_UPLOADED);
        }
    };

    let Some(blueprint) = form.blueprint else {
        return failure(StatusCode::OK, NO_FILE_UPLOADED);
    };
    if blueprint.filename.is_empty() {
        return failure(StatusCode::OK, NO_FILE_SELECTED);
    }

    // Only a missing field picks the default. A blank or padded value is
    // passed through and resolves as an unknown style.
    let style = form.style.unwrap_or_else(|| DEFAULT_STYLE.to_string());
    let user_prompt = form.prompt.unwrap_or_default();

    let token = Uuid::new_v4().simple().to_string();
    let upload_filename = upload_name(&token, &blueprint.filename);
    let result_filename = result_name(&token);
    let upload_path = state.config.upload_dir.join(&upload_filename);
    let result_path = state.config.result_dir.join(&result_filename);

    if let Err(e) = tokio::fs::write(&upload_path, &blueprint.data).await {
        log::error!("Failed to save upload {}: {}", upload_path.display(), e);
        return failure(StatusCode::OK, &format!("Generation failed: {}", e));
    }
    log::info!(
        "📐 Saved blueprint {} ({} bytes), style '{}'",
        upload_filename,
        blueprint.data.len(),
        style
    );

    let outcome = state
        .generator
        .generate_interior(&style, &user_prompt, &upload_path, &result_path)
        .await;

    match outcome {
        Ok(outcome) => match outcome.into_path() {
            Some(_) => page(views::result_page(
                user.as_ref(),
                &format!("/results/{}", result_filename),
                &format!("/uploads/{}", upload_filename),
            )),
            None => failure(StatusCode::OK, GENERATION_FAILED),
        },
        Err(GenerationError::NotConfigured) => {
            log::error!("Generation requested but no image API keys are configured");
            failure(StatusCode::OK, NOT_CONFIGURED)
        }
        Err(e) => {
            log::error!("Interior generation for {} failed: {}", upload_filename, e);
            failure(StatusCode::OK, &format!("Generation failed: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_name_keeps_alphanumeric_extension() {
        assert_eq!(upload_name("abc", "plan.png"), "blueprint_abc.png");
        assert_eq!(upload_name("abc", "plan.final.JPG"), "blueprint_abc.JPG");
        assert_eq!(upload_name("abc", "plan"), "blueprint_abc");
        assert_eq!(upload_name("abc", "plan.p-g"), "blueprint_abc");
        assert_eq!(upload_name("abc", "../../etc/passwd"), "blueprint_abc");
    }

    #[test]
    fn test_result_name() {
        assert_eq!(result_name("abc"), "result_abc.webp");
    }
}
