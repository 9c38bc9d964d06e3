/// Post handlers - JSON endpoints for the wall
use crate::error::{AppError, Result};
use crate::handlers::form::read_composer_form;
use crate::state::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};

/// List all posts, newest first
///
/// Backend read failures produce an empty list rather than an error.
pub async fn list_posts(state: web::Data<AppState>) -> Result<HttpResponse> {
    let posts = state.repo.list_posts().await;
    Ok(HttpResponse::Ok().json(posts))
}

/// Create a post from a multipart composer form (`body`, `uploader_name`, `file`)
pub async fn create_post(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse> {
    let form = read_composer_form(payload).await?;

    let mut composer = state.composer();
    form.apply_to(&mut composer).map_err(AppError::from)?;

    let post = composer.submit(state.repo.as_ref()).await?;

    Ok(HttpResponse::Created().json(post))
}

/// Delete a post and, best effort, its stored media
pub async fn delete_post(
    state: web::Data<AppState>,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    state.repo.delete_post(&post_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn get_profile(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(&state.profile))
}
