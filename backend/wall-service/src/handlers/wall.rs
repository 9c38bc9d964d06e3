/// Page handlers - the HTML wall and its form posts
use crate::components::FeedView;
use crate::error::{AppError, Result};
use crate::handlers::form::read_composer_form;
use crate::state::AppState;
use crate::views::render_wall;
use actix_multipart::Multipart;
use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpResponse, ResponseError};

fn redirect_home() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/"))
        .finish()
}

async fn render(state: &AppState, view: &mut FeedView, status: StatusCode) -> HttpResponse {
    view.load().await;
    let html = render_wall(&state.profile, &view.posts(), view.composer());
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(html)
}

/// Render the wall
pub async fn wall_page(state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut view = state.feed_view();
    Ok(render(&state, &mut view, StatusCode::OK).await)
}

/// Composer form submission; re-renders with the draft kept on failure
pub async fn submit_post(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse> {
    let form = read_composer_form(payload).await?;
    let mut view = state.feed_view();

    if let Err(err) = form.apply_to(view.composer_mut()) {
        let status = AppError::from(err).status_code();
        return Ok(render(&state, &mut view, status).await);
    }

    match view.submit().await {
        Ok(post) => {
            tracing::debug!(post_id = %post.id, "post submitted from page");
            Ok(redirect_home())
        }
        Err(err) => {
            let status = AppError::from(err).status_code();
            Ok(render(&state, &mut view, status).await)
        }
    }
}

/// Delete form submission
pub async fn delete_post_form(
    state: web::Data<AppState>,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let mut view = state.feed_view();

    match view.delete(&post_id).await {
        Ok(()) => Ok(redirect_home()),
        Err(err) => {
            let status = AppError::from(err).status_code();
            Ok(render(&state, &mut view, status).await)
        }
    }
}
