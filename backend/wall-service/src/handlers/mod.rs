/// HTTP handlers
///
/// - `wall`: the HTML page and its composer/delete form posts
/// - `posts`: JSON API for posts and the profile
/// - `stream`: server-sent event stream of newly inserted posts
/// - `form`: multipart composer form parsing
pub mod form;
pub mod posts;
pub mod stream;
pub mod wall;

// Re-export handler functions at module level
pub use posts::{create_post, delete_post, get_profile, list_posts};
pub use stream::post_stream;
pub use wall::{delete_post_form, submit_post, wall_page};

use actix_web::web;

/// Register every wall route; shared by `main` and the handler tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(wall_page))
        .route("/posts", web::post().to(submit_post))
        .route("/posts/{post_id}/delete", web::post().to(delete_post_form))
        .service(
            web::scope("/api/v1")
                .route("/profile", web::get().to(get_profile))
                .service(
                    web::scope("/posts")
                        .service(
                            web::resource("")
                                .route(web::get().to(list_posts))
                                .route(web::post().to(create_post)),
                        )
                        .route("/stream", web::get().to(post_stream))
                        .service(
                            web::resource("/{post_id}").route(web::delete().to(delete_post)),
                        ),
                ),
        );
}
