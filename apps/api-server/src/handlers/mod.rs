//! HTTP handlers and route configuration.

mod health;
mod posts;

use actix_web::web;

/// Configure all application routes.
///
/// The post functions accept any method and read their input from the
/// query string.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .route("/addPost", web::route().to(posts::add_post))
        .route("/deletePost", web::route().to(posts::delete_post))
        .route("/getPosts", web::route().to(posts::get_posts));
}
