use actix_web::web;

use crate::handlers;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/category/{code}", web::get().to(handlers::category))
        .service(
            web::scope("/products")
                // registered before "/{id}" so "add" is never taken for an id
                .route("/add", web::get().to(handlers::create_form))
                .route("/add", web::post().to(handlers::create))
                .route("/{id}", web::get().to(handlers::detail))
                .route("/{id}/update", web::get().to(handlers::update_form))
                .route("/{id}/update", web::post().to(handlers::update))
                .route("/{id}/delete", web::get().to(handlers::delete_confirm))
                .route("/{id}/delete", web::post().to(handlers::delete)),
        );
}
