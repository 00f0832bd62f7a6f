// Route exports
pub mod cycles;

use actix_web::web;

pub use cycles::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(cycles::configure),
    );
}
