use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod ai;
pub mod auth;
pub mod categories;
pub mod content;
pub mod coupons;
pub mod doc;
pub mod health;
pub mod loyalty;
pub mod orders;
pub mod params;
pub mod payments;
pub mod products;
pub mod push;
pub mod sellers;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
        .nest("/coupons", coupons::router())
        .nest("/loyalty", loyalty::router())
        .nest("/sellers", sellers::router())
        .nest("/push", push::router())
        .nest("/ai", ai::router())
        .nest("/admin", admin::router())
        .merge(content::router())
}
