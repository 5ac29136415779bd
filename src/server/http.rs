use std::net::{Ipv4Addr, SocketAddr};

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiResult;
use crate::routes;
use crate::server::appstate::AppState;

#[must_use]
pub fn build_service(appstate: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(appstate)
}

pub async fn serve(listen: Ipv4Addr, port: u16, service: Router) -> ApiResult<()> {
    let addr = SocketAddr::from((listen, port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Admin api listening on http://{addr}/api");
    axum::serve(listener, service).await?;
    Ok(())
}
