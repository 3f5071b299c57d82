use axum::routing::{get, MethodRouter};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{cache, drip, dynamic, range, status};
use crate::state::SharedState;

/// Routes that answer the same way whatever the method.
fn any_method<H, T>(handler: H) -> MethodRouter<SharedState>
where
    H: axum::handler::Handler<T, SharedState>,
    T: 'static,
{
    get(handler.clone())
        .put(handler.clone())
        .post(handler.clone())
        .patch(handler.clone())
        .delete(handler)
}

/// Builds the full probe router around `state`.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/get", get(dynamic::get))
        .route("/status/:codes", any_method(status::status_codes))
        .route("/range/:numbytes", get(range::range))
        .route("/drip", get(drip::drip))
        .route("/cache", get(cache::cache))
        .route("/cache/:value", get(cache::cache_for))
        .route("/etag/:etag", get(cache::etag))
        .route("/bytes/:n", get(dynamic::bytes))
        .route("/stream-bytes/:n", get(dynamic::stream_bytes))
        .route("/delay/:n", any_method(dynamic::delay))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
