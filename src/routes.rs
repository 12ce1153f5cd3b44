use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::shared::AppState;
use crate::{events, logging, presence, room};

/// Builds the full HTTP surface of a room display
pub fn app(state: AppState) -> Router {
    let static_docs = ServeDir::new(&state.static_root);
    // No directory listing; directories serve their index.html
    let ui = ServeDir::new(&state.web_root).append_index_html_on_directories(true);

    Router::new()
        // get/create events for a room
        .route(
            "/:room_id/events",
            get(events::get_events).post(events::create_event),
        )
        // live viewer count for a room
        .route("/:room_id/ws", get(presence::websocket_handler))
        .route("/config", get(room::get_config))
        .nest_service("/static", static_docs)
        .route("/help", post(room::send_help_request))
        // load balancer status check
        .route("/status", get(logging::status))
        .route("/log/:level", get(logging::set_log_level))
        .fallback_service(ui)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
