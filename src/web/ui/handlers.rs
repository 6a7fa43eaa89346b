use axum::{extract::State, response::IntoResponse};

use crate::web::server::AppState;

use super::templates::DashboardTemplate;

pub async fn dashboard(State(state): State<AppState>) -> impl IntoResponse {
    DashboardTemplate {
        refresh_ms: state.refresh.as_millis() as u64,
    }
}
