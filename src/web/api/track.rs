use axum::{extract::State, Json};

use crate::tracker::{Frame, Subpoint};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[utoipa::path(
    get,
    path = "/api/track/frame",
    responses(
        (status = 200, description = "Latest frame", body = Frame),
        (status = 503, description = "No frame rendered yet", body = ErrorResponse)
    ),
    tag = "track"
)]
pub async fn frame(State(state): State<AppState>) -> ApiResult<Json<Frame>> {
    latest(&state).map(Json)
}

#[utoipa::path(
    get,
    path = "/api/track/current",
    responses(
        (status = 200, description = "Current subpoint", body = Subpoint),
        (status = 503, description = "No frame rendered yet", body = ErrorResponse)
    ),
    tag = "track"
)]
pub async fn current(State(state): State<AppState>) -> ApiResult<Json<Subpoint>> {
    latest(&state).map(|frame| Json(frame.current))
}

#[utoipa::path(
    get,
    path = "/api/track/trajectory",
    responses(
        (status = 200, description = "Predicted ground track", body = Vec<Subpoint>),
        (status = 503, description = "No frame rendered yet", body = ErrorResponse)
    ),
    tag = "track"
)]
pub async fn trajectory(State(state): State<AppState>) -> ApiResult<Json<Vec<Subpoint>>> {
    latest(&state).map(|frame| Json(frame.trajectory.points().to_vec()))
}

fn latest(state: &AppState) -> ApiResult<Frame> {
    state.live.latest().ok_or(ApiError::NotReady)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Renderer;
    use crate::tracker::{predict_trajectory, PropagationError};
    use crate::web::LiveFrame;
    use axum::response::IntoResponse;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn state() -> AppState {
        AppState {
            live: LiveFrame::new(),
            refresh: Duration::from_secs(60),
        }
    }

    fn sample_frame(cycle: u64) -> Frame {
        let start = Subpoint {
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            latitude_deg: -20.0,
            longitude_deg: 45.0,
            altitude_km: 415.0,
        };
        let trajectory = predict_trajectory(start, 4, |at| {
            Ok::<_, PropagationError>(Subpoint { timestamp: at, ..start })
        })
        .unwrap();
        Frame {
            cycle,
            satellite: "ISS (ZARYA)".into(),
            norad_id: 25544,
            current: start,
            trajectory,
        }
    }

    #[tokio::test]
    async fn unavailable_before_first_frame() {
        let response = frame(State(state())).await.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn serves_latest_frame() {
        let state = state();
        let mut sink = state.live.clone();
        sink.render(&sample_frame(1)).unwrap();
        sink.render(&sample_frame(2)).unwrap();

        let Ok(Json(latest)) = frame(State(state.clone())).await else {
            panic!("expected a frame");
        };
        assert_eq!(latest.cycle, 2);

        let Ok(Json(current)) = current(State(state.clone())).await else {
            panic!("expected a subpoint");
        };
        assert_eq!(current.latitude_deg, -20.0);

        let Ok(Json(points)) = trajectory(State(state)).await else {
            panic!("expected a trajectory");
        };
        assert_eq!(points.len(), 5);
    }
}
