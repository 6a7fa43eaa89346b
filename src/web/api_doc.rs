use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use crate::tracker::{Frame, Subpoint};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::track::frame,
        super::api::track::current,
        super::api::track::trajectory,
    ),
    components(schemas(Frame, Subpoint, ErrorResponse)),
    info(
        title = "Groundtrack API",
        description = "Live position and predicted ground track of the tracked satellite",
        version = "0.1.0"
    ),
    tags(
        (name = "track", description = "Latest tracking frame")
    )
)]
pub struct ApiDoc;
