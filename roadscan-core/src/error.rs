use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RoadscanError {
    #[snafu(display("Please upload a valid image file (JPG/PNG)."))]
    NotAnImage,
    #[snafu(display("Decode image error: {}", source))]
    ImageDecode { source: image::ImageError },
    #[snafu(display(
        "Invalid dimensions at stage `{}`: {}x{}",
        stage,
        width,
        height
    ))]
    InvalidDimensions {
        stage: String,
        width: f64,
        height: f64,
    },
    #[snafu(display("Invalid page size {}x{}, both sides must be positive", width, height))]
    InvalidPageSpec { width: f64, height: f64 },
    #[snafu(display(
        "Content would need {} pages, more than the supported {}",
        pages,
        limit
    ))]
    TooManyPages { pages: f64, limit: usize },
    #[snafu(display("Location query is empty"))]
    EmptyQuery,
    #[snafu(display("Request to `{}` failed: {}", stage, source))]
    Http {
        source: reqwest::Error,
        stage: String,
    },
    #[snafu(display("Service `{}` answered with status {}", service, status))]
    ServiceStatus { service: String, status: u16 },
    #[snafu(display("No response from `{}`", service))]
    EmptyResponse { service: String },
    #[snafu(display("Invalid payload from `{}`: {}", service, source))]
    ResponseJson {
        source: serde_json::Error,
        service: String,
    },
    #[snafu(display("Location not found for `{}`", query))]
    LocationNotFound { query: String },
    #[snafu(display("Load Font error: {}", source))]
    Font { source: ab_glyph::InvalidFont },
    #[snafu(display("Image Write `{}` error: {}", path, source))]
    ImageWrite {
        source: image::ImageError,
        path: String,
    },
    #[snafu(display("Image Encode error: {}", source))]
    ImageEncode { source: image::ImageError },
    #[snafu(display("Write `{}` error: {}", path, source))]
    IoWrite {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Read `{}` error: {}", path, source))]
    ReadInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Environment `{}` Not Found, error {}", name, source))]
    EnvNotFound {
        source: std::env::VarError,
        name: String,
    },
    #[snafu(display("Background task `{}` failed: {}", stage, source))]
    Join {
        source: tokio::task::JoinError,
        stage: String,
    },
}

impl RoadscanError {
    /// Message suitable for showing to the person who triggered the action.
    ///
    /// External service failures collapse into a single sentence, everything
    /// else uses its display text.
    pub fn user_message(&self) -> String {
        match self {
            RoadscanError::LocationNotFound { .. } | RoadscanError::EmptyQuery => {
                crate::consts::LOCATION_NOT_FOUND_MESSAGE.to_string()
            }
            RoadscanError::Http { .. }
            | RoadscanError::ServiceStatus { .. }
            | RoadscanError::EmptyResponse { .. }
            | RoadscanError::ResponseJson { .. } => {
                crate::consts::ANALYSIS_FAILED_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}
