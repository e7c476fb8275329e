pub mod gemini;

pub use gemini::GeminiClient;

use std::future::Future;

use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt, ensure};

use crate::{
    analysis::detection::DetectionResult,
    consts::DEVICE_LOCATION_ADDRESS,
    error::*,
    intake::SourceImage,
};

/// Remote model that finds hazards in a road photo.
pub trait VisionService {
    fn analyze(
        &self,
        image: &SourceImage,
    ) -> impl Future<Output = Result<DetectionResult, RoadscanError>> + Send;
}

/// Resolves a free-text place description to coordinates.
pub trait Geocoder {
    fn resolve(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<LocationData, RoadscanError>> + Send;
}

/// Where the photo was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    /// milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl LocationData {
    /// Coordinates reported by the capturing device itself.
    pub fn from_device(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            address: Some(DEVICE_LOCATION_ADDRESS.to_string()),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodePayload {
    latitude: f64,
    longitude: f64,
    address: String,
}

/// Parses the model's JSON text into detections.
///
/// Missing or blank text is a hard failure, there is no partial result.
pub fn parse_detection_text(
    service: &str,
    text: Option<&str>,
) -> Result<DetectionResult, RoadscanError> {
    let text = non_empty(service, text)?;
    serde_json::from_str(text).context(ResponseJsonSnafu { service })
}

/// Parses the geocoder's JSON text, stamping it with the current time.
pub fn parse_location_text(
    service: &str,
    text: Option<&str>,
) -> Result<LocationData, RoadscanError> {
    let text = non_empty(service, text)?;
    let payload: GeocodePayload =
        serde_json::from_str(text).context(ResponseJsonSnafu { service })?;

    Ok(LocationData {
        latitude: Some(payload.latitude),
        longitude: Some(payload.longitude),
        address: Some(payload.address),
        timestamp: chrono::Utc::now().timestamp_millis(),
    })
}

fn non_empty<'a>(service: &str, text: Option<&'a str>) -> Result<&'a str, RoadscanError> {
    let text = text.context(EmptyResponseSnafu { service })?;
    ensure!(!text.trim().is_empty(), EmptyResponseSnafu { service });
    Ok(text)
}
