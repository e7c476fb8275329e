use base64::{Engine as _, engine::general_purpose};
use serde::Deserialize;
use serde_json::{Value, json};
use snafu::{ResultExt, ensure};
use tracing::*;

use crate::{
    analysis::detection::DetectionResult,
    consts::*,
    error::*,
    intake::SourceImage,
};

use super::{Geocoder, LocationData, VisionService, parse_detection_text, parse_location_text};

const VISION_SERVICE: &str = "gemini-vision";
const GEOCODE_SERVICE: &str = "gemini-geocode";

/// HTTP client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text = parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<String>();
        (!text.is_empty()).then_some(text)
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Reads the API key (required) and model (optional) from the environment.
    pub fn from_env() -> Result<Self, RoadscanError> {
        let api_key = std::env::var(GEMINI_API_KEY_ENV_NAME).context(EnvNotFoundSnafu {
            name: GEMINI_API_KEY_ENV_NAME,
        })?;
        let model = std::env::var(GEMINI_MODEL_ENV_NAME)
            .unwrap_or_else(|_| DEFAULT_MODEL_NAME.to_string());

        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    #[tracing::instrument(skip_all, fields(service = service, model = %self.model))]
    async fn generate(&self, service: &str, body: &Value) -> Result<Option<String>, RoadscanError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .context(HttpSnafu { stage: "send" })?;

        let status = response.status();
        ensure!(
            status.is_success(),
            ServiceStatusSnafu {
                service,
                status: status.as_u16(),
            }
        );

        let payload = response
            .json::<GenerateContentResponse>()
            .await
            .context(HttpSnafu { stage: "decode" })?;
        debug!("received {} candidates", payload.candidates.len());

        Ok(payload.text())
    }
}

/// Request asking the model for hazards in `image`.
pub fn detection_request(image: &SourceImage) -> Value {
    json!({
        "contents": [{
            "parts": [
                { "text": SYSTEM_PROMPT },
                {
                    "inline_data": {
                        "mime_type": image.mime_type(),
                        "data": general_purpose::STANDARD.encode(&image.bytes),
                    }
                }
            ]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "potholes": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "box_2d": {
                                    "type": "ARRAY",
                                    "items": { "type": "NUMBER" },
                                    "minItems": 4,
                                    "maxItems": 4,
                                    "description": "Coordinates [ymin, xmin, ymax, xmax] scaled 0-1000"
                                },
                                "label": { "type": "STRING" },
                                "confidence": { "type": "NUMBER" },
                                "severity": { "type": "STRING" }
                            },
                            "required": ["box_2d", "label", "confidence", "severity"]
                        }
                    },
                    "summary": { "type": "STRING" }
                },
                "required": ["potholes", "summary"]
            }
        }
    })
}

/// Request asking the model to geocode `query`.
pub fn geocode_request(query: &str) -> Value {
    json!({
        "contents": [{
            "parts": [{
                "text": format!(
                    "Provide the precise latitude, longitude, and full formatted address for the following location: \"{query}\"."
                )
            }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "latitude": { "type": "NUMBER" },
                    "longitude": { "type": "NUMBER" },
                    "address": { "type": "STRING" }
                },
                "required": ["latitude", "longitude", "address"]
            }
        }
    })
}

impl VisionService for GeminiClient {
    async fn analyze(&self, image: &SourceImage) -> Result<DetectionResult, RoadscanError> {
        info!("analyze {} bytes of {}", image.bytes.len(), image.mime_type());
        let text = self
            .generate(VISION_SERVICE, &detection_request(image))
            .await
            .inspect_err(|err| error!("vision analysis failed: {err}"))?;

        let result = parse_detection_text(VISION_SERVICE, text.as_deref())
            .inspect_err(|err| error!("vision analysis failed: {err}"))?;
        info!("model reported {} hazards", result.potholes.len());

        Ok(result)
    }
}

impl Geocoder for GeminiClient {
    async fn resolve(&self, query: &str) -> Result<LocationData, RoadscanError> {
        let query = query.trim();
        ensure!(!query.is_empty(), EmptyQuerySnafu);

        let resolved = match self.generate(GEOCODE_SERVICE, &geocode_request(query)).await {
            Ok(text) => parse_location_text(GEOCODE_SERVICE, text.as_deref()),
            Err(err) => Err(err),
        };

        resolved.map_err(|err| {
            warn!("location resolution for `{query}` failed: {err}");
            RoadscanError::LocationNotFound {
                query: query.to_string(),
            }
        })
    }
}
