/// Upper bound of the normalized coordinate space used by the vision model.
///
/// Every `box_2d` component is expressed on a 0..=1000 scale, independent of
/// the resolution of the image that was analyzed.
pub const NORMALIZED_SCALE: f32 = 1000.0;

/// Width of the rectangle outline drawn around each hazard, in device pixels.
///
/// The stroke is centered on the box edge, so a width of 3 covers one pixel
/// inside and one pixel outside the edge.
pub const STROKE_WIDTH: u32 = 3;

/// Height of the filled label band drawn directly above a box.
pub const LABEL_HEIGHT: f32 = 20.0;

/// Horizontal padding added to the measured label text width.
pub const LABEL_PADDING: f32 = 10.0;

/// Distance from the box's left edge to the start of the label text.
pub const LABEL_TEXT_INSET_X: f32 = 5.0;

/// Distance from the box's top edge up to the label text baseline.
pub const LABEL_TEXT_BASELINE_OFFSET: f32 = 6.0;

/// Pixel size of the label font.
pub const LABEL_FONT_SIZE: f32 = 12.0;

/// Label text color.
pub const LABEL_TEXT_COLOR: [u8; 4] = [255, 255, 255, 255];

/// A4 portrait page width in millimeters.
pub const A4_WIDTH_MM: f64 = 210.0;

/// A4 portrait page height in millimeters.
pub const A4_HEIGHT_MM: f64 = 297.0;

/// Upper bound on the pages one document may be split into.
pub const MAX_PAGES: usize = 1_000_000;

/// PDF user-space points per millimeter.
pub const POINTS_PER_MM: f64 = 72.0 / 25.4;

/// Pixel density multiplier used when the report sheet is captured.
pub const CAPTURE_SCALE: f32 = 2.0;

/// Logical width of the report sheet before the capture scale is applied.
pub const SHEET_WIDTH: u32 = 900;

/// Logical padding around the report sheet content.
pub const SHEET_MARGIN: u32 = 40;

/// JPEG quality used when the report raster is embedded in a PDF.
pub const JPEG_QUALITY: u8 = 95;

/// Bold sans serif face used for labels and the report sheet.
pub const FONT: &[u8] = include_bytes!("../../fonts/DejaVuSans-Bold.ttf");

pub const GEMINI_API_KEY_ENV_NAME: &str = "GEMINI_API_KEY";
pub const GEMINI_MODEL_ENV_NAME: &str = "GEMINI_MODEL";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL_NAME: &str = "gemini-3-flash-preview";

/// Instruction sent alongside every road image.
pub const SYSTEM_PROMPT: &str = r#"
You are an expert civil engineer specializing in road maintenance and safety.
Your task is to analyze the provided image and detect all potholes.
Return a valid JSON object containing a list of detected potholes.

For each pothole, provide:
1. 'box_2d': [ymin, xmin, ymax, xmax] coordinates normalized to 1000.
2. 'label': 'pothole'.
3. 'confidence': score between 0 and 1.
4. 'severity': 'Low', 'Medium', or 'High' based on the relative size and perceived depth.

Format the output as:
{
  "potholes": [
    {
      "box_2d": [ymin, xmin, ymax, xmax],
      "label": "pothole",
      "confidence": 0.95,
      "severity": "High"
    }
  ],
  "summary": "Brief overall assessment of road condition."
}

Only return the JSON. No other text.
"#;

/// Label attached to coordinates that came straight from the device.
pub const DEVICE_LOCATION_ADDRESS: &str = "Live GPS Verification";

/// User-facing message for any geocoding failure.
pub const LOCATION_NOT_FOUND_MESSAGE: &str =
    "Location not found. Please try a more specific address or city.";

/// User-facing message for any vision service failure.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to analyze image.";
