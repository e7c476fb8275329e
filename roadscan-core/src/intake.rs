use std::path::Path;

use image::{DynamicImage, ImageFormat};
use snafu::{OptionExt, ResultExt};
use tracing::*;

use crate::error::*;

/// Raw photo bytes that have passed the "is an image" check.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl SourceImage {
    /// Accepts `bytes` only when their signature is a known image format.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, RoadscanError> {
        let format = image::guess_format(&bytes).ok().context(NotAnImageSnafu)?;
        debug!("accepted {:?} image of {} bytes", format, bytes.len());
        Ok(Self { bytes, format })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RoadscanError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).context(ReadInputSnafu {
            path: path.to_string_lossy(),
        })?;
        Self::from_bytes(bytes)
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn decode(&self) -> Result<DynamicImage, RoadscanError> {
        image::load_from_memory_with_format(&self.bytes, self.format).context(ImageDecodeSnafu)
    }

    /// Decodes on the blocking pool, resolving once the pixels are ready.
    pub async fn decode_async(&self) -> Result<DynamicImage, RoadscanError> {
        let source = self.clone();
        tokio::task::spawn_blocking(move || source.decode())
            .await
            .context(JoinSnafu { stage: "decode" })?
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{Rgb, RgbImage};

    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbImage::from_pixel(width, height, Rgb([10, 20, 30]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_rejects_non_image() {
        let err = SourceImage::from_bytes(b"%PDF-1.7 not a photo".to_vec()).unwrap_err();
        assert!(matches!(err, RoadscanError::NotAnImage));
        assert!(SourceImage::from_bytes(Vec::new()).is_err());
    }

    #[test]
    fn test_accepts_png() {
        let source = SourceImage::from_bytes(png_bytes(4, 3)).unwrap();
        assert_eq!(source.format, ImageFormat::Png);
        assert_eq!(source.mime_type(), "image/png");

        let image = source.decode().unwrap();
        assert_eq!((image.width(), image.height()), (4, 3));
    }

    #[test]
    fn test_truncated_image_fails_to_decode() {
        let mut bytes = png_bytes(4, 3);
        bytes.truncate(20);
        let source = SourceImage::from_bytes(bytes).unwrap();
        assert!(matches!(
            source.decode(),
            Err(RoadscanError::ImageDecode { .. })
        ));
    }

    #[tokio::test]
    async fn test_decode_async() {
        let source = SourceImage::from_bytes(png_bytes(8, 2)).unwrap();
        let image = source.decode_async().await.unwrap();
        assert_eq!((image.width(), image.height()), (8, 2));
    }
}
