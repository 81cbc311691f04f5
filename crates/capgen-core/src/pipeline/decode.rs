//! Image decoding with content-based format detection.

use image::DynamicImage;
use std::path::Path;

use crate::error::PipelineError;

/// Decode an image file into RGB pixels.
///
/// The format is detected from the file content, not the extension, so a
/// PNG misnamed as `.jpg` still decodes.
pub fn decode_image(path: &Path) -> Result<DynamicImage, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|e| PipelineError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    decode_bytes(bytes, path)
}

/// Decode an in-memory byte buffer.
pub fn decode_bytes(bytes: Vec<u8>, path: &Path) -> Result<DynamicImage, PipelineError> {
    use std::io::Cursor;

    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot detect image format: {}", e),
        })?;

    let image = reader.decode().map_err(|e| PipelineError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    // Models expect RGB; strip alpha and normalize the pixel type here.
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};

    fn write_png(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let img = RgbaImage::from_pixel(8, 8, image::Rgba([10, 20, 30, 255]));
        img.save_with_format(&path, ImageFormat::Png).unwrap();
        path
    }

    #[test]
    fn test_decode_produces_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "img.png");

        let decoded = decode_image(&path).unwrap();
        assert!(matches!(decoded, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_decode_detects_format_by_content() {
        // A PNG misnamed as .jpg still decodes.
        let dir = tempfile::tempdir().unwrap();
        let png = write_png(dir.path(), "real.png");
        let misnamed = dir.path().join("misnamed.jpg");
        std::fs::copy(&png, &misnamed).unwrap();

        assert!(decode_image(&misnamed).is_ok());
    }

    #[test]
    fn test_decode_missing_file() {
        let err = decode_image(Path::new("/no/such/img.jpg")).unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[test]
    fn test_decode_garbage_bytes() {
        let err = decode_bytes(b"not an image at all".to_vec(), Path::new("bad.jpg")).unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }
}
