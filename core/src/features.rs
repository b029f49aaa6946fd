//! Feature-vector sources.
//!
//! Runes are drawn white on a dark canvas, so the red channel of each pixel,
//! normalized to `[0, 1]`, is used as the grayscale value.

use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Result, RuneError};

/// Grayscale values from a row-major RGBA8 raster.
///
/// A warning is logged when `width * height` differs from `expected_len`;
/// the vector is still produced and the length check is left to the
/// classifier.
pub fn grayscale_from_rgba(
    pixels: &[u8],
    width: u32,
    height: u32,
    expected_len: usize,
) -> Result<Vec<f32>> {
    let too_large = || RuneError::config(format!("raster {}x{} is too large", width, height));
    let size = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(too_large)?;
    let bytes = size.checked_mul(4).ok_or_else(too_large)?;
    if pixels.len() < bytes {
        return Err(RuneError::config(format!(
            "raster {}x{} needs {} bytes, got {}",
            width,
            height,
            bytes,
            pixels.len()
        )));
    }

    if size != expected_len {
        warn!(
            "Canvas dimensions are {}x{} ({} elements), expected {} elements",
            width, height, size, expected_len
        );
    } else {
        debug!("Canvas dimensions are {}x{}", width, height);
    }

    Ok(pixels
        .chunks_exact(4)
        .take(size)
        .map(|px| f32::from(px[0]) / 255.0)
        .collect())
}

/// Decode an image file and extract its grayscale feature vector.
pub fn load_image(path: impl AsRef<Path>, expected_len: usize) -> Result<Vec<f32>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RuneError::FileNotFound(path.to_path_buf()));
    }
    let rgba = image::open(path)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    grayscale_from_rgba(rgba.as_raw(), width, height, expected_len)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureFile {
    Object { data: Vec<f32> },
    Flat(Vec<f32>),
}

/// Parse a feature vector from JSON, either `{ "data": [...] }` or a bare array.
pub fn from_json_str(json: &str) -> Result<Vec<f32>> {
    let file: FeatureFile = serde_json::from_str(json)?;
    Ok(match file {
        FeatureFile::Object { data } | FeatureFile::Flat(data) => data,
    })
}

/// Load a feature vector from a JSON file.
pub fn load_json(path: impl AsRef<Path>) -> Result<Vec<f32>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RuneError::FileNotFound(path.to_path_buf()));
    }
    from_json_str(&std::fs::read_to_string(path)?)
}

/// Load features from `path`: `.json` files as JSON, anything else as an image.
pub fn load(path: impl AsRef<Path>, expected_len: usize) -> Result<Vec<f32>> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        load_json(path)
    } else {
        load_image(path, expected_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_red_channel() {
        let pixels = [255, 0, 0, 255, 0, 255, 255, 255, 51, 10, 10, 255, 0, 0, 0, 0];
        let features = grayscale_from_rgba(&pixels, 2, 2, 4).unwrap();
        assert_eq!(features, vec![1.0, 0.0, 0.2, 0.0]);
    }

    #[test]
    fn mismatched_dimensions_still_extract() {
        let pixels = [128_u8; 3 * 2 * 4];
        let features = grayscale_from_rgba(&pixels, 3, 2, 4096).unwrap();
        assert_eq!(features.len(), 6);
    }

    #[test]
    fn short_raster_is_rejected() {
        let pixels = [0_u8; 7];
        assert!(grayscale_from_rgba(&pixels, 2, 1, 2).is_err());
    }

    #[test]
    fn oversized_raster_is_rejected() {
        let err = grayscale_from_rgba(&[0_u8; 4], u32::MAX, u32::MAX, 4).unwrap_err();
        assert!(matches!(err, RuneError::Config(_)));
    }

    #[test]
    fn parses_both_json_layouts() {
        assert_eq!(
            from_json_str(r#"{ "data": [0.0, 0.5, 1.0] }"#).unwrap(),
            vec![0.0, 0.5, 1.0]
        );
        assert_eq!(from_json_str("[0.25, 0.75]").unwrap(), vec![0.25, 0.75]);
        assert!(matches!(
            from_json_str(r#"{ "pixels": [] }"#),
            Err(RuneError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load("/nonexistent/rune.png", 4096).unwrap_err();
        assert!(matches!(err, RuneError::FileNotFound(_)));
    }
}
