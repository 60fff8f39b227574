// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image codec — loading photographs and encoding corrected output, backed by
// the `image` crate.

use image::{ImageFormat, RgbImage};
use rectify_core::error::{RectifyError, Result};
use rectify_core::types::OutputFormat;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Load an image file as 8-bit RGB.
///
/// Any format the `image` crate decodes is accepted (PNG, JPEG, BMP, TIFF
/// among them). Alpha is dropped; grayscale is expanded.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load(path: impl AsRef<Path>) -> Result<RgbImage> {
    let data = std::fs::read(path.as_ref())?;
    let img = decode(&data).map_err(|err| match err {
        RectifyError::Decode(detail) => RectifyError::Decode(format!(
            "{}: {}",
            path.as_ref().display(),
            detail
        )),
        other => other,
    })?;
    info!(width = img.width(), height = img.height(), "Image loaded");
    Ok(img)
}

/// Decode encoded bytes (format sniffed from the content) as 8-bit RGB.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn decode(data: &[u8]) -> Result<RgbImage> {
    let img = image::load_from_memory(data)
        .map_err(|err| RectifyError::Decode(err.to_string()))?
        .into_rgb8();
    debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
    Ok(img)
}

/// Encode a raster into `format`, returning the raw bytes.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn encode(image: &RgbImage, format: OutputFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    match format {
        OutputFormat::Jpeg { quality } => {
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
            image.write_with_encoder(encoder).map_err(|err| {
                RectifyError::Encode(format!("JPEG encoding failed: {}", err))
            })?;
        }
        OutputFormat::Png | OutputFormat::Bmp | OutputFormat::Tiff => {
            let mut cursor = std::io::Cursor::new(&mut buffer);
            image
                .write_to(&mut cursor, image_format(format))
                .map_err(|err| {
                    RectifyError::Encode(format!(
                        "{} encoding failed: {}",
                        format.extension(),
                        err
                    ))
                })?;
        }
    }
    debug!(bytes = buffer.len(), "Image encoded");
    Ok(buffer)
}

/// Write encoded bytes to `path`.
pub fn write(bytes: &[u8], path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path.as_ref(), bytes)?;
    Ok(())
}

/// Encode and write a raster, choosing the format from the file extension.
///
/// Unrecognised or missing extensions are written as PNG data.
#[instrument(skip_all, fields(path = %path.as_ref().display(), jpeg_quality))]
pub fn save(image: &RgbImage, path: impl AsRef<Path>, jpeg_quality: u8) -> Result<OutputFormat> {
    let format = format_for_path(path.as_ref(), jpeg_quality);
    let bytes = encode(image, format)?;
    write(&bytes, path.as_ref())?;
    info!(
        format = format.extension(),
        mime = format.mime_type(),
        bytes = bytes.len(),
        "Image saved"
    );
    Ok(format)
}

/// Output format implied by a path's extension, PNG when unknown.
pub fn format_for_path(path: &Path, jpeg_quality: u8) -> OutputFormat {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    OutputFormat::from_extension(ext, jpeg_quality).unwrap_or_else(|| {
        warn!(extension = ext, "Unknown output extension; writing PNG");
        OutputFormat::Png
    })
}

fn image_format(format: OutputFormat) -> ImageFormat {
    match format {
        OutputFormat::Png => ImageFormat::Png,
        OutputFormat::Jpeg { .. } => ImageFormat::Jpeg,
        OutputFormat::Bmp => ImageFormat::Bmp,
        OutputFormat::Tiff => ImageFormat::Tiff,
    }
}
