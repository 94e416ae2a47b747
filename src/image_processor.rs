use std::io::{Cursor, ErrorKind};
use std::path::Path;

use bytes::Bytes;
use image::{ImageFormat, ImageReader};

use crate::error::{AnalysisError, Result};

/// Validated image payload, ready to submit.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub file_name: String,
}

impl ProcessedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

pub fn process_image_from_path(path: impl AsRef<Path>) -> Result<ProcessedImage> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            AnalysisError::ImageNotFound(path.to_path_buf())
        } else {
            AnalysisError::ImageRead {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    process_image_from_bytes(bytes, &file_name)
}

pub fn process_image_from_bytes(
    bytes: impl Into<Bytes>,
    file_name: &str,
) -> Result<ProcessedImage> {
    let bytes = bytes.into();
    if bytes.is_empty() {
        return Err(AnalysisError::InvalidImage(format!("{file_name} is empty")));
    }

    let reader = ImageReader::new(Cursor::new(&bytes[..]))
        .with_guessed_format()
        .map_err(|err| AnalysisError::InvalidImage(format!("{file_name}: {err}")))?;
    let format = match reader.format() {
        Some(format @ (ImageFormat::Jpeg | ImageFormat::Png)) => format,
        Some(other) => {
            return Err(AnalysisError::InvalidImage(format!(
                "{file_name}: unsupported format {other:?}; expected JPEG or PNG"
            )));
        }
        None => {
            return Err(AnalysisError::InvalidImage(format!(
                "{file_name}: not a recognizable image"
            )));
        }
    };
    let (width, height) = reader
        .into_dimensions()
        .map_err(|err| AnalysisError::InvalidImage(format!("{file_name}: {err}")))?;
    if width == 0 || height == 0 {
        return Err(AnalysisError::InvalidImage(format!(
            "{file_name}: image has zero area ({width}x{height})"
        )));
    }

    log::debug!("loaded {file_name}: {format:?} {width}x{height}, {} bytes", bytes.len());

    Ok(ProcessedImage {
        bytes,
        width,
        height,
        format,
        file_name: file_name.to_string(),
    })
}
