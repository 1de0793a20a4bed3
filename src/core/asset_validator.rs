// src/core/asset_validator.rs
use std::fmt;

const MAX_SIZE: usize = 10 * 1024 * 1024;

const PNG_SIGNATURE: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

#[derive(Debug, Clone)]
pub struct AssetValidationError {
    pub file_name: String,
    pub error_type: AssetErrorType,
    pub message: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetErrorType {
    EmptyFile,
    TooLarge,
    CorruptedFile,
    WrongFormat,
}

impl AssetErrorType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyFile => "IMAGE_EMPTY",
            Self::TooLarge => "IMAGE_TOO_LARGE",
            Self::CorruptedFile => "IMAGE_CORRUPTED",
            Self::WrongFormat => "IMAGE_WRONG_FORMAT",
        }
    }
}

impl fmt::Display for AssetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.file_name)
    }
}

impl std::error::Error for AssetValidationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    fn from_extension(file_name: &str) -> Option<Self> {
        let ext = std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())?
            .to_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PNG_SIGNATURE) {
            Some(Self::Png)
        } else if bytes.starts_with(JPEG_SIGNATURE) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Gif => "GIF",
            Self::Webp => "WEBP",
        }
    }
}

pub struct AssetValidator;

impl AssetValidator {
    /// Check an image before it is uploaded to the mirror
    pub fn validate_image(file_name: &str, bytes: &[u8]) -> Result<ImageFormat, AssetValidationError> {
        let fail = |error_type: AssetErrorType, message: String, suggestion: &str| AssetValidationError {
            file_name: file_name.to_string(),
            error_type,
            message,
            suggestion: suggestion.to_string(),
        };

        if bytes.is_empty() {
            return Err(fail(
                AssetErrorType::EmptyFile,
                "Image file is empty".to_string(),
                "Please upload a valid image file",
            ));
        }

        if bytes.len() > MAX_SIZE {
            return Err(fail(
                AssetErrorType::TooLarge,
                format!(
                    "Image file too large: {:.1}MB (max 10MB)",
                    bytes.len() as f64 / 1024.0 / 1024.0
                ),
                "Please resize or compress your image and try again",
            ));
        }

        let declared = ImageFormat::from_extension(file_name).ok_or_else(|| {
            fail(
                AssetErrorType::WrongFormat,
                "Unsupported image format".to_string(),
                "Please use PNG, JPEG, GIF or WEBP",
            )
        })?;

        match ImageFormat::sniff(bytes) {
            Some(actual) if actual == declared => Ok(actual),
            Some(actual) => Err(fail(
                AssetErrorType::WrongFormat,
                format!(
                    "File is {} but has a {} extension",
                    actual.label(),
                    declared.label()
                ),
                "Please rename the file or convert it to the declared format",
            )),
            None => Err(fail(
                AssetErrorType::CorruptedFile,
                format!("Invalid {} file - corrupted or wrong format", declared.label()),
                "Please upload a valid image file",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0; 16]);
        bytes
    }

    #[test]
    fn test_valid_png() {
        assert_eq!(
            AssetValidator::validate_image("avatar.PNG", &png()).unwrap(),
            ImageFormat::Png
        );
    }

    #[test]
    fn test_png_named_jpeg_is_rejected() {
        let err = AssetValidator::validate_image("avatar.jpg", &png()).unwrap_err();
        assert_eq!(err.error_type, AssetErrorType::WrongFormat);
        assert!(err.message.contains("PNG"));
    }

    #[test]
    fn test_empty_and_garbage() {
        assert_eq!(
            AssetValidator::validate_image("a.png", &[]).unwrap_err().error_type,
            AssetErrorType::EmptyFile
        );
        assert_eq!(
            AssetValidator::validate_image("a.png", b"hello world!").unwrap_err().error_type,
            AssetErrorType::CorruptedFile
        );
        assert_eq!(
            AssetValidator::validate_image("a.bmp", &png()).unwrap_err().error_type,
            AssetErrorType::WrongFormat
        );
    }

    #[test]
    fn test_too_large() {
        let mut bytes = png();
        bytes.resize(MAX_SIZE + 1, 0);
        assert_eq!(
            AssetValidator::validate_image("a.png", &bytes).unwrap_err().error_type,
            AssetErrorType::TooLarge
        );
    }

    #[test]
    fn test_webp_signature() {
        let mut bytes = b"RIFF\0\0\0\0WEBPVP8 ".to_vec();
        bytes.extend_from_slice(&[0; 8]);
        assert_eq!(
            AssetValidator::validate_image("a.webp", &bytes).unwrap(),
            ImageFormat::Webp
        );
    }
}
