//! Shared key generation for storage backends.
//!
//! Key format for re-hosted images: `cached/external/{uuid}.{ext}`.

use uuid::Uuid;
use waypoint_core::constants::CACHED_EXTERNAL_PREFIX;

use crate::{StorageError, StorageResult};

/// File extension for an image content type. Unknown types map to `jpg`.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();
    let subtype = mime.strip_prefix("image/").unwrap_or("");

    match subtype {
        "jpeg" | "jpg" | "pjpeg" => "jpg",
        "png" => "png",
        "webp" => "webp",
        "gif" => "gif",
        "avif" => "avif",
        _ => "jpg",
    }
}

/// Content type for a stored key, derived from its extension.
pub fn content_type_for_key(storage_key: &str) -> &'static str {
    let ext = storage_key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "avif" => "image/avif",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Generate a fresh key for a re-hosted external image.
pub fn generate_cached_external_key(content_type: &str) -> String {
    format!(
        "{}{}.{}",
        CACHED_EXTERNAL_PREFIX,
        Uuid::new_v4(),
        extension_for_content_type(content_type)
    )
}

/// Reject keys that could escape the storage namespace.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty()
        || storage_key.contains("..")
        || storage_key.starts_with('/')
        || storage_key.contains('\\')
    {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_table() {
        assert_eq!(extension_for_content_type("image/jpeg"), "jpg");
        assert_eq!(extension_for_content_type("image/jpg"), "jpg");
        assert_eq!(extension_for_content_type("image/png"), "png");
        assert_eq!(extension_for_content_type("image/webp"), "webp");
        assert_eq!(extension_for_content_type("image/gif"), "gif");
        assert_eq!(extension_for_content_type("image/avif"), "avif");
        assert_eq!(extension_for_content_type("IMAGE/PNG; charset=binary"), "png");
    }

    #[test]
    fn test_unknown_types_fall_back_to_jpg() {
        assert_eq!(extension_for_content_type("image/svg+xml"), "jpg");
        assert_eq!(extension_for_content_type("image/tiff"), "jpg");
        assert_eq!(extension_for_content_type(""), "jpg");
    }

    #[test]
    fn test_generated_keys_are_unique_and_prefixed() {
        let a = generate_cached_external_key("image/png");
        let b = generate_cached_external_key("image/png");
        assert_ne!(a, b);
        assert!(a.starts_with("cached/external/"));
        assert!(a.ends_with(".png"));
    }

    #[test]
    fn test_content_type_for_key() {
        assert_eq!(content_type_for_key("cached/external/a.webp"), "image/webp");
        assert_eq!(content_type_for_key("cached/external/a.jpg"), "image/jpeg");
        assert_eq!(content_type_for_key("noext"), "application/octet-stream");
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("cached/external/x.jpg").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("").is_err());
    }
}
