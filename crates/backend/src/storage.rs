//! Object storage for product images.
//!
//! Each file is stored under a fresh random name so uploads never collide,
//! and is served from the bucket's public URL.

use tracing::instrument;
use url::Url;

use crate::auth::BearerToken;
use crate::client::BackendClient;
use crate::error::BackendError;

/// Default bucket holding product images.
pub const DEFAULT_BUCKET: &str = "product_images";

/// An image received from the admin form, not yet uploaded.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Name the file had on the admin's machine.
    pub file_name: String,
    /// MIME type reported by the browser.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Reject anything that is not a non-empty `image/*` file.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidUpload`] naming the file.
    pub fn validate(&self) -> Result<(), BackendError> {
        if !self.content_type.starts_with("image/") {
            return Err(BackendError::InvalidUpload(format!(
                "{} is not an image ({})",
                self.file_name, self.content_type
            )));
        }
        if self.bytes.is_empty() {
            return Err(BackendError::InvalidUpload(format!(
                "{} is empty",
                self.file_name
            )));
        }
        Ok(())
    }

    /// File extension for the stored object.
    ///
    /// Taken from the original file name, falling back to the MIME subtype.
    #[must_use]
    pub fn extension(&self) -> String {
        let from_name = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));
        let ext = from_name.unwrap_or_else(|| {
            let subtype = self
                .content_type
                .split_once('/')
                .map_or("bin", |(_, subtype)| subtype);
            subtype.split(['+', ';']).next().unwrap_or("bin")
        });
        match ext.to_ascii_lowercase().as_str() {
            "jpeg" => "jpg".to_string(),
            other => other.to_string(),
        }
    }

    /// Random object name: `<uuid-v4>.<ext>`.
    #[must_use]
    pub fn object_name(&self) -> String {
        format!("{}.{}", uuid::Uuid::new_v4(), self.extension())
    }
}

impl BackendClient {
    /// Public URL of an object.
    ///
    /// # Errors
    ///
    /// Returns error if the resulting URL is invalid.
    pub fn public_url(&self, bucket: &str, object: &str) -> Result<Url, BackendError> {
        self.endpoint(&format!("storage/v1/object/public/{bucket}/{object}"))
    }

    /// Upload one image and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidUpload`] for non-images, or the
    /// backend's error if the upload is refused.
    #[instrument(skip(self, token, upload), fields(file_name = %upload.file_name, size = upload.bytes.len()))]
    pub async fn upload_image(
        &self,
        token: &BearerToken,
        bucket: &str,
        upload: ImageUpload,
    ) -> Result<String, BackendError> {
        upload.validate()?;
        let object = upload.object_name();
        let url = self.endpoint(&format!("storage/v1/object/{bucket}/{object}"))?;

        let request = self
            .http()
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, upload.content_type)
            .header("x-upsert", "false")
            .body(upload.bytes);

        let response = self.authorize(request, Some(token)).send().await?;
        Self::check(response, "upload image").await?;

        let public = self.public_url(bucket, &object)?;
        tracing::info!(object = %object, "image uploaded");
        Ok(public.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(file_name: &str, content_type: &str) -> ImageUpload {
        ImageUpload {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }
    }

    #[test]
    fn test_only_images_are_accepted() {
        assert!(upload("a.png", "image/png").validate().is_ok());
        assert!(matches!(
            upload("a.pdf", "application/pdf").validate(),
            Err(BackendError::InvalidUpload(_))
        ));
        let empty = ImageUpload {
            bytes: Vec::new(),
            ..upload("a.png", "image/png")
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_extension() {
        assert_eq!(upload("Photo.PNG", "image/png").extension(), "png");
        assert_eq!(upload("shot.jpeg", "image/jpeg").extension(), "jpg");
        assert_eq!(upload("noext", "image/webp").extension(), "webp");
        assert_eq!(upload("icon", "image/svg+xml").extension(), "svg");
    }

    #[test]
    fn test_object_names_are_unique() {
        let file = upload("a.png", "image/png");
        let first = file.object_name();
        let second = file.object_name();
        assert!(first.ends_with(".png"));
        assert_eq!(first.len(), 36 + 4);
        assert_ne!(first, second);
    }
}
