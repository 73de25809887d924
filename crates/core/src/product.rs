//! Catalog products.
//!
//! [`Product`] mirrors one row of the backend `products` table. Rows written
//! before multi-image support only carry `image_url`; newer rows carry an
//! ordered `images` list and keep `image_url` pointing at the first entry.
//! [`ProductDraft`] holds the writable fields used by create and update.

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{Category, Price, ProductId};

/// Maximum number of images a product may carry.
pub const MAX_PRODUCT_IMAGES: usize = 5;

/// Image shown when a product has no usable picture.
pub const PLACEHOLDER_IMAGE: &str = "/static/img/placeholder.svg";

/// A product as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Category,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Ordered image list used by carousels.
    ///
    /// Falls back to the legacy single `image_url` when the list is empty.
    #[must_use]
    pub fn gallery(&self) -> Vec<&str> {
        if self.images.is_empty() {
            self.image_url.as_deref().into_iter().collect()
        } else {
            self.images.iter().map(String::as_str).collect()
        }
    }

    /// First gallery image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images
            .first()
            .map(String::as_str)
            .or(self.image_url.as_deref())
    }

    /// Image URL safe to put in an `<img>` tag.
    #[must_use]
    pub fn thumbnail(&self) -> &str {
        display_image(self.primary_image())
    }

    /// Case-insensitive substring match over title and description.
    ///
    /// An empty (or all-whitespace) term matches every product.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        needle.is_empty()
            || self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// Whether `url` looks like something a browser can render as an image.
///
/// Accepts common raster extensions plus a couple of known image hosts whose
/// URLs carry no extension.
#[must_use]
pub fn is_displayable_image(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    if lower.is_empty() {
        return false;
    }
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    let has_extension = [".jpeg", ".jpg", ".gif", ".png", ".webp"]
        .iter()
        .any(|ext| path.ends_with(ext));
    has_extension || lower.contains("unsplash.com") || lower.contains("placeholder")
}

/// Pick `url` when displayable, otherwise the placeholder.
#[must_use]
pub fn display_image(url: Option<&str>) -> &str {
    match url {
        Some(url) if is_displayable_image(url) => url,
        _ => PLACEHOLDER_IMAGE,
    }
}

/// Problems with a [`ProductDraft`] that block saving it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("title is required")]
    MissingTitle,
    #[error("a product can have at most {max} images")]
    TooManyImages { max: usize },
}

/// Writable product fields for create and update.
///
/// Serializes with an extra `image_url` column holding the first image (or
/// null) so rows stay readable by clients that only know the single-image
/// field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Category,
}

impl ProductDraft {
    /// Check the draft before it is sent to the backend.
    ///
    /// # Errors
    ///
    /// Returns the first [`DraftError`] found.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::MissingTitle);
        }
        if self.images.len() > MAX_PRODUCT_IMAGES {
            return Err(DraftError::TooManyImages {
                max: MAX_PRODUCT_IMAGES,
            });
        }
        Ok(())
    }

    /// Value written to the legacy `image_url` column.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

impl From<&Product> for ProductDraft {
    fn from(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price,
            images: product.gallery().into_iter().map(str::to_owned).collect(),
            category: product.category,
        }
    }
}

impl Serialize for ProductDraft {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_struct("ProductDraft", 6)?;
        row.serialize_field("title", self.title.trim())?;
        row.serialize_field("description", &self.description)?;
        row.serialize_field("price", &self.price)?;
        row.serialize_field("image_url", &self.image_url())?;
        row.serialize_field("images", &self.images)?;
        row.serialize_field("category", &self.category)?;
        row.end()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(json: serde_json::Value) -> Product {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_decodes_backend_row_with_nulls() {
        let product = row(serde_json::json!({
            "id": 3,
            "title": "Companion",
            "description": null,
            "price": 1200,
            "image_url": "https://cdn.test/a.png",
            "images": null,
            "category": "figure",
            "created_at": "2025-01-02T03:04:05+00:00"
        }));
        assert_eq!(product.description, "");
        assert!(product.images.is_empty());
        assert_eq!(product.gallery(), vec!["https://cdn.test/a.png"]);
        assert_eq!(product.price.to_string(), "1200.00");
    }

    #[test]
    fn test_gallery_prefers_image_list() {
        let product = row(serde_json::json!({
            "id": 1,
            "title": "BFF",
            "price": 10,
            "image_url": "https://cdn.test/old.png",
            "images": ["https://cdn.test/1.png", "https://cdn.test/2.png"],
            "category": "art",
            "created_at": "2025-01-01T00:00:00Z"
        }));
        assert_eq!(product.gallery().len(), 2);
        assert_eq!(product.primary_image(), Some("https://cdn.test/1.png"));
    }

    #[test]
    fn test_matches_search_is_case_insensitive() {
        let product = row(serde_json::json!({
            "id": 1,
            "title": "Holiday Companion",
            "description": "Vinyl figure, Brown edition",
            "price": 10,
            "category": "figure",
            "created_at": "2025-01-01T00:00:00Z"
        }));
        assert!(product.matches_search("holiday"));
        assert!(product.matches_search("BROWN"));
        assert!(product.matches_search("  "));
        assert!(!product.matches_search("chum"));
    }

    #[test]
    fn test_displayable_images() {
        assert!(is_displayable_image("https://x.test/object/a.JPG"));
        assert!(is_displayable_image("https://x.test/a.webp?width=200"));
        assert!(is_displayable_image("https://images.unsplash.com/photo-1"));
        assert!(!is_displayable_image("https://x.test/document.pdf"));
        assert!(!is_displayable_image(""));
        assert_eq!(display_image(Some("not an image")), PLACEHOLDER_IMAGE);
        assert_eq!(display_image(None), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_draft_serializes_first_image_as_image_url() {
        let draft = ProductDraft {
            title: " Chum ".to_string(),
            description: "Glow in the dark".to_string(),
            price: Price::from(450),
            images: vec!["https://cdn.test/1.png".into(), "https://cdn.test/2.png".into()],
            category: Category::Figure,
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["title"], "Chum");
        assert_eq!(json["image_url"], "https://cdn.test/1.png");
        assert_eq!(json["images"].as_array().unwrap().len(), 2);
        assert_eq!(json["category"], "figure");

        let empty = ProductDraft::default();
        assert!(serde_json::to_value(&empty).unwrap()["image_url"].is_null());
    }

    #[test]
    fn test_draft_validation() {
        let mut draft = ProductDraft {
            title: "Ok".to_string(),
            ..ProductDraft::default()
        };
        assert!(draft.validate().is_ok());

        draft.images = vec!["https://cdn.test/x.png".to_string(); MAX_PRODUCT_IMAGES + 1];
        assert_eq!(
            draft.validate(),
            Err(DraftError::TooManyImages {
                max: MAX_PRODUCT_IMAGES
            })
        );

        draft.title = "   ".to_string();
        assert_eq!(draft.validate(), Err(DraftError::MissingTitle));
    }
}
