//! Seed the catalog from a YAML file.
//!
//! The file is a list of products:
//!
//! ```yaml
//! - title: Skullpanda Ink Plum
//!   description: Blind box figure
//!   price: 149.90
//!   category: figure
//!   images:
//!     - https://cdn.example.com/plum-front.png
//! ```
//!
//! Every entry is checked before the first write, so a typo on line 300
//! never leaves half a catalog behind.

use curio_backend::BackendClient;
use curio_core::{Category, Email, Price, ProductDraft};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::{error, info};

use super::CliError;

/// Price as written in YAML: `149.90` and `"149.90"` both work.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceInput {
    Text(String),
    Number(serde_yaml::Number),
}

impl PriceInput {
    fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(number) => number.to_string(),
        }
    }
}

/// One product entry in a seed file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedProduct {
    title: String,
    #[serde(default)]
    description: String,
    price: PriceInput,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    images: Vec<String>,
}

impl SeedProduct {
    fn into_draft(self) -> Result<ProductDraft, String> {
        let price: Price = self
            .price
            .text()
            .parse()
            .map_err(|e| format!("price: {e}"))?;
        let category = match self.category.as_deref() {
            Some(raw) => raw.parse::<Category>().map_err(|e| e.to_string())?,
            None => Category::default(),
        };
        if let Some(bad) = self
            .images
            .iter()
            .find(|image| !matches!(url::Url::parse(image), Ok(u) if matches!(u.scheme(), "http" | "https")))
        {
            return Err(format!("image is not an http(s) URL: {bad}"));
        }

        let draft = ProductDraft {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            price,
            images: self.images,
            category,
        };
        draft.validate().map_err(|e| e.to_string())?;
        Ok(draft)
    }
}

/// Parse a seed file and validate every entry.
///
/// # Errors
///
/// Returns [`CliError::Yaml`] if the file does not parse, or
/// [`CliError::InvalidEntries`] listing every bad entry.
pub fn parse_and_validate(content: &str) -> Result<Vec<ProductDraft>, CliError> {
    let entries: Vec<SeedProduct> = serde_yaml::from_str(content)?;

    let mut drafts = Vec::with_capacity(entries.len());
    let mut errors = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let label = format!("entry {} ({})", index + 1, entry.title.trim());
        match entry.into_draft() {
            Ok(draft) => drafts.push(draft),
            Err(message) => errors.push(format!("{label}: {message}")),
        }
    }

    if errors.is_empty() {
        Ok(drafts)
    } else {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        Err(CliError::InvalidEntries(errors))
    }
}

/// Sign in as an admin and create every draft, in file order.
///
/// Stops at the first failed write; products created before it stay.
///
/// # Errors
///
/// Returns an error if sign-in or any insert fails.
pub async fn seed(
    client: &BackendClient,
    email: &str,
    password: &SecretString,
    drafts: &[ProductDraft],
) -> Result<usize, CliError> {
    let email = Email::parse(email)?;
    let session = client.sign_in_with_password(&email, password).await?;
    info!(admin = %email, "Signed in");

    let mut created = 0;
    let mut failure = None;
    for draft in drafts {
        match client.create_product(&session.access_token, draft).await {
            Ok(product) => {
                created += 1;
                info!(product_id = %product.id, title = %product.title, "Created product");
            }
            Err(e) => {
                error!(title = %draft.title, created, "Failed to create product");
                failure = Some(e);
                break;
            }
        }
    }

    if let Err(e) = client.sign_out(&session.access_token).await {
        tracing::warn!(error = %e, "Error signing out");
    }

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(created),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use curio_backend::BackendConfig;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const SEED: &str = r#"
- title: "  Skullpanda Ink Plum "
  description: Blind box figure
  price: 149.90
  category: figure
  images:
    - https://cdn.test/plum.png
- title: Kaws Companion Print
  price: "900"
  category: art
"#;

    #[test]
    fn test_parse_accepts_numbers_and_strings() {
        let drafts = parse_and_validate(SEED).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].title, "Skullpanda Ink Plum");
        assert_eq!(drafts[0].price, "149.9".parse().unwrap());
        assert_eq!(drafts[1].category, Category::Art);
        assert!(drafts[1].images.is_empty());
    }

    #[test]
    fn test_every_bad_entry_is_reported() {
        let bad = r"
- title: ''
  price: 10
- title: Negative
  price: -1
- title: Odd category
  price: 5
  category: plush
- title: Local file
  price: 5
  images: [/tmp/a.png]
";
        let Err(CliError::InvalidEntries(errors)) = parse_and_validate(bad) else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.len(), 4);
        assert!(errors[0].starts_with("entry 1"));
        assert!(errors[3].contains("/tmp/a.png"));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let typo = "- title: A\n  prise: 5\n";
        assert!(matches!(parse_and_validate(typo), Err(CliError::Yaml(_))));
    }

    #[tokio::test]
    async fn test_seed_signs_in_and_creates_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "seed-access",
                "refresh_token": "seed-refresh",
                "expires_in": 3600,
                "user": {"id": "user-1", "email": "owner@curio.test"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/products"))
            .and(body_partial_json(serde_json::json!({"category": "figure"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([{
                "id": 1, "title": "Skullpanda Ink Plum", "price": "149.90",
                "category": "figure", "created_at": "2025-01-01T00:00:00Z"
            }])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/products"))
            .and(body_partial_json(serde_json::json!({"category": "art"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([{
                "id": 2, "title": "Kaws Companion Print", "price": "900",
                "category": "art", "created_at": "2025-01-01T00:00:00Z"
            }])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let config = BackendConfig::new(&server.uri(), SecretString::from("anon")).unwrap();
        let client = BackendClient::new(&config).unwrap();
        let drafts = parse_and_validate(SEED).unwrap();
        let created = seed(
            &client,
            "owner@curio.test",
            &SecretString::from("hunter22"),
            &drafts,
        )
        .await
        .unwrap();
        assert_eq!(created, 2);
    }

    #[tokio::test]
    async fn test_seed_stops_at_first_failed_insert() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "seed-access",
                "refresh_token": "seed-refresh",
                "expires_in": 3600,
                "user": {"id": "user-1", "email": "owner@curio.test"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "message": "new row violates row-level security policy"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let config = BackendConfig::new(&server.uri(), SecretString::from("anon")).unwrap();
        let client = BackendClient::new(&config).unwrap();
        let drafts = parse_and_validate(SEED).unwrap();
        let result = seed(
            &client,
            "owner@curio.test",
            &SecretString::from("hunter22"),
            &drafts,
        )
        .await;
        assert!(matches!(result, Err(CliError::Backend(_))));
    }
}
