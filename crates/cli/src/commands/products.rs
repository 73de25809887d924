//! `curio products list`.

use std::io::Write;

use curio_backend::BackendClient;
use curio_core::{CategoryFilter, Product};

use super::CliError;

/// One table line for `product`.
fn format_row(product: &Product, unit: &str) -> String {
    format!(
        "{:>5}  {:<40}  {:>14}  {}",
        product.id.as_i64(),
        product.title,
        product.price.label(unit),
        product.category
    )
}

/// Write the catalog to `out`, newest first.
///
/// # Errors
///
/// Returns an error if the backend request or the write fails.
pub async fn list(
    client: &BackendClient,
    filter: CategoryFilter,
    unit: &str,
    out: &mut impl Write,
) -> Result<usize, CliError> {
    let products = client.list_products(filter).await?;
    tracing::info!(count = products.len(), category = filter.as_param(), "Fetched products");

    writeln!(out, "{:>5}  {:<40}  {:>14}  CATEGORY", "ID", "TITLE", "PRICE")?;
    for product in &products {
        writeln!(out, "{}", format_row(product, unit))?;
    }
    Ok(products.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use curio_backend::BackendConfig;
    use secrecy::SecretString;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_list_writes_one_line_per_product() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .and(query_param("category", "eq.art"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": 12,
                    "title": "Kaws Companion Print",
                    "description": null,
                    "price": "900.00",
                    "images": null,
                    "category": "art",
                    "created_at": "2025-02-01T00:00:00Z"
                }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let config = BackendConfig::new(&server.uri(), SecretString::from("anon")).unwrap();
        let client = BackendClient::new(&config).unwrap();
        let mut out = Vec::new();
        let count = list(
            &client,
            CategoryFilter::Only(curio_core::Category::Art),
            "MAD",
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(count, 1);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let row = lines.last().unwrap();
        assert!(row.contains("Kaws Companion Print"));
        assert!(row.contains("900.00 MAD"));
        assert!(row.ends_with("art"));
    }
}
