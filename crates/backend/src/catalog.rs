//! Product table access.
//!
//! Reads are anonymous; writes are sent with the signed-in admin's token so
//! the backend's row-level policies decide whether they are allowed.

use curio_core::{CategoryFilter, Product, ProductDraft, ProductId};
use tracing::instrument;
use url::Url;

use crate::auth::BearerToken;
use crate::client::BackendClient;
use crate::error::BackendError;

const PRODUCTS_PATH: &str = "rest/v1/products";

impl BackendClient {
    fn products_url(&self) -> Result<Url, BackendError> {
        self.endpoint(PRODUCTS_PATH)
    }

    fn product_row_url(&self, id: ProductId) -> Result<Url, BackendError> {
        let mut url = self.products_url()?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }

    /// List products, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or rows cannot be decoded.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        category: CategoryFilter,
    ) -> Result<Vec<Product>, BackendError> {
        let mut url = self.products_url()?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("select", "*")
                .append_pair("order", "created_at.desc");
            if let CategoryFilter::Only(category) = category {
                query.append_pair("category", &format!("eq.{category}"));
            }
        }

        let response = self.authorize(self.http().get(url), None).send().await?;
        let products: Vec<Product> = Self::json(response, "list products").await?;
        tracing::debug!(count = products.len(), "fetched products");
        Ok(products)
    }

    /// Fetch a single product.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no row has this id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, BackendError> {
        let mut url = self.product_row_url(id)?;
        url.query_pairs_mut().append_pair("select", "*");

        let response = self.authorize(self.http().get(url), None).send().await?;
        let rows: Vec<Product> = Self::json(response, "get product").await?;
        first_row(rows, id)
    }

    /// Insert a product and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unauthorized`] if the token may not write.
    #[instrument(skip(self, token, draft), fields(title = %draft.title))]
    pub async fn create_product(
        &self,
        token: &BearerToken,
        draft: &ProductDraft,
    ) -> Result<Product, BackendError> {
        let request = self
            .http()
            .post(self.products_url()?)
            .header("Prefer", "return=representation")
            .json(draft);

        let response = self.authorize(request, Some(token)).send().await?;
        let rows: Vec<Product> = Self::json(response, "create product").await?;
        let product = rows
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Parse("create product: empty response".to_string()))?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Replace a product's writable fields and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no row has this id.
    #[instrument(skip(self, token, draft), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &BearerToken,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, BackendError> {
        let request = self
            .http()
            .patch(self.product_row_url(id)?)
            .header("Prefer", "return=representation")
            .json(draft);

        let response = self.authorize(request, Some(token)).send().await?;
        let rows: Vec<Product> = Self::json(response, "update product").await?;
        let product = first_row(rows, id)?;
        tracing::info!(product_id = %id, "product updated");
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no row has this id.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(
        &self,
        token: &BearerToken,
        id: ProductId,
    ) -> Result<(), BackendError> {
        let request = self
            .http()
            .delete(self.product_row_url(id)?)
            .header("Prefer", "return=representation");

        let response = self.authorize(request, Some(token)).send().await?;
        let rows: Vec<serde_json::Value> = Self::json(response, "delete product").await?;
        if rows.is_empty() {
            return Err(BackendError::NotFound(format!("product {id}")));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}

fn first_row(rows: Vec<Product>, id: ProductId) -> Result<Product, BackendError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| BackendError::NotFound(format!("product {id}")))
}
