//! Product create, edit, and delete handlers.
//!
//! Forms are posted as `multipart/form-data` so images can ride along with
//! the text fields. Every write is followed by a redirect to the dashboard,
//! which re-reads the table.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use curio_backend::{BackendError, ImageUpload};
use curio_core::{Category, Flash, Price, PriceError, Product, ProductDraft, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::AppError,
    filters,
    middleware::{Flashes, RequireAdminAuth, clear_current_admin},
    models::{CurrentAdmin, push_flash},
    routes::dashboard::AdminUserView,
    state::AppState,
};

/// Request body limit for product forms (five phone photos fit).
pub const MAX_FORM_BYTES: usize = 25 * 1024 * 1024;

const DASHBOARD_PATH: &str = "/admin/dashboard";
const UPLOAD_FAILED: &str = "Error uploading image";

// =============================================================================
// Form
// =============================================================================

/// Product form as submitted.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub title: String,
    pub description: String,
    pub price: String,
    pub category: String,
    /// Stored image URLs the admin chose to keep (edit only).
    pub existing_images: Vec<String>,
    /// New files, in the order they were chosen.
    pub uploads: Vec<ImageUpload>,
}

/// Text fields that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFields {
    pub title: String,
    pub description: String,
    pub price: Price,
    pub category: Category,
}

impl ProductForm {
    /// Read a multipart body.
    ///
    /// File inputs left empty still send a nameless, empty part; those are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BadRequest`] if the body is not valid multipart.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "title" => form.title = field.text().await.map_err(bad_multipart)?,
                "description" => form.description = field.text().await.map_err(bad_multipart)?,
                "price" => form.price = field.text().await.map_err(bad_multipart)?,
                "category" => form.category = field.text().await.map_err(bad_multipart)?,
                "existing_images" => {
                    let url = field.text().await.map_err(bad_multipart)?;
                    if !url.trim().is_empty() {
                        form.existing_images.push(url.trim().to_string());
                    }
                }
                "images" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await.map_err(bad_multipart)?;
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.uploads.push(ImageUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                other => tracing::debug!(field = other, "ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    /// Only keep images the product actually has, in the submitted order.
    #[must_use]
    pub fn kept_images(&self, current_gallery: &[String]) -> Vec<String> {
        let mut kept: Vec<String> = Vec::new();
        for url in &self.existing_images {
            if current_gallery.contains(url) && !kept.contains(url) {
                kept.push(url.clone());
            }
        }
        kept
    }

    /// Check every field before anything is uploaded or written.
    ///
    /// # Errors
    ///
    /// Returns one message per problem found.
    pub fn validate(&self, kept_images: usize, max_images: usize) -> Result<ValidFields, Vec<String>> {
        let mut errors = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push("Title is required".to_string());
        }

        let price = self.price.parse::<Price>();
        match &price {
            Err(PriceError::TooLarge) => {
                errors.push(format!("Price cannot be more than {}", Price::MAX));
            }
            Err(_) => errors.push("Price must be a number of zero or more".to_string()),
            Ok(_) => {}
        }

        let category = self.category.parse::<Category>();
        if category.is_err() {
            errors.push("Choose a category".to_string());
        }

        if kept_images + self.uploads.len() > max_images {
            errors.push(format!("A product can have at most {max_images} images"));
        }
        for upload in &self.uploads {
            if let Err(BackendError::InvalidUpload(reason)) = upload.validate() {
                errors.push(format!("Only image files can be uploaded: {reason}"));
            }
        }

        match (price, category) {
            (Ok(price), Ok(category)) if errors.is_empty() => Ok(ValidFields {
                title: title.to_string(),
                description: self.description.trim().to_string(),
                price,
                category,
            }),
            _ => Err(errors),
        }
    }
}

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::BadRequest(e.body_text())
}

// =============================================================================
// Views
// =============================================================================

/// Whether the form creates a product or edits one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(ProductId),
}

impl FormMode {
    fn heading(self) -> &'static str {
        match self {
            Self::Create => "Add New Product",
            Self::Edit(_) => "Edit Product",
        }
    }

    fn submit_label(self) -> &'static str {
        match self {
            Self::Create => "Add Product",
            Self::Edit(_) => "Update Product",
        }
    }

    fn action(self) -> String {
        match self {
            Self::Create => "/admin/products".to_string(),
            Self::Edit(id) => format!("/admin/products/{id}"),
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            Self::Create => "Product created successfully",
            Self::Edit(_) => "Product updated successfully",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            Self::Create => "Error creating product",
            Self::Edit(_) => "Error updating product",
        }
    }
}

/// Category `<option>` for templates.
#[derive(Debug, Clone)]
pub struct CategoryOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn category_options(selected: &str) -> Vec<CategoryOptionView> {
    Category::ALL
        .iter()
        .map(|category| CategoryOptionView {
            value: category.as_str(),
            label: category.label(),
            selected: category.as_str() == selected,
        })
        .collect()
}

/// Product form page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub admin_user: Option<AdminUserView>,
    pub current_path: String,
    pub flashes: Vec<Flash>,
    pub heading: &'static str,
    pub submit_label: &'static str,
    pub action: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub categories: Vec<CategoryOptionView>,
    /// Stored images shown with a "keep" checkbox.
    pub images: Vec<String>,
    pub max_images: usize,
    pub errors: Vec<String>,
}

impl ProductFormTemplate {
    fn new(admin: &CurrentAdmin, mode: FormMode, max_images: usize) -> Self {
        Self {
            admin_user: Some(AdminUserView::from(admin)),
            current_path: mode.action(),
            flashes: Vec::new(),
            heading: mode.heading(),
            submit_label: mode.submit_label(),
            action: mode.action(),
            title: String::new(),
            description: String::new(),
            price: String::new(),
            categories: category_options(Category::default().as_str()),
            images: Vec::new(),
            max_images,
            errors: Vec::new(),
        }
    }

    fn with_product(mut self, product: &Product) -> Self {
        self.title.clone_from(&product.title);
        self.description.clone_from(&product.description);
        self.price = product.price.to_string();
        self.categories = category_options(product.category.as_str());
        self.images = product.gallery().into_iter().map(str::to_owned).collect();
        self
    }

    fn with_form(mut self, form: &ProductForm, kept_images: Vec<String>) -> Self {
        self.title.clone_from(&form.title);
        self.description.clone_from(&form.description);
        self.price.clone_from(&form.price);
        self.categories = category_options(form.category.trim());
        self.images = kept_images;
        self
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// New product form.
///
/// GET /admin/products/new
#[instrument(skip_all)]
pub async fn new_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Flashes(flashes): Flashes,
) -> ProductFormTemplate {
    let mut template = ProductFormTemplate::new(&admin, FormMode::Create, state.config().max_images);
    template.flashes = flashes;
    template
}

/// Create a product.
///
/// POST /admin/products
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = ProductForm::from_multipart(multipart).await?;
    Ok(save(&state, &session, &admin, FormMode::Create, &form, &[]).await)
}

/// Edit product form.
///
/// GET /admin/products/{id}/edit
#[instrument(skip(admin, state, session, flashes), fields(admin_id = %admin.id))]
pub async fn edit_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Flashes(flashes): Flashes,
    Path(id): Path<ProductId>,
) -> Response {
    match state.backend().get_product(id).await {
        Ok(product) => {
            let mut template =
                ProductFormTemplate::new(&admin, FormMode::Edit(id), state.config().max_images)
                    .with_product(&product);
            template.flashes = flashes;
            template.into_response()
        }
        Err(e) => {
            if matches!(e, BackendError::NotFound(_)) {
                tracing::warn!(error = %e, "Edit requested for missing product");
            } else {
                tracing::error!(error = %e, "Failed to fetch product");
            }
            push_flash(&session, Flash::error("Error fetching products")).await;
            Redirect::to(DASHBOARD_PATH).into_response()
        }
    }
}

/// Update a product.
///
/// POST /admin/products/{id}
#[instrument(skip(admin, state, session, multipart), fields(admin_id = %admin.id))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = ProductForm::from_multipart(multipart).await?;

    let current = match state.backend().get_product(id).await {
        Ok(product) => product,
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch product before update");
            push_flash(&session, Flash::error(FormMode::Edit(id).failure_message())).await;
            return Ok(Redirect::to(DASHBOARD_PATH).into_response());
        }
    };
    let gallery: Vec<String> = current.gallery().into_iter().map(str::to_owned).collect();

    Ok(save(&state, &session, &admin, FormMode::Edit(id), &form, &gallery).await)
}

/// Delete a product.
///
/// HTMX requests (sent after `hx-confirm`) get an `HX-Redirect`; plain form
/// posts get a normal redirect.
///
/// POST /admin/products/{id}/delete
#[instrument(skip(admin, state, session, headers), fields(admin_id = %admin.id))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
) -> Response {
    match state.backend().delete_product(admin.access_token(), id).await {
        Ok(()) => {
            push_flash(&session, Flash::success("Product deleted successfully")).await;
        }
        Err(e) if e.is_auth() => return token_rejected(&session, &e).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete product");
            push_flash(&session, Flash::error("Error deleting product")).await;
        }
    }

    let is_htmx = headers
        .get("hx-request")
        .is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"true"));
    if is_htmx {
        (AppendHeaders([("HX-Redirect", DASHBOARD_PATH)]), StatusCode::NO_CONTENT).into_response()
    } else {
        Redirect::to(DASHBOARD_PATH).into_response()
    }
}

/// Validate, upload new images, then write the row.
async fn save(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    mode: FormMode,
    form: &ProductForm,
    current_gallery: &[String],
) -> Response {
    let max_images = state.config().max_images;
    let kept = form.kept_images(current_gallery);

    let rerender = |status: StatusCode, errors: Vec<String>, flash: Option<Flash>| {
        let mut template =
            ProductFormTemplate::new(admin, mode, max_images).with_form(form, kept.clone());
        template.errors = errors;
        template.flashes.extend(flash);
        (status, template).into_response()
    };

    let fields = match form.validate(kept.len(), max_images) {
        Ok(fields) => fields,
        Err(errors) => {
            tracing::debug!(count = errors.len(), "product form rejected");
            return rerender(StatusCode::UNPROCESSABLE_ENTITY, errors, None);
        }
    };

    let mut images = kept.clone();
    for upload in &form.uploads {
        match state
            .backend()
            .upload_image(admin.access_token(), &state.config().storage_bucket, upload.clone())
            .await
        {
            Ok(url) => images.push(url),
            Err(e) if e.is_auth() => return token_rejected(session, &e).await,
            Err(e) => {
                tracing::error!(error = %e, file_name = %upload.file_name, "Failed to upload image");
                return rerender(
                    StatusCode::BAD_GATEWAY,
                    Vec::new(),
                    Some(Flash::error(UPLOAD_FAILED)),
                );
            }
        }
    }

    let draft = ProductDraft {
        title: fields.title,
        description: fields.description,
        price: fields.price,
        images,
        category: fields.category,
    };
    if let Err(e) = draft.validate() {
        return rerender(StatusCode::UNPROCESSABLE_ENTITY, vec![e.to_string()], None);
    }

    let token = admin.access_token();
    let result = match mode {
        FormMode::Create => state.backend().create_product(token, &draft).await,
        FormMode::Edit(id) => state.backend().update_product(token, id, &draft).await,
    };

    match result {
        Ok(product) => {
            tracing::info!(product_id = %product.id, images = draft.images.len(), "product saved");
            push_flash(session, Flash::success(mode.success_message())).await;
            Redirect::to(DASHBOARD_PATH).into_response()
        }
        Err(e) if e.is_auth() => token_rejected(session, &e).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to save product");
            rerender(
                StatusCode::BAD_GATEWAY,
                Vec::new(),
                Some(Flash::error(mode.failure_message())),
            )
        }
    }
}

/// The backend refused the admin's token: sign out locally.
async fn token_rejected(session: &Session, error: &BackendError) -> Response {
    tracing::warn!(error = %error, "Backend rejected admin token");
    if let Err(e) = clear_current_admin(session).await {
        tracing::error!(error = %e, "Failed to clear admin session");
    }
    push_flash(
        session,
        Flash::error("Your session has expired").with_detail("Please sign in again."),
    )
    .await;
    Redirect::to("/admin/login").into_response()
}
