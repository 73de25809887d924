//! Checkout handoff route handlers.
//!
//! There is no payment step. The visitor either emails the order to the shop
//! through the contact form or opens a prefilled WhatsApp chat. Neither path
//! clears the cart or records the order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use curio_core::{ContactDetails, Flash, OrderSummary};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::PageContext;
use crate::models::{load_cart, push_flash};
use crate::routes::cart::CartView;
use crate::services::emailjs::OrderEmailParams;
use crate::state::AppState;

/// Shown when the form is submitted successfully.
pub const SENT_MESSAGE: &str = "Message sent successfully!";

/// Shown when the email could not be sent.
pub const FAILED_MESSAGE: &str = "Failed to send message. Please try again.";

const UNAVAILABLE_MESSAGE: &str =
    "Email ordering is temporarily unavailable. Please order through WhatsApp.";

const EMPTY_CART_MESSAGE: &str = "Your cart is empty.";

/// Contact form page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/contact.html")]
pub struct ContactTemplate {
    pub page: PageContext,
    pub form: ContactDetails,
    pub errors: Vec<String>,
    pub cart: CartView,
    pub whatsapp_href: String,
}

impl ContactTemplate {
    fn new(state: &AppState, page: PageContext, cart: &curio_core::Cart, form: ContactDetails) -> Self {
        Self {
            page,
            form,
            errors: Vec::new(),
            cart: CartView::new(cart, state.price_unit()),
            whatsapp_href: state.whatsapp().order_link(cart.total(), state.price_unit()),
        }
    }
}

/// Display the contact form.
#[instrument(skip(state, page, session))]
pub async fn contact_form(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
) -> Response {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        push_flash(&session, Flash::error(EMPTY_CART_MESSAGE)).await;
        return Redirect::to("/cart").into_response();
    }

    ContactTemplate::new(&state, page, &cart, ContactDetails::default()).into_response()
}

/// Submit the email order.
///
/// Invalid input and send failures re-render the form with what the visitor
/// typed so they can retry.
#[instrument(skip(state, page, session, form))]
pub async fn submit_contact(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
    Form(form): Form<ContactDetails>,
) -> Response {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        push_flash(&session, Flash::error(EMPTY_CART_MESSAGE)).await;
        return Redirect::to("/cart").into_response();
    }

    let rerender = |errors: Vec<String>, flash: Option<Flash>, status: StatusCode| {
        let mut template = ContactTemplate::new(&state, page.clone(), &cart, form.clone());
        template.errors = errors;
        template.page.flashes.extend(flash);
        (status, template).into_response()
    };

    let contact = match form.validate() {
        Ok(contact) => contact,
        Err(errors) => {
            tracing::debug!(count = errors.len(), "contact form rejected");
            return rerender(
                errors.iter().map(ToString::to_string).collect(),
                None,
                StatusCode::UNPROCESSABLE_ENTITY,
            );
        }
    };

    let Some(emailjs) = state.emailjs() else {
        tracing::warn!("email order attempted but EmailJS is not configured");
        return rerender(
            Vec::new(),
            Some(Flash::error(UNAVAILABLE_MESSAGE)),
            StatusCode::SERVICE_UNAVAILABLE,
        );
    };

    let summary = OrderSummary::from_cart(&cart);
    let sent = match OrderEmailParams::for_order(&contact, &summary, state.price_unit()) {
        Ok(params) => emailjs.send(&params).await,
        Err(e) => Err(e),
    };

    match sent {
        Ok(()) => {
            add_breadcrumb("checkout", "Order email sent", None);
            tracing::info!(items = summary.item_count, "order handed off by email");
            push_flash(&session, Flash::success(SENT_MESSAGE)).await;
            Redirect::to("/cart").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to send order email");
            rerender(Vec::new(), Some(Flash::error(FAILED_MESSAGE)), StatusCode::BAD_GATEWAY)
        }
    }
}

/// Redirect to the prefilled WhatsApp chat.
#[instrument(skip(state, session))]
pub async fn whatsapp(State(state): State<AppState>, session: Session) -> Response {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        push_flash(&session, Flash::error(EMPTY_CART_MESSAGE)).await;
        return Redirect::to("/cart").into_response();
    }

    add_breadcrumb("checkout", "WhatsApp handoff", None);
    Redirect::to(&state.whatsapp().order_link(cart.total(), state.price_unit())).into_response()
}
