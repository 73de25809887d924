//! Checkout handoff.
//!
//! Curio never takes payment. Checkout ends by handing the cart to a human,
//! either as an order email built from an [`OrderSummary`] and validated
//! [`Contact`] details, or as a prefilled WhatsApp chat.

use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::types::{Email, EmailError, Price, ProductId};

/// Customer details as typed into the contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_phone: String,
    #[serde(default)]
    pub user_address: String,
    #[serde(default)]
    pub message: String,
}

/// A contact form field that failed validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    #[error("full name is required")]
    MissingName,
    #[error("{0}")]
    InvalidEmail(EmailError),
    #[error("phone number is required")]
    MissingPhone,
    #[error("delivery address is required")]
    MissingAddress,
}

/// Validated customer details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub address: String,
    /// Optional free text; empty when the customer left it blank.
    pub message: String,
}

impl ContactDetails {
    /// Validate every field at once so the form can show all problems.
    ///
    /// # Errors
    ///
    /// Returns each failing field's [`ContactError`], in form order.
    pub fn validate(&self) -> Result<Contact, Vec<ContactError>> {
        let mut errors = Vec::new();

        let name = self.user_name.trim();
        if name.is_empty() {
            errors.push(ContactError::MissingName);
        }
        let email = Email::parse(&self.user_email)
            .map_err(|e| errors.push(ContactError::InvalidEmail(e)))
            .ok();
        let phone = self.user_phone.trim();
        if phone.is_empty() {
            errors.push(ContactError::MissingPhone);
        }
        let address = self.user_address.trim();
        if address.is_empty() {
            errors.push(ContactError::MissingAddress);
        }

        match email {
            Some(email) if errors.is_empty() => Ok(Contact {
                name: name.to_string(),
                email,
                phone: phone.to_string(),
                address: address.to_string(),
                message: self.message.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}

/// One line of an order summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub id: ProductId,
    pub title: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
}

/// Snapshot of a cart at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub lines: Vec<OrderLine>,
    pub item_count: u32,
    pub total: Price,
}

impl OrderSummary {
    #[must_use]
    pub fn from_cart(cart: &Cart) -> Self {
        let lines = cart
            .items()
            .iter()
            .map(|item| OrderLine {
                id: item.id,
                title: item.title.clone(),
                image_url: item.image_url.clone(),
                quantity: item.quantity,
                unit_price: item.price,
                line_total: item.line_total(),
            })
            .collect();

        Self {
            lines,
            item_count: cart.item_count(),
            total: cart.total(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Deep links into a WhatsApp chat with the shop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsApp {
    phone: String,
}

impl WhatsApp {
    /// `phone` may contain spaces or dashes; only `+` and digits are kept.
    #[must_use]
    pub fn new(phone: &str) -> Self {
        Self {
            phone: phone
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '+')
                .collect(),
        }
    }

    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Link opening an empty chat.
    #[must_use]
    pub fn chat_link(&self) -> String {
        format!("https://wa.me/{}", self.phone)
    }

    /// Link opening a chat prefilled with `text`.
    #[must_use]
    pub fn message_link(&self, text: &str) -> String {
        format!("{}?text={}", self.chat_link(), urlencoding::encode(text))
    }

    /// Link opening a chat prefilled with the cart total.
    #[must_use]
    pub fn order_link(&self, total: Price, unit: &str) -> String {
        self.message_link(&order_message(total, unit))
    }
}

/// Text sent when a customer hands their cart off over chat.
#[must_use]
pub fn order_message(total: Price, unit: &str) -> String {
    format!(
        "Hello! I'm interested in purchasing items from your store. My cart total is {}.",
        total.label(unit)
    )
}
