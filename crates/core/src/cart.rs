//! The visitor's cart.
//!
//! A [`Cart`] is an ordered collection of [`CartItem`]s, unique by product
//! id. Totals are always derived from the items; nothing is cached. Every
//! mutation reports what happened as a [`CartChange`] so the caller can
//! persist the cart and notify the page.

use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::types::{Price, ProductId};

/// Upper bound for a quantity typed in with [`Cart::set_quantity`].
///
/// Repeated [`Cart::add`] calls are not capped.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// A product snapshot with a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    pub quantity: u32,
}

impl CartItem {
    /// Snapshot a product with quantity 1.
    #[must_use]
    pub fn snapshot(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            image_url: product.primary_image().map(str::to_owned),
            quantity: 1,
        }
    }

    /// Price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Outcome of a cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was inserted with quantity 1.
    Added(ProductId),
    /// An existing line's quantity went up by one.
    Incremented { id: ProductId, quantity: u32 },
    /// A line's quantity was replaced.
    QuantitySet { id: ProductId, quantity: u32 },
    /// A line was deleted.
    Removed(ProductId),
    /// Every line was deleted.
    Cleared,
    /// Nothing changed.
    Unchanged,
}

impl CartChange {
    /// Whether the cart contents differ from before the call.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// Resulting quantity of the affected line (0 when it no longer exists).
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        match self {
            Self::Added(_) => 1,
            Self::Incremented { quantity, .. } | Self::QuantitySet { quantity, .. } => *quantity,
            Self::Removed(_) | Self::Cleared | Self::Unchanged => 0,
        }
    }
}

/// Shopping cart.
///
/// ```
/// use curio_core::{Cart, CartChange, ProductId};
///
/// let mut cart = Cart::default();
/// assert!(cart.is_empty());
/// assert_eq!(cart.remove(ProductId::new(1)), CartChange::Unchanged);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Add one unit of `product`.
    ///
    /// A new product gets a line with quantity 1; an existing line goes up
    /// by one.
    pub fn add(&mut self, product: &Product) -> CartChange {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == product.id) {
            item.quantity = item.quantity.saturating_add(1);
            return CartChange::Incremented {
                id: item.id,
                quantity: item.quantity,
            };
        }
        self.items.push(CartItem::snapshot(product));
        CartChange::Added(product.id)
    }

    /// Delete the line for `id`, if present.
    pub fn remove(&mut self, id: ProductId) -> CartChange {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        if self.items.len() == before {
            CartChange::Unchanged
        } else {
            CartChange::Removed(id)
        }
    }

    /// Replace the quantity for `id`.
    ///
    /// A quantity of zero or less removes the line. Quantities above
    /// [`MAX_LINE_QUANTITY`] are clamped. Unknown ids are ignored.
    pub fn set_quantity(&mut self, id: ProductId, quantity: i64) -> CartChange {
        if quantity <= 0 {
            return self.remove(id);
        }
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return CartChange::Unchanged;
        };
        let clamped = u32::try_from(quantity)
            .unwrap_or(MAX_LINE_QUANTITY)
            .min(MAX_LINE_QUANTITY);
        if item.quantity == clamped {
            return CartChange::Unchanged;
        }
        item.quantity = clamped;
        CartChange::QuantitySet {
            id,
            quantity: clamped,
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) -> CartChange {
        if self.items.is_empty() {
            return CartChange::Unchanged;
        }
        self.items.clear();
        CartChange::Cleared
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Line for `id`, if present.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Σ price × quantity.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Σ quantity.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Rebuild a cart from stored lines, merging duplicate ids and dropping
/// empty lines. Stored quantities are kept as they are.
impl From<Vec<CartItem>> for Cart {
    fn from(stored: Vec<CartItem>) -> Self {
        let mut items: Vec<CartItem> = Vec::with_capacity(stored.len());
        for line in stored.into_iter().filter(|line| line.quantity > 0) {
            if let Some(existing) = items.iter_mut().find(|item| item.id == line.id) {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            } else {
                items.push(line);
            }
        }
        Self { items }
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::Category;

    fn product(id: i64, price: u16) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Figure {id}"),
            description: String::new(),
            price: Price::from(price),
            image_url: Some(format!("https://cdn.test/{id}.png")),
            images: Vec::new(),
            category: Category::Figure,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_adding_n_times_yields_one_line_with_quantity_n() {
        let p = product(1, 10);
        let mut cart = Cart::default();
        for n in 1..=7 {
            let change = cart.add(&p);
            assert_eq!(change.quantity(), n);
        }
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.get(p.id).unwrap().quantity, 7);
    }

    #[test]
    fn test_first_add_reports_added_then_incremented() {
        let p = product(1, 10);
        let mut cart = Cart::default();
        assert_eq!(cart.add(&p), CartChange::Added(p.id));
        assert_eq!(
            cart.add(&p),
            CartChange::Incremented {
                id: p.id,
                quantity: 2
            }
        );
    }

    #[test]
    fn test_total_for_two_lines() {
        let a = product(1, 10);
        let b = product(2, 5);
        let mut cart = Cart::default();
        cart.add(&a);
        cart.add(&a);
        cart.add(&b);
        cart.set_quantity(b.id, 3);
        assert_eq!(cart.total().to_string(), "35.00");
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_total_matches_sum_after_interleaving() {
        let products: Vec<Product> = (1..=4).map(|id| product(id, 7 * u16::try_from(id).unwrap())).collect();
        let mut cart = Cart::default();
        let ops: [(usize, i64); 12] = [
            (0, -2),
            (1, -2),
            (0, -2),
            (2, 4),
            (3, -2),
            (1, 0),
            (2, -2),
            (3, 120),
            (0, -1),
            (1, -2),
            (2, 1),
            (0, -2),
        ];
        for (index, op) in ops {
            let p = &products[index];
            match op {
                -2 => {
                    cart.add(p);
                }
                -1 => {
                    cart.remove(p.id);
                }
                quantity => {
                    cart.set_quantity(p.id, quantity);
                }
            }
            let expected: Price = cart
                .items()
                .iter()
                .map(|item| item.price.times(item.quantity))
                .sum();
            assert_eq!(cart.total(), expected);
        }
    }

    #[test]
    fn test_remove_then_add_restarts_at_one() {
        let p = product(1, 10);
        let mut cart = Cart::default();
        cart.add(&p);
        cart.add(&p);
        assert_eq!(cart.remove(p.id), CartChange::Removed(p.id));
        cart.add(&p);
        assert_eq!(cart.get(p.id).unwrap().quantity, 1);
    }

    #[test]
    fn test_set_quantity_zero_or_negative_removes() {
        let p = product(1, 10);
        let mut cart = Cart::default();
        cart.add(&p);
        assert_eq!(cart.set_quantity(p.id, 0), CartChange::Removed(p.id));
        cart.add(&p);
        assert_eq!(cart.set_quantity(p.id, -4), CartChange::Removed(p.id));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_unknown_id_is_noop() {
        let mut cart = Cart::default();
        assert_eq!(cart.set_quantity(ProductId::new(9), 3), CartChange::Unchanged);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_is_clamped() {
        let p = product(1, 1);
        let mut cart = Cart::default();
        cart.add(&p);
        assert_eq!(
            cart.set_quantity(p.id, 5_000),
            CartChange::QuantitySet {
                id: p.id,
                quantity: MAX_LINE_QUANTITY
            }
        );
        assert_eq!(
            cart.add(&p),
            CartChange::Incremented {
                id: p.id,
                quantity: MAX_LINE_QUANTITY + 1
            }
        );
    }

    #[test]
    fn test_add_keeps_counting_past_typed_quantity_limit() {
        let p = product(1, 2);
        let mut cart = Cart::default();
        for _ in 0..150 {
            assert!(cart.add(&p).is_change());
        }
        assert_eq!(cart.get(p.id).unwrap().quantity, 150);
        assert_eq!(cart.item_count(), 150);
        assert_eq!(cart.total().to_string(), "300.00");

        let reloaded: Cart = serde_json::from_value(serde_json::to_value(&cart).unwrap()).unwrap();
        assert_eq!(reloaded.get(p.id).unwrap().quantity, 150);
    }

    #[test]
    fn test_total_of_huge_prices_does_not_panic() {
        let mut p = product(1, 0);
        p.price = Price::MAX;
        let mut cart = Cart::default();
        cart.add(&p);
        cart.add(&p);
        cart.add(&product(2, 10));
        assert_eq!(cart.total(), Price::MAX.times(2) + Price::from(10));
        assert!(cart.total() > Price::MAX);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::default();
        assert_eq!(cart.clear(), CartChange::Unchanged);
        cart.add(&product(1, 1));
        assert_eq!(cart.clear(), CartChange::Cleared);
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_stored_lines_are_normalized() {
        let json = serde_json::json!([
            {"id": 1, "title": "A", "price": "10", "quantity": 2},
            {"id": 1, "title": "A", "price": "10", "quantity": 3},
            {"id": 2, "title": "B", "price": "5", "quantity": 0}
        ]);
        let cart: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_count(), 5);

        let back = serde_json::to_value(&cart).unwrap();
        assert!(back.is_array());
    }
}
