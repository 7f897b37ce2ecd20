//! Working cart for one in-progress sale.
//!
//! **Invariants:**
//! - At most one line per product id; adding a product already in the cart
//!   grows that line's quantity.
//! - Quantities are always > 0.
//! - Subtotals are derived from quantity × unit price on every read, so the
//!   cart total always equals the sum of line subtotals.

use rust_decimal::Decimal;

use crate::catalog::Product;
use crate::models::{SaleItem, SaleRequest};

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub product: Product,
    quantity: u32,
}

impl LineItem {
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn subtotal(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<LineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&LineItem> {
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total(&self) -> Decimal {
        self.lines.iter().map(LineItem::subtotal).sum()
    }

    /// Add `quantity` of `product`, merging into an existing line.
    ///
    /// Returns the index of the affected line, or `None` for a zero quantity.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Option<usize> {
        if quantity == 0 {
            return None;
        }
        if let Some(index) = self.lines.iter().position(|l| l.product.id == product.id) {
            let line = &mut self.lines[index];
            line.quantity = line.quantity.saturating_add(quantity);
            return Some(index);
        }
        self.lines.push(LineItem {
            product: product.clone(),
            quantity,
        });
        Some(self.lines.len() - 1)
    }

    /// Replace the quantity of an existing line. Zero is rejected; use
    /// [`Cart::remove`] instead.
    pub fn set_quantity(&mut self, index: usize, quantity: u32) -> bool {
        match self.lines.get_mut(index) {
            Some(line) if quantity > 0 => {
                line.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<LineItem> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Ordered `{produto_id, quantidade, subtotal}` payload for submission.
    pub fn to_sale_request(&self) -> SaleRequest {
        SaleRequest {
            items: self
                .lines
                .iter()
                .map(|l| SaleItem {
                    product_id: l.product.id,
                    quantity: l.quantity,
                    subtotal: l.subtotal(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, price_cents: i64) -> Product {
        Product {
            id,
            name: format!("Produto {id}"),
            price: Decimal::new(price_cents, 2),
            stock: 10,
        }
    }

    fn assert_total_consistent(cart: &Cart) {
        let sum: Decimal = cart.lines().iter().map(LineItem::subtotal).sum();
        assert_eq!(cart.total(), sum);
    }

    #[test]
    fn test_add_same_product_merges_lines() {
        let agua = product(1, 500);
        let mut cart = Cart::new();
        cart.add(&agua, 2);
        assert_eq!(cart.line(0).unwrap().subtotal(), Decimal::new(1000, 2));

        let index = cart.add(&agua, 3);
        assert_eq!(index, Some(0));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line(0).unwrap().quantity(), 5);
        assert_eq!(cart.line(0).unwrap().subtotal(), Decimal::new(2500, 2));
        assert_eq!(cart.total(), Decimal::new(2500, 2));
    }

    #[test]
    fn test_merge_holds_for_many_quantities() {
        let p = product(9, 333);
        for (a, b) in [(1u32, 1u32), (2, 7), (10, 90), (123, 456)] {
            let mut cart = Cart::new();
            cart.add(&p, a);
            cart.add(&p, b);
            assert_eq!(cart.len(), 1);
            let line = cart.line(0).unwrap();
            assert_eq!(line.quantity(), a + b);
            assert_eq!(line.subtotal(), p.price * Decimal::from(a + b));
        }
    }

    #[test]
    fn test_add_zero_quantity_is_ignored() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(&product(1, 100), 0), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_tracks_every_mutation() {
        let mut cart = Cart::new();
        cart.add(&product(1, 500), 2);
        cart.add(&product(2, 125), 4);
        cart.add(&product(3, 999), 1);
        assert_total_consistent(&cart);
        assert_eq!(cart.total(), Decimal::new(2499, 2));

        assert!(cart.set_quantity(1, 1));
        assert_total_consistent(&cart);
        assert_eq!(cart.total(), Decimal::new(2124, 2));

        let removed = cart.remove(0).unwrap();
        assert_eq!(removed.product.id, 1);
        assert_total_consistent(&cart);
        assert_eq!(cart.total(), Decimal::new(1124, 2));

        cart.clear();
        assert_total_consistent(&cart);
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_set_quantity_rejects_zero_and_bad_index() {
        let mut cart = Cart::new();
        cart.add(&product(1, 100), 1);
        assert!(!cart.set_quantity(0, 0));
        assert!(!cart.set_quantity(5, 2));
        assert_eq!(cart.line(0).unwrap().quantity(), 1);
        assert!(cart.remove(3).is_none());
    }

    #[test]
    fn test_sale_request_preserves_order() {
        let mut cart = Cart::new();
        cart.add(&product(3, 100), 1);
        cart.add(&product(1, 250), 2);
        cart.add(&product(3, 100), 1);
        let request = cart.to_sale_request();
        let ids: Vec<i64> = request.items.iter().map(|i| i.product_id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(request.items[0].quantity, 2);
        assert_eq!(request.items[0].subtotal, Decimal::new(200, 2));
        assert_eq!(request.items[1].subtotal, Decimal::new(500, 2));
    }
}
