//! Cart Entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persistence::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: i64,
    pub product_name: String,
    /// Price when the item was added, in cents
    pub unit_price_cents: i64,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Same as the owning customer's id
    pub id: i64,
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(customer_id: i64) -> Self {
        Self {
            id: customer_id,
            items: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn customer_id(&self) -> i64 {
        self.id
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, product_id: i64) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    pub fn quantity_of(&self, product_id: i64) -> u32 {
        self.item(product_id).map_or(0, |i| i.quantity)
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn total_cents(&self) -> i64 {
        self.items
            .iter()
            .map(|i| i.unit_price_cents * i64::from(i.quantity))
            .sum()
    }

    /// Add units of a product, merging with an existing line. The line keeps
    /// the latest name and price.
    pub fn add(
        &mut self,
        product_id: i64,
        product_name: &str,
        unit_price_cents: i64,
        quantity: u32,
    ) {
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.quantity += quantity;
                item.product_name = product_name.to_string();
                item.unit_price_cents = unit_price_cents;
            }
            None => self.items.push(CartItem {
                product_id,
                product_name: product_name.to_string(),
                unit_price_cents,
                quantity,
            }),
        }
        self.updated_at = Utc::now();
    }

    /// Returns `false` when the product was not in the cart.
    pub fn remove(&mut self, product_id: i64) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        let removed = self.items.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }
}

impl Entity for Cart {
    const COLLECTION: &'static str = "carts";

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDto {
    pub product_id: String,
    pub product_name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub line_total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDto {
    pub customer_id: String,
    pub items: Vec<CartItemDto>,
    pub total_quantity: u32,
    pub total_cents: i64,
}

impl From<Cart> for CartDto {
    fn from(cart: Cart) -> Self {
        let total_quantity = cart.total_quantity();
        let total_cents = cart.total_cents();
        Self {
            customer_id: cart.id.to_string(),
            items: cart
                .items
                .into_iter()
                .map(|i| CartItemDto {
                    product_id: i.product_id.to_string(),
                    line_total_cents: i.unit_price_cents * i64::from(i.quantity),
                    product_name: i.product_name,
                    unit_price_cents: i.unit_price_cents,
                    quantity: i.quantity,
                })
                .collect(),
            total_quantity,
            total_cents,
        }
    }
}
