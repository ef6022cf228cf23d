//! Cart Aggregate
//!
//! One shopping cart per customer, keyed by the customer id.

pub mod api;
pub mod entity;
pub mod operations;
pub mod repository;

pub use api::cart_router;
pub use entity::{Cart, CartDto, CartItem, CartItemDto};
pub use repository::CartRepository;
