//! Order Aggregate
//!
//! Orders placed from a customer's cart. Placing an order takes stock;
//! cancelling it gives the stock back.

pub mod api;
pub mod entity;
pub mod operations;
pub mod repository;

pub use api::orders_router;
pub use entity::{Order, OrderDto, OrderLine, OrderStatus};
pub use repository::OrderRepository;
