pub mod cart;
pub mod memory;

pub use cart::{Cart, CartError, CartItem, CartRepository, CartService};
