pub mod order_line;
pub mod product;
pub mod shop;

pub use order_line::OrderLineRef;
pub use product::Product;
pub use shop::Shop;
