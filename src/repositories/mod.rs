pub mod order_line_repo;
pub mod product_repo;
pub mod shop_repo;

pub use order_line_repo::OrderLineRepository;
pub use product_repo::ProductRepository;
pub use shop_repo::ShopRepository;
