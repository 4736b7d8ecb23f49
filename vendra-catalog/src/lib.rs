pub mod memory;
pub mod product;
pub mod supplier;

pub use product::{Product, ProductRepository, ProductSnapshot};
pub use supplier::{Supplier, SupplierRepository, SupplierResolution};
