//! Catalog entity models

pub mod group;
pub mod menu;
pub mod operator;
pub mod product;
pub mod table;
pub mod tender;
pub mod vat;

pub use group::{Department, ProductGroup};
pub use menu::{Menu, MenuEntry};
pub use operator::Operator;
pub use product::{PriceOption, Product};
pub use table::Table;
pub use tender::Tender;
pub use vat::VatRate;
