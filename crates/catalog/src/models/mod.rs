//! Catalog data models.

pub mod deal;
pub mod product;

pub use deal::{Deal, DealPatch, DealStats, MAX_DISCOUNT, NewDeal};
pub use product::{
    MAX_PRICE, MAX_RATING, NewProduct, Product, ProductPatch, ProductStats, SeedProduct, SeedVariant,
    StockUpdate,
};
