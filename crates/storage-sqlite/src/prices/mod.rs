//! SQLite storage implementation for daily prices.

mod model;
mod repository;


pub use model::{PriceDB, SymbolSummaryDB};
pub use repository::PriceRepository;

// Re-export trait from core for convenience
pub use pricesync_core::prices::PriceStore;
