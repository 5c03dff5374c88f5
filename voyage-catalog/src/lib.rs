pub mod pricing;
pub mod inventory;

pub use pricing::{PricingConfig, PricingEngine, PricingError};
pub use inventory::InventoryManager;
