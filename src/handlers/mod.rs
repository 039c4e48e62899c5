// Handler modules
pub mod breakdown;
pub mod creators;
pub mod skus;
pub mod utils;

// Re-export all handler functions
pub use breakdown::handle_breakdown;
pub use creators::handle_creators;
pub use skus::handle_skus;
