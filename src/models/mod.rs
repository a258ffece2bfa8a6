// Models module

pub mod offer;

// Re-export commonly used types
pub use offer::Offer;
