//! # Vellum Engine Core
//!
//! GPU-agnostic building blocks shared by the other Vellum crates: math
//! aliases, bounding boxes, structural hashing, and CPU mesh/material data.

pub mod bounds;
pub mod hash;
pub mod material;
pub mod math;
pub mod mesh;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core crate version.
pub fn init() {
    log::info!("Vellum Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
