//! Collage composition - ranked tiles onto a fixed-size canvas

mod error;
mod normalize;
mod render;

// Re-export public API
pub use error::ComposeError;
pub use normalize::normalize_tile;
pub use render::{centering_offset, compose, compose_with_progress};

/// Result type alias for composition operations.
pub type Result<T> = std::result::Result<T, ComposeError>;
