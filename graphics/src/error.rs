//! Graphics error types.

use crate::descriptor::DescriptorHeapKind;
use crate::scene::DrawableId;

/// Errors that can occur in the graphics system.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphicsError {
    /// Failed to initialize the graphics system.
    #[error("initialization failed: {0}")]
    InitializationFailed(String),
    /// Failed to create a resource.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),
    /// A requested feature is not supported by the active backend.
    #[error("feature not supported: {0}")]
    FeatureNotSupported(String),
    /// The GPU device was lost or already dropped.
    #[error("GPU device lost")]
    DeviceLost,
    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// A descriptor heap has no free slots left.
    #[error("descriptor heap `{kind}` exhausted (capacity {capacity})")]
    DescriptorHeapExhausted {
        /// Heap that ran out of slots.
        kind: DescriptorHeapKind,
        /// Fixed capacity of that heap.
        capacity: u32,
    },
    /// A bounded material slot array has no free entries left.
    #[error("material {array} slot array full (capacity {capacity})")]
    SlotArrayFull {
        /// Which array ran out (`"texture"` or `"sampler"`).
        array: &'static str,
        /// Fixed capacity of the array.
        capacity: u32,
    },
    /// A drawable id does not refer to a registered drawable.
    #[error("drawable {0} is not registered")]
    UnknownDrawable(DrawableId),
    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
