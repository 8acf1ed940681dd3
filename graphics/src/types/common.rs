//! Common types shared across the graphics system.

/// 3D extent for textures.
///
/// `depth_or_layers` is the depth of a 3D texture or the layer count of a
/// 1D/2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent3d {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels (1 for 1D textures).
    pub height: u32,
    /// Depth in pixels or number of array layers.
    pub depth_or_layers: u32,
}

impl Extent3d {
    /// Create a new 2D extent with a single layer.
    pub fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth_or_layers: 1,
        }
    }

    /// Create a new 3D extent.
    pub fn new_3d(width: u32, height: u32, depth_or_layers: u32) -> Self {
        Self {
            width,
            height,
            depth_or_layers,
        }
    }

    /// Component-wise minimum, used to clamp copy regions.
    pub fn min(self, other: Self) -> Self {
        Self {
            width: self.width.min(other.width),
            height: self.height.min(other.height),
            depth_or_layers: self.depth_or_layers.min(other.depth_or_layers),
        }
    }
}

impl Default for Extent3d {
    fn default() -> Self {
        Self::new_2d(1, 1)
    }
}
