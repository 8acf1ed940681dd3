//! Texture types and descriptors.

use bitflags::bitflags;

use super::Extent3d;

/// Texture format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// 8-bit red channel, unsigned normalized.
    R8Unorm,
    /// 8-bit RG channels, unsigned normalized.
    Rg8Unorm,
    /// 32-bit red channel, float.
    R32Float,
    /// 32-bit red channel, unsigned integer.
    R32Uint,
    /// 8-bit RGBA channels, unsigned normalized.
    #[default]
    Rgba8Unorm,
    /// 8-bit RGBA channels, sRGB.
    Rgba8UnormSrgb,
    /// 8-bit BGRA channels, unsigned normalized.
    Bgra8Unorm,
    /// 8-bit BGRA channels, sRGB.
    Bgra8UnormSrgb,
    /// 16-bit RGBA channels, float.
    Rgba16Float,
    /// 32-bit RGBA channels, float.
    Rgba32Float,
    /// 24-bit depth with 8-bit stencil.
    Depth24PlusStencil8,
    /// 32-bit depth, float.
    Depth32Float,
}

impl TextureFormat {
    /// Returns true if this is a depth or stencil format.
    pub fn is_depth_stencil(&self) -> bool {
        matches!(self, Self::Depth24PlusStencil8 | Self::Depth32Float)
    }

    /// Returns the size in bytes per pixel.
    pub fn block_size(&self) -> u32 {
        match self {
            Self::R8Unorm => 1,
            Self::Rg8Unorm => 2,
            Self::R32Float
            | Self::R32Uint
            | Self::Rgba8Unorm
            | Self::Rgba8UnormSrgb
            | Self::Bgra8Unorm
            | Self::Bgra8UnormSrgb
            | Self::Depth24PlusStencil8
            | Self::Depth32Float => 4,
            Self::Rgba16Float => 8,
            Self::Rgba32Float => 16,
        }
    }
}

bitflags! {
    /// Usage flags for textures.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Texture can be copied from.
        const COPY_SRC = 1 << 0;
        /// Texture can be copied to.
        const COPY_DST = 1 << 1;
        /// Texture can be sampled in a shader.
        const TEXTURE_BINDING = 1 << 2;
        /// Texture can be used as a storage texture.
        const STORAGE_BINDING = 1 << 3;
        /// Texture can be used as a render attachment.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

impl Default for TextureUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureDimension {
    /// One-dimensional texture.
    D1,
    /// Two-dimensional texture.
    #[default]
    D2,
    /// Three-dimensional (volume) texture.
    D3,
}

impl TextureDimension {
    /// Decode the raw value stored in serialized or native descriptors.
    ///
    /// # Panics
    ///
    /// Panics on any value other than 1, 2 or 3. Such a value means the
    /// texture was described incorrectly upstream and there is no sensible
    /// view to derive from it.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::D1,
            2 => Self::D2,
            3 => Self::D3,
            other => panic!("invalid texture dimension {other}"),
        }
    }

    /// Raw value, the inverse of [`from_raw`](Self::from_raw).
    pub fn as_raw(self) -> u32 {
        match self {
            Self::D1 => 1,
            Self::D2 => 2,
            Self::D3 => 3,
        }
    }
}

/// The kind of view a texture descriptor is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureViewType {
    /// Single-layer 1D view.
    D1,
    /// 1D array view.
    D1Array,
    /// Single-layer 2D view.
    D2,
    /// 2D array view.
    D2Array,
    /// 3D view.
    D3,
}

impl TextureViewType {
    /// Derive the view type from a texture's dimension and depth/layer count.
    ///
    /// 3D textures always get a [`D3`](Self::D3) view; 1D and 2D textures
    /// get an array view when they have more than one layer.
    pub fn of(dimension: TextureDimension, depth_or_layers: u32) -> Self {
        match (dimension, depth_or_layers > 1) {
            (TextureDimension::D1, false) => Self::D1,
            (TextureDimension::D1, true) => Self::D1Array,
            (TextureDimension::D2, false) => Self::D2,
            (TextureDimension::D2, true) => Self::D2Array,
            (TextureDimension::D3, _) => Self::D3,
        }
    }

    /// Whether this is an array view.
    pub fn is_array(self) -> bool {
        matches!(self, Self::D1Array | Self::D2Array)
    }
}

/// Descriptor for creating a texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    /// Debug label for the texture.
    pub label: Option<String>,
    /// Dimensionality.
    pub dimension: TextureDimension,
    /// Size of the texture.
    pub size: Extent3d,
    /// Mip level count.
    pub mip_level_count: u32,
    /// Sample count for multisampling.
    pub sample_count: u32,
    /// Texture format.
    pub format: TextureFormat,
    /// Usage flags.
    pub usage: TextureUsage,
}

impl TextureDescriptor {
    /// Create a new 2D texture descriptor.
    pub fn new_2d(width: u32, height: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            size: Extent3d::new_2d(width, height),
            format,
            usage,
            ..Default::default()
        }
    }

    /// Create a new 2D array texture descriptor.
    pub fn new_2d_array(
        width: u32,
        height: u32,
        layers: u32,
        format: TextureFormat,
        usage: TextureUsage,
    ) -> Self {
        Self {
            size: Extent3d::new_3d(width, height, layers),
            format,
            usage,
            ..Default::default()
        }
    }

    /// Create a new 3D texture descriptor.
    pub fn new_3d(
        width: u32,
        height: u32,
        depth: u32,
        format: TextureFormat,
        usage: TextureUsage,
    ) -> Self {
        Self {
            dimension: TextureDimension::D3,
            size: Extent3d::new_3d(width, height, depth),
            format,
            usage,
            ..Default::default()
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the mip level count.
    pub fn with_mip_levels(mut self, count: u32) -> Self {
        self.mip_level_count = count;
        self
    }

    /// View type this texture's descriptor is written with.
    pub fn view_type(&self) -> TextureViewType {
        TextureViewType::of(self.dimension, self.size.depth_or_layers)
    }
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            dimension: TextureDimension::D2,
            size: Extent3d::default(),
            mip_level_count: 1,
            sample_count: 1,
            format: TextureFormat::default(),
            usage: TextureUsage::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_type_for_2d() {
        assert_eq!(
            TextureViewType::of(TextureDimension::D2, 1),
            TextureViewType::D2
        );
        assert_eq!(
            TextureViewType::of(TextureDimension::D2, 4),
            TextureViewType::D2Array
        );
    }

    #[test]
    fn view_type_for_1d() {
        assert_eq!(
            TextureViewType::of(TextureDimension::D1, 1),
            TextureViewType::D1
        );
        assert_eq!(
            TextureViewType::of(TextureDimension::D1, 6),
            TextureViewType::D1Array
        );
    }

    #[test]
    fn view_type_for_3d_ignores_depth() {
        for depth in [1, 2, 64] {
            assert_eq!(
                TextureViewType::of(TextureDimension::D3, depth),
                TextureViewType::D3
            );
        }
    }

    #[test]
    fn raw_dimension_round_trips() {
        for dimension in [
            TextureDimension::D1,
            TextureDimension::D2,
            TextureDimension::D3,
        ] {
            assert_eq!(TextureDimension::from_raw(dimension.as_raw()), dimension);
        }
    }

    #[test]
    #[should_panic(expected = "invalid texture dimension 7")]
    fn unknown_raw_dimension_panics() {
        TextureDimension::from_raw(7);
    }

    #[test]
    fn descriptor_view_type() {
        let desc = TextureDescriptor::new_2d_array(
            64,
            64,
            6,
            TextureFormat::Rgba8Unorm,
            TextureUsage::TEXTURE_BINDING,
        );
        assert_eq!(desc.view_type(), TextureViewType::D2Array);
        assert!(desc.view_type().is_array());
    }
}
