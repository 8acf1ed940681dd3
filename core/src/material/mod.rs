//! CPU-side material parameter blocks.
//!
//! A [`MaterialParams`] is an ordered list of named, typed values that packs
//! into one raw byte block for GPU upload. Texture and sampler bindings are
//! GPU resources and live in the graphics crate; only plain data is kept here.

/// A typed material property value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialValue {
    /// Single float (metallic, roughness, alpha cutoff).
    Float(f32),
    /// Unsigned integer (flags, texture slot indices).
    Uint(u32),
    /// 2-component vector.
    Vec2([f32; 2]),
    /// 3-component vector (emissive factor).
    Vec3([f32; 3]),
    /// 4-component vector (base color factor).
    Vec4([f32; 4]),
}

impl MaterialValue {
    /// Size in bytes when packed.
    pub fn size(&self) -> usize {
        match self {
            Self::Float(_) | Self::Uint(_) => 4,
            Self::Vec2(_) => 8,
            Self::Vec3(_) => 12,
            Self::Vec4(_) => 16,
        }
    }

    /// Required alignment in bytes (std430 rules).
    pub fn alignment(&self) -> usize {
        match self {
            Self::Float(_) | Self::Uint(_) => 4,
            Self::Vec2(_) => 8,
            Self::Vec3(_) | Self::Vec4(_) => 16,
        }
    }

    fn write(&self, out: &mut [u8]) {
        match self {
            Self::Float(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            Self::Uint(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            Self::Vec2(v) => out.copy_from_slice(bytemuck::cast_slice(v)),
            Self::Vec3(v) => out.copy_from_slice(bytemuck::cast_slice(v)),
            Self::Vec4(v) => out.copy_from_slice(bytemuck::cast_slice(v)),
        }
    }
}

/// Alpha rendering mode.
///
/// Affects pipeline state (blend configuration), not shader bindings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AlphaMode {
    /// Fully opaque (alpha ignored).
    #[default]
    Opaque,
    /// Alpha masking with cutoff threshold.
    Mask {
        /// Fragments with alpha below this are discarded.
        cutoff: f32,
    },
    /// Full alpha blending.
    Blend,
}

/// Byte alignment of a packed parameter block.
pub const PARAMS_BLOCK_ALIGNMENT: usize = 16;

/// Ordered, named material parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialParams {
    /// Material name.
    pub name: Option<String>,
    /// Alpha rendering mode.
    pub alpha_mode: AlphaMode,
    /// Whether the material is double-sided.
    pub double_sided: bool,
    values: Vec<(String, MaterialValue)>,
}

impl MaterialParams {
    /// Create an empty parameter block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the material name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the alpha mode.
    #[must_use]
    pub fn with_alpha_mode(mut self, alpha_mode: AlphaMode) -> Self {
        self.alpha_mode = alpha_mode;
        self
    }

    /// Set or replace a named value, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: MaterialValue) -> Self {
        self.set(name, value);
        self
    }

    /// Set or replace a named value. Replacing keeps the original position.
    pub fn set(&mut self, name: impl Into<String>, value: MaterialValue) {
        let name = name.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((name, value)),
        }
    }

    /// Look up a value by name.
    pub fn get(&self, name: &str) -> Option<MaterialValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Values in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&str, MaterialValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// Byte offset of each value within the packed block, in order.
    pub fn layout(&self) -> Vec<usize> {
        let mut offset = 0usize;
        self.values
            .iter()
            .map(|(_, v)| {
                offset = offset.next_multiple_of(v.alignment());
                let at = offset;
                offset += v.size();
                at
            })
            .collect()
    }

    /// Pack every value into a std430-style byte block.
    ///
    /// The block length is rounded up to [`PARAMS_BLOCK_ALIGNMENT`]. An empty
    /// parameter list packs into zero bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let offsets = self.layout();
        let end = self
            .values
            .iter()
            .zip(&offsets)
            .map(|((_, v), at)| at + v.size())
            .max()
            .unwrap_or(0);
        let mut bytes = vec![0u8; end.next_multiple_of(PARAMS_BLOCK_ALIGNMENT)];
        for ((_, v), at) in self.values.iter().zip(offsets) {
            v.write(&mut bytes[at..at + v.size()]);
        }
        bytes
    }

    /// Standard PBR metallic-roughness defaults.
    pub fn pbr_default() -> Self {
        Self::new()
            .with_name("pbr_default")
            .with("base_color", MaterialValue::Vec4([1.0, 1.0, 1.0, 1.0]))
            .with("emissive", MaterialValue::Vec3([0.0, 0.0, 0.0]))
            .with("metallic", MaterialValue::Float(0.0))
            .with("roughness", MaterialValue::Float(1.0))
    }
}
