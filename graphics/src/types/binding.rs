//! Shader stage visibility flags.

bitflags::bitflags! {
    /// Shader stages that can access a binding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct ShaderStageFlags: u32 {
        /// Vertex shader stage.
        const VERTEX = 1 << 0;
        /// Fragment shader stage.
        const FRAGMENT = 1 << 1;
        /// Compute shader stage.
        const COMPUTE = 1 << 2;
    }
}

impl ShaderStageFlags {
    /// Vertex and fragment stages.
    pub const GRAPHICS: Self = Self::VERTEX.union(Self::FRAGMENT);
}

impl Default for ShaderStageFlags {
    fn default() -> Self {
        Self::GRAPHICS
    }
}
