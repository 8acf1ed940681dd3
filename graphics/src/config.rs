//! Device configuration loaded from TOML.
//!
//! ```toml
//! backend = "dummy"
//!
//! [descriptor_heaps]
//! resource = 4096
//! sampler = 256
//!
//! [scene]
//! vertices = 65536
//! ```
//!
//! Every field is optional; missing values fall back to [`Default`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::DescriptorHeapKind;
use crate::error::GraphicsError;

/// Which backend [`GraphicsDevice::from_config`](crate::GraphicsDevice::from_config)
/// should create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Best available backend, falling back to the dummy backend.
    #[default]
    Auto,
    /// Recording backend with no GPU access.
    Dummy,
    /// wgpu backend (requires the `wgpu-backend` feature).
    Wgpu,
}

/// Fixed capacity of each descriptor heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorHeapCapacities {
    /// Shader-visible buffer and texture descriptors.
    pub resource: u32,
    /// Shader-visible sampler descriptors.
    pub sampler: u32,
    /// Render target views.
    pub render_target: u32,
    /// Depth-stencil views.
    pub depth_stencil: u32,
}

impl DescriptorHeapCapacities {
    /// Capacity of the heap for `kind`.
    pub fn get(&self, kind: DescriptorHeapKind) -> u32 {
        match kind {
            DescriptorHeapKind::Resource => self.resource,
            DescriptorHeapKind::Sampler => self.sampler,
            DescriptorHeapKind::RenderTarget => self.render_target,
            DescriptorHeapKind::DepthStencil => self.depth_stencil,
        }
    }
}

impl Default for DescriptorHeapCapacities {
    fn default() -> Self {
        Self {
            resource: 65536,
            sampler: 2048,
            render_target: 256,
            depth_stencil: 64,
        }
    }
}

/// Initial sizes of the GPU scene mirror's backing arrays.
///
/// Arrays grow on demand, so these only control how early the first
/// reallocation happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneCapacities {
    /// Vertices per attribute stream.
    pub vertices: u32,
    /// Entries in the index stream.
    pub indices: u32,
    /// Transform slots (one per drawable).
    pub drawables: u32,
    /// Bytes of packed material parameters.
    pub material_param_bytes: u32,
}

impl Default for SceneCapacities {
    fn default() -> Self {
        Self {
            vertices: 16384,
            indices: 49152,
            drawables: 256,
            material_param_bytes: 16384,
        }
    }
}

/// Configuration for a [`GraphicsDevice`](crate::GraphicsDevice).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// Backend selection.
    pub backend: BackendPreference,
    /// Descriptor heap sizes, fixed for the lifetime of the device.
    pub descriptor_heaps: DescriptorHeapCapacities,
    /// Initial GPU scene mirror sizes.
    pub scene: SceneCapacities,
}

impl GraphicsConfig {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidConfig`] if the text is not valid TOML
    /// or does not match the configuration schema.
    pub fn from_toml_str(text: &str) -> Result<Self, GraphicsError> {
        toml::from_str(text).map_err(|e| GraphicsError::InvalidConfig(e.to_string()))
    }

    /// Load a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidConfig`] if the file cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, GraphicsError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GraphicsError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidConfig`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, GraphicsError> {
        toml::to_string(self).map_err(|e| GraphicsError::InvalidConfig(e.to_string()))
    }

    /// Set the backend preference.
    pub fn with_backend(mut self, backend: BackendPreference) -> Self {
        self.backend = backend;
        self
    }

    /// Set descriptor heap capacities.
    pub fn with_descriptor_heaps(mut self, heaps: DescriptorHeapCapacities) -> Self {
        self.descriptor_heaps = heaps;
        self
    }

    /// Set the initial scene mirror capacities.
    pub fn with_scene_capacities(mut self, scene: SceneCapacities) -> Self {
        self.scene = scene;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(
            GraphicsConfig::from_toml_str("").unwrap(),
            GraphicsConfig::default()
        );
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = GraphicsConfig::from_toml_str(
            r#"
            backend = "dummy"

            [descriptor_heaps]
            sampler = 8

            [scene]
            drawables = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, BackendPreference::Dummy);
        assert_eq!(config.descriptor_heaps.sampler, 8);
        assert_eq!(
            config.descriptor_heaps.resource,
            DescriptorHeapCapacities::default().resource
        );
        assert_eq!(config.scene.drawables, 4);
        assert_eq!(config.scene.vertices, SceneCapacities::default().vertices);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = GraphicsConfig::from_toml_str(r#"backend = "metal""#).unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidConfig(_)));
    }

    #[test]
    fn serializes_back_to_equal_config() {
        let config = GraphicsConfig::default().with_backend(BackendPreference::Wgpu);
        let text = config.to_toml_string().unwrap();
        assert_eq!(GraphicsConfig::from_toml_str(&text).unwrap(), config);
    }
}
