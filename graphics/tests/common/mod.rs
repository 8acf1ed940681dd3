//! Common utilities for integration tests.
//!
//! Tests are parameterized over [`Backend`] with `rstest`. The dummy backend
//! is always available and additionally exposes its operation log, so
//! assertions about the number of GPU operations only run there.

#![allow(dead_code)]

use std::sync::Arc;

use vellum_core::math::{Mat4, Vec3, mat4_from_translation};
use vellum_core::mesh::generators::generate_box;
use vellum_graphics::backend::create_backend;
use vellum_graphics::scene::Drawable;
use vellum_graphics::{
    BackendPreference, DummyBackend, GraphicsConfig, GraphicsDevice, SceneCapacities,
};

/// Available backends for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Recording backend with no GPU access.
    Dummy,
    /// wgpu backend.
    WebGpu,
}

impl Backend {
    /// Check if this backend is currently available.
    pub fn is_available(&self) -> bool {
        match self {
            Backend::Dummy => true,
            #[cfg(feature = "wgpu-backend")]
            Backend::WebGpu => vellum_graphics::backend::has_gpu_backend(),
            #[cfg(not(feature = "wgpu-backend"))]
            Backend::WebGpu => false,
        }
    }
}

/// Device plus, for the dummy backend, its operation log.
pub struct TestContext {
    pub backend: Backend,
    pub device: Arc<GraphicsDevice>,
    pub dummy: Option<Arc<DummyBackend>>,
}

impl TestContext {
    /// Create a context with default configuration.
    ///
    /// Returns `None` if the backend is not available.
    pub fn new(backend: Backend) -> Option<Self> {
        Self::with_config(backend, GraphicsConfig::default())
    }

    /// Create a context with `config`; the backend preference is overridden.
    pub fn with_config(backend: Backend, config: GraphicsConfig) -> Option<Self> {
        let _ = env_logger::builder().is_test(true).try_init();
        if !backend.is_available() {
            return None;
        }
        match backend {
            Backend::Dummy => {
                let (device, dummy) = GraphicsDevice::with_dummy_backend(
                    config.with_backend(BackendPreference::Dummy),
                );
                Some(Self {
                    backend,
                    device,
                    dummy: Some(dummy),
                })
            }
            Backend::WebGpu => {
                let native = create_backend(BackendPreference::Wgpu).ok()?;
                let device =
                    GraphicsDevice::new(native, config.with_backend(BackendPreference::Wgpu));
                Some(Self {
                    backend,
                    device,
                    dummy: None,
                })
            }
        }
    }
}

/// Scene capacities small enough to force growth in tests.
pub fn tiny_scene() -> GraphicsConfig {
    GraphicsConfig::default().with_scene_capacities(SceneCapacities {
        vertices: 24,
        indices: 36,
        drawables: 1,
        material_param_bytes: 16,
    })
}

/// A unit box drawable translated along X.
pub fn box_at(x: f32) -> Drawable {
    Drawable::new(
        Arc::new(generate_box([0.5; 3])),
        0,
        mat4_from_translation(Vec3::new(x, 0.0, 0.0)),
    )
    .expect("box has one submesh")
}

/// Column-major bytes of a matrix, as stored in the transform arrays.
pub fn matrix_bytes(m: &Mat4) -> Vec<u8> {
    bytemuck::cast_slice(&vellum_core::math::mat4_to_cols_array(m)).to_vec()
}
