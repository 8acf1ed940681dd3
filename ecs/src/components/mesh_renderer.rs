//! Render mesh component for entities that should be drawn.

use std::sync::Arc;

use vellum_core::material::MaterialParams;
use vellum_core::mesh::Mesh;

/// Component that references a shared mesh for rendering.
///
/// The mesh asset is owned by the engine and shared through `Arc`; every
/// listed submesh becomes one drawable in the GPU scene.
#[derive(Debug, Clone)]
pub struct MeshRenderer {
    /// Shared mesh asset.
    pub mesh: Arc<Mesh>,
    /// Submesh indices to draw. Empty means every submesh.
    pub submeshes: Vec<usize>,
    /// Material parameters applied to every submesh.
    pub material: Option<Arc<MaterialParams>>,
}

impl MeshRenderer {
    /// Draw every submesh of `mesh` without a material.
    pub fn new(mesh: Arc<Mesh>) -> Self {
        Self {
            mesh,
            submeshes: Vec::new(),
            material: None,
        }
    }

    /// Restrict drawing to the given submeshes.
    #[must_use]
    pub fn with_submeshes(mut self, submeshes: Vec<usize>) -> Self {
        self.submeshes = submeshes;
        self
    }

    /// Attach material parameters.
    #[must_use]
    pub fn with_material(mut self, material: Arc<MaterialParams>) -> Self {
        self.material = Some(material);
        self
    }

    /// Submesh indices that will actually be drawn.
    pub fn drawn_submeshes(&self) -> Vec<usize> {
        if self.submeshes.is_empty() {
            (0..self.mesh.submeshes().len()).collect()
        } else {
            self.submeshes.clone()
        }
    }
}

impl PartialEq for MeshRenderer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.mesh, &other.mesh)
            && self.submeshes == other.submeshes
            && match (&self.material, &other.material) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_core::mesh::generators::generate_box;

    #[test]
    fn empty_selection_draws_all_submeshes() {
        let mut mesh = generate_box([1.0, 1.0, 1.0]);
        mesh.push_submesh(0..4, 0..6);
        let renderer = MeshRenderer::new(Arc::new(mesh));
        assert_eq!(renderer.drawn_submeshes(), vec![0, 1]);
        assert_eq!(renderer.clone().with_submeshes(vec![1]).drawn_submeshes(), vec![1]);
    }

    #[test]
    fn equality_is_by_shared_asset() {
        let mesh = Arc::new(generate_box([1.0, 1.0, 1.0]));
        let a = MeshRenderer::new(mesh.clone());
        let b = MeshRenderer::new(mesh);
        let c = MeshRenderer::new(Arc::new(generate_box([1.0, 1.0, 1.0])));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
