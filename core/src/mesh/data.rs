//! CPU-side mesh data.
//!
//! A [`Mesh`] stores each vertex attribute in its own stream, which is the
//! layout the GPU scene mirror uploads into. Submeshes carve contiguous
//! vertex and index ranges out of those streams.

use std::ops::Range;

use crate::bounds::BoundingBox;
use crate::math::Vec3;

/// A contiguous slice of a [`Mesh`] that is drawn as one unit.
///
/// Indices inside the range are relative to `vertices.start`.
#[derive(Debug, Clone, PartialEq)]
pub struct Submesh {
    /// Vertex range within the mesh streams.
    pub vertices: Range<u32>,
    /// Index range within the mesh index stream.
    pub indices: Range<u32>,
    /// Local-space bounds of the referenced vertices.
    pub bounding_box: BoundingBox,
}

impl Submesh {
    /// Number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.vertices.end - self.vertices.start
    }

    /// Number of indices.
    pub fn index_count(&self) -> u32 {
        self.indices.end - self.indices.start
    }
}

/// A CPU mesh with per-attribute vertex streams.
///
/// Only `positions` is mandatory. Optional streams are either empty or the
/// same length as `positions`; consumers substitute defaults for empty ones.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    tangents: Vec<[f32; 4]>,
    colors: Vec<[f32; 4]>,
    texcoords: Vec<[f32; 2]>,
    texcoords2: Vec<[f32; 2]>,
    indices: Vec<u32>,
    submeshes: Vec<Submesh>,
    label: Option<String>,
}

impl Mesh {
    /// Create a mesh from vertex positions.
    pub fn new(positions: Vec<[f32; 3]>) -> Self {
        Self {
            positions,
            ..Default::default()
        }
    }

    /// Set the normal stream.
    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = normals;
        self
    }

    /// Set the tangent stream (xyz + handedness in w).
    pub fn with_tangents(mut self, tangents: Vec<[f32; 4]>) -> Self {
        self.tangents = tangents;
        self
    }

    /// Set the vertex color stream.
    pub fn with_colors(mut self, colors: Vec<[f32; 4]>) -> Self {
        self.colors = colors;
        self
    }

    /// Set the primary UV stream.
    pub fn with_texcoords(mut self, texcoords: Vec<[f32; 2]>) -> Self {
        self.texcoords = texcoords;
        self
    }

    /// Set the secondary UV stream.
    pub fn with_texcoords2(mut self, texcoords2: Vec<[f32; 2]>) -> Self {
        self.texcoords2 = texcoords2;
        self
    }

    /// Set the index stream.
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = indices;
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Append a submesh covering the given ranges.
    ///
    /// Its bounding box is computed from the positions in `vertices`. Ranges
    /// reaching past the end of a stream are clamped.
    pub fn with_submesh(mut self, vertices: Range<u32>, indices: Range<u32>) -> Self {
        self.push_submesh(vertices, indices);
        self
    }

    /// Append a single submesh spanning every vertex and index.
    pub fn with_full_submesh(self) -> Self {
        let vertex_count = self.positions.len() as u32;
        let index_count = self.indices.len() as u32;
        self.with_submesh(0..vertex_count, 0..index_count)
    }

    /// Append a submesh and return its index.
    pub fn push_submesh(&mut self, vertices: Range<u32>, indices: Range<u32>) -> usize {
        let vertices = clamp_range(vertices, self.positions.len());
        let indices = clamp_range(indices, self.indices.len());
        let bounding_box = BoundingBox::from_points(
            self.positions[vertices.start as usize..vertices.end as usize]
                .iter()
                .map(|p| Vec3::from(*p)),
        );
        self.submeshes.push(Submesh {
            vertices,
            indices,
            bounding_box,
        });
        self.submeshes.len() - 1
    }

    /// Vertex positions.
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Vertex normals. May be empty.
    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    /// Vertex tangents. May be empty.
    pub fn tangents(&self) -> &[[f32; 4]] {
        &self.tangents
    }

    /// Vertex colors. May be empty.
    pub fn colors(&self) -> &[[f32; 4]] {
        &self.colors
    }

    /// Primary UVs. May be empty.
    pub fn texcoords(&self) -> &[[f32; 2]] {
        &self.texcoords
    }

    /// Secondary UVs. May be empty.
    pub fn texcoords2(&self) -> &[[f32; 2]] {
        &self.texcoords2
    }

    /// Index stream.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// All submeshes.
    pub fn submeshes(&self) -> &[Submesh] {
        &self.submeshes
    }

    /// Submesh by index.
    pub fn submesh(&self, index: usize) -> Option<&Submesh> {
        self.submeshes.get(index)
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }

    /// Debug label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Bounds of every vertex in the mesh.
    pub fn bounding_box(&self) -> BoundingBox {
        self.submeshes
            .iter()
            .fold(BoundingBox::EMPTY, |acc, s| acc.union(&s.bounding_box))
    }
}

fn clamp_range(range: Range<u32>, len: usize) -> Range<u32> {
    let len = len as u32;
    let end = range.end.min(len);
    range.start.min(end)..end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_pair() -> Mesh {
        Mesh::new(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [5.0, 5.0, 5.0],
            [6.0, 5.0, 5.0],
            [5.0, 7.0, 5.0],
        ])
        .with_indices(vec![0, 1, 2, 0, 1, 2])
        .with_submesh(0..3, 0..3)
        .with_submesh(3..6, 3..6)
    }

    #[test]
    fn submesh_bounds_cover_their_vertices_only() {
        let mesh = triangle_pair();
        let first = mesh.submesh(0).unwrap();
        assert_eq!(first.bounding_box.p_min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(first.bounding_box.p_max, Vec3::new(1.0, 1.0, 0.0));

        let second = mesh.submesh(1).unwrap();
        assert_eq!(second.bounding_box.p_min, Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(second.bounding_box.p_max, Vec3::new(6.0, 7.0, 5.0));
        assert_eq!(second.vertex_count(), 3);
        assert_eq!(second.index_count(), 3);
    }

    #[test]
    fn mesh_bounds_union_submeshes() {
        let bb = triangle_pair().bounding_box();
        assert_eq!(bb.p_min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(bb.p_max, Vec3::new(6.0, 7.0, 5.0));
    }

    #[test]
    fn out_of_range_submesh_is_clamped() {
        let mesh = Mesh::new(vec![[0.0; 3]; 2]).with_submesh(1..10, 4..8);
        let s = mesh.submesh(0).unwrap();
        assert_eq!(s.vertices, 1..2);
        assert_eq!(s.indices, 0..0);
    }

    #[test]
    fn missing_submesh_is_none() {
        assert!(Mesh::new(vec![]).submesh(0).is_none());
    }
}
