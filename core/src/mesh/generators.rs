//! Mesh generators for common shapes.
//!
//! Every generated mesh has full vertex streams (normals, tangents, UVs) and
//! a single submesh spanning the whole mesh.

use std::f32::consts::PI;

use super::data::Mesh;

/// Generate an axis-aligned box centered at the origin.
///
/// Each face has its own four vertices so normals stay flat: 24 vertices and
/// 36 indices in total.
pub fn generate_box(half_extents: [f32; 3]) -> Mesh {
    let [hx, hy, hz] = half_extents;
    // (normal, tangent, bitangent)
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut tangents = Vec::with_capacity(24);
    let mut texcoords = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (n, t, b) in faces {
        let base = positions.len() as u32;
        for (su, sv, uv) in [
            (-1.0, -1.0, [0.0, 1.0]),
            (1.0, -1.0, [1.0, 1.0]),
            (1.0, 1.0, [1.0, 0.0]),
            (-1.0, 1.0, [0.0, 0.0]),
        ] {
            let p = [
                (n[0] + t[0] * su + b[0] * sv) * hx,
                (n[1] + t[1] * su + b[1] * sv) * hy,
                (n[2] + t[2] * su + b[2] * sv) * hz,
            ];
            positions.push(p);
            normals.push(n);
            tangents.push([t[0], t[1], t[2], 1.0]);
            texcoords.push(uv);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    Mesh::new(positions)
        .with_normals(normals)
        .with_tangents(tangents)
        .with_texcoords(texcoords)
        .with_indices(indices)
        .with_label("box")
        .with_full_submesh()
}

/// Generate a UV sphere mesh.
///
/// `segments` counts longitudinal slices around the equator and `rings`
/// latitudinal bands from pole to pole.
pub fn generate_sphere(radius: f32, segments: u32, rings: u32) -> Mesh {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut tangents = Vec::new();
    let mut texcoords = Vec::new();
    let mut indices = Vec::new();

    for ring in 0..=rings {
        let theta = ring as f32 * PI / rings as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for segment in 0..=segments {
            let phi = segment as f32 * 2.0 * PI / segments as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let x = sin_theta * cos_phi;
            let y = cos_theta;
            let z = sin_theta * sin_phi;

            positions.push([x * radius, y * radius, z * radius]);
            normals.push([x, y, z]);
            tangents.push([-sin_phi, 0.0, cos_phi, 1.0]);
            texcoords.push([segment as f32 / segments as f32, ring as f32 / rings as f32]);
        }
    }

    for ring in 0..rings {
        for segment in 0..segments {
            let current = ring * (segments + 1) + segment;
            let next = current + segments + 1;

            indices.extend_from_slice(&[current, next, current + 1]);
            indices.extend_from_slice(&[current + 1, next, next + 1]);
        }
    }

    Mesh::new(positions)
        .with_normals(normals)
        .with_tangents(tangents)
        .with_texcoords(texcoords)
        .with_indices(indices)
        .with_label("sphere")
        .with_full_submesh()
}

/// Generate a quad on the XY plane facing +Z.
///
/// UV coordinates go from (0,0) at top-left to (1,1) at bottom-right.
pub fn generate_quad(half_width: f32, half_height: f32) -> Mesh {
    let positions = vec![
        [-half_width, -half_height, 0.0],
        [half_width, -half_height, 0.0],
        [half_width, half_height, 0.0],
        [-half_width, half_height, 0.0],
    ];
    let texcoords = vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    Mesh::new(positions)
        .with_normals(vec![[0.0, 0.0, 1.0]; 4])
        .with_tangents(vec![[1.0, 0.0, 0.0, 1.0]; 4])
        .with_texcoords(texcoords)
        .with_indices(vec![0, 1, 2, 2, 3, 0])
        .with_label("quad")
        .with_full_submesh()
}
