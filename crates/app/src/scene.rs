//! Built-in demo geometry.
//!
//! Stands in for the scene-import collaborator: both meshes arrive in
//! the same flat, pre-triangulated, one-vertex-per-corner form a real
//! importer would deliver.

use vantage_render::mesh_data::MeshData;

/// The classic RGB triangle.
pub fn demo_triangle() -> MeshData {
    MeshData {
        positions: vec![[0.0, 0.25, 0.0], [0.25, -0.25, 0.0], [-0.25, -0.25, 0.0]],
        normals: None,
        uvs: None,
        colors: vec![
            [1.0, 0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 1.0],
        ],
    }
}

/// A unit cube with per-face normals and colors, unrolled to 36 corners.
pub fn demo_cube() -> MeshData {
    // Each face: normal, color, four corners in two clockwise triangles
    struct Face {
        normal: [f32; 3],
        color: [f32; 4],
        corners: [[f32; 3]; 4],
    }

    let h = 0.5f32;
    let faces = [
        Face {
            normal: [0.0, 0.0, -1.0],
            color: [0.8, 0.2, 0.2, 1.0],
            corners: [[-h, -h, -h], [-h, h, -h], [h, h, -h], [h, -h, -h]],
        },
        Face {
            normal: [0.0, 0.0, 1.0],
            color: [0.2, 0.8, 0.2, 1.0],
            corners: [[h, -h, h], [h, h, h], [-h, h, h], [-h, -h, h]],
        },
        Face {
            normal: [-1.0, 0.0, 0.0],
            color: [0.2, 0.2, 0.8, 1.0],
            corners: [[-h, -h, h], [-h, h, h], [-h, h, -h], [-h, -h, -h]],
        },
        Face {
            normal: [1.0, 0.0, 0.0],
            color: [0.8, 0.8, 0.2, 1.0],
            corners: [[h, -h, -h], [h, h, -h], [h, h, h], [h, -h, h]],
        },
        Face {
            normal: [0.0, 1.0, 0.0],
            color: [0.8, 0.2, 0.8, 1.0],
            corners: [[-h, h, -h], [-h, h, h], [h, h, h], [h, h, -h]],
        },
        Face {
            normal: [0.0, -1.0, 0.0],
            color: [0.2, 0.8, 0.8, 1.0],
            corners: [[-h, -h, h], [-h, -h, -h], [h, -h, -h], [h, -h, h]],
        },
    ];

    let mut positions = Vec::with_capacity(36);
    let mut normals = Vec::with_capacity(36);
    let mut colors = Vec::with_capacity(36);

    for face in &faces {
        // Two triangles per quad face: 0-1-2 and 0-2-3
        for &corner in &[0usize, 1, 2, 0, 2, 3] {
            positions.push(face.corners[corner]);
            normals.push(face.normal);
            colors.push(face.color);
        }
    }

    MeshData {
        positions,
        normals: Some(normals),
        uvs: None,
        colors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_triangle_is_consistent() {
        let mesh = demo_triangle();
        assert!(mesh.check_consistent().is_ok());
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_demo_cube_is_consistent() {
        let mesh = demo_cube();
        assert!(mesh.check_consistent().is_ok());
        assert_eq!(mesh.vertex_count(), 36);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.normals.is_some());
    }

    #[test]
    fn test_demo_cube_normals_are_unit_length() {
        let mesh = demo_cube();
        for normal in mesh.normals.as_ref().unwrap() {
            let len2 = normal.iter().map(|c| c * c).sum::<f32>();
            assert!((len2 - 1.0).abs() < 1e-6);
        }
    }
}
