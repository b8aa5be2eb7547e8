//! Flat triangle-list mesh contract.
//!
//! The scene-import collaborator delivers geometry already triangulated
//! and unrolled to one vertex per triangle corner - no shared indices.
//! The render core consumes this contract as-is: attribute arrays are
//! checked for consistent lengths, but polygon topology is never
//! revalidated here.

use vantage_rhi::vertex::{PositionColor, PositionNormalColor};

use crate::error::{RenderError, RenderResult};

/// One drawable's imported geometry, pre-triangulated and unrolled.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    /// Per-corner positions; length is a multiple of 3.
    pub positions: Vec<[f32; 3]>,
    /// Optional per-corner normals, same length as `positions`.
    pub normals: Option<Vec<[f32; 3]>>,
    /// Optional per-corner texture coordinates, same length as `positions`.
    pub uvs: Option<Vec<[f32; 2]>>,
    /// Per-corner colors (imported or generated), same length as `positions`.
    pub colors: Vec<[f32; 4]>,
}

impl MeshData {
    /// Number of vertices (triangle corners).
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Checks the attribute arrays agree on length and form whole
    /// triangles.
    ///
    /// # Errors
    ///
    /// Returns an error naming the mismatched attribute.
    pub fn check_consistent(&self) -> RenderResult<()> {
        let n = self.positions.len();
        if n == 0 || n % 3 != 0 {
            return Err(RenderError::Frame(format!(
                "Mesh positions must form whole triangles, got {} corners",
                n
            )));
        }
        if self.colors.len() != n {
            return Err(RenderError::Frame(format!(
                "Mesh colors length {} does not match {} positions",
                self.colors.len(),
                n
            )));
        }
        if let Some(normals) = &self.normals {
            if normals.len() != n {
                return Err(RenderError::Frame(format!(
                    "Mesh normals length {} does not match {} positions",
                    normals.len(),
                    n
                )));
            }
        }
        if let Some(uvs) = &self.uvs {
            if uvs.len() != n {
                return Err(RenderError::Frame(format!(
                    "Mesh UVs length {} does not match {} positions",
                    uvs.len(),
                    n
                )));
            }
        }
        Ok(())
    }

    /// Sequential index list for the unrolled vertex stream.
    ///
    /// The corners are already in draw order, so indices are 0..n; the
    /// draw stays indexed to keep one submission path for all meshes.
    pub fn sequential_indices(&self) -> Vec<u32> {
        (0..self.positions.len() as u32).collect()
    }

    /// Converts to the position+color GPU vertex stream.
    pub fn to_position_color(&self) -> Vec<PositionColor> {
        self.positions
            .iter()
            .zip(self.colors.iter())
            .map(|(&position, &color)| PositionColor::new(position, color))
            .collect()
    }

    /// Converts to the position+normal+color GPU vertex stream.
    ///
    /// Missing normals fall back to +Y; the import collaborator supplies
    /// real ones for lit meshes.
    pub fn to_position_normal_color(&self) -> Vec<PositionNormalColor> {
        let up = [0.0, 1.0, 0.0];
        self.positions
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let normal = self
                    .normals
                    .as_ref()
                    .map(|normals| normals[i])
                    .unwrap_or(up);
                PositionNormalColor::new(position, normal, self.colors[i])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
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

    #[test]
    fn test_counts() {
        let mesh = triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_consistency_accepts_valid_mesh() {
        assert!(triangle().check_consistent().is_ok());
    }

    #[test]
    fn test_consistency_rejects_partial_triangle() {
        let mut mesh = triangle();
        mesh.positions.pop();
        mesh.colors.pop();
        assert!(mesh.check_consistent().is_err());
    }

    #[test]
    fn test_consistency_rejects_mismatched_attributes() {
        let mut mesh = triangle();
        mesh.colors.pop();
        assert!(mesh.check_consistent().is_err());

        let mut mesh = triangle();
        mesh.normals = Some(vec![[0.0, 1.0, 0.0]]);
        assert!(mesh.check_consistent().is_err());
    }

    #[test]
    fn test_sequential_indices() {
        assert_eq!(triangle().sequential_indices(), vec![0, 1, 2]);
    }

    #[test]
    fn test_to_position_color() {
        let vertices = triangle().to_position_color();
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[0].position, [0.0, 0.25, 0.0]);
        assert_eq!(vertices[0].color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_to_position_normal_color_default_normal() {
        let vertices = triangle().to_position_normal_color();
        assert_eq!(vertices[1].normal, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_to_position_normal_color_uses_supplied_normals() {
        let mut mesh = triangle();
        mesh.normals = Some(vec![[0.0, 0.0, -1.0]; 3]);
        let vertices = mesh.to_position_normal_color();
        assert_eq!(vertices[2].normal, [0.0, 0.0, -1.0]);
    }
}
