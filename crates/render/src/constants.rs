//! Per-frame shader constants.
//!
//! The transform block carries the model/view/projection matrices every
//! pipeline consumes. The shader contract is row-major: matrices are
//! transposed once at block construction, and `update()` copies the
//! block into the mapped constant buffer as a single contiguous write.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Hardware alignment invariant for constant-buffer allocations.
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

/// Rounds `size` up to the constant-buffer alignment boundary.
pub const fn align_constant_buffer_size(size: u64) -> u64 {
    (size + CONSTANT_BUFFER_ALIGNMENT - 1) & !(CONSTANT_BUFFER_ALIGNMENT - 1)
}

/// Model/view/projection block, pre-transposed for the shader.
///
/// # Memory layout
///
/// Three 64-byte matrices, 192 bytes total; the backing buffer is
/// allocated at [`TransformBlock::ALIGNED_SIZE`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct TransformBlock {
    /// Model-to-world matrix (transposed).
    pub model: Mat4,
    /// World-to-view matrix (transposed).
    pub view: Mat4,
    /// View-to-clip matrix (transposed).
    pub projection: Mat4,
}

impl TransformBlock {
    /// Size of the block in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Allocation size after rounding up to the 256-byte boundary.
    pub const ALIGNED_SIZE: u64 = align_constant_buffer_size(Self::SIZE as u64);

    /// Builds a block from untransposed matrices.
    ///
    /// The transpose happens here, once, so every upload path sees the
    /// same shader-ready data.
    pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            model: model.transpose(),
            view: view.transpose(),
            projection: projection.transpose(),
        }
    }

    /// Identity block, the state before the first `update()`.
    pub fn identity() -> Self {
        Self {
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }
}

impl Default for TransformBlock {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_block_size() {
        // 3 Mat4 of 64 bytes each
        assert_eq!(TransformBlock::SIZE, 192);
    }

    #[test]
    fn test_aligned_size_is_rounded_to_256() {
        assert_eq!(TransformBlock::ALIGNED_SIZE, 256);
    }

    #[test]
    fn test_align_constant_buffer_size() {
        assert_eq!(align_constant_buffer_size(0), 0);
        assert_eq!(align_constant_buffer_size(1), 256);
        assert_eq!(align_constant_buffer_size(192), 256);
        assert_eq!(align_constant_buffer_size(256), 256);
        assert_eq!(align_constant_buffer_size(257), 512);
    }

    #[test]
    fn test_new_transposes_matrices() {
        let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let block = TransformBlock::new(model, Mat4::IDENTITY, Mat4::IDENTITY);
        assert_eq!(block.model, model.transpose());
        assert_eq!(block.view, Mat4::IDENTITY);
    }

    #[test]
    fn test_last_write_wins() {
        // Writing the block twice into the same bytes leaves only the
        // second block visible - the write is one contiguous copy.
        let first = TransformBlock::new(
            Mat4::from_rotation_y(0.5),
            Mat4::IDENTITY,
            Mat4::IDENTITY,
        );
        let second = TransformBlock::new(
            Mat4::from_rotation_y(1.5),
            Mat4::IDENTITY,
            Mat4::IDENTITY,
        );

        let mut backing = [0u8; TransformBlock::SIZE];
        backing.copy_from_slice(bytemuck::bytes_of(&first));
        backing.copy_from_slice(bytemuck::bytes_of(&second));

        let read: &TransformBlock = bytemuck::from_bytes(&backing);
        assert_eq!(read.model, second.model);
    }

    #[test]
    fn test_pod_roundtrip() {
        let block = TransformBlock::identity();
        let bytes: &[u8] = bytemuck::bytes_of(&block);
        assert_eq!(bytes.len(), TransformBlock::SIZE);
    }
}
