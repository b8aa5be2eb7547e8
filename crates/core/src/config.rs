//! Render configuration.

/// Fixed configuration consumed at renderer construction time.
///
/// The swap chain is bound at exactly `width`×`height` pixels with no
/// automatic scaling; the overlay depends on a 1:1 pixel mapping. None of
/// these values change after setup except through the resize path.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    /// Client-area width in pixels.
    pub width: u32,
    /// Client-area height in pixels.
    pub height: u32,
    /// Number of presentation buffers in the swap chain ring.
    pub buffer_count: u32,
    /// Present at vertical blank (true) or immediately (false).
    pub vsync: bool,
    /// Color the back-buffer is cleared to at the start of every frame.
    pub clear_color: [f32; 4],
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane distance.
    pub near_plane: f32,
    /// Far clip plane distance.
    pub far_plane: f32,
    /// Window title.
    pub title: String,
}

impl RenderConfig {
    /// Width/height ratio used for the projection matrix.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            buffer_count: 2,
            vsync: true,
            clear_color: [0.6, 0.6, 0.6, 1.0],
            fov_y_degrees: 45.0,
            near_plane: 0.1,
            far_plane: 100.0,
            title: "Vantage Scene Viewer".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RenderConfig::default();
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 600);
        assert_eq!(config.buffer_count, 2);
        assert!(config.vsync);
        assert!(config.near_plane < config.far_plane);
    }

    #[test]
    fn test_aspect_ratio() {
        let config = RenderConfig {
            width: 1920,
            height: 1080,
            ..Default::default()
        };
        assert!((config.aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
    }
}
