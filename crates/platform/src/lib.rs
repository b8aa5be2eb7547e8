//! Platform layer for the vantage renderer.
//!
//! Provides window creation via winit and Vulkan surface creation. The
//! render core receives a native window handle and a fixed client size
//! from this crate at construction time; it never creates or owns the
//! window itself.

mod window;

pub use window::{Surface, Window};

// Re-export the winit types the app loop needs
pub use winit::event::WindowEvent;
pub use winit::event_loop::EventLoop;
