//! Vulkan abstraction layer for the vantage renderer.
//!
//! This crate provides safe wrappers over Vulkan using the `ash` crate:
//! - Instance and adapter selection
//! - Logical device and queue management
//! - Swapchain lifecycle
//! - Command pool and command buffer recording
//! - Buffer, shader, descriptor and pipeline objects
//! - Synchronization primitives (timeline fence, binary semaphores)
//!
//! The renderer targets one fixed device generation: Vulkan 1.3 with
//! dynamic rendering and timeline semaphores. There is no fallback path
//! for older API versions.

mod error;

pub mod adapter;
pub mod buffer;
pub mod command;
pub mod descriptor;
pub mod device;
pub mod instance;
pub mod pipeline;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export ash types that users need for raw-handle interop
pub use ash::vk;
