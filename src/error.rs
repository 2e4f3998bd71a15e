//! Error types for flockview.
//!
//! This module provides error types for GPU initialization, agent buffer
//! synchronization, and running the simulation window.

use std::fmt;

/// Errors that can occur during GPU initialization or readback.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// The adapter cannot run compute shaders.
    ComputeUnsupported(String),
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// Failed to map buffer for reading.
    BufferMapping(String),
    /// The flock needs more than a device limit allows.
    LimitExceeded {
        limit: &'static str,
        requested: u64,
        max: u64,
    },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::ComputeUnsupported(name) => {
                write!(f, "GPU adapter '{}' does not support compute shaders", name)
            }
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::BufferMapping(msg) => write!(f, "Failed to map GPU buffer: {}", msg),
            GpuError::LimitExceeded { limit, requested, max } => write!(
                f,
                "Flock needs {} of {}, device allows {}",
                requested, limit, max
            ),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors raised by the host shadow copy of the agent buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Device bytes do not match the store's agent layout.
    SizeMismatch { expected: usize, actual: usize },
    /// An agent index past the end of the store.
    IndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::SizeMismatch { expected, actual } => write!(
                f,
                "Agent buffer size mismatch: expected {} bytes, got {}",
                expected, actual
            ),
            StoreError::IndexOutOfRange { index, len } => {
                write!(f, "Agent index {} out of range for {} agents", index, len)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors that can occur when running a simulation.
#[derive(Debug)]
pub enum SimulationError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// Startup parameters cannot produce a valid simulation.
    InvalidConfig(String),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            SimulationError::Window(e) => write!(f, "Failed to create window: {}", e),
            SimulationError::Gpu(e) => write!(f, "GPU error: {}", e),
            SimulationError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::EventLoop(e) => Some(e),
            SimulationError::Window(e) => Some(e),
            SimulationError::Gpu(e) => Some(e),
            SimulationError::InvalidConfig(_) => None,
        }
    }
}

impl From<winit::error::EventLoopError> for SimulationError {
    fn from(e: winit::error::EventLoopError) -> Self {
        SimulationError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for SimulationError {
    fn from(e: winit::error::OsError) -> Self {
        SimulationError::Window(e)
    }
}

impl From<GpuError> for SimulationError {
    fn from(e: GpuError) -> Self {
        SimulationError::Gpu(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::SizeMismatch { expected: 128, actual: 64 };
        assert_eq!(
            err.to_string(),
            "Agent buffer size mismatch: expected 128 bytes, got 64"
        );
    }

    #[test]
    fn test_gpu_error_wraps_into_simulation_error() {
        let err: SimulationError = GpuError::NoAdapter.into();
        assert!(matches!(err, SimulationError::Gpu(GpuError::NoAdapter)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
