// device.rs — wgpu device/queue initialization.
//
// Responsibilities:
//   - Enumerate Vulkan adapters and select the first non-CPU one.
//   - Require timestamp queries and request limits wide enough for the
//     32×32 kernel variant (1024 invocations per workgroup).
//   - Expose the ceiling-division dispatch math used by the runner.
//
// ADAPTER SELECTION:
// wgpu's default `request_adapter` uses power preference heuristics that
// may grab llvmpipe/softpipe where the software renderer appears as a valid
// Vulkan device. We enumerate explicitly and reject anything with
// DeviceType::Cpu — timing a software rasterizer would be meaningless.
//
// This is a one-time, process-lifetime initialization. There is no
// re-initialization path: a lost device fails the run.

use std::fmt;

use crate::error::BenchError;

/// Cached adapter information for logging and diagnostics.
#[derive(Debug, Clone)]
pub struct AdapterInfo {
    pub name: String,
    pub device_type: wgpu::DeviceType,
    pub backend: wgpu::Backend,
}

impl fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:?}, {:?})",
            self.name, self.backend, self.device_type
        )
    }
}

/// The core GPU context: device, queue, and timing metadata.
///
/// Create one via [`GpuContext::new`] and hold it for the lifetime of the
/// process — it is expensive to create and every pipeline and dispatch
/// borrows it. The context is the only state shared across runner
/// invocations.
///
/// # Field drop order
/// Rust drops struct fields in declaration order (top → bottom).
/// `_instance` is declared last so the `wgpu::Instance` outlives `device`
/// and `queue`; some Vulkan layers crash if the instance is destroyed while
/// device-level objects still reference it.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: AdapterInfo,
    /// Nanoseconds per timestamp tick, as reported by the queue. Multiplied
    /// into raw tick deltas to produce wall-clock GPU time.
    pub timestamp_period: f32,
    /// Keeps the `wgpu::Instance` alive until `device` and `queue` are
    /// dropped. Never accessed directly.
    _instance: wgpu::Instance,
}

impl GpuContext {
    /// Create a `GpuContext` on the first non-CPU Vulkan adapter.
    ///
    /// # Errors
    /// `NoSuitableAdapter` if only software renderers are visible,
    /// `TimestampsUnsupported` if the adapter cannot time dispatches, and
    /// `DeviceRequest` if the device request itself fails.
    pub fn new() -> Result<Self, BenchError> {
        pollster::block_on(Self::init_async())
    }

    async fn init_async() -> Result<Self, BenchError> {
        // Validation layer in debug builds for shader error feedback.
        let flags = if cfg!(debug_assertions) {
            wgpu::InstanceFlags::VALIDATION
        } else {
            wgpu::InstanceFlags::empty()
        };

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::VULKAN,
            flags,
            ..Default::default()
        });

        let adapters = instance.enumerate_adapters(wgpu::Backends::VULKAN);
        if adapters.is_empty() {
            return Err(BenchError::NoSuitableAdapter);
        }
        for a in &adapters {
            let info = a.get_info();
            eprintln!(
                "[tilebench] Vulkan adapter: {} ({:?}, {:?})",
                info.name, info.backend, info.device_type
            );
        }

        // First adapter that is not a software rasterizer. Discrete GPUs
        // enumerate before integrated ones on every driver we care about,
        // so "first non-CPU" lands on the dedicated card when present.
        let adapter = adapters
            .into_iter()
            .find(|a| a.get_info().device_type != wgpu::DeviceType::Cpu)
            .ok_or(BenchError::NoSuitableAdapter)?;

        let raw_info = adapter.get_info();
        let adapter_info = AdapterInfo {
            name: raw_info.name.clone(),
            device_type: raw_info.device_type,
            backend: raw_info.backend,
        };

        // Minimum feature requirement: without timestamp queries there is
        // nothing to measure.
        if !adapter.features().contains(wgpu::Features::TIMESTAMP_QUERY) {
            return Err(BenchError::TimestampsUnsupported {
                adapter: raw_info.name,
            });
        }

        // wgpu's default limits cap workgroups at 256 invocations; the
        // 32×32 kernel variant needs 1024. Desktop Vulkan drivers report at
        // least 1024, so a refusal here means the adapter genuinely cannot
        // run the largest variant and the device request fails.
        let limits = wgpu::Limits {
            max_compute_invocations_per_workgroup: 1024,
            ..wgpu::Limits::default()
        };

        let (device, queue): (wgpu::Device, wgpu::Queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("tilebench"),
                    required_features: wgpu::Features::TIMESTAMP_QUERY,
                    required_limits: limits,
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(BenchError::DeviceRequest)?;

        let timestamp_period = queue.get_timestamp_period();

        Ok(GpuContext {
            device,
            queue,
            adapter_info,
            timestamp_period,
            _instance: instance,
        })
    }
}

impl fmt::Display for GpuContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GpuContext {{ adapter: {}, timestamp period: {} ns/tick }}",
            self.adapter_info, self.timestamp_period
        )
    }
}

/// Workgroups needed to cover a `width × height` image with square
/// `tile`-sized groups.
///
/// Ceiling division: extents that are exact multiples of `tile` get exactly
/// `extent / tile` groups; anything else gets one extra partial group per
/// axis. The kernel guards the out-of-range texels, so a partial group
/// contributes only its in-range samples.
pub fn dispatch_size(width: u32, height: u32, tile: u32) -> (u32, u32) {
    ((width + tile - 1) / tile, (height + tile - 1) / tile)
}
