// error.rs — crate-wide error type.
//
// One enum covering every failure the harness can hit, in rough pipeline
// order: device/queue initialization, shader loading and compilation,
// pipeline construction, per-run resource creation, the debug dump, and the
// GPU wait. Initialization errors are fatal and reported once at the top
// level (main.rs); there are no retries anywhere.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub enum BenchError {
    /// No Vulkan adapter left after filtering out CPU/software renderers.
    NoSuitableAdapter,
    /// Adapter found, but it does not expose timestamp queries — the harness
    /// cannot measure anything without them.
    TimestampsUnsupported { adapter: String },
    /// wgpu device request failed (driver issue, unsupported limits, ...).
    DeviceRequest(wgpu::RequestDeviceError),
    /// Kernel file could not be opened or fully read.
    ShaderIo { path: PathBuf, source: io::Error },
    /// Kernel source failed WGSL validation (or was not valid UTF-8).
    /// `detail` carries the compiler diagnostic.
    ShaderCompile { label: String, detail: String },
    /// Bind-group layout or compute pipeline creation failed.
    PipelineCreation { label: String, detail: String },
    /// A per-run GPU resource failed validation; `what` names the resource.
    ResourceCreation { what: &'static str, detail: String },
    /// The debug text dump of the input image could not be written.
    DumpWrite { path: PathBuf, source: io::Error },
    /// Mapping a readback buffer failed after submission completed.
    ReadbackMap(wgpu::BufferAsyncError),
    /// The GPU did not signal completion within the bounded wait.
    GpuTimeout { waited: Duration },
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchError::NoSuitableAdapter => write!(
                f,
                "no suitable Vulkan adapter found (only CPU/software renderers visible)"
            ),
            BenchError::TimestampsUnsupported { adapter } => write!(
                f,
                "adapter '{adapter}' does not support timestamp queries"
            ),
            BenchError::DeviceRequest(e) => write!(f, "device request failed: {e}"),
            BenchError::ShaderIo { path, source } => write!(
                f,
                "failed to read kernel file {}: {source}",
                path.display()
            ),
            BenchError::ShaderCompile { label, detail } => {
                write!(f, "kernel '{label}' failed to compile: {detail}")
            }
            BenchError::PipelineCreation { label, detail } => {
                write!(f, "pipeline for kernel '{label}' failed to build: {detail}")
            }
            BenchError::ResourceCreation { what, detail } => {
                write!(f, "failed to create {what}: {detail}")
            }
            BenchError::DumpWrite { path, source } => write!(
                f,
                "failed to write debug dump {}: {source}",
                path.display()
            ),
            BenchError::ReadbackMap(e) => write!(f, "readback buffer map failed: {e}"),
            BenchError::GpuTimeout { waited } => write!(
                f,
                "GPU did not complete within {:.1}s — device hung or lost",
                waited.as_secs_f64()
            ),
        }
    }
}

impl std::error::Error for BenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BenchError::DeviceRequest(e) => Some(e),
            BenchError::ShaderIo { source, .. } => Some(source),
            BenchError::DumpWrite { source, .. } => Some(source),
            BenchError::ReadbackMap(e) => Some(e),
            _ => None,
        }
    }
}
