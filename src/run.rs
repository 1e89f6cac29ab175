// run.rs — dispatch-and-readback runner.
//
// One invocation is one full GPU round trip:
//   1. fresh command encoder (wgpu recycles allocator state internally)
//   2. random image → staging buffer → R8Uint texture
//   3. per-tile maxima buffer + readback buffer + timestamp query set
//   4. compute pass with begin/end timestamps, one dispatch
//   5. copy maxima and resolved timestamps to host-visible buffers
//   6. submit, bounded wait, map, reduce on the CPU
//
// Every GPU resource is created fresh inside the invocation and dropped
// when it returns; the only state shared across runs is the GpuContext.
// The CPU waits for full completion before the next run, so consecutive
// runs never overlap on the GPU timeline.
//
// Resource creation in wgpu does not return Results — validation failures
// surface through error scopes. Each resource here is created inside its
// own scope so a failure names the resource that caused it.

use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use rand::Rng;
use wgpu::util::DeviceExt;

use crate::device::{dispatch_size, GpuContext};
use crate::error::BenchError;
use crate::input;
use crate::pipeline::TilePipeline;

/// Upper bound on the CPU-side wait for GPU completion. A hung GPU
/// surfaces as `GpuTimeout` instead of blocking the process forever.
pub const GPU_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// wgpu requires buffer→texture copies to use a row pitch that is a
/// multiple of this value; staging rows are padded up to it.
const COPY_ALIGNMENT: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

/// Result of a single dispatch: the reduced maximum and the GPU-measured
/// kernel time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunRecord {
    /// Maximum over the per-tile maxima. For [0, 100) inputs this is
    /// always in [0, 99].
    pub max_value: u32,
    /// Wall-clock time between the pass-begin and pass-end timestamps.
    pub gpu_time_ms: f64,
}

/// Create one wgpu object inside a validation error scope, converting any
/// popped error into `ResourceCreation` naming the resource.
fn checked<T>(
    device: &wgpu::Device,
    what: &'static str,
    create: impl FnOnce() -> T,
) -> Result<T, BenchError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(BenchError::ResourceCreation {
            what,
            detail: err.to_string(),
        }),
        None => Ok(value),
    }
}

/// Round `value` up to the next multiple of `alignment`.
#[inline]
pub(crate) fn align_to(value: u32, alignment: u32) -> u32 {
    (value + alignment - 1) / alignment * alignment
}

/// Copy tightly packed rows into a 256-aligned staging layout.
fn build_staging(pixels: &[u8], width: u32, height: u32, aligned_bytes_per_row: u32) -> Vec<u8> {
    let mut staging = vec![0u8; (aligned_bytes_per_row * height) as usize];
    for y in 0..height as usize {
        let src_start = y * width as usize;
        let dst_start = y * aligned_bytes_per_row as usize;
        staging[dst_start..dst_start + width as usize]
            .copy_from_slice(&pixels[src_start..src_start + width as usize]);
    }
    staging
}

/// Run the tile-max kernel once over a fresh random image.
///
/// `rng` drives the input samples (seed it for reproducible pixels);
/// `dump_path` receives the row-major text dump of the image before upload.
pub fn run_once<R: Rng>(
    ctx: &GpuContext,
    pipeline: &TilePipeline,
    width: u32,
    height: u32,
    rng: &mut R,
    dump_path: &Path,
) -> Result<RunRecord, BenchError> {
    let tile = pipeline.variant.tile();
    let (groups_x, groups_y) = dispatch_size(width, height, tile);
    // Ceiling grid, so edge workgroups on non-multiple extents have a slot.
    let n_tiles = groups_x as u64 * groups_y as u64;
    let maxima_bytes = n_tiles * std::mem::size_of::<u32>() as u64;
    let timestamp_bytes = 2 * std::mem::size_of::<u64>() as u64;

    let pixels = input::generate_pixels(rng, width, height);
    input::write_debug_dump(dump_path, width, &pixels)?;

    // --- Input texture + staging upload ---
    let extent = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = checked(&ctx.device, "input texture", || {
        ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tilebench input"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            // R8Uint: the kernel reads raw integer samples, not normalised
            // floats — max() over [0, 99] must stay exact.
            format: wgpu::TextureFormat::R8Uint,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    })?;
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let aligned_bytes_per_row = align_to(width, COPY_ALIGNMENT);
    let staging = build_staging(&pixels, width, height, aligned_bytes_per_row);
    let staging_buf = checked(&ctx.device, "upload staging buffer", || {
        ctx.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("tilebench staging"),
                contents: &staging,
                usage: wgpu::BufferUsages::COPY_SRC,
            })
    })?;

    // --- Output + timing resources ---
    let maxima_buf = checked(&ctx.device, "tile maxima buffer", || {
        ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tilebench maxima"),
            size: maxima_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    })?;
    let readback_buf = checked(&ctx.device, "maxima readback buffer", || {
        ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tilebench readback"),
            size: maxima_bytes,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    })?;
    let query_set = checked(&ctx.device, "timestamp query set", || {
        ctx.device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("tilebench timestamps"),
            ty: wgpu::QueryType::Timestamp,
            count: 2,
        })
    })?;
    let ts_resolve_buf = checked(&ctx.device, "timestamp resolve buffer", || {
        ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tilebench ts resolve"),
            size: timestamp_bytes,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    })?;
    let ts_readback_buf = checked(&ctx.device, "timestamp readback buffer", || {
        ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tilebench ts readback"),
            size: timestamp_bytes,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    })?;

    let bind_group = checked(&ctx.device, "bind group", || {
        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tilebench BG"),
            layout: &pipeline.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: maxima_buf.as_entire_binding(),
                },
            ],
        })
    })?;

    // --- Record: upload, timestamped dispatch, drain ---
    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tilebench run"),
        });

    encoder.copy_buffer_to_texture(
        wgpu::ImageCopyBuffer {
            buffer: &staging_buf,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(aligned_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        extent,
    );

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("tile_max"),
            timestamp_writes: Some(wgpu::ComputePassTimestampWrites {
                query_set: &query_set,
                beginning_of_pass_write_index: Some(0),
                end_of_pass_write_index: Some(1),
            }),
        });
        pass.set_pipeline(&pipeline.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(groups_x, groups_y, 1);
    }

    encoder.resolve_query_set(&query_set, 0..2, &ts_resolve_buf, 0);
    encoder.copy_buffer_to_buffer(&maxima_buf, 0, &readback_buf, 0, maxima_bytes);
    encoder.copy_buffer_to_buffer(&ts_resolve_buf, 0, &ts_readback_buf, 0, timestamp_bytes);

    ctx.queue.submit(std::iter::once(encoder.finish()));

    // --- Bounded wait for both readbacks ---
    let maxima_slice = readback_buf.slice(..);
    let ts_slice = ts_readback_buf.slice(..);
    let (tx, rx) = mpsc::channel();
    let tx_ts = tx.clone();
    maxima_slice.map_async(wgpu::MapMode::Read, move |r| {
        let _ = tx.send(r);
    });
    ts_slice.map_async(wgpu::MapMode::Read, move |r| {
        let _ = tx_ts.send(r);
    });
    wait_for_maps(&ctx.device, &rx, 2)?;

    // --- Reduce ---
    let mapped = maxima_slice.get_mapped_range();
    let maxima: &[u32] = bytemuck::cast_slice(&mapped);
    let max_value = maxima.iter().copied().max().unwrap_or(0);
    drop(mapped);
    readback_buf.unmap();

    let mapped = ts_slice.get_mapped_range();
    let ticks: &[u64] = bytemuck::cast_slice(&mapped);
    // Wrapping: some drivers let the counter roll over between samples.
    let elapsed_ticks = ticks[1].wrapping_sub(ticks[0]);
    drop(mapped);
    ts_readback_buf.unmap();

    let gpu_time_ms = elapsed_ticks as f64 * ctx.timestamp_period as f64 / 1_000_000.0;

    Ok(RunRecord {
        max_value,
        gpu_time_ms,
    })
}

/// Poll the device until `expected` map callbacks have fired, failing with
/// `GpuTimeout` once `GPU_WAIT_TIMEOUT` elapses.
fn wait_for_maps(
    device: &wgpu::Device,
    rx: &mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>,
    expected: usize,
) -> Result<(), BenchError> {
    let started = Instant::now();
    let mut done = 0;
    while done < expected {
        device.poll(wgpu::Maintain::Poll);
        match rx.recv_timeout(Duration::from_millis(1)) {
            Ok(Ok(())) => done += 1,
            Ok(Err(e)) => return Err(BenchError::ReadbackMap(e)),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if started.elapsed() >= GPU_WAIT_TIMEOUT {
                    return Err(BenchError::GpuTimeout {
                        waited: started.elapsed(),
                    });
                }
            }
            // Callbacks dropped without firing: the device is gone.
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(BenchError::GpuTimeout {
                    waited: started.elapsed(),
                })
            }
        }
    }
    Ok(())
}
