// pipeline.rs — bind-group layout and compute pipeline construction.
//
// The binding contract is fixed across every kernel variant:
//   binding 0 — read-only 2D texture, u32 samples (R8Uint view of the input)
//   binding 1 — read-write storage buffer, one u32 per workgroup tile
//
// One `TilePipeline` is built per thread-group variant (the workgroup size
// is baked into the kernel) and reused across all dispatches for that
// variant. Layout and pipeline objects are immutable after construction.

use std::num::NonZeroU64;

use crate::device::GpuContext;
use crate::error::BenchError;
use crate::shader::{self, KernelBlob, KernelVariant};

/// A compiled (layout, kernel) pair for one thread-group variant.
#[derive(Debug)]
pub struct TilePipeline {
    pub variant: KernelVariant,
    pub pipeline: wgpu::ComputePipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl TilePipeline {
    /// Compile `blob` and build the pipeline for `variant`.
    ///
    /// Shader diagnostics surface as `ShaderCompile`; layout or pipeline
    /// validation failures surface as `PipelineCreation`, both carrying the
    /// backend's diagnostic text.
    pub fn new(
        ctx: &GpuContext,
        blob: &KernelBlob,
        variant: KernelVariant,
    ) -> Result<Self, BenchError> {
        let module = shader::compile(&ctx.device, blob)?;

        ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("tilebench BGL"),
                    entries: &[
                        // 0 — input image
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Texture {
                                multisampled: false,
                                view_dimension: wgpu::TextureViewDimension::D2,
                                sample_type: wgpu::TextureSampleType::Uint,
                            },
                            count: None,
                        },
                        // 1 — per-tile maxima (storage read_write)
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Storage { read_only: false },
                                has_dynamic_offset: false,
                                min_binding_size: NonZeroU64::new(4),
                            },
                            count: None,
                        },
                    ],
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("tilebench pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    push_constant_ranges: &[],
                });

        let pipeline = ctx
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(blob.label.as_str()),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: shader::ENTRY_POINT,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            });

        if let Some(err) = pollster::block_on(ctx.device.pop_error_scope()) {
            return Err(BenchError::PipelineCreation {
                label: blob.label.clone(),
                detail: err.to_string(),
            });
        }

        Ok(TilePipeline {
            variant,
            pipeline,
            bind_group_layout,
        })
    }
}
