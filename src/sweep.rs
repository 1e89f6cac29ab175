// sweep.rs — texture-size × thread-group-size sweep driver.
//
// Fixed tables, no configuration surface: five square texture sizes, three
// thread-group sizes, ten timed dispatches per combination. The report
// keeps the maximum of the per-run maxima and the summed GPU time; the
// per-run times are printed as they arrive.
//
// Nothing persists between combinations except the shared GpuContext. A
// fresh pipeline is built per combination (the kernel encodes the
// thread-group dimensions), and the runner waits for full completion
// before each reuse, so runs never overlap.

use std::path::Path;

use rand::Rng;

use crate::device::GpuContext;
use crate::error::BenchError;
use crate::pipeline::TilePipeline;
use crate::run::{self, RunRecord};
use crate::shader::{KernelSet, KernelVariant};

/// Texture extents measured by the fixed sweep.
pub const TEXTURE_SIZES: [(u32, u32); 5] = [
    (64, 64),
    (128, 128),
    (256, 256),
    (512, 512),
    (1024, 1024),
];

/// Thread-group sizes measured by the fixed sweep.
pub const TILE_SIZES: [u32; 3] = [8, 16, 32];

/// Timed dispatches per (texture, tile) combination.
pub const RUNS_PER_CONFIG: usize = 10;

/// Aggregated result for one (texture size, tile size) combination.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRecord {
    pub width: u32,
    pub height: u32,
    /// Requested thread-group size (may differ from `variant` only when the
    /// caller asked for an unsupported size and got the 16×16 fallback).
    pub tile: u32,
    pub variant: KernelVariant,
    /// Maximum of the per-run maxima.
    pub max_value: u32,
    /// Sum of the per-run GPU times.
    pub total_gpu_time_ms: f64,
}

/// Run the full fixed sweep, printing the per-configuration report.
pub fn run_sweep<R: Rng>(
    ctx: &GpuContext,
    kernels: &KernelSet,
    rng: &mut R,
    dump_path: &Path,
) -> Result<Vec<SweepRecord>, BenchError> {
    let mut records = Vec::with_capacity(TEXTURE_SIZES.len() * TILE_SIZES.len());
    for &(width, height) in &TEXTURE_SIZES {
        println!("Texture Size: {width}x{height}");
        for &tile in &TILE_SIZES {
            println!("Thread Group Size: {tile}x{tile}");
            records.push(run_config(ctx, kernels, width, height, tile, rng, dump_path)?);
            println!("----------------------------------------------------");
        }
    }
    Ok(records)
}

/// Run one (texture size, tile size) combination: build the pipeline for
/// the matching kernel variant and dispatch it `RUNS_PER_CONFIG` times.
pub fn run_config<R: Rng>(
    ctx: &GpuContext,
    kernels: &KernelSet,
    width: u32,
    height: u32,
    tile: u32,
    rng: &mut R,
    dump_path: &Path,
) -> Result<SweepRecord, BenchError> {
    let variant = KernelVariant::for_tile(tile);
    let pipeline = TilePipeline::new(ctx, kernels.get(variant), variant)?;

    let mut max_value = 0u32;
    let mut total_gpu_time_ms = 0.0;
    for _ in 0..RUNS_PER_CONFIG {
        let RunRecord {
            max_value: run_max,
            gpu_time_ms,
        } = run::run_once(ctx, &pipeline, width, height, rng, dump_path)?;
        println!("GPU Time: {gpu_time_ms} ms");
        max_value = max_value.max(run_max);
        total_gpu_time_ms += gpu_time_ms;
    }
    println!("Final Max Value: {max_value}");

    Ok(SweepRecord {
        width,
        height,
        tile,
        variant,
        max_value,
        total_gpu_time_ms,
    })
}
