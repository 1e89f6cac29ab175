// benches/sweep_bench.rs — criterion wrapper around the dispatch runner.
//
// Requires a Vulkan GPU with timestamp queries:
//   cargo bench --bench sweep_bench
//
// Criterion measures wall time including CPU overhead (buffer creation,
// staging copy, submit, poll) on top of the kernel itself — the same
// end-to-end cost the sweep driver pays per run. The GPU-side time alone
// is what the harness's own timestamp report covers; this bench exists to
// watch the host-side orchestration cost.
//
// Warmup matters: the first iterations pay lazy pipeline compilation on
// some drivers, so warmup time is set explicitly.

use std::path::Path;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use tilebench::device::GpuContext;
use tilebench::pipeline::TilePipeline;
use tilebench::run;
use tilebench::shader::{KernelSet, KernelVariant};

fn bench_run_once(c: &mut Criterion) {
    let ctx = GpuContext::new().expect("no Vulkan GPU");
    let kernels = KernelSet::load(Path::new("shaders")).expect("kernel files");
    let dump = std::env::temp_dir().join("tilebench_bench_dump.txt");
    let mut rng = rand::thread_rng();

    let mut group = c.benchmark_group("run_once");
    group.warm_up_time(Duration::from_secs(2));

    for &tile in &[8u32, 16, 32] {
        let variant = KernelVariant::for_tile(tile);
        let pipeline =
            TilePipeline::new(&ctx, kernels.get(variant), variant).expect("pipeline");
        group.bench_with_input(BenchmarkId::new("512x512", tile), &tile, |b, _| {
            b.iter(|| {
                run::run_once(&ctx, &pipeline, 512, 512, &mut rng, &dump).expect("run failed")
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_run_once);
criterion_main!(benches);
