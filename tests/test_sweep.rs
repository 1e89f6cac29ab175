// tests/test_sweep.rs — sweep scenarios through the public API.
//
// The GPU-dependent test at the bottom is #[ignore]d; run it on a machine
// with a Vulkan GPU via `cargo test --test test_sweep -- --include-ignored`.

use std::path::Path;

use tilebench::device::dispatch_size;
use tilebench::input::{generate_pixels, write_debug_dump, MAX_RANDOM_VALUE};
use tilebench::sweep::{RUNS_PER_CONFIG, TEXTURE_SIZES, TILE_SIZES};

#[test]
fn scenario_64x64_tile8_grid_and_buffer() {
    let (gx, gy) = dispatch_size(64, 64, 8);
    assert_eq!((gx, gy), (8, 8));
    assert_eq!(gx * gy, 64, "reduction buffer must hold 64 elements");
}

#[test]
fn scenario_1024x1024_tile32_grid_and_buffer() {
    let (gx, gy) = dispatch_size(1024, 1024, 32);
    assert_eq!((gx, gy), (32, 32));
    assert_eq!(gx * gy, 1024, "reduction buffer must hold 1024 elements");
}

#[test]
fn ceiling_grids_exceed_truncating_quotients_for_non_multiples() {
    let (gx, gy) = dispatch_size(100, 70, 16);
    assert!(gx > 100 / 16);
    assert!(gy > 70 / 16);
}

#[test]
fn sweep_tables_are_the_fixed_ones() {
    assert_eq!(
        TEXTURE_SIZES,
        [(64, 64), (128, 128), (256, 256), (512, 512), (1024, 1024)]
    );
    assert_eq!(TILE_SIZES, [8, 16, 32]);
    assert_eq!(RUNS_PER_CONFIG, 10);
}

#[test]
fn generated_input_stays_below_the_sample_bound() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    let mut rng = StdRng::seed_from_u64(0xDEAD);
    let pixels = generate_pixels(&mut rng, 256, 256);
    assert_eq!(pixels.len(), 256 * 256);
    assert!(pixels.iter().all(|&p| p < MAX_RANDOM_VALUE));
}

#[test]
fn debug_dump_round_trips_through_text() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    let mut rng = StdRng::seed_from_u64(5);
    let pixels = generate_pixels(&mut rng, 16, 4);
    let path = std::env::temp_dir().join("tilebench_integration_dump.txt");
    write_debug_dump(&path, 16, &pixels).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let parsed: Vec<u8> = text
        .split_whitespace()
        .map(|tok| tok.parse().unwrap())
        .collect();
    assert_eq!(parsed, pixels);
    assert_eq!(text.lines().count(), 4);
    std::fs::remove_file(&path).ok();
}

// ---- GPU integration -------------------------------------------------------

#[test]
#[ignore = "requires a real Vulkan GPU with timestamp queries"]
fn full_config_on_gpu_reports_in_range_maximum() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tilebench::device::GpuContext;
    use tilebench::shader::{KernelSet, KernelVariant};
    use tilebench::sweep::run_config;

    let ctx = GpuContext::new().expect("need a Vulkan GPU");
    let kernels = KernelSet::load(Path::new("shaders")).expect("kernel files");
    let mut rng = StdRng::seed_from_u64(11);
    let dump = std::env::temp_dir().join("tilebench_integration_gpu_dump.txt");

    let record = run_config(&ctx, &kernels, 64, 64, 8, &mut rng, &dump).expect("config run");
    assert_eq!(record.variant, KernelVariant::Tile8);
    assert_eq!((record.width, record.height, record.tile), (64, 64, 8));
    assert!(record.max_value < 100, "max {} out of range", record.max_value);
    assert!(record.total_gpu_time_ms >= 0.0);
}
