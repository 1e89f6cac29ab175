// main.rs — fixed sweep entry point.
//
// Kernel files load before any GPU work: a missing or unreadable shader is
// the one failure reported purely via stderr + exit code, with the GPU
// never touched. Everything after that propagates typed errors up to here.

use std::path::Path;
use std::process::ExitCode;

use tilebench::device::GpuContext;
use tilebench::error::BenchError;
use tilebench::shader::KernelSet;
use tilebench::sweep;

const DEFAULT_SHADER_DIR: &str = "shaders";
const DUMP_PATH: &str = "texture_dump.txt";

fn main() -> ExitCode {
    let shader_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SHADER_DIR.to_string());

    let kernels = match KernelSet::load(Path::new(&shader_dir)) {
        Ok(kernels) => kernels,
        Err(e) => {
            eprintln!("[tilebench] {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&kernels) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[tilebench] {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(kernels: &KernelSet) -> Result<(), BenchError> {
    let ctx = GpuContext::new()?;
    eprintln!("[tilebench] using adapter: {}", ctx.adapter_info);
    let mut rng = rand::thread_rng();
    sweep::run_sweep(&ctx, kernels, &mut rng, Path::new(DUMP_PATH))?;
    Ok(())
}
