// input.rs — random input generation and the row-major debug dump.
//
// Every run consumes a fresh width×height byte image with uniform-random
// samples in [0, 100). The caller supplies the RNG so tests can seed it;
// the binary uses `rand::thread_rng()`.
//
// Before upload, the image is written to a plain-text side file: row-major,
// each value followed by a single space, newline at the end of each row.
// One fixed path, overwritten every run — later runs clobber earlier dumps
// (a deliberate choice, see DESIGN.md).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::Rng;

use crate::error::BenchError;

/// Exclusive upper bound for random input samples. Values span [0, 100).
pub const MAX_RANDOM_VALUE: u8 = 100;

/// Generate a tightly packed (stride == width) row-major byte image with
/// uniform-random values in `[0, MAX_RANDOM_VALUE)`.
pub fn generate_pixels<R: Rng>(rng: &mut R, width: u32, height: u32) -> Vec<u8> {
    let n = width as usize * height as usize;
    (0..n).map(|_| rng.gen_range(0..MAX_RANDOM_VALUE)).collect()
}

/// Write the input image as decimal text, one row per line.
pub fn write_debug_dump(path: &Path, width: u32, pixels: &[u8]) -> Result<(), BenchError> {
    debug_assert_eq!(pixels.len() % width as usize, 0);
    let dump_err = |source: std::io::Error| BenchError::DumpWrite {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(dump_err)?;
    let mut out = BufWriter::new(file);
    for (i, px) in pixels.iter().enumerate() {
        write!(out, "{px} ").map_err(dump_err)?;
        if (i + 1) % width as usize == 0 {
            writeln!(out).map_err(dump_err)?;
        }
    }
    out.flush().map_err(dump_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_pixels_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let pixels = generate_pixels(&mut rng, 128, 64);
        assert_eq!(pixels.len(), 128 * 64);
        assert!(pixels.iter().all(|&p| p < MAX_RANDOM_VALUE));
    }

    #[test]
    fn test_generate_pixels_deterministic_with_seed() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(generate_pixels(&mut a, 64, 64), generate_pixels(&mut b, 64, 64));
    }

    #[test]
    fn test_generate_pixels_varies_across_seeds() {
        let mut a = StdRng::seed_from_u64(1);
        let mut b = StdRng::seed_from_u64(2);
        assert_ne!(generate_pixels(&mut a, 64, 64), generate_pixels(&mut b, 64, 64));
    }

    #[test]
    fn test_dump_format_row_major() {
        // 3×2 image: rows "1 2 3" and "97 0 45", trailing space per value.
        let path = std::env::temp_dir().join("tilebench_dump_format.txt");
        write_debug_dump(&path, 3, &[1, 2, 3, 97, 0, 45]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "1 2 3 \n97 0 45 \n");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_dump_overwrites_previous_run() {
        let path = std::env::temp_dir().join("tilebench_dump_overwrite.txt");
        write_debug_dump(&path, 2, &[9, 9]).unwrap();
        write_debug_dump(&path, 2, &[1, 1]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "1 1 \n");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_dump_unwritable_path_is_an_error() {
        let path = std::env::temp_dir().join("tilebench_missing_dir/dump.txt");
        let err = write_debug_dump(&path, 1, &[0]).unwrap_err();
        assert!(matches!(err, BenchError::DumpWrite { .. }));
    }
}
