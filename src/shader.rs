// shader.rs — kernel variants and the shader loader.
//
// The tile-max kernel exists in three variants, one per thread-group size,
// because the workgroup dimensions are baked into each WGSL file. The
// loader treats kernel files as opaque bytes; validation happens only when
// a variant is compiled against the device. No caching — every load
// re-reads the file and every compile revalidates the source.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BenchError;

/// Entry point shared by every kernel variant.
pub const ENTRY_POINT: &str = "tile_max";

/// The kernel variants shipped with the harness, keyed by thread-group size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelVariant {
    Tile8,
    Tile16,
    Tile32,
}

impl KernelVariant {
    pub const ALL: [KernelVariant; 3] =
        [KernelVariant::Tile8, KernelVariant::Tile16, KernelVariant::Tile32];

    /// Select the variant for a requested thread-group size.
    ///
    /// 8, 16 and 32 map to their exact variants; any other value falls back
    /// to the 16×16 variant. The fallback is intentional, not an error.
    pub fn for_tile(tile: u32) -> Self {
        match tile {
            8 => KernelVariant::Tile8,
            16 => KernelVariant::Tile16,
            32 => KernelVariant::Tile32,
            _ => KernelVariant::Tile16,
        }
    }

    /// Thread-group edge length baked into this variant's kernel.
    pub fn tile(self) -> u32 {
        match self {
            KernelVariant::Tile8 => 8,
            KernelVariant::Tile16 => 16,
            KernelVariant::Tile32 => 32,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            KernelVariant::Tile8 => "tile_max_8x8.wgsl",
            KernelVariant::Tile16 => "tile_max_16x16.wgsl",
            KernelVariant::Tile32 => "tile_max_32x32.wgsl",
        }
    }

    pub fn path(self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

impl std::fmt::Display for KernelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{0}x{0}", self.tile())
    }
}

/// Opaque kernel bytes as read from disk, plus the file name for
/// diagnostics. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelBlob {
    pub label: String,
    bytes: Vec<u8>,
}

impl KernelBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Read a kernel file fully into an opaque blob.
///
/// Two loads of the same unchanged path return byte-identical blobs.
pub fn load_kernel(path: &Path) -> Result<KernelBlob, BenchError> {
    let bytes = fs::read(path).map_err(|source| BenchError::ShaderIo {
        path: path.to_path_buf(),
        source,
    })?;
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(KernelBlob { label, bytes })
}

/// Compile a kernel blob into a shader module, surfacing WGSL diagnostics.
///
/// wgpu reports shader validation failures through error scopes rather than
/// a Result, so the module is created inside a validation scope and the
/// popped error (if any) becomes `ShaderCompile` with the compiler's text.
pub fn compile(
    device: &wgpu::Device,
    blob: &KernelBlob,
) -> Result<wgpu::ShaderModule, BenchError> {
    let source = std::str::from_utf8(blob.as_bytes()).map_err(|e| BenchError::ShaderCompile {
        label: blob.label.clone(),
        detail: format!("kernel bytes are not valid UTF-8: {e}"),
    })?;

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&blob.label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(BenchError::ShaderCompile {
            label: blob.label.clone(),
            detail: err.to_string(),
        });
    }
    Ok(module)
}

/// All three kernel variants, loaded up front so a missing file aborts the
/// run before any GPU work begins.
#[derive(Debug)]
pub struct KernelSet {
    tile8: KernelBlob,
    tile16: KernelBlob,
    tile32: KernelBlob,
}

impl KernelSet {
    pub fn load(dir: &Path) -> Result<Self, BenchError> {
        Ok(KernelSet {
            tile8: load_kernel(&KernelVariant::Tile8.path(dir))?,
            tile16: load_kernel(&KernelVariant::Tile16.path(dir))?,
            tile32: load_kernel(&KernelVariant::Tile32.path(dir))?,
        })
    }

    pub fn get(&self, variant: KernelVariant) -> &KernelBlob {
        match variant {
            KernelVariant::Tile8 => &self.tile8,
            KernelVariant::Tile16 => &self.tile16,
            KernelVariant::Tile32 => &self.tile32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_tile_exact_matches() {
        assert_eq!(KernelVariant::for_tile(8), KernelVariant::Tile8);
        assert_eq!(KernelVariant::for_tile(16), KernelVariant::Tile16);
        assert_eq!(KernelVariant::for_tile(32), KernelVariant::Tile32);
    }

    #[test]
    fn test_for_tile_falls_back_to_16() {
        for tile in [0u32, 1, 4, 7, 9, 24, 64, 1000] {
            assert_eq!(
                KernelVariant::for_tile(tile),
                KernelVariant::Tile16,
                "tile {tile} should fall back to the 16x16 variant"
            );
        }
    }

    #[test]
    fn test_variant_tile_round_trip() {
        for v in KernelVariant::ALL {
            assert_eq!(KernelVariant::for_tile(v.tile()), v);
        }
    }

    #[test]
    fn test_variant_display() {
        assert_eq!(KernelVariant::Tile8.to_string(), "8x8");
        assert_eq!(KernelVariant::Tile32.to_string(), "32x32");
    }

    #[test]
    fn test_variant_paths_are_distinct() {
        let dir = Path::new("shaders");
        let mut paths: Vec<_> = KernelVariant::ALL.iter().map(|v| v.path(dir)).collect();
        paths.dedup();
        assert_eq!(paths.len(), 3);
    }

    #[test]
    fn test_load_kernel_missing_file() {
        let path = std::env::temp_dir().join("tilebench_no_such_kernel.wgsl");
        let err = load_kernel(&path).unwrap_err();
        match err {
            BenchError::ShaderIo { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected ShaderIo, got: {other}"),
        }
    }

    #[test]
    fn test_load_kernel_idempotent() {
        let path = std::env::temp_dir().join("tilebench_idempotent_kernel.wgsl");
        std::fs::write(&path, b"// not a real kernel\n").unwrap();
        let a = load_kernel(&path).unwrap();
        let b = load_kernel(&path).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.label, "tilebench_idempotent_kernel.wgsl");
        std::fs::remove_file(&path).ok();
    }
}
