// tilebench — GPU tile-max micro-benchmark harness.
//
// Measures compute-shader throughput for a per-workgroup max reduction
// over a random 8-bit image, sweeping texture sizes × thread-group sizes
// with GPU timestamp queries around each dispatch.
//
// Per run:
//   random [0,100) image → staging upload → R8Uint texture
//     → tile_max kernel (one u32 maximum per workgroup tile)
//     → readback → CPU max + timestamp delta in milliseconds

pub mod device;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod run;
pub mod shader;
pub mod sweep;
