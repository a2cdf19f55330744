//! Conversion pipeline driving the usdzcrate libraries
//!
//! [`convert`] turns a 3MF or OBJ file into a normalized USDZ preview:
//! load, simplify, normalize, serialize, package. [`emit_cube`] and
//! [`emit_blocks`] write the fixed cube assets.

pub mod blocks;
pub mod pipeline;

pub use blocks::*;
pub use pipeline::*;
