//! Octree colour quantization.
//!
//! A bitmap is scanned once into a colour index and an adaptive octree, after which
//! it can be reduced to any number of colour counts. Each count yields a recoloured
//! image and a palette image. Decoding and encoding image files is left to the caller.
//!
//! ```no_run
//! use octoquant::{Bitmap, Quantizer, QuantizerConfig};
//!
//! # fn main() -> octoquant::Result<()> {
//! let bitmap = Bitmap::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255])?;
//! let mut quantizer = Quantizer::scan(&bitmap, QuantizerConfig::default())?;
//! let reduction = quantizer.reduce(1)?;
//! assert_eq!(reduction.colors, 1);
//! # Ok(())
//! # }
//! ```

pub mod bitmap;
pub mod color;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod hash_map;
pub mod oct_tree;
pub mod priority_queue;
pub mod quantizer;

pub use bitmap::Bitmap;
pub use color::{Color, Vector3};
pub use config::QuantizerConfig;
pub use dispatch::{dispatch, quantize_to_sink, DispatchReport, OutputSink};
pub use error::{QuantizeError, Result};
pub use quantizer::{ColorIndex, ColorRecord, Quantizer, Reduction};
