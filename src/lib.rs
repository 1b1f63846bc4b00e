//! Decode PMX models and export them as Wavefront OBJ/MTL.
//!
//! [`Model::decode`] reads the header, model info, vertices, faces, textures and
//! materials of an in-memory PMX 2.x file. Bones and every later section are left
//! undecoded. [`ObjWriter`] turns the result into an OBJ mesh plus its material library.
//!
//! ```rust,no_run
//! use pmx2obj::{ExportConfig, Model, ObjWriter};
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("miku.pmx")?;
//! let model = Model::decode(&data)?;
//! ObjWriter::new(&model, ExportConfig::default()).write_files(".".as_ref(), "miku")?;
//! # Ok(())
//! # }
//! ```

mod binary_reader;
#[cfg(test)]
mod binary_writer;
pub mod error;
pub mod model;
pub mod obj_writer;
/// Section by section decoding, for callers that only need the first sections.
pub mod reader;
pub mod types;

pub use error::{DecodeError, ExportError};
pub use model::Model;
pub use obj_writer::{ExportConfig, ObjWriter};
