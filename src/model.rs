//! Whole-file decoding.

use crate::error::DecodeError;
use crate::reader::ModelInfoStage;
use crate::types::{Header, Material, ModelInfo, TextureList, Vertex};
use std::convert::TryFrom;
use tracing::{debug, info};

/// A decoded PMX model, up to and including the material section.
///
/// Only [`Model::decode`] builds one, and it checks before returning that
/// * the face index count is a multiple of 3
/// * every face index refers to an existing vertex
/// * every material covers a non-negative multiple of 3 face indices
/// * the materials together cover exactly all face indices
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    header: Header,
    model_info: ModelInfo,
    vertices: Vec<Vertex>,
    faces: Vec<u32>,
    textures: TextureList,
    materials: Vec<Material>,
}

impl Model {
    /// Decode header, model info, vertices, faces, textures and materials in file order.
    ///
    /// Any failure aborts the whole decode; there are no partial results.
    pub fn decode(data: &[u8]) -> Result<Model, DecodeError> {
        let stage = ModelInfoStage::new(data)?;
        let header = stage.get_header().clone();
        let (model_info, stage) = stage.read()?;
        let (vertices, stage) = stage.read()?;
        let (faces, stage) = stage.read()?;
        let (textures, stage) = stage.read()?;
        let (materials, done) = stage.read()?;
        if done.remaining() > 0 {
            debug!(
                position = done.position(),
                remaining = done.remaining(),
                "leaving bone and later sections undecoded"
            );
        }
        let model = Model {
            header,
            model_info,
            vertices,
            faces,
            textures,
            materials,
        };
        model.validate()?;
        info!(
            version = model.header.version,
            vertices = model.vertices.len(),
            triangles = model.faces.len() / 3,
            materials = model.materials.len(),
            "decoded PMX model"
        );
        Ok(model)
    }

    fn validate(&self) -> Result<(), DecodeError> {
        if self.faces.len() % 3 != 0 {
            return Err(DecodeError::IncompleteTriangle {
                index_count: self.faces.len(),
            });
        }
        let vertex_count = self.vertices.len();
        if let Some((face, &index)) = self
            .faces
            .iter()
            .enumerate()
            .find(|&(_, &index)| index as usize >= vertex_count)
        {
            return Err(DecodeError::FaceIndexOutOfRange {
                face,
                index,
                vertex_count,
            });
        }
        let mut surface_total = 0_i64;
        for (material, m) in self.materials.iter().enumerate() {
            let count = m.num_face_vertices;
            if count < 0 || count % 3 != 0 {
                return Err(DecodeError::InvalidSurfaceCount { material, count });
            }
            surface_total += i64::from(count);
        }
        if surface_total != self.faces.len() as i64 {
            return Err(DecodeError::SurfaceCountMismatch {
                surface_total,
                index_count: self.faces.len(),
            });
        }
        Ok(())
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn model_info(&self) -> &ModelInfo {
        &self.model_info
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Flat triangle corner list, 3 entries per triangle.
    pub fn faces(&self) -> &[u32] {
        &self.faces
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.faces.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    pub fn textures(&self) -> &TextureList {
        &self.textures
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Each material paired with the face indices it covers, in file order.
    ///
    /// Runs are contiguous, whole triangles, and together cover [`Model::faces`] exactly.
    pub fn material_runs(&self) -> impl Iterator<Item = (&Material, &[u32])> + '_ {
        let mut rest = self.faces.as_slice();
        self.materials.iter().map(move |material| {
            let count = usize::try_from(material.num_face_vertices)
                .unwrap_or(0)
                .min(rest.len());
            let (run, tail) = rest.split_at(count);
            rest = tail;
            (material, run)
        })
    }
}

impl TryFrom<&[u8]> for Model {
    type Error = DecodeError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        Model::decode(data)
    }
}
