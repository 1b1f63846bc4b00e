//! # PMX reading module.
//! this module separated to some parts.To avoid invalid reading.
//!
//! |Current stage|product|Next stage|
//! |-------------|-------|----------|
//! |[`ModelInfoStage`]|[`ModelInfo`]|[`VerticesStage`]|
//! |[`VerticesStage`]|[`Vec<Vertex>`]|[`FacesStage`]|
//! |[`FacesStage`]|[`Vec<u32>`]|[`TexturesStage`]|
//! |[`TexturesStage`]|[`TextureList`]|[`MaterialsStage`]|
//! |[`MaterialsStage`]|[`Vec<Material>`]|[`Done`]|
//!
//! Every stage consumes itself, so sections can only be read once and in file order.
//! The header is decoded by [`ModelInfoStage::new`].
//! ```rust
//! # fn run(bytes: &[u8]) -> Result<(), pmx2obj::DecodeError> {
//! let model_info_loader = pmx2obj::reader::ModelInfoStage::new(bytes)?;
//! let (model_info, vertices_loader) = model_info_loader.read()?;
//! # Ok(())
//! # }
//! ```

use crate::binary_reader::BinaryReader;
use crate::error::DecodeError;
use crate::types::{
    Encode, EnvironmentBlendMode, Header, IndexSize, Material, MaterialFlags, ModelInfo, TextureList,
    Toon, ToonType, Vec2, Vec3, Vec4, Vertex, VertexWeight, WeightType,
};
use std::convert::TryFrom;
use tracing::{debug, trace, warn};

const SIGNATURE: [u8; 4] = *b"PMX ";
const KNOWN_CONFIG_LEN: u8 = 8;
// position + normal + uv + weight type + smallest weight payload + edge
const MIN_VERTEX_LEN: usize = 12 + 12 + 8 + 1 + 1 + 4;
// two empty names .. surface count with one byte indices
const MIN_MATERIAL_LEN: usize = 4 + 4 + 16 + 12 + 4 + 12 + 1 + 12 + 4 + 4 + 1 + 1 + 1 + 1 + 1 + 4 + 4;

fn read_header(inner: &mut BinaryReader<'_>) -> Result<Header, DecodeError> {
    let magic: [u8; 4] = inner.read_array()?;
    if magic != SIGNATURE {
        return Err(DecodeError::InvalidSignature { found: magic });
    }
    let version = inner.read_f32()?;
    let length = inner.read_u8()?;
    if length < KNOWN_CONFIG_LEN {
        return Err(DecodeError::InvalidHeaderLength { length });
    }
    let base = inner.position();
    let config = inner.read_vec(usize::from(length))?;
    if length > KNOWN_CONFIG_LEN {
        warn!(length, "header declares unknown trailing config bytes, ignoring them");
    }
    let index_size = |offset: usize, field: &'static str| {
        IndexSize::try_from(config[offset]).map_err(|value| DecodeError::UnsupportedIndexWidth {
            field,
            position: base + offset,
            value,
        })
    };
    let header = Header {
        version,
        length,
        encode: Encode::try_from(config[0]).map_err(|value| {
            DecodeError::UnsupportedEncoding {
                position: base,
                value,
            }
        })?,
        additional_uv: config[1],
        s_vertex_index: index_size(2, "vertex index")?,
        s_texture_index: index_size(3, "texture index")?,
        s_material_index: index_size(4, "material index")?,
        s_bone_index: index_size(5, "bone index")?,
        s_morph_index: index_size(6, "morph index")?,
        s_rigid_body_index: index_size(7, "rigid body index")?,
    };
    debug!(%header, "decoded header");
    Ok(header)
}

pub struct ModelInfoStage<'a>(ReaderInner<'a>);

impl<'a> ModelInfoStage<'a> {
    /// the start of reader module.
    ///
    /// # Errors
    /// * the buffer is shorter than the header
    /// * magic number is not `PMX `
    /// * text encoding or any index width is out of range
    pub fn new(data: &'a [u8]) -> Result<ModelInfoStage<'a>, DecodeError> {
        let mut inner = BinaryReader::new(data);
        let header = read_header(&mut inner)?;
        Ok(ModelInfoStage(ReaderInner { inner, header }))
    }

    pub fn get_header(&self) -> &Header {
        &self.0.header
    }

    pub fn read(mut self) -> Result<(ModelInfo, VerticesStage<'a>), DecodeError> {
        let info = ModelInfo {
            name: self.0.read_text_buf()?,
            name_en: self.0.read_text_buf()?,
            comment: self.0.read_text_buf()?,
            comment_en: self.0.read_text_buf()?,
        };
        debug!(name = %info.name, end = self.0.position(), "decoded model info");
        Ok((info, VerticesStage(self.0)))
    }
}

pub struct VerticesStage<'a>(ReaderInner<'a>);

impl<'a> VerticesStage<'a> {
    pub fn get_header(&self) -> &Header {
        &self.0.header
    }

    pub fn read(mut self) -> Result<(Vec<Vertex>, FacesStage<'a>), DecodeError> {
        let count = self.0.inner.read_u32()?;
        let mut vertices = Vec::with_capacity(self.0.inner.capacity_for(count, MIN_VERTEX_LEN));
        for _ in 0..count {
            vertices.push(self.read_pmx_vertex()?);
        }
        debug!(count, end = self.0.position(), "decoded vertices");
        Ok((vertices, FacesStage(self.0)))
    }

    fn read_pmx_vertex(&mut self) -> Result<Vertex, DecodeError> {
        let position = self.0.read_vec3()?;
        let norm = self.0.read_vec3()?;
        let uv = self.0.read_vec2()?;
        let add_uv = (0..self.0.header.additional_uv)
            .map(|_| self.0.read_vec4())
            .collect::<Result<Vec<_>, _>>()?;
        let weight = self.read_weight()?;
        Ok(Vertex {
            position,
            norm,
            uv,
            add_uv,
            weight,
            edge_mag: self.0.read_f32()?,
        })
    }

    fn read_weight(&mut self) -> Result<VertexWeight, DecodeError> {
        let position = self.0.position();
        let weight_type = WeightType::try_from(self.0.read_u8()?)
            .map_err(|value| DecodeError::InvalidWeightType { position, value })?;
        trace!(position, ?weight_type, "vertex weight");
        let start = self.0.position();
        let weight = match weight_type {
            WeightType::BDEF1 => VertexWeight::BDEF1(self.0.read_bone_index()?),
            WeightType::BDEF2 => VertexWeight::BDEF2 {
                bone_index_1: self.0.read_bone_index()?,
                bone_index_2: self.0.read_bone_index()?,
                bone_weight_1: self.0.read_f32()?,
            },
            WeightType::BDEF4 => {
                let (bone_indices, bone_weights) = self.read_four_bones()?;
                VertexWeight::BDEF4 {
                    bone_indices,
                    bone_weights,
                }
            }
            WeightType::SDEF => VertexWeight::SDEF {
                bone_index_1: self.0.read_bone_index()?,
                bone_index_2: self.0.read_bone_index()?,
                bone_weight_1: self.0.read_f32()?,
                sdef_c: self.0.read_vec3()?,
                sdef_r0: self.0.read_vec3()?,
                sdef_r1: self.0.read_vec3()?,
            },
            WeightType::QDEF => {
                let (bone_indices, bone_weights) = self.read_four_bones()?;
                VertexWeight::QDEF {
                    bone_indices,
                    bone_weights,
                }
            }
        };
        debug_assert_eq!(
            self.0.position() - start,
            weight_type.payload_len(self.0.header.s_bone_index)
        );
        Ok(weight)
    }

    fn read_four_bones(&mut self) -> Result<([i32; 4], [f32; 4]), DecodeError> {
        let bone_indices = [
            self.0.read_bone_index()?,
            self.0.read_bone_index()?,
            self.0.read_bone_index()?,
            self.0.read_bone_index()?,
        ];
        Ok((bone_indices, self.0.read_vec4()?))
    }
}

pub struct FacesStage<'a>(ReaderInner<'a>);

impl<'a> FacesStage<'a> {
    pub fn get_header(&self) -> &Header {
        &self.0.header
    }

    /// Read the flat triangle corner list.
    ///
    /// Indices are unsigned at every width, unlike the other index fields.
    pub fn read(mut self) -> Result<(Vec<u32>, TexturesStage<'a>), DecodeError> {
        let count = self.0.inner.read_u32()?;
        let size = self.0.header.s_vertex_index;
        let mut faces = Vec::with_capacity(self.0.inner.capacity_for(count, size.bytes()));
        for _ in 0..count {
            faces.push(self.0.inner.read_vertex_index(size)?);
        }
        debug!(count, end = self.0.position(), "decoded face indices");
        Ok((faces, TexturesStage(self.0)))
    }
}

pub struct TexturesStage<'a>(ReaderInner<'a>);

impl<'a> TexturesStage<'a> {
    pub fn get_header(&self) -> &Header {
        &self.0.header
    }

    /// Read relative texture path from current reading file
    ///
    /// # Note
    /// for Unix like -system user you need to convert \ to /
    pub fn read(mut self) -> Result<(TextureList, MaterialsStage<'a>), DecodeError> {
        let count = self.0.inner.read_u32()?;
        let mut textures = Vec::with_capacity(self.0.inner.capacity_for(count, 4));
        for _ in 0..count {
            textures.push(self.0.read_text_buf()?);
        }
        debug!(count, end = self.0.position(), "decoded texture list");
        Ok((TextureList { textures }, MaterialsStage(self.0)))
    }
}

pub struct MaterialsStage<'a>(ReaderInner<'a>);

impl<'a> MaterialsStage<'a> {
    pub fn get_header(&self) -> &Header {
        &self.0.header
    }

    ///Read material's information contains name ambient diffuse specular etc parameters.
    ///
    /// please read [Material](crate::types::Material) doc
    pub fn read(mut self) -> Result<(Vec<Material>, Done), DecodeError> {
        let count = self.0.inner.read_u32()?;
        let mut materials = Vec::with_capacity(self.0.inner.capacity_for(count, MIN_MATERIAL_LEN));
        for _ in 0..count {
            materials.push(self.read_pmx_material()?);
        }
        debug!(count, end = self.0.position(), "decoded materials");
        Ok((
            materials,
            Done {
                position: self.0.position(),
                remaining: self.0.inner.remaining(),
            },
        ))
    }

    fn read_pmx_material(&mut self) -> Result<Material, DecodeError> {
        let name = self.0.read_text_buf()?;
        let english_name = self.0.read_text_buf()?;
        let diffuse = self.0.read_vec4()?;
        let specular = self.0.read_vec3()?;
        let specular_factor = self.0.read_f32()?;
        let ambient = self.0.read_vec3()?;
        let draw_mode = MaterialFlags::from_bits_truncate(self.0.read_u8()?);
        let edge_color = self.0.read_vec3()?;
        let edge_size = self.0.read_f32()?;
        // reserved float after the edge size, never used
        self.0.inner.skip(4)?;
        let texture_index = self.0.read_texture_index()?;
        let environment_index = self.0.read_texture_index()?;
        let environment_blend_mode =
            self.0.read_discriminant::<EnvironmentBlendMode>("environment blend mode")?;
        let toon = match self.0.read_discriminant::<ToonType>("toon type")? {
            ToonType::Internal => Toon::Internal(self.0.inner.read_u8()?),
            ToonType::Texture => Toon::Texture(self.0.read_texture_index()?),
        };
        let material = Material {
            name,
            english_name,
            diffuse,
            specular,
            specular_factor,
            ambient,
            draw_mode,
            edge_color,
            edge_size,
            texture_index,
            environment_index,
            environment_blend_mode,
            toon,
            memo: self.0.read_text_buf()?,
            num_face_vertices: self.0.inner.read_i32()?,
        };
        trace!(name = %material.name, surfaces = material.num_face_vertices, "material");
        Ok(material)
    }
}

/// End of the sections this crate decodes.
///
/// Bones, morphs, frames, rigid bodies and joints start at `position` and are left unread.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Done {
    position: usize,
    remaining: usize,
}

impl Done {
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

struct ReaderInner<'a> {
    inner: BinaryReader<'a>,
    header: Header,
}

impl<'a> ReaderInner<'a> {
    fn position(&self) -> usize {
        self.inner.position()
    }

    fn read_texture_index(&mut self) -> Result<i32, DecodeError> {
        self.inner.read_sized(self.header.s_texture_index)
    }

    fn read_bone_index(&mut self) -> Result<i32, DecodeError> {
        self.inner.read_sized(self.header.s_bone_index)
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.inner.read_u8()
    }

    fn read_f32(&mut self) -> Result<f32, DecodeError> {
        self.inner.read_f32()
    }

    fn read_vec4(&mut self) -> Result<Vec4, DecodeError> {
        self.inner.read_vec4()
    }

    fn read_vec3(&mut self) -> Result<Vec3, DecodeError> {
        self.inner.read_vec3()
    }

    fn read_vec2(&mut self) -> Result<Vec2, DecodeError> {
        self.inner.read_vec2()
    }

    fn read_text_buf(&mut self) -> Result<String, DecodeError> {
        self.inner.read_text_buf(self.header.encode)
    }

    fn read_discriminant<T: TryFrom<u8, Error = u8>>(
        &mut self,
        field: &'static str,
    ) -> Result<T, DecodeError> {
        let position = self.position();
        T::try_from(self.read_u8()?).map_err(|value| DecodeError::InvalidDiscriminator {
            field,
            position,
            value,
        })
    }
}
