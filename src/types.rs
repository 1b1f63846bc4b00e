//! PMX type definitions.

use bitflags::bitflags;
use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

pub type Vec2 = [f32; 2];
pub type Vec3 = [f32; 3];
pub type Vec4 = [f32; 4];

/// represent text encoding but all texts in pmx file are converted to String so you don't need to care
#[repr(u8)]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Encode {
    Utf16Le = 0x00,
    UTF8 = 0x01,
}

impl Encode {
    pub(crate) fn encoding(self) -> &'static encoding_rs::Encoding {
        match self {
            Encode::Utf16Le => encoding_rs::UTF_16LE,
            Encode::UTF8 => encoding_rs::UTF_8,
        }
    }
}

impl TryFrom<u8> for Encode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Utf16Le),
            1 => Ok(Self::UTF8),
            x => Err(x),
        }
    }
}

/// Byte width of an index field, declared once per file in the header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexSize {
    Byte,
    Short,
    Int,
}

impl IndexSize {
    pub fn bytes(self) -> usize {
        match self {
            IndexSize::Byte => 1,
            IndexSize::Short => 2,
            IndexSize::Int => 4,
        }
    }
}

impl TryFrom<u8> for IndexSize {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Byte),
            2 => Ok(Self::Short),
            4 => Ok(Self::Int),
            x => Err(x),
        }
    }
}

/// rustic wrapped header.
///
/// refer PMX仕様.txt 156~173
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub version: f32,
    /// number of config bytes following the length byte, 8 for every known writer
    pub length: u8,
    pub encode: Encode,
    pub additional_uv: u8,
    pub s_vertex_index: IndexSize,
    pub s_texture_index: IndexSize,
    pub s_material_index: IndexSize,
    pub s_bone_index: IndexSize,
    pub s_morph_index: IndexSize,
    pub s_rigid_body_index: IndexSize,
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PMX {} ({:?}, additional uv:{}, index sizes v{} t{} m{} b{} mo{} r{})",
            self.version,
            self.encode,
            self.additional_uv,
            self.s_vertex_index.bytes(),
            self.s_texture_index.bytes(),
            self.s_material_index.bytes(),
            self.s_bone_index.bytes(),
            self.s_morph_index.bytes(),
            self.s_rigid_body_index.bytes(),
        )
    }
}

/// Pmx embedded comments and names
///
/// refer PMX仕様.txt 176~181
#[derive(Debug, Default, Eq, PartialEq, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub name_en: String,
    pub comment: String,
    pub comment_en: String,
}

/// Discriminator byte preceding the bone weight payload of a vertex.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WeightType {
    BDEF1 = 0,
    BDEF2 = 1,
    BDEF4 = 2,
    SDEF = 3,
    QDEF = 4,
}

impl WeightType {
    /// Byte length of the payload that follows the discriminator.
    pub fn payload_len(self, bone_index: IndexSize) -> usize {
        let b = bone_index.bytes();
        match self {
            WeightType::BDEF1 => b,
            WeightType::BDEF2 => 2 * b + 4,
            WeightType::BDEF4 | WeightType::QDEF => 4 * b + 16,
            WeightType::SDEF => 2 * b + 4 + 36,
        }
    }
}

impl TryFrom<u8> for WeightType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::BDEF1),
            1 => Ok(Self::BDEF2),
            2 => Ok(Self::BDEF4),
            3 => Ok(Self::SDEF),
            4 => Ok(Self::QDEF),
            x => Err(x),
        }
    }
}

/// Defining how to calculate skinning.
///
/// refer PMX仕様.txt 190~197
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum VertexWeight {
    /// a bone with weight 1.0
    BDEF1(i32),
    /// 2 bones, bone_index_2 gets `1.0 - bone_weight_1`
    BDEF2 {
        bone_index_1: i32,
        bone_index_2: i32,
        bone_weight_1: f32,
    },
    /// 4 bones without normalized weights guaranty.
    BDEF4 {
        bone_indices: [i32; 4],
        bone_weights: [f32; 4],
    },
    /// spherical deforming bones
    SDEF {
        bone_index_1: i32,
        bone_index_2: i32,
        bone_weight_1: f32,
        sdef_c: Vec3,
        sdef_r0: Vec3,
        sdef_r1: Vec3,
    },
    /// DualQuaternion deforming, same layout as BDEF4
    QDEF {
        bone_indices: [i32; 4],
        bone_weights: [f32; 4],
    },
}

impl VertexWeight {
    pub fn weight_type(&self) -> WeightType {
        match self {
            VertexWeight::BDEF1(_) => WeightType::BDEF1,
            VertexWeight::BDEF2 { .. } => WeightType::BDEF2,
            VertexWeight::BDEF4 { .. } => WeightType::BDEF4,
            VertexWeight::SDEF { .. } => WeightType::SDEF,
            VertexWeight::QDEF { .. } => WeightType::QDEF,
        }
    }
}

/// refer PMX仕様.txt 184~252
///
/// `add_uv` always holds exactly `Header::additional_uv` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub norm: Vec3,
    pub uv: Vec2,
    pub add_uv: Vec<Vec4>,
    pub weight: VertexWeight,
    pub edge_mag: f32,
}

impl Vertex {
    pub fn weight_type(&self) -> WeightType {
        self.weight.weight_type()
    }
}

impl Display for Vertex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Vertex:[position:{:?} norm:{:?} uv:{:?} weight:{:?} edge:{}]",
            self.position,
            self.norm,
            self.uv,
            self.weight_type(),
            self.edge_mag
        )
    }
}

/// texture file name list
///
/// refer PMX仕様.txt 263~273
/// relative path from pmx file located directory
///
/// path separator may contains `/` or `\` so unix-like system will need  to convert it
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct TextureList {
    pub textures: Vec<String>,
}

impl TextureList {
    /// `None` for negative indices, which mean "no texture".
    pub fn get(&self, index: i32) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.textures.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// how to blend the environment (sphere) texture
/// refer PMX仕様.txt 295
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EnvironmentBlendMode {
    None = 0,
    Multiply = 1,
    Additive = 2,
    AdditiveVec4 = 3,
}

impl TryFrom<u8> for EnvironmentBlendMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Multiply),
            2 => Ok(Self::Additive),
            3 => Ok(Self::AdditiveVec4),
            x => Err(x),
        }
    }
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ToonType {
    Texture = 0,
    Internal = 1,
}

impl TryFrom<u8> for ToonType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Texture),
            1 => Ok(Self::Internal),
            x => Err(x),
        }
    }
}

/// represent which texture need to use for toon
/// * Texture use texture in texture list, index width follows the header
/// * Internal use one of the embedded toon01.bmp～toon10.bmp, always one byte
/// refer  PMX仕様.txt 297 ~ 303
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Toon {
    Texture(i32),
    Internal(u8),
}

impl Toon {
    pub fn toon_type(self) -> ToonType {
        match self {
            Toon::Texture(_) => ToonType::Texture,
            Toon::Internal(_) => ToonType::Internal,
        }
    }

    pub fn index(self) -> i32 {
        match self {
            Toon::Texture(index) => index,
            Toon::Internal(index) => i32::from(index),
        }
    }
}

///  refer PMX仕様.txt 276~310
///
/// `num_face_vertices` counts face indices (3 per triangle), consumed in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub english_name: String,
    pub diffuse: Vec4,
    pub specular: Vec3,
    pub specular_factor: f32,
    pub ambient: Vec3,
    pub draw_mode: MaterialFlags,
    pub edge_color: Vec3,
    pub edge_size: f32,
    pub texture_index: i32,
    pub environment_index: i32,
    pub environment_blend_mode: EnvironmentBlendMode,
    pub toon: Toon,
    pub memo: String,
    pub num_face_vertices: i32,
}

bitflags! {
    pub struct MaterialFlags: u8 {
        const DISABLE_CULLING = 0x01;
        const GROUND_SHADOW = 0x02;
        const RECEIVE_SHADOW_MAP = 0x04;
        const RECEIVE_SHADOW = 0x08;
        const HAS_EDGE = 0x10;
        // PMX 2.1
        const VERTEX_COLOR = 0x20;
        const POINT_DRAW = 0x40;
        const LINE_DRAW = 0x80;
    }
}
