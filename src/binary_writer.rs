//! In-memory PMX byte builder for test fixtures.

use crate::types::{Encode, Material, Toon, Vec2, Vec3, Vec4, VertexWeight};

macro_rules! write_bin {
    ($F:ident,$T:ty) => {
        pub(crate) fn $F(&mut self, value: $T) {
            self.inner.extend_from_slice(&value.to_le_bytes());
        }
    };
}

/// Index widths in header order: vertex, texture, material, bone, morph, rigid body.
pub(crate) type Sizes = [u8; 6];

pub(crate) struct BinaryWriter {
    inner: Vec<u8>,
}

impl BinaryWriter {
    pub(crate) fn new() -> BinaryWriter {
        BinaryWriter { inner: vec![] }
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.inner
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }

    pub(crate) fn write_vec(&mut self, v: &[u8]) {
        self.inner.extend_from_slice(v);
    }

    pub(crate) fn write_header(&mut self, encode: Encode, additional_uv: u8, sizes: Sizes) {
        self.write_vec(b"PMX ");
        self.write_f32(2.0);
        self.write_u8(8);
        self.write_u8(encode as u8);
        self.write_u8(additional_uv);
        self.write_vec(&sizes);
    }

    pub(crate) fn write_text_buf(&mut self, encode: Encode, text: &str) {
        let bytes: Vec<u8> = match encode {
            Encode::UTF8 => text.as_bytes().to_vec(),
            Encode::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        };
        self.write_u32(bytes.len() as u32);
        self.write_vec(&bytes);
    }

    pub(crate) fn write_model_info(&mut self, encode: Encode, name: &str) {
        self.write_text_buf(encode, name);
        self.write_text_buf(encode, "");
        self.write_text_buf(encode, "comment");
        self.write_text_buf(encode, "");
    }

    pub(crate) fn write_vertex_index(&mut self, size: u8, value: u32) {
        match size {
            1 => self.write_u8(value as u8),
            2 => self.write_u16(value as u16),
            _ => self.write_u32(value),
        }
    }

    pub(crate) fn write_sized(&mut self, size: u8, value: i32) {
        match size {
            1 => self.write_i8(value as i8),
            2 => self.write_u16(value as u16),
            _ => self.write_i32(value),
        }
    }

    pub(crate) fn write_vertex(
        &mut self,
        additional_uv: u8,
        s_bone_index: u8,
        position: Vec3,
        uv: Vec2,
        weight: &VertexWeight,
    ) {
        self.write_vec3(position);
        self.write_vec3([0.0, 0.0, 1.0]);
        self.write_vec2(uv);
        for i in 0..additional_uv {
            self.write_vec4([f32::from(i), 0.0, 0.0, 1.0]);
        }
        self.write_u8(weight.weight_type() as u8);
        match *weight {
            VertexWeight::BDEF1(index) => self.write_sized(s_bone_index, index),
            VertexWeight::BDEF2 {
                bone_index_1,
                bone_index_2,
                bone_weight_1,
            } => {
                self.write_sized(s_bone_index, bone_index_1);
                self.write_sized(s_bone_index, bone_index_2);
                self.write_f32(bone_weight_1);
            }
            VertexWeight::BDEF4 {
                bone_indices,
                bone_weights,
            }
            | VertexWeight::QDEF {
                bone_indices,
                bone_weights,
            } => {
                for index in bone_indices.iter() {
                    self.write_sized(s_bone_index, *index);
                }
                for weight in bone_weights.iter() {
                    self.write_f32(*weight);
                }
            }
            VertexWeight::SDEF {
                bone_index_1,
                bone_index_2,
                bone_weight_1,
                sdef_c,
                sdef_r0,
                sdef_r1,
            } => {
                self.write_sized(s_bone_index, bone_index_1);
                self.write_sized(s_bone_index, bone_index_2);
                self.write_f32(bone_weight_1);
                self.write_vec3(sdef_c);
                self.write_vec3(sdef_r0);
                self.write_vec3(sdef_r1);
            }
        }
        self.write_f32(1.0);
    }

    pub(crate) fn write_material(&mut self, encode: Encode, s_texture_index: u8, m: &Material) {
        self.write_text_buf(encode, &m.name);
        self.write_text_buf(encode, &m.english_name);
        self.write_vec4(m.diffuse);
        self.write_vec3(m.specular);
        self.write_f32(m.specular_factor);
        self.write_vec3(m.ambient);
        self.write_u8(m.draw_mode.bits());
        self.write_vec3(m.edge_color);
        self.write_f32(m.edge_size);
        // reserved
        self.write_f32(1.0);
        self.write_sized(s_texture_index, m.texture_index);
        self.write_sized(s_texture_index, m.environment_index);
        self.write_u8(m.environment_blend_mode as u8);
        self.write_u8(m.toon.toon_type() as u8);
        match m.toon {
            Toon::Texture(index) => self.write_sized(s_texture_index, index),
            Toon::Internal(index) => self.write_u8(index),
        }
        self.write_text_buf(encode, &m.memo);
        self.write_i32(m.num_face_vertices);
    }

    pub(crate) fn write_vec4(&mut self, v: Vec4) {
        v.iter().for_each(|x| self.write_f32(*x));
    }

    pub(crate) fn write_vec3(&mut self, v: Vec3) {
        v.iter().for_each(|x| self.write_f32(*x));
    }

    pub(crate) fn write_vec2(&mut self, v: Vec2) {
        v.iter().for_each(|x| self.write_f32(*x));
    }

    write_bin!(write_f32, f32);
    write_bin!(write_i32, i32);
    write_bin!(write_u32, u32);
    write_bin!(write_u16, u16);
    write_bin!(write_i8, i8);
    write_bin!(write_u8, u8);
}

pub(crate) fn sample_material(name: &str, num_face_vertices: i32) -> Material {
    use crate::types::{EnvironmentBlendMode, MaterialFlags};
    Material {
        name: name.to_owned(),
        english_name: String::new(),
        diffuse: [0.8, 0.6, 0.4, 0.5],
        specular: [0.1, 0.2, 0.3],
        specular_factor: 12.5,
        ambient: [0.4, 0.3, 0.2],
        draw_mode: MaterialFlags::GROUND_SHADOW | MaterialFlags::HAS_EDGE,
        edge_color: [0.0, 0.0, 0.0],
        edge_size: 1.0,
        texture_index: 0,
        environment_index: -1,
        environment_blend_mode: EnvironmentBlendMode::None,
        toon: Toon::Internal(3),
        memo: String::new(),
        num_face_vertices,
    }
}

/// Header, model info, one vertex per position, the given face indices,
/// a single texture and the given materials.
pub(crate) fn model_fixture(
    encode: Encode,
    sizes: Sizes,
    positions: &[Vec3],
    faces: &[u32],
    materials: &[Material],
) -> Vec<u8> {
    let mut writer = BinaryWriter::new();
    writer.write_header(encode, 0, sizes);
    writer.write_model_info(encode, "fixture");
    writer.write_u32(positions.len() as u32);
    for (i, position) in positions.iter().enumerate() {
        writer.write_vertex(
            0,
            sizes[3],
            *position,
            [i as f32 * 0.5, 0.25],
            &VertexWeight::BDEF1(0),
        );
    }
    writer.write_u32(faces.len() as u32);
    for index in faces {
        writer.write_vertex_index(sizes[0], *index);
    }
    writer.write_u32(1);
    writer.write_text_buf(encode, "tex\\skin.png");
    writer.write_u32(materials.len() as u32);
    for material in materials {
        writer.write_material(encode, sizes[1], material);
    }
    writer.into_inner()
}

/// One triangle, one material covering it.
pub(crate) fn triangle_fixture(encode: Encode, sizes: Sizes) -> Vec<u8> {
    model_fixture(
        encode,
        sizes,
        &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        &[0, 1, 2],
        &[sample_material("body", 3)],
    )
}
