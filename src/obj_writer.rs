//! Wavefront OBJ/MTL export of a decoded [`Model`].
//!
//! One MTL entry is written per material and a single OBJ object holds every
//! vertex. Faces are grouped under `usemtl` by [`Model::material_runs`].

use crate::error::ExportError;
use crate::model::Model;
use crate::types::{Material, Vec3};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Output formatting knobs. Numbers are always written with `.` as the decimal separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Fixed number of decimals for `v` lines, `None` for shortest round-trip output.
    pub position_precision: Option<usize>,
    /// Write `vt u -v` instead of `vt u v`.
    pub flip_v: bool,
    pub object_name: String,
    /// Write the `#Toon ...; EdgeFlag ...` line in every MTL entry.
    pub emit_comments: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            position_precision: Some(7),
            flip_v: true,
            object_name: "object".to_owned(),
            emit_comments: true,
        }
    }
}

pub struct ObjWriter<'m> {
    model: &'m Model,
    config: ExportConfig,
    material_names: Vec<String>,
}

impl<'m> ObjWriter<'m> {
    pub fn new(model: &'m Model, config: ExportConfig) -> ObjWriter<'m> {
        let material_names = unique_material_names(model.materials());
        ObjWriter {
            model,
            config,
            material_names,
        }
    }

    /// `newmtl` names in material order.
    pub fn material_names(&self) -> &[String] {
        &self.material_names
    }

    pub fn write_mtl<W: Write>(&self, w: &mut W) -> Result<(), ExportError> {
        let textures = self.model.textures();
        for (material, name) in self.model.materials().iter().zip(&self.material_names) {
            writeln!(w, "newmtl {}", name)?;
            if material.texture_index >= 0 {
                let texture = textures.get(material.texture_index).ok_or_else(|| {
                    ExportError::TextureOutOfRange {
                        material: name.clone(),
                        index: material.texture_index,
                        texture_count: textures.len(),
                    }
                })?;
                writeln!(w, "map_Kd {}", texture)?;
            }
            write_rgb(w, "Ka", material.ambient)?;
            write_rgb(
                w,
                "Kd",
                [material.diffuse[0], material.diffuse[1], material.diffuse[2]],
            )?;
            write_rgb(w, "Ks", material.specular)?;
            writeln!(w, "Ns {}", material.specular_factor)?;
            if self.config.emit_comments {
                writeln!(
                    w,
                    "#Toon {}; EdgeFlag {:?}",
                    material.toon.index(),
                    material.draw_mode
                )?;
            }
            writeln!(w, "d {}", material.diffuse[3])?;
            writeln!(w)?;
        }
        Ok(())
    }

    /// `mtl_file_name` is written verbatim after `mtllib`.
    pub fn write_obj<W: Write>(&self, w: &mut W, mtl_file_name: &str) -> Result<(), ExportError> {
        writeln!(w, "mtllib {}", mtl_file_name)?;
        writeln!(w, "o {}", self.config.object_name)?;
        let vertices = self.model.vertices();
        for vertex in vertices {
            self.write_position(w, vertex.position)?;
        }
        for vertex in vertices {
            let [u, v] = vertex.uv;
            let v = if self.config.flip_v { -v } else { v };
            writeln!(w, "vt {} {}", u, v)?;
        }
        for vertex in vertices {
            let [x, y, z] = vertex.norm;
            writeln!(w, "vn {} {} {}", x, y, z)?;
        }
        for ((_, run), name) in self.model.material_runs().zip(&self.material_names) {
            if run.is_empty() {
                continue;
            }
            writeln!(w, "usemtl {}", name)?;
            for triangle in run.chunks_exact(3) {
                let a = u64::from(triangle[0]) + 1;
                let b = u64::from(triangle[1]) + 1;
                let c = u64::from(triangle[2]) + 1;
                writeln!(w, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}", a = a, b = b, c = c)?;
            }
        }
        Ok(())
    }

    /// Write `<dir>/<stem>.mtl` and `<dir>/<stem>.obj`, returning the OBJ and MTL paths.
    pub fn write_files(&self, dir: &Path, stem: &str) -> Result<(PathBuf, PathBuf), ExportError> {
        let mtl_file_name = format!("{}.mtl", stem);
        let mtl_path = dir.join(&mtl_file_name);
        let obj_path = dir.join(format!("{}.obj", stem));

        let mut mtl = BufWriter::new(File::create(&mtl_path)?);
        self.write_mtl(&mut mtl)?;
        mtl.flush()?;
        debug!(path = %mtl_path.display(), materials = self.material_names.len(), "wrote MTL");

        let mut obj = BufWriter::new(File::create(&obj_path)?);
        self.write_obj(&mut obj, &mtl_file_name)?;
        obj.flush()?;
        debug!(path = %obj_path.display(), vertices = self.model.vertices().len(), "wrote OBJ");

        Ok((obj_path, mtl_path))
    }

    fn write_position<W: Write>(&self, w: &mut W, position: Vec3) -> io::Result<()> {
        let [x, y, z] = position;
        match self.config.position_precision {
            Some(p) => writeln!(w, "v {:.*} {:.*} {:.*}", p, x, p, y, p, z),
            None => writeln!(w, "v {} {} {}", x, y, z),
        }
    }
}

fn write_rgb<W: Write>(w: &mut W, key: &str, rgb: Vec3) -> io::Result<()> {
    writeln!(w, "{} {} {} {}", key, rgb[0], rgb[1], rgb[2])
}

/// Prefer the universal name, fall back to the local one when it is empty or the
/// placeholder `"en"`. Spaces become `_`. A repeated name gets the number of
/// earlier names sharing its prefix appended.
fn unique_material_names(materials: &[Material]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(materials.len());
    for material in materials {
        let base = if material.english_name.is_empty() || material.english_name == "en" {
            &material.name
        } else {
            &material.english_name
        };
        let mut name = base.replace(' ', "_");
        if names.contains(&name) {
            let used = names.iter().filter(|n| n.starts_with(name.as_str())).count();
            name = format!("{}{}", name, used);
        }
        names.push(name);
    }
    names
}
