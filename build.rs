use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::collections::BTreeMap;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    // This tells Cargo to rerun this script if something in /assets/ changes.
    println!("cargo:rerun-if-changed=assets/");

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");

    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    copy_items(&[&assets_src], &out_dir, &copy_options)?;

    let model = bake_model(&assets_src.join("maxwell.obj"))?;
    fs::write(out_dir.join("maxwell.rs"), model)?;

    Ok(())
}

/// Position, texture coordinate and normal.
const FLOATS_PER_VERTEX: usize = 3 + 2 + 3;

/// Flattens every mesh of the obj into one shared vertex list and one index
/// list per material, and renders them as Rust constants.
fn bake_model(path: &Path) -> Result<String> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .with_context(|| format!("failed to parse {}", path.display()))?;
    let materials = materials.with_context(|| format!("failed to load materials for {}", path.display()))?;

    let mut vertices: Vec<f32> = Vec::new();
    let mut indices: BTreeMap<String, Vec<u16>> = BTreeMap::new();

    for model in &models {
        let mesh = &model.mesh;
        let base = vertices.len() / FLOATS_PER_VERTEX;
        let count = mesh.positions.len() / 3;
        if mesh.normals.len() != mesh.positions.len() {
            bail!("mesh {} in {} has no vertex normals", model.name, path.display());
        }
        for i in 0..count {
            vertices.extend_from_slice(&mesh.positions[i * 3..i * 3 + 3]);
            vertices.push(mesh.texcoords.get(i * 2).copied().unwrap_or(0.0));
            // wgpu samples with a top-left origin
            vertices.push(1.0 - mesh.texcoords.get(i * 2 + 1).copied().unwrap_or(0.0));
            vertices.extend_from_slice(&mesh.normals[i * 3..i * 3 + 3]);
        }

        let name = mesh
            .material_id
            .and_then(|id| materials.get(id))
            .map(|material| material.name.clone())
            .ok_or_else(|| anyhow!("mesh {} has no material", model.name))?;
        let list = indices.entry(name).or_default();
        for index in &mesh.indices {
            let index = u16::try_from(base + *index as usize)
                .map_err(|_| anyhow!("{} has too many vertices for u16 indices", path.display()))?;
            list.push(index);
        }
    }

    let mut result = String::new();
    writeln!(result, "// Generated by build.rs from {}.", path.display())?;
    writeln!(result)?;
    writeln!(result, "#[allow(clippy::approx_constant, clippy::unreadable_literal)]")?;
    writeln!(result, "pub const MODEL_VERTICES: &[f32] = &{vertices:?};")?;
    for (name, list) in &indices {
        writeln!(result)?;
        writeln!(result, "pub const {}_INDICES: &[u16] = &{list:?};", name.to_uppercase())?;
    }
    Ok(result)
}
