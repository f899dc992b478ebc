use maxwell_stereo::{
    assets::ModelAssets,
    data_structures::{material::validate_indices, texture::decode_texture},
};

#[test]
fn should_embed_a_consistent_model() {
    let assets = ModelAssets::maxwell();
    assert!(!assets.vertices.is_empty());

    for material in assets.materials() {
        validate_indices(material.name, material.indices, assets.vertices.len()).unwrap();
    }
}

#[test]
fn should_list_materials_in_draw_order() {
    let names: Vec<&str> = ModelAssets::maxwell()
        .materials()
        .iter()
        .map(|material| material.name)
        .collect();
    assert_eq!(names, vec!["body", "whiskers"]);
}

#[test]
fn should_keep_texture_coordinates_inside_the_texture() {
    for vertex in ModelAssets::maxwell().vertices {
        for uv in vertex.tex_coords {
            assert!((0.0..=1.0).contains(&uv), "{:?}", vertex);
        }
    }
}

#[test]
fn should_bake_unit_normals() {
    for vertex in ModelAssets::maxwell().vertices {
        let length = vertex.normal.iter().map(|n| n * n).sum::<f32>().sqrt();
        assert!((length - 1.0).abs() < 1e-3, "{:?}", vertex);
    }
}

#[test]
fn should_decode_embedded_textures() {
    for material in ModelAssets::maxwell().materials() {
        let image = decode_texture(material.texture, material.name).unwrap();
        assert!(image.width() > 0 && image.height() > 0);
        assert!(image.width().is_power_of_two() && image.height().is_power_of_two());
    }
}

#[test]
fn should_embed_a_shader_with_both_entry_points() {
    let shader = ModelAssets::maxwell().shader;
    assert!(shader.contains("fn vs_main"));
    assert!(shader.contains("fn fs_main"));
    assert!(shader.contains("model_view"));
    assert!(shader.contains("projection"));
    assert!(shader.contains("@location(2) normal"));
}
