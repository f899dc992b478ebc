use maxwell_stereo::{
    assets::{ModelAssets, WHISKERS_TEXTURE},
    backend::Eye,
    camera::ModelPose,
    config::DemoConfig,
    data_structures::material::Material,
    error::GraphicsError,
    flow::Demo,
    frame::FrameController,
    scene::SceneRenderer,
};

use crate::common::{
    frame_input,
    mock_backend::{Event, MockBackend},
    mock_demo,
};

mod common;

#[test]
fn should_create_scene_resources_in_order() {
    let demo = mock_demo();
    let assets = ModelAssets::maxwell();

    let events = &demo.backend().events;
    assert_eq!(events[0], Event::CreateProgram("Scene Shader".to_string()));
    assert_eq!(events[1], Event::BindProgram("Scene Shader".to_string()));
    assert_eq!(events[2], Event::UploadVertices(assets.vertices.len()));
    assert_eq!(events[3], Event::BindVertices);
    assert_eq!(
        events[4],
        Event::UploadIndices {
            label: "body".to_string(),
            len: assets.body.indices.len()
        }
    );
    assert!(matches!(&events[5], Event::CreateTexture { label, .. } if label == "body"));
    assert_eq!(
        events[6],
        Event::UploadIndices {
            label: "whiskers".to_string(),
            len: assets.whiskers.indices.len()
        }
    );
    assert!(matches!(&events[7], Event::CreateTexture { label, .. } if label == "whiskers"));
    assert_eq!(events[8], Event::CreateTarget(Eye::Left));
    assert_eq!(events[9], Event::CreateTarget(Eye::Right));
}

#[test]
fn should_release_everything_exactly_once_in_shutdown_order() {
    let mut demo = mock_demo();
    demo.tick(&frame_input(0.1, 0.5)).unwrap();
    demo.backend_mut().clear_events();

    let backend = demo.shutdown();

    assert_eq!(
        backend.events,
        vec![
            Event::ReleaseBuffer("body".to_string()),
            Event::ReleaseTexture("body".to_string()),
            Event::ReleaseBuffer("whiskers".to_string()),
            Event::ReleaseTexture("whiskers".to_string()),
            Event::ReleaseBuffer("maxwell".to_string()),
            Event::ReleaseProgram("Scene Shader".to_string()),
            Event::ReleaseTarget(Eye::Right),
            Event::ReleaseTarget(Eye::Left),
        ]
    );
    assert_eq!(backend.live_resources(), 0);
}

#[test]
fn should_free_a_material_through_its_handles() {
    let mut backend = MockBackend::new();
    let assets = ModelAssets::maxwell();
    let material = Material::new(
        &mut backend,
        "whiskers",
        assets.whiskers.indices,
        assets.vertices.len(),
        WHISKERS_TEXTURE,
    )
    .unwrap();
    assert_eq!(material.name(), "whiskers");
    assert_eq!(material.index_count() as usize, assets.whiskers.indices.len());
    assert_eq!(backend.live_resources(), 2);

    material.free(&mut backend);

    assert_eq!(backend.live_resources(), 0);
}

#[test]
fn should_reject_texture_data_that_is_not_an_image() {
    let mut backend = MockBackend::new();
    let result = Material::new(&mut backend, "body", &[0, 1, 2], 3, b"not a png");

    assert!(matches!(
        result,
        Err(GraphicsError::TextureDecode { ref label, .. }) if label == "body"
    ));
    assert_eq!(backend.live_resources(), 0);
}

#[test]
fn should_reject_broken_index_lists() {
    let mut backend = MockBackend::new();
    let texture = ModelAssets::maxwell().whiskers.texture;

    for indices in [&[][..], &[0, 1][..], &[0, 1, 3][..]] {
        let result = Material::new(&mut backend, "broken", indices, 3, texture);
        assert!(
            matches!(result, Err(GraphicsError::InvalidMesh { .. })),
            "{indices:?} was accepted"
        );
    }
    assert!(backend.events.is_empty());
}

#[test]
fn should_clean_up_when_a_texture_cannot_be_created() {
    let mut backend = MockBackend::new();
    backend.fail_texture = Some("whiskers");

    let result = SceneRenderer::new(&mut backend, &ModelAssets::maxwell(), &DemoConfig::default());

    assert!(matches!(result, Err(GraphicsError::Platform(_))));
    assert_eq!(backend.live_resources(), 0);
    assert_eq!(
        backend.events.last(),
        Some(&Event::ReleaseProgram("Scene Shader".to_string()))
    );
}

#[test]
fn should_not_leak_when_demo_setup_fails() {
    let mut backend = MockBackend::new();
    backend.fail_texture = Some("body");
    let live = backend.live_set();

    let result = Demo::new(backend, DemoConfig::default(), &ModelAssets::maxwell());

    assert!(matches!(result, Err(GraphicsError::Platform(_))));
    assert!(live.borrow().is_empty());
}

#[test]
fn should_free_the_scene_when_an_eye_target_cannot_be_created() {
    for eye in [Eye::Left, Eye::Right] {
        let mut backend = MockBackend::new();
        backend.fail_target = Some(eye);
        let live = backend.live_set();

        let result = Demo::new(backend, DemoConfig::default(), &ModelAssets::maxwell());

        assert!(matches!(result, Err(GraphicsError::Platform(_))), "{eye:?}");
        assert!(live.borrow().is_empty(), "{eye:?} leaked {:?}", live.borrow());
    }
}

#[test]
fn should_release_the_left_target_when_the_right_one_fails() {
    let mut backend = MockBackend::new();
    backend.fail_target = Some(Eye::Right);

    let result = FrameController::new(&mut backend, &DemoConfig::default());

    assert!(result.is_err());
    assert_eq!(backend.live_resources(), 0);
    assert_eq!(
        backend.events,
        vec![Event::CreateTarget(Eye::Left), Event::ReleaseTarget(Eye::Left)]
    );
}

#[test]
fn should_refuse_to_draw_outside_a_frame() {
    let mut backend = MockBackend::new();
    let scene =
        SceneRenderer::new(&mut backend, &ModelAssets::maxwell(), &DemoConfig::default()).unwrap();

    let result = scene.render_scene(&mut backend, &ModelPose::default(), 0.0);

    assert!(matches!(result, Err(GraphicsError::NoFrame)));
    scene.free(&mut backend);
    assert_eq!(backend.live_resources(), 0);
}
