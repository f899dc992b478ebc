#![cfg(feature = "integration-tests")]

use maxwell_stereo::{
    assets::ModelAssets,
    backend::Eye,
    config::DemoConfig,
    context::Context,
    flow::Demo,
    input::InputSnapshot,
};

fn headless_demo(runtime: &tokio::runtime::Runtime) -> Demo<Context> {
    let ctx = runtime
        .block_on(Context::headless())
        .expect("no GPU available for golden image tests");
    Demo::new(ctx, DemoConfig::default(), &ModelAssets::maxwell()).unwrap()
}

fn is_clear_gray(pixel: &image::Rgba<u8>) -> bool {
    pixel.0[..3].iter().all(|&c| c.abs_diff(0x80) <= 1) && pixel.0[3] == 0xff
}

#[test]
fn should_render_clear_colour_around_the_model() {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let mut demo = headless_demo(&runtime);

    demo.tick(&InputSnapshot::default()).unwrap();

    let left = runtime
        .block_on(demo.backend().read_target(demo.frames().target(Eye::Left)))
        .unwrap();
    assert_eq!(left.dimensions(), (400, 240));
    assert!(is_clear_gray(left.get_pixel(0, 0)));
    assert!(is_clear_gray(left.get_pixel(399, 239)));
    assert!(
        left.pixels().any(|pixel| !is_clear_gray(pixel)),
        "the model was not drawn"
    );

    // mono frame: the right target keeps its initial clear
    let right = runtime
        .block_on(demo.backend().read_target(demo.frames().target(Eye::Right)))
        .unwrap();
    assert!(right.pixels().all(is_clear_gray));

    demo.shutdown();
}

#[test]
fn should_shift_the_model_between_eyes() {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let mut demo = headless_demo(&runtime);

    demo.tick(&InputSnapshot {
        stereo_reading: 1.0,
        ..Default::default()
    })
    .unwrap();

    let left = runtime
        .block_on(demo.backend().read_target(demo.frames().target(Eye::Left)))
        .unwrap();
    let right = runtime
        .block_on(demo.backend().read_target(demo.frames().target(Eye::Right)))
        .unwrap();
    assert!(right.pixels().any(|pixel| !is_clear_gray(pixel)));
    assert_ne!(left.as_raw(), right.as_raw());

    demo.shutdown();
}
