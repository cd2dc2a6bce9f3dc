use glam::Vec3;
use shadow_lab::render::program::{scene_uniform_layout, shadow_uniform_layout};
use shadow_lab::render::uniforms::names;
use shadow_lab::render::{FramebufferTarget, RenderCommand};
use shadow_lab::{
    apply_static_uniforms, load_mesh_indexed_from_str, CameraInput, DrawMode, DryRunAllocator,
    FrameDriver, FrameTime, GeometryStore, InputState, KeyCode, Mesh, UniformBlock, ViewerConfig,
};

const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

#[test]
fn a_second_of_frames_matches_closed_form_state() {
    let allocator = DryRunAllocator::new();
    let mut store = GeometryStore::new();
    let mesh = load_mesh_indexed_from_str(TRIANGLE).unwrap();
    let geometry = store.upload_indexed(&allocator, &mesh, "triangle").unwrap();

    let config = ViewerConfig::default();
    let mut scene = UniformBlock::new(scene_uniform_layout());
    let mut shadow = UniformBlock::new(shadow_uniform_layout());
    apply_static_uniforms(&config, &mut scene);

    let mut input = InputState::new();
    input.set_key_down(KeyCode::W);
    input.set_key_down(KeyCode::from_name("LShift").unwrap());

    let mut driver = FrameDriver::new(config);
    let start = driver.state().camera.position();
    let forward = driver.state().camera.forward();
    let mut last = None;
    for index in 0..10 {
        let camera_input = input.camera_input();
        last = Some(driver.frame(
            FrameTime::fixed(index, 0.1),
            &camera_input,
            geometry,
            (640, 480),
            &mut scene,
            &mut shadow,
        ));
    }

    let moved = driver.state().camera.position() - start;
    assert!(moved.abs_diff_eq(forward * 3.0, 1e-4), "{moved:?}");
    assert!((driver.state().animation.spin_deg() - 45.0).abs() < 1e-3);

    let model = driver.state().animation.transform();
    assert_eq!(scene.read_mat4(names::MODEL_MATRIX), Some(model));
    assert_eq!(shadow.read_mat4(names::MODEL_MATRIX), Some(model));
    assert_eq!(
        scene.read_mat4(names::LIGHT_VIEW_PROJ_MATRIX),
        shadow.read_mat4(names::LIGHT_VIEW_PROJ_MATRIX)
    );
    assert_eq!(scene.read_vec3(names::OBJECT_COLOR), Some(Vec3::ONE));
    assert_eq!(scene.read_int(names::SHADOWS_ENABLED), Some(1));

    let commands = last.unwrap();
    let binds: Vec<_> = commands
        .commands()
        .iter()
        .filter_map(|command| match command {
            RenderCommand::BindFramebuffer(target) => Some(*target),
            _ => None,
        })
        .collect();
    assert_eq!(binds, vec![FramebufferTarget::ShadowMap, FramebufferTarget::Screen]);
    assert_eq!(
        commands.draw_calls().collect::<Vec<_>>(),
        vec![(DrawMode::Indexed, 3), (DrawMode::Indexed, 3)]
    );

    store.release_all(&allocator);
    assert_eq!(allocator.freed(), 4);
}

#[test]
fn rejected_mesh_never_reaches_the_allocator() {
    let allocator = DryRunAllocator::new();
    let mut store = GeometryStore::new();
    let mut mesh = Mesh::cube();
    mesh.uvs.pop();
    assert!(store.upload_indexed(&allocator, &mesh, "bad").is_err());
    assert!(store.upload_nonindexed(&allocator, &mesh, "bad").is_err());
    assert!(allocator.allocations().is_empty());
}

#[test]
fn scene_viewport_follows_framebuffer_each_frame() {
    let allocator = DryRunAllocator::new();
    let mut store = GeometryStore::new();
    let geometry = store.upload_indexed(&allocator, &Mesh::cube(), "cube").unwrap();
    let mut driver = FrameDriver::new(ViewerConfig::default());
    let mut scene = UniformBlock::new(scene_uniform_layout());
    let mut shadow = UniformBlock::new(shadow_uniform_layout());

    for (index, size) in [(1024, 768), (2048, 1536)].into_iter().enumerate() {
        let commands = driver.frame(
            FrameTime::fixed(index as u64, 1.0 / 60.0),
            &CameraInput::default(),
            geometry,
            size,
            &mut scene,
            &mut shadow,
        );
        let passes = commands.passes();
        let shadow_viewport = passes[0].viewport.unwrap();
        let scene_viewport = passes[1].viewport.unwrap();
        assert_eq!((shadow_viewport.width, shadow_viewport.height), (1024, 1024));
        assert_eq!((scene_viewport.width, scene_viewport.height), size);
    }
}
