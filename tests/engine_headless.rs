//! Drives the engine against the recording backend

use glam::{Mat4, Vec3};
use lit_cube::backend::headless::RecordedCommand;
use lit_cube::backend::{IndexFormat, VertexFormat};
use lit_cube::resources::{
    IndexBufferConfig, IndexType, Material, MaterialKind, Mesh, RenderableConfig,
    VertexBufferConfig,
};
use lit_cube::scene::DirectionalLight;
use lit_cube::{spin_transform, Engine, EngineConfig, EngineError, HeadlessBackend};

fn engine() -> Engine<HeadlessBackend> {
    Engine::new(HeadlessBackend::new(800, 600), &EngineConfig::default()).unwrap()
}

fn draws(engine: &Engine<HeadlessBackend>) -> Vec<RecordedCommand> {
    engine.backend().last_frame().unwrap().passes[0]
        .commands
        .iter()
        .filter(|c| matches!(c, RecordedCommand::DrawIndexed { .. }))
        .cloned()
        .collect()
}

#[test]
fn lit_cube_frame() {
    let mut engine = engine();
    let material = engine.create_material(Material::lit()).unwrap();
    let cube = Mesh::cube();
    let id = engine.upload_mesh(&cube, material).unwrap();
    engine.check_renderable(id).unwrap();
    engine.add_directional_light(DirectionalLight::new(
        Vec3::new(0.0, 1.0, 0.0),
        115_000.0,
        Vec3::NEG_Z,
    ));

    engine.render().unwrap();

    let frame = engine.backend().last_frame().unwrap();
    assert_eq!(frame.passes.len(), 1);
    let pass = &frame.passes[0];
    assert_eq!(pass.clear_color, Some([0.0, 0.1, 0.2, 1.0]));
    assert!(pass.has_depth);
    assert_eq!(
        draws(&engine),
        vec![RecordedCommand::DrawIndexed {
            indices: 0..36,
            base_vertex: 0,
            instances: 0..1
        }]
    );

    let bind_groups: Vec<u32> = pass
        .commands
        .iter()
        .filter_map(|c| match c {
            RecordedCommand::SetBindGroup { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(bind_groups, vec![0, 1, 2]);

    assert!(pass.commands.iter().any(|c| matches!(
        c,
        RecordedCommand::SetIndexBuffer {
            format: IndexFormat::Uint16,
            ..
        }
    )));

    // Slot 1 holds the packed tangent frames
    let tangent_buffer = pass
        .commands
        .iter()
        .find_map(|c| match c {
            RecordedCommand::SetVertexBuffer { slot: 1, buffer, .. } => Some(*buffer),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        engine.backend().buffer_data(tangent_buffer),
        Some(cube.tangent_bytes())
    );

    let pipeline = pass
        .commands
        .iter()
        .find_map(|c| match c {
            RecordedCommand::SetPipeline(p) => Some(*p),
            _ => None,
        })
        .unwrap();
    let desc = engine.backend().pipeline(pipeline).unwrap();
    assert_eq!(desc.vertex_layouts[1].attributes[0].format, VertexFormat::Snorm16x4);
}

#[test]
fn vertex_color_cube_draws_with_colors() {
    let mut engine = engine();
    let material = engine.create_material(Material::vertex_color()).unwrap();
    engine.upload_mesh(&Mesh::cube(), material).unwrap();
    engine.render().unwrap();

    let pass = &engine.backend().last_frame().unwrap().passes[0];
    let slots: Vec<u32> = pass
        .commands
        .iter()
        .filter_map(|c| match c {
            RecordedCommand::SetVertexBuffer { slot, .. } => Some(*slot),
            _ => None,
        })
        .collect();
    assert_eq!(slots, vec![0, 1, 2]);
    assert_eq!(pass.draw_count(), 1);
}

#[test]
fn hidden_and_culled_renderables_are_skipped() {
    let mut engine = engine();
    let material = engine.create_material(Material::lit()).unwrap();
    let id = engine.upload_mesh(&Mesh::cube(), material).unwrap();

    engine.set_visible(id, false).unwrap();
    engine.render().unwrap();
    assert!(draws(&engine).is_empty());

    engine.set_visible(id, true).unwrap();
    engine
        .set_transform(id, Mat4::from_translation(Vec3::new(100.0, 0.0, 0.0)))
        .unwrap();
    engine.render().unwrap();
    assert!(draws(&engine).is_empty());

    engine.set_transform(id, spin_transform(1.0, 1.0)).unwrap();
    engine.render().unwrap();
    assert_eq!(draws(&engine).len(), 1);
    assert_eq!(engine.backend().frames().len(), 3);
}

#[test]
fn clear_color_follows_engine() {
    let mut engine = engine();
    engine.set_clear_color([1.0, 0.0, 0.0, 1.0]);
    engine.render().unwrap();
    let pass = &engine.backend().last_frame().unwrap().passes[0];
    assert_eq!(pass.clear_color, Some([1.0, 0.0, 0.0, 1.0]));
}

#[test]
fn handles_are_checked() {
    let mut engine = engine();
    let material = engine.create_material(Material::lit()).unwrap();
    let id = engine.upload_mesh(&Mesh::cube(), material).unwrap();
    engine.remove_renderable(id).unwrap();

    assert!(matches!(
        engine.set_transform(id, Mat4::IDENTITY),
        Err(EngineError::UnknownRenderable(_))
    ));
    assert!(matches!(
        engine.remove_renderable(id),
        Err(EngineError::UnknownRenderable(_))
    ));

    engine.render().unwrap();
    assert!(draws(&engine).is_empty());
}

#[test]
fn manual_upload_sequence() {
    // The explicit path upload_mesh takes
    let mut engine = engine();
    let cube = Mesh::cube();

    let vb = engine
        .create_vertex_buffer(VertexBufferConfig::position_and_tangents(24))
        .unwrap();
    engine.set_vertex_buffer_at(vb, 0, cube.position_bytes()).unwrap();
    assert!(matches!(
        engine.set_vertex_buffer_at(vb, 1, cube.position_bytes()),
        Err(EngineError::SizeMismatch {
            expected: 192,
            actual: 288
        })
    ));
    engine.set_vertex_buffer_at(vb, 1, cube.tangent_bytes()).unwrap();

    let ib = engine
        .create_index_buffer(IndexBufferConfig::new(36, IndexType::UShort))
        .unwrap();
    engine.set_index_buffer(ib, cube.index_bytes()).unwrap();

    let material = engine.create_material(Material::lit()).unwrap();
    assert_eq!(engine.material(material).unwrap().kind, MaterialKind::Lit);

    let id = engine
        .create_renderable(
            RenderableConfig::new(vb, ib, material).with_bounding_box(cube.bounding_box()),
        )
        .unwrap();
    engine.check_renderable(id).unwrap();
    engine.render().unwrap();
    assert_eq!(draws(&engine).len(), 1);
}
