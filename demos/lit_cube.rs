//! Spinning cube lit by one green directional light
//!
//! Run with:
//!   cargo run --example lit_cube
//!   cargo run --example lit_cube -- --material vcolor --speed 1.0
//!
//! Escape or closing the window exits.

use clap::{Parser, ValueEnum};
use glam::Vec3;
use lit_cube::{
    resources::{Material, Mesh},
    scene::{DirectionalLight, Projection},
    spin_transform, Engine, EngineConfig, FrameControl, FrameDriver, WindowHost,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MaterialChoice {
    /// Diffuse lighting from the packed tangent frames
    Lit,
    /// Per-face vertex colors, unlit
    Vcolor,
}

#[derive(Parser, Debug)]
#[command(about = "Draw a cube whose normals come from quaternion-packed tangent frames")]
struct Args {
    #[arg(long, default_value_t = 1280)]
    width: u32,
    #[arg(long, default_value_t = 720)]
    height: u32,
    /// Present without waiting for vblank
    #[arg(long)]
    no_vsync: bool,
    /// Spin speed in multiples of pi radians per second
    #[arg(long, default_value_t = 0.2)]
    speed: f64,
    #[arg(long, value_enum, default_value_t = MaterialChoice::Lit)]
    material: MaterialChoice,
    /// Orthographic camera instead of perspective
    #[arg(long)]
    ortho: bool,
}

fn main() {
    lit_cube::init_logging();
    let args = Args::parse();

    let config = EngineConfig {
        width: args.width,
        height: args.height,
        vsync: !args.no_vsync,
        ..Default::default()
    };

    let host = match WindowHost::new(&config.title, config.width, config.height) {
        Ok(host) => host,
        Err(e) => {
            log::error!("{}", e);
            return;
        }
    };

    let mut engine = match Engine::with_window(host.window().window_arc(), &config) {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("Failed to create engine: {}", e);
            return;
        }
    };

    let material = match args.material {
        MaterialChoice::Lit => Material::lit(),
        MaterialChoice::Vcolor => Material::vertex_color(),
    };

    let cube = Mesh::cube();
    let cube_id = match engine
        .create_material(material)
        .and_then(|material| engine.upload_mesh(&cube, material))
    {
        Ok(id) => id,
        Err(e) => {
            log::error!("Failed to upload cube: {}", e);
            return;
        }
    };

    engine.add_directional_light(DirectionalLight::new(
        Vec3::new(0.0, 1.0, 0.0),
        115_000.0,
        Vec3::new(0.0, 0.0, -1.0),
    ));

    let (width, height) = engine.dimensions();
    let aspect = width as f32 / height as f32;
    let camera = engine.camera_mut();
    camera.look_at(Vec3::new(0.0, 0.0, 4.0), Vec3::ZERO, Vec3::Y);
    camera.set_projection(if args.ortho {
        Projection::orthographic(4.0, aspect, 1.0, 10.0)
    } else {
        Projection::perspective(45.0, aspect, 1.0, 10.0)
    });

    let speed = args.speed * std::f64::consts::PI;
    let mut driver = FrameDriver::new();

    let result = host.run(move |window| {
        if window.state_mut().take_resized() {
            let (w, h) = window.dimensions();
            if let Err(e) = engine.resize(w, h) {
                log::error!("Resize failed: {}", e);
                return FrameControl::Exit;
            }
        }

        let rendered = driver.tick(|time| {
            engine.set_transform(cube_id, spin_transform(time.elapsed_secs, speed))?;
            engine.render()
        });

        match rendered {
            Ok(_) => FrameControl::Continue,
            Err(e) => {
                log::error!("Frame failed: {}", e);
                FrameControl::Exit
            }
        }
    });

    if let Err(e) = result {
        log::error!("{}", e);
    }
}
