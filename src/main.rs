use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

use shadow_lab::render::program::{scene_uniform_layout, shadow_uniform_layout};
use shadow_lab::{
    apply_static_uniforms, init_logging, load_mesh, load_mesh_indexed, run_viewer,
    DryRunAllocator, FrameDriver, FrameTime, GeometryStore, InputState, KeyCode, Mesh,
    PlatformInitError, ProgramKind, ProgramSource, RendererOptions, UniformBlock, ViewerConfig,
};

fn main() {
    init_logging();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let config = options.viewer_config();
    let (mesh, name) = load_model(&config, options.model.is_some())?;
    println!(
        "Loaded model {name} ({} vertices, {} triangles)",
        mesh.vertex_count(),
        mesh.triangle_count()
    );

    if options.summary_only {
        return run_headless(config, &mesh, &options);
    }

    let renderer_options = options.renderer_options(&config)?;
    match run_viewer(config.clone(), mesh.clone(), renderer_options) {
        Ok(summary) => {
            println!("{summary}");
            Ok(())
        }
        Err(err) => {
            if err.downcast_ref::<PlatformInitError>().is_some() {
                eprintln!(
                    "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                );
                run_headless(config, &mesh, &options)
            } else {
                Err(err)
            }
        }
    }
}

/// Loads the configured OBJ. The built-in default path falls back to a cube
/// when it does not exist; an explicit path must load.
fn load_model(config: &ViewerConfig, explicit: bool) -> Result<(Mesh, String)> {
    let path = &config.model.path;
    if !explicit && !path.exists() {
        warn!("{} not found, showing a cube instead", path.display());
        return Ok((Mesh::cube(), "built-in cube".to_string()));
    }
    let mesh = if config.model.indexed {
        load_mesh_indexed(path)
    } else {
        load_mesh(path)
    };
    let mesh = mesh.with_context(|| format!("failed to load model {}", path.display()))?;
    Ok((mesh, path.display().to_string()))
}

/// Runs the frame driver without a window and prints what it would draw.
fn run_headless(config: ViewerConfig, mesh: &Mesh, options: &CliOptions) -> Result<()> {
    let allocator = DryRunAllocator::new();
    let mut store = GeometryStore::new();
    let geometry = if config.model.indexed {
        store.upload_indexed(&allocator, mesh, "model")
    } else {
        store.upload_nonindexed(&allocator, mesh, "model")
    }
    .context("failed to upload model")?;

    let mut scene = UniformBlock::new(scene_uniform_layout());
    let mut shadow = UniformBlock::new(shadow_uniform_layout());
    apply_static_uniforms(&config, &mut scene);

    let mut input = InputState::new();
    for key in &options.held_keys {
        input.set_key_down(*key);
    }

    let size = (config.window.width, config.window.height);
    let mut driver = FrameDriver::new(config);
    let mut draws = 0;
    for index in 0..options.frames {
        let camera_input = input.camera_input();
        let commands = driver.frame(
            FrameTime::fixed(index, options.dt),
            &camera_input,
            geometry,
            size,
            &mut scene,
            &mut shadow,
        );
        draws += commands.draw_calls().count();
        if input.should_exit() {
            info!("escape held, stopping after frame {index}");
            break;
        }
    }

    println!(
        "Uploaded {} buffer(s), {} bytes ({:?} draw of {} elements)",
        allocator.allocations().len(),
        allocator.allocated_bytes(),
        geometry.mode,
        geometry.draw_count
    );
    println!("Issued {draws} draw call(s)");
    println!("{}", driver.summary());

    store.release_all(&allocator);
    Ok(())
}

const USAGE: &str = "Usage: shadow-lab [model.obj] [--summary-only] [--frames N] [--dt SECONDS] \
[--hold KEY]... [--shader-dir DIR] [--non-indexed] [--no-shadows]";

struct CliOptions {
    model: Option<PathBuf>,
    summary_only: bool,
    frames: u64,
    dt: f32,
    held_keys: Vec<KeyCode>,
    shader_dir: Option<PathBuf>,
    non_indexed: bool,
    no_shadows: bool,
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self {
            model: None,
            summary_only: false,
            frames: 120,
            dt: 1.0 / 60.0,
            held_keys: Vec::new(),
            shader_dir: None,
            non_indexed: false,
            no_shadows: false,
        };
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => options.summary_only = true,
                "--non-indexed" => options.non_indexed = true,
                "--no-shadows" => options.no_shadows = true,
                "--frames" => {
                    let value = next_value(&mut args, "--frames")?;
                    options.frames = value
                        .parse()
                        .with_context(|| format!("invalid frame count {value}"))?;
                }
                "--dt" => {
                    let value = next_value(&mut args, "--dt")?;
                    let dt: f32 = value
                        .parse()
                        .with_context(|| format!("invalid delta time {value}"))?;
                    if !dt.is_finite() || dt < 0.0 {
                        return Err(anyhow!("delta time must be a non-negative number, got {value}"));
                    }
                    options.dt = dt;
                }
                "--hold" => {
                    let value = next_value(&mut args, "--hold")?;
                    let key = KeyCode::from_name(&value)
                        .ok_or_else(|| anyhow!("unknown key {value}"))?;
                    options.held_keys.push(key);
                }
                "--shader-dir" => {
                    options.shader_dir = Some(PathBuf::from(next_value(&mut args, "--shader-dir")?));
                }
                "--help" | "-h" => {
                    println!("{USAGE}");
                    std::process::exit(0);
                }
                other if other.starts_with("--") => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
                path => {
                    if options.model.is_some() {
                        return Err(anyhow!("only one model can be shown. {USAGE}"));
                    }
                    options.model = Some(PathBuf::from(path));
                }
            }
        }
        Ok(options)
    }

    fn viewer_config(&self) -> ViewerConfig {
        let mut config = ViewerConfig::default();
        if let Some(model) = &self.model {
            config.model.path = model.clone();
        }
        config.model.indexed = !self.non_indexed;
        config.shadow.enabled = !self.no_shadows;
        config
    }

    fn renderer_options(&self, config: &ViewerConfig) -> Result<RendererOptions> {
        let (scene_source, shadow_source) = match &self.shader_dir {
            Some(dir) => (
                ProgramSource::from_dir(dir, ProgramKind::Scene)?,
                ProgramSource::from_dir(dir, ProgramKind::Shadow)?,
            ),
            None => (ProgramSource::builtin_scene(), ProgramSource::builtin_shadow()),
        };
        Ok(RendererOptions {
            shadow_map_size: config.shadow.map_size,
            indexed: config.model.indexed,
            scene_source,
            shadow_source,
        })
    }
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("{flag} expects a value. {USAGE}"))
}
