use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use micro3d::model::{Bucket, MeshAsset};
use micro3d::renderer::{DeviceCall, RecordingDevice, Renderer};
use micro3d::settings::Settings;
use micro3d::texture::Texture;
use micro3d::{decode_animation, decode_mesh, Figure};

#[derive(Debug, Parser)]
#[command(name = "micro3d-rs", version, about = "Decode, pose and replay compact 3D assets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a mesh summary
    Mesh {
        path: PathBuf,
        /// Dump as JSON; `--full` includes every buffer
        #[arg(long)]
        json: bool,
        #[arg(long)]
        full: bool,
    },

    /// Print the actions of an animation file
    Anim {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// Pose a mesh with an animation and print the posed bounds
    Pose {
        mesh: PathBuf,
        anim: PathBuf,
        #[arg(long)]
        action: Option<usize>,
        /// Keyframe position, fractions allowed
        #[arg(long, default_value_t = 0.0)]
        frame: f32,
    },

    /// Draw one frame against a recording device and print the device calls
    Replay {
        mesh: PathBuf,
        #[arg(long)]
        anim: Option<PathBuf>,
        #[arg(long)]
        action: Option<usize>,
        #[arg(long, default_value_t = 0.0)]
        frame: f32,
        #[arg(long)]
        pattern: Option<u32>,
        /// Indexed BMP bound to every texture slot
        #[arg(long)]
        texture: Option<PathBuf>,
        /// Command list file, little-endian u32 words
        #[arg(long)]
        commands: Option<PathBuf>,
    },

    /// Show persisted settings, optionally resetting them first
    Settings {
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Serialize)]
struct MeshSummary<'a> {
    version: u8,
    vertices: usize,
    normals: bool,
    textured_polygons: usize,
    colored_polygons: usize,
    indices: usize,
    bones: usize,
    patterns: usize,
    textures: usize,
    buckets: &'a [Bucket],
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_mesh(path: &Path) -> Result<MeshAsset> {
    decode_mesh(&read(path)?).with_context(|| format!("Failed to decode mesh {}", path.display()))
}

fn to_fixed(frame: f32) -> i32 {
    (frame * 65536.0) as i32
}

fn mesh_command(path: &Path, json: bool, full: bool) -> Result<()> {
    let mesh = load_mesh(path)?;
    let buckets = mesh.buckets.buckets();
    if full {
        println!("{}", serde_json::to_string_pretty(&mesh)?);
        return Ok(());
    }
    let summary = MeshSummary {
        version: mesh.version,
        vertices: mesh.vertex_count,
        normals: mesh.has_normals(),
        textured_polygons: mesh.textured.len(),
        colored_polygons: mesh.colored.len(),
        indices: mesh.indices.len(),
        bones: mesh.bones.len(),
        patterns: mesh.pattern_count,
        textures: mesh.texture_count,
        buckets: &buckets,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Mesh: {}", path.display());
    println!("  Version:   {}", summary.version);
    println!("  Vertices:  {} (normals: {})", summary.vertices, summary.normals);
    println!(
        "  Polygons:  {} textured, {} colored",
        summary.textured_polygons, summary.colored_polygons
    );
    println!("  Bones:     {}", summary.bones);
    println!("  Patterns:  {}", summary.patterns);
    println!("  Textures:  {}", summary.textures);
    println!("  Buckets:");
    for b in &buckets {
        println!(
            "    {:?} {:<4} slot {:>2} {} [{}..{})",
            b.kind,
            b.blend.name(),
            b.slot,
            if b.double_face { "double" } else { "single" },
            b.start,
            b.start + b.count
        );
    }
    Ok(())
}

fn anim_command(path: &Path, json: bool) -> Result<()> {
    let clip = decode_animation(&read(path)?)
        .with_context(|| format!("Failed to decode animation {}", path.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&clip)?);
        return Ok(());
    }
    println!("Animation: {} (v{}, {} bones)", path.display(), clip.version, clip.bone_count);
    for (i, action) in clip.actions.iter().enumerate() {
        let tags: Vec<String> = action.tracks.iter().map(|t| t.type_tag().to_string()).collect();
        println!(
            "  action {i}: {} keyframes, {} pattern events, types [{}]",
            action.keyframes,
            action.pattern_events.len(),
            tags.join(" ")
        );
    }
    Ok(())
}

fn pose_command(mesh: &Path, anim: &Path, action: Option<usize>, frame: f32) -> Result<()> {
    let settings = Settings::load();
    let mut figure = Figure::new(Arc::new(load_mesh(mesh)?));
    let clip = Arc::new(decode_animation(&read(anim)?)?);
    let action = action.unwrap_or(settings.playback.action);
    figure.set_posture(&clip, action, to_fixed(frame))?;

    let posed = figure.posed();
    let count = figure.mesh().vertex_count;
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for v in &posed.vertices[..count] {
        for axis in 0..3 {
            min[axis] = min[axis].min(v[axis]);
            max[axis] = max[axis].max(v[axis]);
        }
    }
    println!("action {action} frame {frame}: pattern {:#x}", figure.pattern());
    println!("  bounds min {min:?}");
    println!("  bounds max {max:?}");
    Ok(())
}

fn read_words(path: &Path) -> Result<Vec<u32>> {
    let bytes = read(path)?;
    let mut words = vec![0u32; bytes.len() / 4];
    let mut rdr = &bytes[..words.len() * 4];
    rdr.read_u32_into::<LittleEndian>(&mut words)?;
    Ok(words)
}

struct ReplayArgs {
    mesh: PathBuf,
    anim: Option<PathBuf>,
    action: Option<usize>,
    frame: f32,
    pattern: Option<u32>,
    texture: Option<PathBuf>,
    commands: Option<PathBuf>,
}

fn replay_command(args: ReplayArgs) -> Result<()> {
    let settings = Settings::load();
    let mut figure = Figure::new(Arc::new(load_mesh(&args.mesh)?));
    figure.set_pattern(args.pattern.unwrap_or(settings.playback.pattern))?;

    if let Some(path) = &args.anim {
        let clip = Arc::new(decode_animation(&read(path)?)?);
        let action = args.action.unwrap_or(settings.playback.action);
        figure.set_posture(&clip, action, to_fixed(args.frame))?;
    }
    if let Some(path) = &args.texture {
        let texture = Texture::from_bmp(&read(path)?)
            .with_context(|| format!("Failed to load texture {}", path.display()))?;
        figure.set_texture(texture)?;
    }

    let mut renderer = Renderer::new(RecordingDevice::new());
    settings.effect.apply(renderer.effect_mut());
    renderer.bind(settings.target.width, settings.target.height)?;
    renderer.layout_mut().projection = settings.target.projection;
    if let Some(path) = &args.commands {
        let words = read_words(path)?;
        info!("executing {} command words", words.len());
        renderer.execute_command_list(&words)?;
    }
    renderer.post_figure(&figure)?;
    renderer.release()?;

    let device = renderer.into_device();
    for call in &device.calls {
        match call {
            DeviceCall::Draw(d) => println!(
                "draw {:?} [{}..{}) depth_write={} blend={}",
                d.kind,
                d.start,
                d.start + d.count,
                d.depth_write,
                d.blend.name()
            ),
            other => println!("{other:?}"),
        }
    }
    Ok(())
}

fn settings_command(reset: bool) -> Result<()> {
    let settings = if reset {
        let defaults = Settings::default();
        defaults.save();
        defaults
    } else {
        Settings::load()
    };
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Mesh { path, json, full } => mesh_command(&path, json, full),
        Command::Anim { path, json } => anim_command(&path, json),
        Command::Pose {
            mesh,
            anim,
            action,
            frame,
        } => pose_command(&mesh, &anim, action, frame),
        Command::Replay {
            mesh,
            anim,
            action,
            frame,
            pattern,
            texture,
            commands,
        } => replay_command(ReplayArgs {
            mesh,
            anim,
            action,
            frame,
            pattern,
            texture,
            commands,
        }),
        Command::Settings { reset } => settings_command(reset),
    }
}
