//! Skinned model command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Subcommand};
use glam::EulerRot;

use cue_model::skinning::skinned_bounds;
use cue_model::{
    AnimatedModel, AnimationClip, AssetLoader, Buttons, GltfLoader, InputState, LoadedAsset,
    LocomotionDriver, LocomotionProfile, MixerEvent,
};

use crate::utils::tree::scene_tree;
use crate::utils::{
    TreeOptions, add_table_row, clip_label, clip_table, create_table, format_bytes, format_seconds,
    format_state, format_vec3, render_tree,
};

#[derive(Subcommand)]
pub enum ModelCommands {
    /// Display information about a glTF/GLB model
    Info {
        /// Path to the model file
        file: PathBuf,

        /// Show skins, materials and meshes
        #[arg(short, long)]
        detailed: bool,
    },

    /// Display the node hierarchy and clip list as a tree
    Tree {
        /// Path to the model file
        file: PathBuf,

        /// Maximum depth to display
        #[arg(short, long, default_value = "10")]
        depth: usize,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Simulate cueing a clip and print the playback state per frame
    Play(PlayArgs),

    /// Run the locomotion driver over a scripted input sequence
    Drive(DriveArgs),
}

#[derive(Args)]
pub struct PlayArgs {
    /// Path to the model file
    pub file: PathBuf,

    /// Clip index to cue
    #[arg(short, long)]
    pub clip: usize,

    /// Clip to have playing before the cue
    #[arg(long)]
    pub from: Option<usize>,

    /// Play the clip once and hold its last frame
    #[arg(long)]
    pub once: bool,

    /// Crossfade duration in seconds
    #[arg(short, long, default_value = "0.2")]
    pub blend: f32,

    /// Simulated time in seconds
    #[arg(short = 't', long, default_value = "1.0")]
    pub duration: f32,

    /// Simulated frames per second
    #[arg(long, default_value = "10")]
    pub fps: f32,

    /// Rotation about +Y applied to the model, in radians
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub rotation_offset: f32,
}

#[derive(Args)]
pub struct DriveArgs {
    /// Path to the model file
    pub file: PathBuf,

    /// Input script: comma-separated `buttons:seconds` steps, buttons joined
    /// with `+` (forward, back, left, right, sprint, attack, idle)
    #[arg(short, long)]
    pub script: String,

    /// YAML locomotion profile (clip indices and blend times)
    #[arg(short, long)]
    pub profile: Option<PathBuf>,

    /// Attack clip, overriding the profile
    #[arg(long)]
    pub attack_clip: Option<usize>,

    /// Simulated frames per second
    #[arg(long, default_value = "30")]
    pub fps: f32,
}

pub async fn execute(cmd: ModelCommands) -> Result<()> {
    match cmd {
        ModelCommands::Info { file, detailed } => handle_info(&file, detailed).await,
        ModelCommands::Tree {
            file,
            depth,
            no_color,
        } => handle_tree(&file, depth, no_color).await,
        ModelCommands::Play(args) => handle_play(args).await,
        ModelCommands::Drive(args) => handle_drive(args).await,
    }
}

async fn load_asset(path: &Path) -> Result<LoadedAsset> {
    GltfLoader::default()
        .load(&path.to_string_lossy())
        .await
        .with_context(|| format!("Failed to load model from {}", path.display()))
}

async fn load_model(path: &Path, rotation_offset: f32) -> Result<AnimatedModel> {
    AnimatedModel::load_from(&GltfLoader::default(), &path.to_string_lossy(), rotation_offset)
        .await
        .with_context(|| format!("Failed to load model from {}", path.display()))
}

fn frame_step(fps: f32) -> Result<f32> {
    if !fps.is_finite() || fps <= 0.0 {
        bail!("--fps must be a positive number, got {fps}");
    }
    Ok(1.0 / fps)
}

fn format_events(events: &[MixerEvent], clips: &[AnimationClip]) -> String {
    events
        .iter()
        .map(|event| match *event {
            MixerEvent::Looped { clip } => format!("looped {}", clip_label(clips, clip)),
            MixerEvent::Finished { clip } => format!("finished {}", clip_label(clips, clip)),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_weights(model: &AnimatedModel, clips: &[AnimationClip]) -> String {
    (0..clips.len())
        .filter_map(|i| {
            let weight = model.clip_weight(i);
            (weight > 0.0).then(|| format!("{}={weight:.2}", clip_label(clips, i)))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_buttons(buttons: Buttons) -> String {
    if buttons.is_empty() {
        return "idle".to_string();
    }
    buttons
        .iter_names()
        .map(|(name, _)| name.to_lowercase())
        .collect::<Vec<_>>()
        .join("+")
}

/// Parse `forward+sprint:1.5,attack:0.2,idle:1` into timed input steps
pub fn parse_script(script: &str) -> Result<Vec<(Buttons, f32)>> {
    let mut steps = Vec::new();

    for step in script.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (names, seconds) = step
            .split_once(':')
            .ok_or_else(|| anyhow!("Script step '{step}' is missing ':seconds'"))?;
        let seconds: f32 = seconds
            .trim()
            .parse()
            .with_context(|| format!("Invalid duration in script step '{step}'"))?;
        if !seconds.is_finite() || seconds < 0.0 {
            bail!("Script step '{step}' has a negative duration");
        }

        let mut buttons = Buttons::empty();
        for name in names.split('+').map(str::trim) {
            if name.eq_ignore_ascii_case("idle") || name.eq_ignore_ascii_case("none") {
                continue;
            }
            buttons |= Buttons::from_name(&name.to_uppercase())
                .ok_or_else(|| anyhow!("Unknown button '{name}' in script step '{step}'"))?;
        }
        steps.push((buttons, seconds));
    }

    if steps.is_empty() {
        bail!("Script is empty");
    }
    Ok(steps)
}

async fn handle_info(path: &Path, detailed: bool) -> Result<()> {
    println!("Loading model: {}", path.display());

    let mut asset = load_asset(path).await?;
    let graph = &mut asset.graph;
    graph.update_world_matrices();

    println!("\n=== Model Information ===");
    if let Ok(metadata) = tokio::fs::metadata(path).await {
        println!("File size: {}", format_bytes(metadata.len()));
    }
    println!("Nodes: {}", graph.nodes.len());
    println!(
        "Meshes: {} ({} vertices)",
        graph.meshes.len(),
        graph.meshes.iter().map(|m| m.vertex_count()).sum::<usize>()
    );
    println!(
        "Skins: {} ({} joints)",
        graph.skins.len(),
        graph.skins.iter().map(|s| s.joints.len()).sum::<usize>()
    );
    println!("Materials: {}", graph.materials.len());

    match skinned_bounds(graph) {
        Some(bounds) => println!(
            "Bind-pose bounds: {} .. {} (size {})",
            format_vec3(bounds.min),
            format_vec3(bounds.max),
            format_vec3(bounds.size())
        ),
        None => println!("Bind-pose bounds: no geometry"),
    }

    if asset.clips.is_empty() {
        println!("\nNo animation clips");
    } else {
        println!("\n=== Clips ({}) ===", asset.clips.len());
        clip_table(&asset.clips).printstd();
    }

    if detailed {
        let graph = &asset.graph;

        if !graph.skins.is_empty() {
            println!("\n=== Skins ===");
            let mut table = create_table(&["#", "Name", "Joints", "Inverse binds"]);
            for (i, skin) in graph.skins.iter().enumerate() {
                add_table_row(
                    &mut table,
                    [
                        i.to_string(),
                        skin.name.clone().unwrap_or_default(),
                        skin.joints.len().to_string(),
                        skin.inverse_bind_matrices.len().to_string(),
                    ],
                );
            }
            table.printstd();
        }

        if !graph.meshes.is_empty() {
            println!("\n=== Meshes ===");
            let mut table = create_table(&["#", "Name", "Primitives", "Vertices", "Skinned"]);
            for (i, mesh) in graph.meshes.iter().enumerate() {
                add_table_row(
                    &mut table,
                    [
                        i.to_string(),
                        mesh.name.clone().unwrap_or_default(),
                        mesh.primitives.len().to_string(),
                        mesh.vertex_count().to_string(),
                        mesh.primitives.iter().any(|p| p.is_skinned()).to_string(),
                    ],
                );
            }
            table.printstd();
        }

        if !graph.materials.is_empty() {
            println!("\n=== Materials ===");
            let mut table = create_table(&["#", "Name", "Base color", "Texture", "Double-sided"]);
            for (i, material) in graph.materials.iter().enumerate() {
                let [r, g, b, a] = material.base_color;
                add_table_row(
                    &mut table,
                    [
                        i.to_string(),
                        material.name.clone().unwrap_or_default(),
                        format!("{r:.2} {g:.2} {b:.2} {a:.2}"),
                        material
                            .base_color_texture
                            .map_or_else(|| "-".to_string(), |t| t.to_string()),
                        material.double_sided.to_string(),
                    ],
                );
            }
            table.printstd();
        }
    }

    Ok(())
}

async fn handle_tree(path: &Path, depth: usize, no_color: bool) -> Result<()> {
    let asset = load_asset(path).await?;

    let title = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let tree = scene_tree(&title, &asset.graph, &asset.clips);

    let options = TreeOptions {
        max_depth: Some(depth),
        no_color,
        ..TreeOptions::default()
    };
    print!("{}", render_tree(&tree, &options));
    Ok(())
}

async fn handle_play(args: PlayArgs) -> Result<()> {
    let step = frame_step(args.fps)?;
    if !args.duration.is_finite() || args.duration < 0.0 {
        bail!("--duration must not be negative");
    }

    let mut model = load_model(&args.file, args.rotation_offset).await?;
    let clips = model.clips().to_vec();

    if let Some(from) = args.from {
        model
            .cue(from, true, 0.0)
            .with_context(|| format!("Failed to cue starting clip {from}"))?;
    }
    model
        .cue(args.clip, !args.once, args.blend)
        .with_context(|| format!("Failed to cue clip {}", args.clip))?;

    let mut table = create_table(&["Frame", "Time", "State", "Weights", "Events"]);
    add_table_row(
        &mut table,
        [
            "0".to_string(),
            format_seconds(0.0),
            format_state(&model.playback_state(), &clips),
            format_weights(&model, &clips),
            String::new(),
        ],
    );

    let frames = (args.duration / step).ceil() as usize;
    for frame in 1..=frames {
        let events = model.advance(step)?;
        add_table_row(
            &mut table,
            [
                frame.to_string(),
                format_seconds(frame as f32 * step),
                format_state(&model.playback_state(), &clips),
                format_weights(&model, &clips),
                format_events(&events, &clips),
            ],
        );
    }
    table.printstd();

    if let Some(bounds) = model.bounding_box() {
        println!("Final bounds: {} .. {}", format_vec3(bounds.min), format_vec3(bounds.max));
    }
    Ok(())
}

async fn handle_drive(args: DriveArgs) -> Result<()> {
    let step = frame_step(args.fps)?;
    let script = parse_script(&args.script)?;

    let mut profile = match &args.profile {
        Some(path) => LocomotionProfile::from_yaml(path)
            .map_err(|e| anyhow!("Failed to load profile {}: {e}", path.display()))?,
        None => LocomotionProfile::default(),
    };
    if args.attack_clip.is_some() {
        profile.attack_clip = args.attack_clip;
    }
    log::info!("Locomotion profile: {profile:?}");

    let mut model = load_model(&args.file, 0.0).await?;
    let clips = model.clips().to_vec();
    let mut driver = LocomotionDriver::new(profile);

    let mut table = create_table(&["Frame", "Time", "Input", "State", "Events"]);
    let mut events = Vec::new();
    let mut frame = 0usize;
    let mut last_clip = None;

    for (buttons, seconds) in script {
        let input = InputState::new(buttons);
        let frames = ((seconds / step).round() as usize).max(1);

        for _ in 0..frames {
            driver
                .update(&mut model, &input, &events)
                .context("Locomotion driver rejected a cue")?;
            events = model.advance(step)?;
            frame += 1;

            let current = model.current_animation();
            if current != last_clip || !events.is_empty() {
                add_table_row(
                    &mut table,
                    [
                        frame.to_string(),
                        format_seconds(frame as f32 * step),
                        format_buttons(buttons),
                        format_state(&model.playback_state(), &clips),
                        format_events(&events, &clips),
                    ],
                );
                last_clip = current;
            }
        }
    }
    table.printstd();

    if let Some(transform) = model.root_transform() {
        let (yaw, _, _) = transform.rotation.to_euler(EulerRot::YXZ);
        println!("Final facing: {yaw:.3} rad");
    }
    Ok(())
}
