//! The animated model controller
//!
//! [`AnimatedModel`] wraps one loaded skinned asset and turns cue requests
//! into mixer crossfades. Each instance owns its scene graph and mixer;
//! only the clip definitions are shared between an instance and its
//! duplicates.

use std::sync::Arc;

use glam::{Mat4, Quat};

use crate::animation::{AnimationClip, AnimationMixer, ClipAction, LoopMode, MixerEvent, PlaybackState};
use crate::error::{LoadError, ModelError, Result};
use crate::loader::AssetLoader;
use crate::math::Aabb;
use crate::scene::{SceneGraph, SceneNode, Transform};
use crate::skinning;

/// The scene graph of one model instance plus its two synthetic nodes
///
/// The root node carries the gameplay transform. Beneath it, the offset
/// node carries a fixed rotation about +Y so assets authored facing another
/// axis line up with the game's forward direction. The asset's own scene
/// roots hang below the offset node. Both synthetic nodes are appended after
/// the asset's nodes, so asset node indices are unchanged.
#[derive(Debug)]
pub struct ModelRoot {
    graph: SceneGraph,
    root: usize,
    offset: usize,
    rotation_offset: f32,
}

impl ModelRoot {
    pub fn new(mut graph: SceneGraph, rotation_offset: f32) -> Self {
        let asset_roots = graph.roots.clone();

        let root = graph.add_node(SceneNode::new(Some("ModelRoot".into()), Transform::IDENTITY));
        let offset = graph.add_node(SceneNode::new(
            Some("RotationOffset".into()),
            Transform::from_rotation(Quat::from_rotation_y(rotation_offset)),
        ));
        graph.attach(root, offset);
        for asset_root in asset_roots {
            graph.attach(offset, asset_root);
        }
        graph.update_world_matrices();

        Self {
            graph,
            root,
            offset,
            rotation_offset,
        }
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Index of the gameplay root node
    pub fn root_node(&self) -> usize {
        self.root
    }

    /// Index of the node carrying the rotation offset
    pub fn offset_node(&self) -> usize {
        self.offset
    }

    pub fn rotation_offset(&self) -> f32 {
        self.rotation_offset
    }

    /// Gameplay transform (position, facing, scale)
    pub fn transform(&self) -> &Transform {
        &self.graph.nodes[self.root].transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.graph.nodes[self.root].transform
    }
}

/// Deep-copy an animatable graph and bind a fresh mixer to the copy
///
/// Geometry, materials and skeleton are copied; the clip table is shared.
/// The copy is reset to the rest pose the source mixer captured before the
/// new mixer binds to it, so the copy does not inherit the source's
/// current pose as its rest pose.
pub fn duplicate_animatable(
    root: &ModelRoot,
    mixer: &AnimationMixer,
) -> Result<(ModelRoot, AnimationMixer)> {
    let mut graph = root.graph.duplicate();
    mixer.restore_rest_pose(&mut graph);
    graph.update_world_matrices();

    let copy_mixer = AnimationMixer::new(Arc::clone(mixer.clips()), &graph)?;
    let copy_root = ModelRoot {
        graph,
        root: root.root,
        offset: root.offset,
        rotation_offset: root.rotation_offset,
    };

    Ok((copy_root, copy_mixer))
}

#[derive(Debug)]
struct Loaded {
    root: ModelRoot,
    mixer: AnimationMixer,
    current: Option<usize>,
    last: Option<usize>,
}

#[derive(Debug, Default)]
enum ModelState {
    #[default]
    Empty,
    Loading,
    Ready(Box<Loaded>),
}

fn validate_duration(seconds: f32) -> Result<()> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(())
    } else {
        Err(ModelError::InvalidDuration(seconds))
    }
}

/// A skinned model driven by clip cues
///
/// Deliberately not `Clone`: use [`AnimatedModel::duplicate`], which copies
/// the skeleton instead of sharing it.
#[derive(Debug, Default)]
pub struct AnimatedModel {
    state: ModelState,
}

impl AnimatedModel {
    /// An empty model; call [`load`](Self::load) before anything else
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a model and load `source` into it
    pub async fn load_from<L: AssetLoader>(
        loader: &L,
        source: &str,
        rotation_offset: f32,
    ) -> Result<Self> {
        let mut model = Self::new();
        model.load(loader, source, rotation_offset).await?;
        Ok(model)
    }

    /// Fetch and parse a skinned asset, then bind a mixer to it
    ///
    /// On failure the model is left empty. If the returned future is dropped
    /// before it resolves, the model keeps reporting
    /// [`ModelError::StillLoading`].
    pub async fn load<L: AssetLoader>(
        &mut self,
        loader: &L,
        source: &str,
        rotation_offset: f32,
    ) -> Result<()> {
        match self.state {
            ModelState::Empty => {}
            ModelState::Loading => return Err(ModelError::StillLoading),
            ModelState::Ready(_) => return Err(ModelError::AlreadyLoaded),
        }

        self.state = ModelState::Loading;
        match Self::build(loader, source, rotation_offset).await {
            Ok(loaded) => {
                self.state = ModelState::Ready(Box::new(loaded));
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to load '{source}': {e}");
                self.state = ModelState::Empty;
                Err(e)
            }
        }
    }

    async fn build<L: AssetLoader>(loader: &L, source: &str, rotation_offset: f32) -> Result<Loaded> {
        let asset = loader.load(source).await?;
        if asset.clips.is_empty() {
            return Err(LoadError::NoClips(source.to_string()).into());
        }

        let root = ModelRoot::new(asset.graph, rotation_offset);
        let clips: Arc<[AnimationClip]> = asset.clips.into();
        let mixer = AnimationMixer::new(clips, root.graph())?;

        log::debug!(
            "Loaded '{source}': {} clips, {} nodes, rotation offset {rotation_offset:.3} rad",
            mixer.clip_count(),
            root.graph().nodes.len()
        );

        Ok(Loaded {
            root,
            mixer,
            current: None,
            last: None,
        })
    }

    fn loaded(&self) -> Result<&Loaded> {
        match &self.state {
            ModelState::Ready(loaded) => Ok(loaded),
            ModelState::Loading => Err(ModelError::StillLoading),
            ModelState::Empty => Err(ModelError::NotLoaded),
        }
    }

    fn loaded_mut(&mut self) -> Result<&mut Loaded> {
        match &mut self.state {
            ModelState::Ready(loaded) => Ok(loaded),
            ModelState::Loading => Err(ModelError::StillLoading),
            ModelState::Empty => Err(ModelError::NotLoaded),
        }
    }

    /// Switch to `clip_index`, crossfading over `blend_seconds`
    ///
    /// Cueing the clip that is already current and still running keeps its
    /// playback time; only the loop mode is updated, and a pending stop is
    /// cancelled by fading the clip back in. Any other cue restarts the clip
    /// from the beginning. `blend_seconds == 0` is a hard cut.
    pub fn cue(&mut self, clip_index: usize, looping: bool, blend_seconds: f32) -> Result<()> {
        validate_duration(blend_seconds)?;
        let loaded = self.loaded_mut()?;

        let count = loaded.mixer.clip_count();
        if clip_index >= count {
            return Err(ModelError::ClipIndexOutOfRange {
                index: clip_index,
                count,
            });
        }

        let loop_mode = LoopMode::from_looping(looping);
        if loaded.current == Some(clip_index)
            && let Some(action) = loaded.mixer.action(clip_index)
            && action.is_running()
        {
            let stopping = action.is_fading_out();
            loaded.mixer.set_loop_mode(clip_index, loop_mode);
            if stopping {
                log::debug!("Cue {clip_index} cancels pending stop, fading back in over {blend_seconds}s");
                loaded.mixer.fade_in(clip_index, blend_seconds);
            }
            return Ok(());
        }

        loaded.last = loaded.current;
        loaded.current = Some(clip_index);
        loaded.mixer.crossfade_to(clip_index, loop_mode, blend_seconds);

        log::debug!(
            "Cue {} -> {clip_index} ('{}'), {loop_mode:?}, blend {blend_seconds}s",
            loaded.last.map_or_else(|| "none".to_string(), |c| c.to_string()),
            loaded.mixer.clips()[clip_index].name
        );
        Ok(())
    }

    /// Fade every weighted clip back to the rest pose
    ///
    /// The cue history is left alone.
    pub fn stop(&mut self, blend_seconds: f32) -> Result<()> {
        validate_duration(blend_seconds)?;
        let loaded = self.loaded_mut()?;
        loaded.mixer.fade_out_all(blend_seconds);
        log::debug!("Stop over {blend_seconds}s (current {:?})", loaded.current);
        Ok(())
    }

    /// Step the mixer and refresh world matrices; call once per frame
    pub fn advance(&mut self, delta_time: f32) -> Result<Vec<MixerEvent>> {
        validate_duration(delta_time)?;
        let loaded = self.loaded_mut()?;

        let events = loaded.mixer.update(delta_time, loaded.root.graph_mut());
        loaded.root.graph_mut().update_world_matrices();

        for event in &events {
            log::debug!("Mixer event: {event:?}");
        }
        Ok(events)
    }

    /// An independent copy with its own skeleton, geometry and mixer
    ///
    /// The copy starts in the rest pose with nothing cued.
    pub fn duplicate(&self) -> Result<Self> {
        let loaded = self.loaded()?;
        let (root, mixer) = duplicate_animatable(&loaded.root, &loaded.mixer)?;

        Ok(Self {
            state: ModelState::Ready(Box::new(Loaded {
                root,
                mixer,
                current: None,
                last: None,
            })),
        })
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ModelState::Ready(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ModelState::Loading)
    }

    /// Most recently cued clip
    pub fn current_animation(&self) -> Option<usize> {
        self.loaded().ok().and_then(|l| l.current)
    }

    /// Clip that was current before the most recent switching cue
    pub fn last_animation(&self) -> Option<usize> {
        self.loaded().ok().and_then(|l| l.last)
    }

    pub fn clip_count(&self) -> usize {
        self.loaded().map_or(0, |l| l.mixer.clip_count())
    }

    /// Clip table in declaration order
    pub fn clips(&self) -> &[AnimationClip] {
        match self.loaded() {
            Ok(loaded) => &loaded.mixer.clips()[..],
            Err(_) => &[],
        }
    }

    pub fn clip_index(&self, name: &str) -> Option<usize> {
        self.clips().iter().position(|c| c.name == name)
    }

    /// Effective blend weight of a clip
    pub fn clip_weight(&self, clip_index: usize) -> f32 {
        self.loaded().map_or(0.0, |l| l.mixer.weight(clip_index))
    }

    /// Local playback time of a clip
    pub fn clip_time(&self, clip_index: usize) -> Option<f32> {
        self.loaded()
            .ok()?
            .mixer
            .action(clip_index)
            .map(ClipAction::time)
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.loaded().map_or(PlaybackState::Idle, |l| {
            PlaybackState::resolve(&l.mixer, l.current, l.last)
        })
    }

    pub fn rotation_offset(&self) -> Option<f32> {
        self.loaded().ok().map(|l| l.root.rotation_offset())
    }

    pub fn root(&self) -> Option<&ModelRoot> {
        self.loaded().ok().map(|l| &l.root)
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        self.root().map(ModelRoot::graph)
    }

    pub fn root_transform(&self) -> Option<&Transform> {
        self.root().map(ModelRoot::transform)
    }

    /// Mutable gameplay transform; picked up by the next [`advance`](Self::advance)
    pub fn root_transform_mut(&mut self) -> Option<&mut Transform> {
        self.loaded_mut().ok().map(|l| l.root.transform_mut())
    }

    /// Skinning matrices of skin `skin_index` in the current pose
    pub fn joint_matrices(&self, skin_index: usize) -> Option<Vec<Mat4>> {
        let graph = self.scene()?;
        let skin = graph.skins.get(skin_index)?;
        Some(skinning::joint_matrices(graph, skin))
    }

    /// World-space bounds of the posed, skinned geometry
    pub fn bounding_box(&self) -> Option<Aabb> {
        skinning::skinned_bounds(self.scene()?)
    }
}
