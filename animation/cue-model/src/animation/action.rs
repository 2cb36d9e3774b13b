//! Per-clip playback state owned by a mixer

/// What happens when playback reaches the end of a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Play once and hold the last frame
    Once,
    /// Wrap back to the start
    #[default]
    Repeat,
}

impl LoopMode {
    pub fn from_looping(looping: bool) -> Self {
        if looping { Self::Repeat } else { Self::Once }
    }

    pub fn is_looping(self) -> bool {
        self == Self::Repeat
    }
}

/// A linear weight ramp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub from: f32,
    pub to: f32,
    pub elapsed: f32,
    pub duration: f32,
}

impl Fade {
    pub fn value(&self) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }

    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }

    pub fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Something that happened to an action during one mixer step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEvent {
    Looped,
    Finished,
}

/// Playback state of one clip
#[derive(Debug, Clone, PartialEq)]
pub struct ClipAction {
    clip: usize,
    time: f32,
    loop_mode: LoopMode,
    enabled: bool,
    finished: bool,
    weight: f32,
    fade: Option<Fade>,
}

impl ClipAction {
    /// A stopped action for the given clip index
    pub fn new(clip: usize) -> Self {
        Self {
            clip,
            time: 0.0,
            loop_mode: LoopMode::Repeat,
            enabled: false,
            finished: false,
            weight: 1.0,
            fade: None,
        }
    }

    pub fn clip(&self) -> usize {
        self.clip
    }

    /// Local playback time in seconds
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn set_loop_mode(&mut self, loop_mode: LoopMode) {
        self.loop_mode = loop_mode;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Enabled and still advancing
    pub fn is_running(&self) -> bool {
        self.enabled && !self.finished
    }

    pub fn fade(&self) -> Option<&Fade> {
        self.fade.as_ref()
    }

    /// True while a fade toward zero weight is in progress
    pub fn is_fading_out(&self) -> bool {
        self.enabled && self.fade.is_some_and(|f| f.to < f.from || f.to == 0.0)
    }

    /// Weight this action contributes to the blended pose
    pub fn effective_weight(&self) -> f32 {
        if !self.enabled {
            return 0.0;
        }
        match &self.fade {
            Some(fade) => self.weight * fade.value(),
            None => self.weight,
        }
    }

    /// Rewind to the start and enable
    pub fn restart(&mut self) {
        self.time = 0.0;
        self.finished = false;
        self.enabled = true;
    }

    /// Ramp from the current effective weight to `target` over `duration`
    ///
    /// A zero duration applies the target immediately; reaching zero
    /// disables the action.
    pub fn fade_to(&mut self, target: f32, duration: f32) {
        let from = self.effective_weight();
        if duration <= 0.0 {
            self.fade = None;
            if target <= 0.0 {
                self.enabled = false;
            } else {
                self.enabled = true;
                self.weight = target;
            }
            return;
        }

        self.enabled = true;
        self.weight = 1.0;
        self.fade = Some(Fade {
            from,
            to: target,
            elapsed: 0.0,
            duration,
        });
    }

    /// Disable without touching the playback time
    pub fn halt(&mut self) {
        self.enabled = false;
        self.fade = None;
    }

    /// Advance time and fades by `dt` seconds against a clip of `duration`
    pub fn advance(&mut self, dt: f32, duration: f32) -> Option<ActionEvent> {
        if !self.enabled {
            return None;
        }

        let event = if self.finished {
            None
        } else {
            self.advance_time(dt, duration)
        };

        if let Some(fade) = &mut self.fade {
            fade.elapsed += dt;
            if fade.is_done() {
                let to = fade.to;
                self.fade = None;
                if to <= 0.0 {
                    self.enabled = false;
                } else {
                    self.weight = to;
                }
            }
        }

        event
    }

    fn advance_time(&mut self, dt: f32, duration: f32) -> Option<ActionEvent> {
        // a single-key clip: repeat holds the pose, once finishes immediately
        if duration <= 0.0 {
            self.time = 0.0;
            if self.loop_mode == LoopMode::Once {
                self.finished = true;
                return Some(ActionEvent::Finished);
            }
            return None;
        }

        self.time += dt;
        match self.loop_mode {
            LoopMode::Repeat if self.time >= duration => {
                self.time %= duration;
                Some(ActionEvent::Looped)
            }
            LoopMode::Once if self.time >= duration => {
                self.time = duration;
                self.finished = true;
                Some(ActionEvent::Finished)
            }
            _ => None,
        }
    }
}
