//! Frame arithmetic for the clip boundary walk.
//!
//! All positions are frame indices local to the current ("from") clip. The overlap with the next
//! clip occupies the last `safe_frames` frames of the current clip.

/// Frame counts at the boundary between the current clip and its successor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundaryFrames {
    /// Frames in the current clip.
    pub from_frames: u64,
    /// Frames in the next clip, if any.
    pub to_frames: Option<u64>,
    /// Requested transition length in frames.
    pub transition_frames: u64,
    /// Overlap actually rendered: the transition clamped to half of either clip.
    pub safe_frames: u64,
}

fn secs_to_frames(secs: f64, fps: f64) -> u64 {
    let n = (secs * fps).round();
    if n.is_finite() && n > 0.0 { n as u64 } else { 0 }
}

impl BoundaryFrames {
    /// Frame counts for a clip of `from_duration` seconds followed by an optional clip of
    /// `to_duration` seconds, joined by a transition of `transition_duration` seconds.
    pub fn new(
        fps: f64,
        from_duration: f64,
        to_duration: Option<f64>,
        transition_duration: f64,
    ) -> Self {
        let from_frames = secs_to_frames(from_duration, fps);
        let to_frames = to_duration.map(|d| secs_to_frames(d, fps));
        let transition_frames = secs_to_frames(transition_duration, fps);
        let shortest = match to_frames {
            Some(to) => from_frames.min(to),
            None => from_frames,
        };
        Self {
            from_frames,
            to_frames,
            transition_frames,
            safe_frames: (shortest / 2).min(transition_frames),
        }
    }

    /// Position relative to the start of the overlap. Negative before the overlap.
    pub fn transition_frame_at(&self, from_frame_at: u64) -> i64 {
        let overlap_start = self.from_frames - self.safe_frames;
        from_frame_at as i64 - overlap_start as i64
    }

    /// Return `true` once the current clip has no frames left to emit.
    pub fn should_advance(&self, from_frame_at: u64) -> bool {
        self.transition_frame_at(from_frame_at) >= self.safe_frames as i64
    }

    /// Return `true` when `from_frame_at` lies inside the overlap.
    pub fn in_transition(&self, from_frame_at: u64) -> bool {
        self.safe_frames > 0 && self.transition_frame_at(from_frame_at) >= 0
    }

    /// Raw transition progress in `[0, 1)` for a frame inside the overlap.
    pub fn progress(&self, from_frame_at: u64) -> f64 {
        if self.safe_frames == 0 {
            return 0.0;
        }
        (self.transition_frame_at(from_frame_at).max(0) as f64) / self.safe_frames as f64
    }
}

/// Clip-local time in seconds of frame `frame_at` out of `num_frames`.
pub fn clip_time(duration: f64, frame_at: u64, num_frames: u64) -> f64 {
    if num_frames == 0 {
        return 0.0;
    }
    duration * frame_at as f64 / num_frames as f64
}

/// Number of frames the render loop writes for clips given as `(duration, transition)` pairs.
pub fn planned_frame_count(fps: f64, clips: &[(f64, f64)]) -> u64 {
    let mut total = 0u64;
    let mut start_at = 0u64;
    for (i, &(duration, transition)) in clips.iter().enumerate() {
        let next = clips.get(i + 1).map(|&(d, _)| d);
        let b = BoundaryFrames::new(fps, duration, next, transition);
        total += b.from_frames.saturating_sub(start_at);
        start_at = b.safe_frames;
    }
    total
}

#[cfg(test)]
#[path = "../../tests/unit/render/timeline.rs"]
mod tests;
