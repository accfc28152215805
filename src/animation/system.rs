// Pose arena
// Per-bone output slots for one action, evaluated in place every frame

use super::skeleton::evaluate;
use crate::error::PoseError;
use crate::model::{Affine, AnimationClip};
use log::debug;

/// Owned matrix slots for the action currently being played.
///
/// Slot `i` holds bone `i`'s local transform; `memo[i]` is the fixed-point
/// frame it was last written for. Switching action resets both.
#[derive(Debug, Clone, Default)]
pub struct PoseArena {
    action: Option<usize>,
    slots: Vec<Affine>,
    memo: Vec<Option<i32>>,
}

impl PoseArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(&self) -> Option<usize> {
        self.action
    }

    pub fn slots(&self) -> &[Affine] {
        &self.slots
    }

    pub fn reset(&mut self) {
        self.action = None;
        self.slots.clear();
        self.memo.clear();
    }

    /// Evaluate every bone of `action` at `frame`, clamped to the action's length.
    pub fn evaluate_all(
        &mut self,
        clip: &AnimationClip,
        action: usize,
        frame: i32,
    ) -> Result<&[Affine], PoseError> {
        let entry = clip.actions.get(action).ok_or(PoseError::InvalidAction {
            action,
            count: clip.action_count(),
        })?;
        if frame < 0 {
            return Err(PoseError::InvalidFrame { frame });
        }
        let frame = frame.min(entry.num_frames());

        if self.action != Some(action) || self.slots.len() != entry.tracks.len() {
            debug!("pose arena: switching to action {action}");
            self.action = Some(action);
            self.slots = vec![Affine::IDENTITY; entry.tracks.len()];
            self.memo = vec![None; entry.tracks.len()];
        }

        for ((track, slot), memo) in entry
            .tracks
            .iter()
            .zip(self.slots.iter_mut())
            .zip(self.memo.iter_mut())
        {
            evaluate(track, slot, memo, frame);
        }
        Ok(&self.slots)
    }

    /// Dynamic pattern in force at `frame`, if the action carries events.
    pub fn pattern_at(clip: &AnimationClip, action: usize, frame: i32) -> Option<u32> {
        clip.actions.get(action)?.pattern_at(frame)
    }
}
