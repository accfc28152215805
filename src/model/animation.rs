use super::Affine;
use serde::{Deserialize, Serialize};

/// Keyframed 3-vector channel. Keys are non-decreasing, at least one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vec3Track {
    pub keys: Vec<i32>,
    pub values: Vec<[f32; 3]>,
}

/// Keyframed scalar channel. Keys are non-decreasing, at least one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarTrack {
    pub keys: Vec<i32>,
    pub values: Vec<f32>,
}

/// Per-bone animation, one variant per type tag.
///
/// Rotations are direction vectors (the bone's local +Z is turned onto them);
/// rolls are angles in radians about the rotated Z axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoneTrack {
    /// Type 0: literal matrix
    Static(Affine),
    /// Type 1: identity
    Identity,
    /// Type 2
    Full {
        translate: Vec3Track,
        scale: Vec3Track,
        rotate: Vec3Track,
        roll: ScalarTrack,
    },
    /// Type 3
    Pivot {
        translate: [f32; 3],
        rotate: Vec3Track,
        roll: f32,
    },
    /// Type 4
    Orient { rotate: Vec3Track, roll: ScalarTrack },
    /// Type 5
    Aim { rotate: Vec3Track },
    /// Type 6
    Move {
        translate: Vec3Track,
        rotate: Vec3Track,
        roll: ScalarTrack,
    },
}

impl BoneTrack {
    pub fn type_tag(&self) -> u8 {
        match self {
            Self::Static(_) => 0,
            Self::Identity => 1,
            Self::Full { .. } => 2,
            Self::Pivot { .. } => 3,
            Self::Orient { .. } => 4,
            Self::Aim { .. } => 5,
            Self::Move { .. } => 6,
        }
    }

    /// Static tracks never change their output slot.
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static(_) | Self::Identity)
    }
}

/// Pattern switch at a frame, applied while playing an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEvent {
    pub frame: i32,
    pub mask: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub keyframes: i32,
    pub tracks: Vec<BoneTrack>, // one per bone
    pub pattern_events: Vec<PatternEvent>, // strictly ascending frames
}

impl Action {
    /// Playable length in the fixed-point frame representation, saturated
    /// at `i32::MAX` for counts of 32768 keyframes and up.
    pub fn num_frames(&self) -> i32 {
        (i64::from(self.keyframes) << 16).min(i64::from(i32::MAX)) as i32
    }

    /// Pattern mask in force at `frame` (fixed point), if the action carries events.
    pub fn pattern_at(&self, frame: i32) -> Option<u32> {
        let key = frame >> 16;
        self.pattern_events
            .iter()
            .rev()
            .find(|e| e.frame <= key)
            .map(|e| e.mask)
    }
}

/// Decoded animation file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub version: u8,
    pub bone_count: usize,
    pub actions: Vec<Action>,
}

impl AnimationClip {
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn num_frames(&self, action: usize) -> Option<i32> {
        self.actions.get(action).map(Action::num_frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_at_picks_latest_event_not_after_frame() {
        let action = Action {
            keyframes: 30,
            tracks: vec![BoneTrack::Identity],
            pattern_events: vec![
                PatternEvent { frame: 0, mask: 1 },
                PatternEvent { frame: 10, mask: 2 },
                PatternEvent { frame: 20, mask: 4 },
            ],
        };
        assert_eq!(action.pattern_at(0), Some(1));
        assert_eq!(action.pattern_at(9 << 16 | 0xFFFF), Some(1));
        assert_eq!(action.pattern_at(10 << 16), Some(2));
        assert_eq!(action.pattern_at(99 << 16), Some(4));
        assert_eq!(action.num_frames(), 30 << 16);
    }

    #[test]
    fn long_actions_saturate_frame_count() {
        let action = Action {
            keyframes: 40000,
            tracks: vec![BoneTrack::Identity],
            pattern_events: Vec::new(),
        };
        assert_eq!(action.num_frames(), i32::MAX);
        assert!(action.num_frames() > 100 << 16);
    }
}
