// Interpolation utilities
// Clamped linear sampling of keyframe tracks

use crate::model::{ScalarTrack, Vec3Track};

/// Continuous keyframe position of a fixed-point frame (`frame / 65536`).
pub fn kgf(frame: i32) -> f32 {
    frame as f32 / 65536.0
}

/// Where `kgf` falls in a key list.
enum Span {
    At(usize),
    Between(usize, f32),
}

/// Greatest key not after `kgf`; keys past either end clamp to that end.
fn locate(keys: &[i32], kgf: f32) -> Span {
    let last = keys.len() - 1;
    if last == 0 || kgf >= keys[last] as f32 {
        return Span::At(last);
    }
    match keys.iter().rposition(|&k| k as f32 <= kgf) {
        None => Span::At(0),
        Some(i) => {
            let k = keys[i] as f32;
            if k == kgf {
                Span::At(i)
            } else {
                let next = keys[i + 1] as f32;
                Span::Between(i, (kgf - k) / (next - k))
            }
        }
    }
}

impl Vec3Track {
    pub fn sample(&self, kgf: f32) -> [f32; 3] {
        match locate(&self.keys, kgf) {
            Span::At(i) => self.values[i],
            Span::Between(i, t) => lerp_vec3(&self.values[i], &self.values[i + 1], t),
        }
    }
}

impl ScalarTrack {
    pub fn sample(&self, kgf: f32) -> f32 {
        match locate(&self.keys, kgf) {
            Span::At(i) => self.values[i],
            Span::Between(i, t) => lerp_f32(self.values[i], self.values[i + 1], t),
        }
    }
}

/// Linear interpolation for vectors
pub fn lerp_vec3(a: &[f32; 3], b: &[f32; 3], t: f32) -> [f32; 3] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
    ]
}

/// Linear interpolation for scalars
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_keys() -> Vec3Track {
        Vec3Track {
            keys: vec![0, 100],
            values: vec![[0.0, 0.0, 0.0], [10.0, 20.0, 30.0]],
        }
    }

    #[test]
    fn midpoint_interpolates() {
        assert_eq!(two_keys().sample(kgf(50 << 16)), [5.0, 10.0, 15.0]);
    }

    #[test]
    fn past_last_key_clamps() {
        assert_eq!(two_keys().sample(kgf(150 << 16)), [10.0, 20.0, 30.0]);
    }

    #[test]
    fn exact_first_key_has_no_error() {
        assert_eq!(two_keys().sample(kgf(0)), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn single_key_is_constant() {
        let track = ScalarTrack {
            keys: vec![40],
            values: vec![1.5],
        };
        assert_eq!(track.sample(0.0), 1.5);
        assert_eq!(track.sample(99.0), 1.5);
    }

    #[test]
    fn before_first_key_clamps_to_first() {
        let track = ScalarTrack {
            keys: vec![10, 20],
            values: vec![1.0, 3.0],
        };
        assert_eq!(track.sample(5.0), 1.0);
        assert_eq!(track.sample(15.0), 2.0);
    }

    #[test]
    fn repeated_keys_step() {
        let track = ScalarTrack {
            keys: vec![0, 10, 10, 20],
            values: vec![0.0, 1.0, 5.0, 6.0],
        };
        assert_eq!(track.sample(10.0), 5.0);
        assert_eq!(track.sample(5.0), 0.5);
        assert_eq!(track.sample(15.0), 5.5);
    }
}
