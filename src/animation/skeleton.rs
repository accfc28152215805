// Skeleton bone calculations
// Per-type construction of a bone's local transform at a frame

use super::interpolation::kgf;
use crate::model::{Affine, BoneTrack};
use nalgebra_glm as glm;

/// Rotation turning the local +Z axis onto `(x, y, z)`.
///
/// `(0, 0, z)` gives identity for `z >= 0` and a half turn about X otherwise.
/// The general case is Rodrigues' formula about `Z × dir`, with the two
/// axis-aligned rotation axes taking closed forms.
pub fn direction_rotation(dir: [f32; 3]) -> glm::Mat3 {
    let [x, y, z] = dir;
    if x == 0.0 && y == 0.0 {
        return if z >= 0.0 {
            glm::Mat3::identity()
        } else {
            glm::Mat3::new(1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, -1.0)
        };
    }

    let len = (x * x + y * y + z * z).sqrt();
    let (x, y, z) = (x / len, y / len, z / len);
    let c = z;
    let s = (1.0 - z * z).max(0.0).sqrt();

    let axis_len = (x * x + y * y).sqrt();
    let rx = -y / axis_len;
    let ry = x / axis_len;

    if rx == 1.0 && ry == 0.0 {
        return glm::Mat3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c);
    }
    if rx == 0.0 && ry == 1.0 {
        return glm::Mat3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c);
    }

    let t = 1.0 - c;
    glm::Mat3::new(
        c + t * rx * rx,
        t * rx * ry,
        s * ry,
        t * rx * ry,
        c + t * ry * ry,
        -s * rx,
        -s * ry,
        s * rx,
        c,
    )
}

/// Turn the X and Y basis columns about local Z by `angle` radians.
pub fn apply_roll(m: &mut glm::Mat3, angle: f32) {
    if angle == 0.0 {
        return;
    }
    let (s, c) = angle.sin_cos();
    let x = m.column(0).into_owned();
    let y = m.column(1).into_owned();
    m.set_column(0, &(x * c + y * s));
    m.set_column(1, &(y * c - x * s));
}

/// Scales each column by the corresponding scale component.
pub fn apply_scaling_to_matrix(m: &glm::Mat3, scale: [f32; 3]) -> glm::Mat3 {
    let mut out = *m;
    for (col, s) in scale.iter().enumerate() {
        out.set_column(col, &(m.column(col) * *s));
    }
    out
}

fn rotate_and_roll(slot: &mut Affine, rotate: [f32; 3], roll: f32) {
    let mut linear = direction_rotation(rotate);
    apply_roll(&mut linear, roll);
    slot.set_linear(&linear);
}

/// Write `track`'s local transform at fixed-point `frame` into `slot`.
///
/// `memo` holds the frame last written; repeating it is a no-op. Static
/// tracks are written once and never again.
pub fn evaluate(track: &BoneTrack, slot: &mut Affine, memo: &mut Option<i32>, frame: i32) {
    if track.is_static() {
        if memo.is_none() {
            *slot = match track {
                BoneTrack::Static(m) => *m,
                _ => Affine::IDENTITY,
            };
            *memo = Some(frame);
        }
        return;
    }
    if *memo == Some(frame) {
        return;
    }
    *memo = Some(frame);

    let k = kgf(frame);
    *slot = Affine::IDENTITY;
    match track {
        BoneTrack::Static(_) | BoneTrack::Identity => {}
        BoneTrack::Full {
            translate,
            scale,
            rotate,
            roll,
        } => {
            slot.set_translation(translate.sample(k));
            let mut linear = direction_rotation(rotate.sample(k));
            apply_roll(&mut linear, roll.sample(k));
            slot.set_linear(&apply_scaling_to_matrix(&linear, scale.sample(k)));
        }
        BoneTrack::Pivot {
            translate,
            rotate,
            roll,
        } => {
            slot.set_translation(*translate);
            rotate_and_roll(slot, rotate.sample(k), *roll);
        }
        BoneTrack::Orient { rotate, roll } => {
            rotate_and_roll(slot, rotate.sample(k), roll.sample(k));
        }
        BoneTrack::Aim { rotate } => {
            slot.set_linear(&direction_rotation(rotate.sample(k)));
        }
        BoneTrack::Move {
            translate,
            rotate,
            roll,
        } => {
            slot.set_translation(translate.sample(k));
            rotate_and_roll(slot, rotate.sample(k), roll.sample(k));
        }
    }
}
