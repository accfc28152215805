use super::reader::Reader;
use crate::error::DecodeError;
use crate::model::{
    Action, Affine, AnimationClip, BoneTrack, PatternEvent, ScalarTrack, Vec3Track, TO_FLOAT,
};
use log::{debug, warn};
use std::f32::consts::TAU;

/// Angle unit: 4096 = one full turn.
const ANGLE_UNIT: f32 = 4096.0;

/// Decode an animation blob into every action it carries.
pub fn decode_animation(data: &[u8]) -> Result<AnimationClip, DecodeError> {
    let mut r = Reader::new(data);
    r.expect_magic(b'M', b'T')?;
    let version = r.read_version()?;

    let action_count = r.read_u16()? as usize;
    let bone_count = r.read_u16()? as usize;

    let mut histogram = [0u16; 8];
    for count in histogram.iter_mut() {
        *count = r.read_u16()?;
    }
    if histogram[7] != 0 {
        warn!("animation: type histogram slot 7 is {} (expected 0)", histogram[7]);
    }
    let data_size = r.read_u32()?;
    debug!(
        "animation v{version}: {action_count} actions, {bone_count} bones, histogram {histogram:?}, data size {data_size}"
    );

    let mut actions = Vec::with_capacity(action_count);
    for index in 0..action_count {
        let keyframes = r.read_u16()? as i32;
        let mut tracks = Vec::with_capacity(bone_count);
        for bone in 0..bone_count {
            tracks.push(read_track(&mut r, bone)?);
        }
        let pattern_events = if version >= 5 {
            read_events(&mut r)?
        } else {
            Vec::new()
        };
        debug!(
            "action {index}: {keyframes} keyframes, {} pattern events",
            pattern_events.len()
        );
        actions.push(Action {
            keyframes,
            tracks,
            pattern_events,
        });
    }

    Ok(AnimationClip {
        version,
        bone_count,
        actions,
    })
}

fn read_track(r: &mut Reader, bone: usize) -> Result<BoneTrack, DecodeError> {
    let start = r.offset();
    let tag = r.read_u8()?;
    let track = match tag {
        0 => {
            let mut fields = [0i16; 12];
            for f in fields.iter_mut() {
                *f = r.read_i16()?;
            }
            BoneTrack::Static(Affine::from_fixed(&fields))
        }
        1 => BoneTrack::Identity,
        2 => BoneTrack::Full {
            translate: read_vec3_track(r, 1.0)?,
            scale: read_vec3_track(r, TO_FLOAT)?,
            rotate: read_vec3_track(r, 1.0)?,
            roll: read_roll_track(r)?,
        },
        3 => {
            let translate = [
                r.read_i16()? as f32,
                r.read_i16()? as f32,
                r.read_i16()? as f32,
            ];
            let rotate = read_vec3_track(r, 1.0)?;
            let roll = to_radians(r.read_i16()?);
            BoneTrack::Pivot {
                translate,
                rotate,
                roll,
            }
        }
        4 => BoneTrack::Orient {
            rotate: read_vec3_track(r, 1.0)?,
            roll: read_roll_track(r)?,
        },
        5 => BoneTrack::Aim {
            rotate: read_vec3_track(r, 1.0)?,
        },
        6 => BoneTrack::Move {
            translate: read_vec3_track(r, 1.0)?,
            rotate: read_vec3_track(r, 1.0)?,
            roll: read_roll_track(r)?,
        },
        _ => {
            return Err(DecodeError::new("unknown-bone-type", start)
                .with_arg("bone", bone)
                .with_arg("type", tag));
        }
    };
    Ok(track)
}

fn to_radians(raw: i16) -> f32 {
    raw as f32 * TAU / ANGLE_UNIT
}

/// Key count followed by the keys; at least one key, frames non-decreasing.
fn read_keys<T>(
    r: &mut Reader,
    mut value: impl FnMut(&mut Reader) -> Result<T, DecodeError>,
) -> Result<(Vec<i32>, Vec<T>), DecodeError> {
    let len = r.read_u16()? as usize;
    if len == 0 {
        return Err(r.error("empty-track"));
    }
    let mut keys = Vec::with_capacity(len);
    let mut values = Vec::with_capacity(len);
    for _ in 0..len {
        let frame = r.read_u16()? as i32;
        if let Some(&last) = keys.last() {
            if frame < last {
                return Err(r
                    .error("key-order")
                    .with_arg("frame", frame)
                    .with_arg("previous", last));
            }
        }
        keys.push(frame);
        values.push(value(r)?);
    }
    Ok((keys, values))
}

fn read_vec3_track(r: &mut Reader, scale: f32) -> Result<Vec3Track, DecodeError> {
    let (keys, values) = read_keys(r, |r| {
        Ok([
            r.read_i16()? as f32 * scale,
            r.read_i16()? as f32 * scale,
            r.read_i16()? as f32 * scale,
        ])
    })?;
    Ok(Vec3Track { keys, values })
}

fn read_roll_track(r: &mut Reader) -> Result<ScalarTrack, DecodeError> {
    let (keys, values) = read_keys(r, |r| Ok(to_radians(r.read_i16()?)))?;
    Ok(ScalarTrack { keys, values })
}

fn read_events(r: &mut Reader) -> Result<Vec<PatternEvent>, DecodeError> {
    let count = r.read_u16()? as usize;
    let mut events: Vec<PatternEvent> = Vec::with_capacity(count);
    for _ in 0..count {
        let frame = r.read_u16()? as i32;
        let mask = r.read_u32()?;
        if let Some(last) = events.last() {
            if frame <= last.frame {
                return Err(r
                    .error("event-order")
                    .with_arg("frame", frame)
                    .with_arg("previous", last.frame));
            }
        }
        events.push(PatternEvent { frame, mask });
    }
    Ok(events)
}
