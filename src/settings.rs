use crate::CONFY_APP_NAME;
use crate::renderer::{Effect, Projection};

use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSettings {
    pub width: i32,
    pub height: i32,
    pub projection: Projection,
}

impl Default for TargetSettings {
    fn default() -> Self {
        Self {
            width: 240,
            height: 240,
            projection: Projection::PerspectiveFov {
                near: 1,
                far: 32767,
                angle: 512,
            },
        }
    }
}

impl TargetSettings {
    pub fn load() -> Self {
        confy::load(CONFY_APP_NAME, "target").unwrap_or_default()
    }

    pub fn save(&self) {
        if let Err(e) = confy::store(CONFY_APP_NAME, "target", self) {
            warn!("could not save target settings: {e}");
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectSettings {
    pub lighting: bool,
    pub semi_transparent: bool,
    pub toon: bool,
    pub ambient: i32,
    pub light_direction: [i32; 3],
    pub light_intensity: i32,
    pub toon_threshold: [i32; 3], // threshold, high, low
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            lighting: true,
            semi_transparent: true,
            toon: false,
            ambient: 1024,
            light_direction: [0, 0, 4096],
            light_intensity: 3072,
            toon_threshold: [128, 255, 64],
        }
    }
}

impl EffectSettings {
    pub fn load() -> Self {
        confy::load(CONFY_APP_NAME, "effect").unwrap_or_default()
    }

    pub fn save(&self) {
        if let Err(e) = confy::store(CONFY_APP_NAME, "effect", self) {
            warn!("could not save effect settings: {e}");
        }
    }

    /// Host defaults for the renderer's effect state.
    pub fn apply(&self, effect: &mut Effect) {
        effect.lighting = self.lighting;
        effect.semi_transparent = self.semi_transparent;
        effect.toon = self.toon;
        effect.light.ambient = self.ambient;
        effect.light.direction = self.light_direction;
        effect.light.intensity = self.light_intensity;
        let [threshold, high, low] = self.toon_threshold;
        effect.toon_params.threshold = threshold;
        effect.toon_params.high = high;
        effect.toon_params.low = low;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackSettings {
    pub action: usize,
    pub frame_step: i32, // fixed point, 65536 = one keyframe
    pub pattern: u32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            action: 0,
            frame_step: 1 << 16,
            pattern: 0,
        }
    }
}

impl PlaybackSettings {
    pub fn load() -> Self {
        confy::load(CONFY_APP_NAME, "playback").unwrap_or_default()
    }

    pub fn save(&self) {
        if let Err(e) = confy::store(CONFY_APP_NAME, "playback", self) {
            warn!("could not save playback settings: {e}");
        }
    }
}

// Aggregate struct for convenience
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub target: TargetSettings,
    pub effect: EffectSettings,
    pub playback: PlaybackSettings,
}

impl Settings {
    pub fn load() -> Self {
        Self {
            target: TargetSettings::load(),
            effect: EffectSettings::load(),
            playback: PlaybackSettings::load(),
        }
    }

    pub fn save(&self) {
        self.target.save();
        self.effect.save();
        self.playback.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_defaults_reach_the_renderer_state() {
        let mut effect = Effect::default();
        EffectSettings::default().apply(&mut effect);
        assert!(effect.lighting);
        assert!(effect.semi_transparent);
        assert_eq!(effect.light.direction, [0, 0, 4096]);
        assert_eq!(effect.toon_params.high, 255);
    }

    #[test]
    fn settings_survive_serialization() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.playback.frame_step, 1 << 16);
        assert_eq!(back.target.width, 240);
    }
}
