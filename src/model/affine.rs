use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

/// Fixed point scale: 4096 = 1.0.
pub const TO_FLOAT: f32 = 1.0 / 4096.0;

/// 3x4 affine transform, row-major: `[m00 m01 m02 tx, m10 m11 m12 ty, m20 m21 m22 tz]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine(pub [f32; 12]);

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0,
    ]);

    /// Builds a transform from twelve fixed-point fields. The linear block is
    /// scaled by [`TO_FLOAT`]; every 4th field (translation) is kept as is.
    pub fn from_fixed(fields: &[i16; 12]) -> Self {
        let mut m = [0.0; 12];
        for (i, &v) in fields.iter().enumerate() {
            m[i] = if i % 4 == 3 {
                v as f32
            } else {
                v as f32 * TO_FLOAT
            };
        }
        Affine(m)
    }

    pub fn from_parts(linear: &glm::Mat3, translation: &glm::Vec3) -> Self {
        let mut m = [0.0; 12];
        for row in 0..3 {
            for col in 0..3 {
                m[row * 4 + col] = linear[(row, col)];
            }
            m[row * 4 + 3] = translation[row];
        }
        Affine(m)
    }

    pub fn linear(&self) -> glm::Mat3 {
        let m = &self.0;
        glm::Mat3::new(m[0], m[1], m[2], m[4], m[5], m[6], m[8], m[9], m[10])
    }

    pub fn translation(&self) -> glm::Vec3 {
        glm::vec3(self.0[3], self.0[7], self.0[11])
    }

    pub fn set_linear(&mut self, linear: &glm::Mat3) {
        for row in 0..3 {
            for col in 0..3 {
                self.0[row * 4 + col] = linear[(row, col)];
            }
        }
    }

    pub fn set_translation(&mut self, t: [f32; 3]) {
        self.0[3] = t[0];
        self.0[7] = t[1];
        self.0[11] = t[2];
    }

    /// `self ∘ child`: apply `child` first, then `self`.
    pub fn compose(&self, child: &Affine) -> Affine {
        let linear = self.linear() * child.linear();
        let translation = self.linear() * child.translation() + self.translation();
        Affine::from_parts(&linear, &translation)
    }

    pub fn transform_point(&self, p: [f32; 3]) -> [f32; 3] {
        let m = &self.0;
        [
            m[0] * p[0] + m[1] * p[1] + m[2] * p[2] + m[3],
            m[4] * p[0] + m[5] * p[1] + m[6] * p[2] + m[7],
            m[8] * p[0] + m[9] * p[1] + m[10] * p[2] + m[11],
        ]
    }

    pub fn transform_vector(&self, v: [f32; 3]) -> [f32; 3] {
        let m = &self.0;
        [
            m[0] * v[0] + m[1] * v[1] + m[2] * v[2],
            m[4] * v[0] + m[5] * v[1] + m[6] * v[2],
            m[8] * v[0] + m[9] * v[1] + m[10] * v[2],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_fields_keep_translation_unscaled() {
        let a = Affine::from_fixed(&[4096, 0, 0, 10, 0, 2048, 0, -20, 0, 0, 4096, 30]);
        assert_eq!(a.0[0], 1.0);
        assert_eq!(a.0[5], 0.5);
        assert_eq!(a.translation(), glm::vec3(10.0, -20.0, 30.0));
    }

    #[test]
    fn compose_applies_child_first() {
        let mut parent = Affine::IDENTITY;
        parent.set_translation([1.0, 0.0, 0.0]);
        // 90 degrees about Z
        let mut child = Affine::IDENTITY;
        child.set_linear(&glm::Mat3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0));
        let p = parent.compose(&child).transform_point([1.0, 0.0, 0.0]);
        assert_eq!(p, [1.0, 1.0, 0.0]);
    }

    #[test]
    fn parts_round_trip_through_rows() {
        let linear = glm::Mat3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
        let a = Affine::from_parts(&linear, &glm::vec3(0.5, 0.25, 0.125));
        assert_eq!(a.0[1], 2.0);
        assert_eq!(a.0[4], 4.0);
        assert_eq!(a.linear(), linear);
    }
}
