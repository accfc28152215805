use super::Affine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub vertex_count: usize, // contiguous run of vertices this bone owns
    pub parent: i32,         // -1 means no parent
    pub bind: Affine,        // bind-pose local transform
}

impl Default for Bone {
    fn default() -> Self {
        Self {
            vertex_count: 0,
            parent: -1,
            bind: Affine::IDENTITY,
        }
    }
}

impl Bone {
    pub fn parent_index(&self) -> Option<usize> {
        (self.parent >= 0).then_some(self.parent as usize)
    }
}
