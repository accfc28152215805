// Command list decoding
// One instruction at a time; operand counts are checked before anything is applied

use super::device::PrimitiveKind;
use super::effect::Toon;
use super::layout::{Projection, Rect};
use super::queue::{PrimitiveAttributes, PrimitiveBatch};
use crate::error::CommandListError;
use crate::model::TO_FLOAT;
use std::iter::repeat_n;

/// First word of every command list.
pub const VERSION_TAG: u32 = 0xFE00_0001;

pub const OP_END: u32 = 0x80;
pub const OP_NOP: u32 = 0x81;
pub const OP_FLUSH: u32 = 0x82;
pub const OP_ATTRIBUTE: u32 = 0x83;
pub const OP_CLIP: u32 = 0x84;
pub const OP_CENTER: u32 = 0x85;
pub const OP_TEXTURE: u32 = 0x86;
pub const OP_AFFINE_INDEX: u32 = 0x87;
pub const OP_PARALLEL_SCALE: u32 = 0x90;
pub const OP_PARALLEL_SIZE: u32 = 0x91;
pub const OP_PERSPECTIVE_FOV: u32 = 0x92;
pub const OP_PERSPECTIVE_WH: u32 = 0x93;
pub const OP_AMBIENT_LIGHT: u32 = 0xA0;
pub const OP_DIRECTION_LIGHT: u32 = 0xA1;
pub const OP_THRESHOLD: u32 = 0xAF;

// primitive flag fields
const NORMAL_SHIFT: u32 = 8;
const COLOR_SHIFT: u32 = 10;
const EXTRA_SHIFT: u32 = 12;
const TEXCOORDS: u32 = 3;

/// Words of one sprite parameter block.
pub const SPRITE_WORDS: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    End,
    Nop,
    Flush,
    Attribute(u32),
    Clip(Rect),
    Center([i32; 2]),
    Texture(usize),
    AffineIndex(usize),
    Projection(Projection),
    AmbientLight(i32),
    DirectionLight { direction: [i32; 3], intensity: i32 },
    Threshold(Toon),
    Draw(PrimitiveBatch),
}

/// Cursor over a command list, positioned after the version tag.
pub struct CommandReader<'a> {
    words: &'a [u32],
    pos: usize,
}

impl<'a> CommandReader<'a> {
    pub fn new(words: &'a [u32]) -> Result<Self, CommandListError> {
        match words.first() {
            None => Err(CommandListError::Empty),
            Some(&VERSION_TAG) => Ok(Self { words, pos: 1 }),
            Some(&tag) => Err(CommandListError::BadVersion(tag)),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Next instruction and its word index. `None` once the words run out.
    pub fn next_instruction(&mut self) -> Result<Option<(usize, Instruction)>, CommandListError> {
        let index = self.pos;
        let Some(&word) = self.words.get(index) else {
            return Ok(None);
        };
        let (instruction, used) = decode(index, word, &self.words[index + 1..])?;
        self.pos = index + 1 + used;
        Ok(Some((index, instruction)))
    }
}

fn operands(
    index: usize,
    opcode: u32,
    words: &[u32],
    needed: usize,
) -> Result<Vec<i32>, CommandListError> {
    if words.len() < needed {
        return Err(CommandListError::Truncated {
            index,
            opcode,
            needed,
            remaining: words.len(),
        });
    }
    Ok(words[..needed].iter().map(|&w| w as i32).collect())
}

/// Decode the instruction at `index`; returns it with its operand word count.
pub fn decode(
    index: usize,
    word: u32,
    words: &[u32],
) -> Result<(Instruction, usize), CommandListError> {
    let low = word & 0x00FF_FFFF;
    let ops = |n| operands(index, word, words, n);

    let decoded = match word >> 24 {
        OP_END => (Instruction::End, 0),
        OP_NOP => {
            let n = low as usize;
            ops(n)?;
            (Instruction::Nop, n)
        }
        OP_FLUSH => (Instruction::Flush, 0),
        OP_ATTRIBUTE => (Instruction::Attribute(low), 0),
        OP_CLIP => {
            let o = ops(4)?;
            (Instruction::Clip(Rect::new(o[0], o[1], o[2], o[3])), 4)
        }
        OP_CENTER => {
            let o = ops(2)?;
            (Instruction::Center([o[0], o[1]]), 2)
        }
        OP_TEXTURE => (Instruction::Texture(low as usize), 0),
        OP_AFFINE_INDEX => (Instruction::AffineIndex(low as usize), 0),
        OP_PARALLEL_SCALE => {
            let o = ops(2)?;
            (Instruction::Projection(Projection::ParallelScale { x: o[0], y: o[1] }), 2)
        }
        OP_PARALLEL_SIZE => {
            let o = ops(2)?;
            let p = Projection::ParallelSize {
                width: o[0],
                height: o[1],
            };
            (Instruction::Projection(p), 2)
        }
        OP_PERSPECTIVE_FOV => {
            let o = ops(3)?;
            let p = Projection::PerspectiveFov {
                near: o[0],
                far: o[1],
                angle: o[2],
            };
            (Instruction::Projection(p), 3)
        }
        OP_PERSPECTIVE_WH => {
            let o = ops(4)?;
            let p = Projection::PerspectiveSize {
                near: o[0],
                far: o[1],
                width: o[2],
                height: o[3],
            };
            (Instruction::Projection(p), 4)
        }
        OP_AMBIENT_LIGHT => (Instruction::AmbientLight(ops(1)?[0]), 1),
        OP_DIRECTION_LIGHT => {
            let o = ops(4)?;
            let i = Instruction::DirectionLight {
                direction: [o[0], o[1], o[2]],
                intensity: o[3],
            };
            (i, 4)
        }
        OP_THRESHOLD => {
            let o = ops(3)?;
            let toon = Toon {
                threshold: o[0],
                high: o[1],
                low: o[2],
            };
            (Instruction::Threshold(toon), 3)
        }
        tag => match PrimitiveKind::from_tag(tag) {
            Some(kind) => decode_primitive(index, word, kind, words)?,
            None => return Err(CommandListError::UnknownOpcode { index, opcode: word }),
        },
    };
    Ok(decoded)
}

/// Operand words of a primitive draw, by stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PrimitiveLayout {
    positions: usize,
    normals: usize,
    texcoords: usize,
    sprites: usize,
    colors: usize,
}

impl PrimitiveLayout {
    fn total(&self) -> usize {
        self.positions + self.normals + self.texcoords + self.sprites + self.colors
    }
}

fn primitive_layout(
    index: usize,
    kind: PrimitiveKind,
    count: usize,
    flags: u32,
) -> Result<PrimitiveLayout, CommandListError> {
    let vertices = count * kind.vertices_per_primitive();
    let sprite = kind == PrimitiveKind::Sprite;
    let extra = (flags >> EXTRA_SHIFT) & 3;

    let normals = match (sprite, (flags >> NORMAL_SHIFT) & 3) {
        (false, 2) => count * 3,
        (false, 3) => vertices * 3,
        _ => 0,
    };
    let texcoords = if !sprite && extra == TEXCOORDS {
        vertices * 2
    } else {
        0
    };
    let sprites = match (sprite, extra) {
        (false, _) => 0,
        (true, 1) => SPRITE_WORDS,
        (true, 2 | 3) => count * SPRITE_WORDS,
        (true, _) => return Err(CommandListError::InvalidSpriteParams { index }),
    };
    let colors = match (flags >> COLOR_SHIFT) & 3 {
        1 => 1,
        2 | 3 => count,
        _ => 0,
    };
    Ok(PrimitiveLayout {
        positions: vertices * 3,
        normals,
        texcoords,
        sprites,
        colors,
    })
}

fn decode_primitive(
    index: usize,
    word: u32,
    kind: PrimitiveKind,
    words: &[u32],
) -> Result<(Instruction, usize), CommandListError> {
    let count = ((word >> 16) & 0xFF) as usize;
    let flags = word & 0xFFFF;
    let vpp = kind.vertices_per_primitive();
    let vertices = count * vpp;
    let layout = primitive_layout(index, kind, count, flags)?;
    let ops = operands(index, word, words, layout.total())?;

    let (positions, rest) = ops.split_at(layout.positions);
    let (normals, rest) = rest.split_at(layout.normals);
    let (texcoords, rest) = rest.split_at(layout.texcoords);
    let (sprites, colors) = rest.split_at(layout.sprites);

    let mut batch = PrimitiveBatch::new(kind, count, PrimitiveAttributes::from_bits(flags & 0xFF));
    batch.positions = positions
        .chunks_exact(3)
        .map(|c| [c[0] as f32, c[1] as f32, c[2] as f32])
        .collect();

    if !normals.is_empty() {
        let per_face = normals.len() == count * 3 && vpp > 1;
        let normals = normals
            .chunks_exact(3)
            .map(|c| [c[0] as f32 * TO_FLOAT, c[1] as f32 * TO_FLOAT, c[2] as f32 * TO_FLOAT]);
        batch.normals = Some(if per_face {
            normals.flat_map(|n| repeat_n(n, vpp)).collect()
        } else {
            normals.collect()
        });
    }
    if !texcoords.is_empty() {
        batch.texcoords = Some(
            texcoords
                .chunks_exact(2)
                .map(|c| [c[0] as f32, c[1] as f32])
                .collect(),
        );
    }
    if !sprites.is_empty() {
        let blocks: Vec<[i32; 8]> = sprites
            .chunks_exact(SPRITE_WORDS)
            .map(|c| {
                let mut block = [0; SPRITE_WORDS];
                block.copy_from_slice(c);
                block
            })
            .collect();
        batch.sprites = Some(if blocks.len() == 1 && count > 1 {
            repeat_n(blocks[0], count).collect()
        } else {
            blocks
        });
    }
    if !colors.is_empty() {
        batch.colors = Some(if colors.len() == 1 {
            repeat_n(colors[0] as u32, vertices).collect()
        } else {
            colors
                .iter()
                .flat_map(|&c| repeat_n(c as u32, vpp))
                .collect()
        });
    }

    Ok((Instruction::Draw(batch), layout.total()))
}
