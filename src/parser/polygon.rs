use super::mesh::MeshHeader;
use super::reader::Reader;
use crate::error::DecodeError;
use crate::material::MaterialFlags;
use crate::model::{MaterialBytes, Polygon, PolygonKind};

/// UV width used by polygon format 2.
const FIXED_UV_BITS: u32 = 7;

/// Visibility mask of pattern `p`. Pattern 0 is always visible.
pub fn pattern_mask(p: usize) -> u32 {
    if p == 0 { 0 } else { 1 << (p - 1) }
}

/// Per-pattern polygon counts: `colored[p] = [tri, quad]`, `textured[p][slot] = [tri, quad]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PatternTable {
    pub colored: Vec<[usize; 2]>,
    pub textured: Vec<Vec<[usize; 2]>>,
}

impl PatternTable {
    pub fn read(r: &mut Reader, header: &MeshHeader) -> Result<Self, DecodeError> {
        if header.version < 5 {
            let mut slots = vec![[0, 0]; header.texture_count];
            slots[0] = [header.textured_tri, header.textured_quad];
            return Ok(Self {
                colored: vec![[header.colored_tri, header.colored_quad]],
                textured: vec![slots],
            });
        }

        let mut table = Self {
            colored: Vec::with_capacity(header.pattern_count),
            textured: Vec::with_capacity(header.pattern_count),
        };
        for _ in 0..header.pattern_count {
            let tri = r.read_u16()? as usize;
            let quad = r.read_u16()? as usize;
            table.colored.push([tri, quad]);
            let mut slots = Vec::with_capacity(header.texture_count);
            for _ in 0..header.texture_count {
                let tri = r.read_u16()? as usize;
                let quad = r.read_u16()? as usize;
                slots.push([tri, quad]);
            }
            table.textured.push(slots);
        }
        Ok(table)
    }

    fn colored_runs(&self, shape: usize) -> Vec<(u32, usize, usize)> {
        self.colored
            .iter()
            .enumerate()
            .map(|(p, counts)| (pattern_mask(p), 0, counts[shape]))
            .collect()
    }

    fn textured_runs(&self, shape: usize) -> Vec<(u32, usize, usize)> {
        let mut runs = Vec::new();
        for (p, slots) in self.textured.iter().enumerate() {
            for (slot, counts) in slots.iter().enumerate() {
                runs.push((pattern_mask(p), slot, counts[shape]));
            }
        }
        runs
    }
}

/// Field widths of a bit-packed polygon section.
struct Widths {
    material: u32,
    vertex: u32,
    uv: u32,
}

/// Decode every polygon and stamp patterns and texture slots.
/// Returns `(textured, colored)` in decode order.
pub(crate) fn read_polygons(
    r: &mut Reader,
    header: &MeshHeader,
    table: &PatternTable,
) -> Result<(Vec<Polygon>, Vec<Polygon>), DecodeError> {
    let (mut colored_tris, mut colored_quads) = if header.polygon_format >= 3 {
        read_colored(r, header)?
    } else {
        (Vec::new(), Vec::new())
    };
    let (mut textured_tris, mut textured_quads) = read_textured(r, header)?;

    stamp(r, &mut colored_tris, &table.colored_runs(0), "colored-tri")?;
    stamp(r, &mut colored_quads, &table.colored_runs(1), "colored-quad")?;
    stamp(r, &mut textured_tris, &table.textured_runs(0), "textured-tri")?;
    stamp(r, &mut textured_quads, &table.textured_runs(1), "textured-quad")?;

    textured_tris.append(&mut textured_quads);
    colored_tris.append(&mut colored_quads);
    Ok((textured_tris, colored_tris))
}

/// Walk `runs` of `(mask, slot, count)` over polygons in decode order.
fn stamp(
    r: &Reader,
    polygons: &mut [Polygon],
    runs: &[(u32, usize, usize)],
    what: &'static str,
) -> Result<(), DecodeError> {
    let total: usize = runs.iter().map(|run| run.2).sum();
    if total != polygons.len() {
        return Err(r
            .error("pattern-table")
            .with_arg("list", what)
            .with_arg("table", total)
            .with_arg("decoded", polygons.len()));
    }
    let mut it = polygons.iter_mut();
    for &(mask, slot, count) in runs {
        for polygon in it.by_ref().take(count) {
            polygon.pattern = mask;
            polygon.texture = slot;
        }
    }
    Ok(())
}

fn read_material(
    r: &mut Reader,
    bits: Option<u32>,
    allowed: u32,
) -> Result<MaterialFlags, DecodeError> {
    let raw = match bits {
        Some(n) => r.read_bits(n)?,
        None => r.read_u16()? as u32,
    };
    MaterialFlags::from_bits(raw, allowed).ok_or_else(|| {
        r.error("material")
            .with_arg("bits", format!("{raw:#x}"))
            .with_arg("allowed", format!("{allowed:#x}"))
    })
}

fn read_index(r: &mut Reader, bits: Option<u32>, vertex_count: usize) -> Result<u32, DecodeError> {
    let index = match bits {
        Some(n) => r.read_bits(n)?,
        None => r.read_u16()? as u32,
    };
    if index as usize >= vertex_count {
        return Err(r
            .error("vertex-index")
            .with_arg("index", index)
            .with_arg("count", vertex_count));
    }
    Ok(index)
}

/// Rescale a `bits`-wide channel to 8 bits.
fn to_byte(value: u32, bits: u32) -> u8 {
    if bits >= 8 {
        (value >> (bits - 8)) as u8
    } else {
        (value << (8 - bits)) as u8
    }
}

/// Build a polygon from 3 or 4 corners. Quads `(a, b, c, d)` become
/// `(a, b, c)` and `(c, b, d)`, sharing the `b-c` diagonal.
pub(crate) fn build_polygon(
    kind: PolygonKind,
    flags: MaterialFlags,
    corners: &[u32],
    bytes: &[MaterialBytes],
) -> Polygon {
    let order: &[usize] = if corners.len() == 4 {
        &[0, 1, 2, 2, 1, 3]
    } else {
        &[0, 1, 2]
    };
    Polygon {
        kind,
        blend: flags.blend,
        double_face: flags.double_face,
        pattern: 0,
        texture: 0,
        indices: order.iter().map(|&i| corners[i]).collect(),
        materials: order.iter().map(|&i| bytes[i]).collect(),
    }
}

fn read_colored(
    r: &mut Reader,
    header: &MeshHeader,
) -> Result<(Vec<Polygon>, Vec<Polygon>), DecodeError> {
    let material_bits = r.read_width("material")?;
    let vertex_bits = r.read_width("vertex")?;
    let color_bits = r.read_width("color")?;
    let color_id_bits = r.read_width("color-id")?;
    let _reserved = r.read_u8()?;

    let mut palette = Vec::with_capacity(header.color_count);
    for _ in 0..header.color_count {
        let red = to_byte(r.read_bits(color_bits)?, color_bits);
        let green = to_byte(r.read_bits(color_bits)?, color_bits);
        let blue = to_byte(r.read_bits(color_bits)?, color_bits);
        palette.push([red, green, blue]);
    }

    let read_one = |r: &mut Reader, corners: usize| -> Result<Polygon, DecodeError> {
        let flags = read_material(r, Some(material_bits), MaterialFlags::COLORED_ALLOWED)?;
        let mut indices = [0u32; 4];
        for slot in indices.iter_mut().take(corners) {
            *slot = read_index(r, Some(vertex_bits), header.vertex_count)?;
        }
        let color_id = r.read_bits(color_id_bits)? as usize;
        let [red, green, blue] = *palette.get(color_id).ok_or_else(|| {
            r.error("color-index")
                .with_arg("index", color_id)
                .with_arg("count", palette.len())
        })?;
        let byte = [red, green, blue, flags.lighting as u8, flags.specular as u8];
        Ok(build_polygon(
            PolygonKind::Colored,
            flags,
            &indices[..corners],
            &[byte; 4][..corners],
        ))
    };

    let mut tris = Vec::with_capacity(header.colored_tri);
    for _ in 0..header.colored_tri {
        tris.push(read_one(r, 3)?);
    }
    let mut quads = Vec::with_capacity(header.colored_quad);
    for _ in 0..header.colored_quad {
        quads.push(read_one(r, 4)?);
    }
    r.clear_bits();
    Ok((tris, quads))
}

fn read_textured(
    r: &mut Reader,
    header: &MeshHeader,
) -> Result<(Vec<Polygon>, Vec<Polygon>), DecodeError> {
    let widths = match header.polygon_format {
        1 => None,
        2 => {
            let material = r.read_width("material")?;
            let vertex = r.read_width("vertex")?;
            Some(Widths {
                material,
                vertex,
                uv: FIXED_UV_BITS,
            })
        }
        _ => {
            let material = r.read_width("material")?;
            let vertex = r.read_width("vertex")?;
            let uv = r.read_width("uv")?;
            let _reserved = r.read_u8()?;
            Some(Widths {
                material,
                vertex,
                uv,
            })
        }
    };

    let read_one = |r: &mut Reader, corners: usize| -> Result<Polygon, DecodeError> {
        let flags = read_material(
            r,
            widths.as_ref().map(|w| w.material),
            MaterialFlags::TEXTURED_ALLOWED,
        )?;
        let mut indices = [0u32; 4];
        for slot in indices.iter_mut().take(corners) {
            *slot = read_index(r, widths.as_ref().map(|w| w.vertex), header.vertex_count)?;
        }
        let mut bytes = [[0u8; 5]; 4];
        for byte in bytes.iter_mut().take(corners) {
            let (u, v) = match &widths {
                None => (r.read_u8()? as u32, r.read_u8()? as u32),
                Some(w) => (r.read_bits(w.uv)?, r.read_bits(w.uv)?),
            };
            if u > 255 || v > 255 {
                return Err(r.error("uv-range").with_arg("u", u).with_arg("v", v));
            }
            *byte = [
                u as u8,
                v as u8,
                flags.lighting as u8,
                flags.specular as u8,
                flags.transparent as u8,
            ];
        }
        Ok(build_polygon(
            PolygonKind::Textured,
            flags,
            &indices[..corners],
            &bytes[..corners],
        ))
    };

    let mut tris = Vec::with_capacity(header.textured_tri);
    for _ in 0..header.textured_tri {
        tris.push(read_one(r, 3)?);
    }
    let mut quads = Vec::with_capacity(header.textured_quad);
    for _ in 0..header.textured_quad {
        quads.push(read_one(r, 4)?);
    }
    r.clear_bits();
    Ok((tris, quads))
}
