use super::polygon::{self, PatternTable};
use super::reader::Reader;
use crate::assembly;
use crate::error::DecodeError;
use crate::model::{
    Affine, Bone, MeshAsset, MeshParts, MAX_COLORS, MAX_PATTERNS, MAX_TEXTURES, MAX_VERTICES,
    TO_FLOAT,
};
use log::debug;

/// Field widths selected by the top two bits of a vertex chunk header.
const VERTEX_CHUNK_BITS: [u32; 4] = [8, 10, 13, 16];

/// Fixed-point unit length of a packed normal.
const NORMAL_ONE: i32 = 4096;

/// Axis normals addressed by the escape value of a packed normal.
const NORMAL_POOL: [[i32; 3]; 6] = [
    [NORMAL_ONE, 0, 0],
    [-NORMAL_ONE, 0, 0],
    [0, NORMAL_ONE, 0],
    [0, -NORMAL_ONE, 0],
    [0, 0, NORMAL_ONE],
    [0, 0, -NORMAL_ONE],
];

/// Fixed-size part of a mesh blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MeshHeader {
    pub version: u8,
    pub vertex_format: u8,
    pub normal_format: u8,
    pub polygon_format: u8,
    pub bone_format: u8,
    pub vertex_count: usize,
    pub textured_tri: usize,
    pub textured_quad: usize,
    pub bone_count: usize,
    pub colored_tri: usize,
    pub colored_quad: usize,
    pub texture_count: usize,
    pub pattern_count: usize,
    pub color_count: usize,
}

/// Decode a mesh blob into a draw-ready [`MeshAsset`].
pub fn decode_mesh(data: &[u8]) -> Result<MeshAsset, DecodeError> {
    let mut r = Reader::new(data);
    let header = read_header(&mut r)?;
    let table = PatternTable::read(&mut r, &header)?;

    let vertices = read_vertices(&mut r, &header)?;
    let normals = read_normals(&mut r, &header)?;
    let (textured, colored) = polygon::read_polygons(&mut r, &header, &table)?;
    let bones = read_bones(&mut r, &header)?;

    debug!(
        "mesh v{}: {} vertices, {} textured / {} colored polygons, {} bones, {} patterns",
        header.version,
        header.vertex_count,
        textured.len(),
        colored.len(),
        bones.len(),
        header.pattern_count
    );
    if r.remaining() > 0 {
        debug!("mesh: {} trailing bytes ignored", r.remaining());
    }

    Ok(assembly::assemble(MeshParts {
        version: header.version,
        vertices,
        normals,
        bones,
        textured,
        colored,
        texture_count: header.texture_count,
        pattern_count: header.pattern_count,
    }))
}

fn read_count(r: &mut Reader, key: &'static str, max: usize) -> Result<usize, DecodeError> {
    let count = r.read_u16()? as usize;
    if count > max {
        return Err(r
            .error(key)
            .with_arg("count", count)
            .with_arg("max", max));
    }
    Ok(count)
}

pub(crate) fn read_header(r: &mut Reader) -> Result<MeshHeader, DecodeError> {
    r.expect_magic(b'M', b'B')?;
    let version = r.read_version()?;

    let (vertex_format, normal_format, polygon_format, bone_format) = if version >= 4 {
        (r.read_u8()?, r.read_u8()?, r.read_u8()?, r.read_u8()?)
    } else {
        (1, 0, 1, 1)
    };
    if !(1..=2).contains(&vertex_format)
        || normal_format > 2
        || !(1..=3).contains(&polygon_format)
        || bone_format != 1
    {
        return Err(r
            .error("format")
            .with_arg("vertex", vertex_format)
            .with_arg("normal", normal_format)
            .with_arg("polygon", polygon_format)
            .with_arg("bone", bone_format));
    }

    let vertex_count = read_count(r, "vertex-count", MAX_VERTICES)?;
    let textured_tri = r.read_u16()? as usize;
    let textured_quad = r.read_u16()? as usize;
    let bone_count = r.read_u16()? as usize;

    let mut header = MeshHeader {
        version,
        vertex_format,
        normal_format,
        polygon_format,
        bone_format,
        vertex_count,
        textured_tri,
        textured_quad,
        bone_count,
        colored_tri: 0,
        colored_quad: 0,
        texture_count: 1,
        pattern_count: 1,
        color_count: 0,
    };

    if polygon_format >= 3 {
        header.colored_tri = r.read_u16()? as usize;
        header.colored_quad = r.read_u16()? as usize;
        header.texture_count = read_count(r, "texture-count", MAX_TEXTURES)?;
        header.pattern_count = read_count(r, "pattern-count", MAX_PATTERNS)?;
        header.color_count = read_count(r, "color-count", MAX_COLORS)?;
        if header.texture_count == 0 || header.pattern_count == 0 {
            return Err(r
                .error("table-count")
                .with_arg("textures", header.texture_count)
                .with_arg("patterns", header.pattern_count));
        }
    }

    Ok(header)
}

fn read_vertices(r: &mut Reader, header: &MeshHeader) -> Result<Vec<[f32; 3]>, DecodeError> {
    let count = header.vertex_count;
    let mut vertices = Vec::with_capacity(count + 1);

    if header.vertex_format == 1 {
        for _ in 0..count {
            let x = r.read_i16()?;
            let y = r.read_i16()?;
            let z = r.read_i16()?;
            vertices.push([x as f32, y as f32, z as f32]);
        }
        return Ok(vertices);
    }

    while vertices.len() < count {
        let chunk = r.read_bits(8)?;
        let bits = VERTEX_CHUNK_BITS[(chunk >> 6) as usize];
        let chunk_len = (chunk & 0x3F) as usize + 1;
        if vertices.len() + chunk_len > count {
            return Err(r
                .error("vertex-overflow")
                .with_arg("chunk", chunk_len)
                .with_arg("decoded", vertices.len())
                .with_arg("count", count));
        }
        for _ in 0..chunk_len {
            let x = r.read_sbits(bits)?;
            let y = r.read_sbits(bits)?;
            let z = r.read_sbits(bits)?;
            vertices.push([x as f32, y as f32, z as f32]);
        }
    }
    r.clear_bits();
    Ok(vertices)
}

fn read_normals(r: &mut Reader, header: &MeshHeader) -> Result<Option<Vec<[f32; 3]>>, DecodeError> {
    let count = header.vertex_count;
    let to_float = |n: [i32; 3]| [n[0] as f32 * TO_FLOAT, n[1] as f32 * TO_FLOAT, n[2] as f32 * TO_FLOAT];

    match header.normal_format {
        0 => Ok(None),
        1 => {
            let mut normals = Vec::with_capacity(count + 1);
            for _ in 0..count {
                let x = r.read_i16()? as i32;
                let y = r.read_i16()? as i32;
                let z = r.read_i16()? as i32;
                normals.push(to_float([x, y, z]));
            }
            Ok(Some(normals))
        }
        _ => {
            let mut normals = Vec::with_capacity(count + 1);
            for _ in 0..count {
                normals.push(to_float(read_packed_normal(r)?));
            }
            r.clear_bits();
            Ok(Some(normals))
        }
    }
}

/// One bit-packed normal in 4096 fixed point.
pub(crate) fn read_packed_normal(r: &mut Reader) -> Result<[i32; 3], DecodeError> {
    let raw = r.read_bits(7)?;
    if raw == 64 {
        let which = r.read_bits(3)? as usize;
        return NORMAL_POOL
            .get(which)
            .copied()
            .ok_or_else(|| r.error("normal-pool").with_arg("index", which));
    }
    let x = super::reader::sign_extend(raw, 7) * 64;
    let y = r.read_sbits(7)? * 64;
    let negative = r.read_bits(1)? != 0;
    let zz = NORMAL_ONE * NORMAL_ONE - x * x - y * y;
    let mut z = (zz.max(0) as f64).sqrt().round() as i32;
    if negative {
        z = -z;
    }
    Ok([x, y, z])
}

fn read_bones(r: &mut Reader, header: &MeshHeader) -> Result<Vec<Bone>, DecodeError> {
    let mut bones = Vec::with_capacity(header.bone_count);
    let mut assigned = 0usize;

    for index in 0..header.bone_count {
        let vertex_count = r.read_u16()? as usize;
        let parent = r.read_i16()? as i32;
        if parent < -1 || parent >= header.bone_count as i32 {
            return Err(r
                .error("bone-parent")
                .with_arg("bone", index)
                .with_arg("parent", parent));
        }
        let mut fields = [0i16; 12];
        for f in fields.iter_mut() {
            *f = r.read_i16()?;
        }
        assigned += vertex_count;
        bones.push(Bone {
            vertex_count,
            parent,
            bind: Affine::from_fixed(&fields),
        });
    }

    if assigned != header.vertex_count {
        return Err(r
            .error("bone-vertex-sum")
            .with_arg("assigned", assigned)
            .with_arg("vertices", header.vertex_count));
    }
    Ok(bones)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_defaults_before_version_four() {
        let data = [b'M', b'B', 3, 0, 4, 0, 1, 0, 0, 0, 1, 0];
        let mut r = Reader::new(&data);
        let h = read_header(&mut r).unwrap();
        assert_eq!((h.vertex_format, h.normal_format, h.polygon_format), (1, 0, 1));
        assert_eq!(h.texture_count, 1);
        assert_eq!(h.pattern_count, 1);
        assert_eq!(h.vertex_count, 4);
    }

    #[test]
    fn rejects_bone_format_other_than_one() {
        let data = [b'M', b'B', 4, 0, 1, 0, 1, 2];
        let err = read_header(&mut Reader::new(&data)).unwrap_err();
        assert_eq!(err.key, "format");
        assert_eq!(err.arg("bone"), Some("2"));
    }

    #[test]
    fn rejects_bad_magic_and_version() {
        assert_eq!(read_header(&mut Reader::new(b"MX\x03\x00")).unwrap_err().key, "magic");
        assert_eq!(read_header(&mut Reader::new(b"MB\x06\x00")).unwrap_err().key, "version");
        assert_eq!(read_header(&mut Reader::new(b"MB\x03\x01")).unwrap_err().key, "version");
    }

    #[test]
    fn packed_normal_escape_reads_pool() {
        // 7-bit 64 then 3-bit 5 -> -Z
        let bits: u32 = 64 | (5 << 7);
        let data = bits.to_le_bytes();
        let n = read_packed_normal(&mut Reader::new(&data)).unwrap();
        assert_eq!(n, [0, 0, -NORMAL_ONE]);
    }

    #[test]
    fn packed_normal_rebuilds_z() {
        // x = 0, y = 0, sign = 1
        let bits: u32 = 1 << 14;
        let data = bits.to_le_bytes();
        let n = read_packed_normal(&mut Reader::new(&data)).unwrap();
        assert_eq!(n, [0, 0, -NORMAL_ONE]);
    }

    #[test]
    fn packed_normal_pool_index_out_of_range() {
        let bits: u32 = 64 | (7 << 7);
        let data = bits.to_le_bytes();
        let err = read_packed_normal(&mut Reader::new(&data)).unwrap_err();
        assert_eq!(err.key, "normal-pool");
    }
}
