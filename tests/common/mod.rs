#![allow(dead_code)]

/// Little-endian blob builder with an LSB-first bit packer, the mirror of
/// the decoder's reader.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    cache: u64,
    pending: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn aligned(&mut self) -> &mut Vec<u8> {
        assert_eq!(self.pending, 0, "byte write with pending bits");
        &mut self.bytes
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.aligned().push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.aligned().extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.aligned().extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.aligned().extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i16s(&mut self, values: &[i16]) -> &mut Self {
        for &v in values {
            self.i16(v);
        }
        self
    }

    /// Low `n` bits of `v` (negative values are two's complement).
    pub fn bits(&mut self, v: i64, n: u32) -> &mut Self {
        let mask = (1u64 << n) - 1;
        self.cache |= (v as u64 & mask) << self.pending;
        self.pending += n;
        while self.pending >= 8 {
            self.bytes.push(self.cache as u8);
            self.cache >>= 8;
            self.pending -= 8;
        }
        self
    }

    /// Pad the partial byte with zeros.
    pub fn align(&mut self) -> &mut Self {
        if self.pending > 0 {
            self.bytes.push(self.cache as u8);
        }
        self.cache = 0;
        self.pending = 0;
        self
    }

    pub fn finish(&mut self) -> Vec<u8> {
        self.align();
        std::mem::take(&mut self.bytes)
    }
}

pub const IDENTITY_FIELDS: [i16; 12] = [4096, 0, 0, 0, 0, 4096, 0, 0, 0, 0, 4096, 0];

/// Textured triangle of a format-1 mesh: material field, corners, uvs.
pub struct Triangle {
    pub material: u16,
    pub corners: [u16; 3],
    pub uvs: [[u8; 2]; 3],
}

/// Version-4 mesh with raw 16-bit fields, no normals and one bone per
/// `bones` entry `(vertex_count, parent)`.
pub fn raw_mesh(vertices: &[[i16; 3]], triangles: &[Triangle], bones: &[(u16, i16)]) -> Vec<u8> {
    raw_mesh_with_count(vertices.len() as u16, vertices, triangles, bones)
}

pub fn raw_mesh_with_count(
    vertex_count: u16,
    vertices: &[[i16; 3]],
    triangles: &[Triangle],
    bones: &[(u16, i16)],
) -> Vec<u8> {
    let mut w = BitWriter::new();
    w.u8(b'M').u8(b'B').u8(4).u8(0);
    w.u8(1).u8(0).u8(1).u8(1);
    w.u16(vertex_count)
        .u16(triangles.len() as u16)
        .u16(0)
        .u16(bones.len() as u16);
    for v in vertices {
        w.i16s(v);
    }
    for t in triangles {
        w.u16(t.material);
        for &c in &t.corners {
            w.u16(c);
        }
        for uv in &t.uvs {
            w.u8(uv[0]).u8(uv[1]);
        }
    }
    for &(count, parent) in bones {
        w.u16(count).i16(parent).i16s(&IDENTITY_FIELDS);
    }
    w.finish()
}

pub fn triangle(material: u16, corners: [u16; 3]) -> Triangle {
    Triangle {
        material,
        corners,
        uvs: [[0, 0], [10, 0], [0, 10]],
    }
}

/// Animation header for `actions` actions over `bones` bones.
pub fn anim_header(w: &mut BitWriter, version: u8, actions: u16, bones: u16) {
    w.u8(b'M').u8(b'T').u8(version).u8(0);
    w.u16(actions).u16(bones);
    for _ in 0..8 {
        w.u16(0);
    }
    w.u32(0);
}

/// Mesh header up to and including the counts. `extra` holds colored
/// tri/quad, textures, patterns and colors for polygon format 3.
pub fn mesh_header(
    w: &mut BitWriter,
    version: u8,
    formats: [u8; 4],
    counts: [u16; 4],
    extra: Option<[u16; 5]>,
) {
    w.u8(b'M').u8(b'B').u8(version).u8(0);
    for f in formats {
        w.u8(f);
    }
    for c in counts {
        w.u16(c);
    }
    for c in extra.into_iter().flatten() {
        w.u16(c);
    }
}

/// Triangle of a bit-packed polygon section.
pub struct PackedTriangle {
    pub material: u8,
    pub corners: [u8; 3],
    /// Palette index for colored triangles; texture coordinates otherwise.
    pub color: u8,
    pub uvs: [[u8; 2]; 3],
}

pub fn colored(corners: [u8; 3], color: u8) -> PackedTriangle {
    PackedTriangle {
        material: 0,
        corners,
        color,
        uvs: [[0; 2]; 3],
    }
}

pub fn textured(corners: [u8; 3], uvs: [[u8; 2]; 3]) -> PackedTriangle {
    PackedTriangle {
        material: 0,
        corners,
        color: 0,
        uvs,
    }
}

/// Version-5 mesh with raw vertices, no normals, one root bone and
/// bit-packed polygon sections (triangles only).
pub struct PackedMesh {
    pub vertices: Vec<[i16; 3]>,
    pub textures: u16,
    /// Per pattern: colored `[tri, quad]`, then `[tri, quad]` per texture slot.
    pub patterns: Vec<([u16; 2], Vec<[u16; 2]>)>,
    /// 5-bit channels.
    pub palette: Vec<[u8; 3]>,
    pub colored: Vec<PackedTriangle>,
    pub textured: Vec<PackedTriangle>,
}

impl PackedMesh {
    const VERTEX_BITS: u32 = 4;
    const COLOR_ID_BITS: u32 = 2;

    pub fn build(&self) -> Vec<u8> {
        let mut w = BitWriter::new();
        let vertex_count = self.vertices.len() as u16;
        mesh_header(
            &mut w,
            5,
            [1, 0, 3, 1],
            [vertex_count, self.textured.len() as u16, 0, 1],
            Some([
                self.colored.len() as u16,
                0,
                self.textures,
                self.patterns.len() as u16,
                self.palette.len() as u16,
            ]),
        );
        for (colored, slots) in &self.patterns {
            w.u16(colored[0]).u16(colored[1]);
            for slot in slots {
                w.u16(slot[0]).u16(slot[1]);
            }
        }
        for v in &self.vertices {
            w.i16s(v);
        }

        w.u8(6)
            .u8(Self::VERTEX_BITS as u8)
            .u8(5)
            .u8(Self::COLOR_ID_BITS as u8)
            .u8(0);
        for rgb in &self.palette {
            for &c in rgb {
                w.bits(c as i64, 5);
            }
        }
        for t in &self.colored {
            w.bits(t.material as i64, 6);
            for &c in &t.corners {
                w.bits(c as i64, Self::VERTEX_BITS);
            }
            w.bits(t.color as i64, Self::COLOR_ID_BITS);
        }
        w.align();

        w.u8(6).u8(Self::VERTEX_BITS as u8).u8(8).u8(0);
        for t in &self.textured {
            w.bits(t.material as i64, 6);
            for &c in &t.corners {
                w.bits(c as i64, Self::VERTEX_BITS);
            }
            for uv in &t.uvs {
                w.bits(uv[0] as i64, 8).bits(uv[1] as i64, 8);
            }
        }
        w.align();

        w.u16(vertex_count).i16(-1).i16s(&IDENTITY_FIELDS);
        w.finish()
    }
}
