mod common;

use common::{
    anim_header, colored, mesh_header, raw_mesh, raw_mesh_with_count, textured, triangle,
    BitWriter, PackedMesh, IDENTITY_FIELDS,
};
use micro3d::assembly::{apply_pattern, SENTINEL_NORMAL};
use micro3d::model::{BoneTrack, PolygonKind, MATERIAL_STRIDE};
use micro3d::{decode_animation, decode_mesh};

#[test]
fn minimal_mesh_round_trip() {
    let vertices = [[1, 2, 3], [4, 5, 6], [-7, 8, -9]];
    let data = raw_mesh(&vertices, &[triangle(0, [0, 1, 2])], &[(3, -1)]);

    let mesh = decode_mesh(&data).unwrap();
    assert_eq!(mesh.vertex_count, 3);
    assert_eq!(mesh.vertices[..3], [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [-7.0, 8.0, -9.0]]);
    assert!(mesh.vertices[3].iter().all(|c| c.is_infinite()));
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    assert_eq!(mesh.materials, vec![0, 0, 0, 0, 0, 10, 0, 0, 0, 0, 0, 10, 0, 0, 0]);
    assert_eq!(mesh.bones.len(), 1);
    assert!(!mesh.has_normals());

    // decoding is pure
    assert_eq!(decode_mesh(&data).unwrap(), mesh);
}

#[test]
fn vertex_count_over_limit_fails() {
    let data = raw_mesh_with_count(21846, &[], &[], &[]);
    let err = decode_mesh(&data).unwrap_err();
    assert_eq!(err.key, "vertex-count");
    assert_eq!(err.arg("count"), Some("21846"));
}

#[test]
fn bones_must_cover_every_vertex() {
    let vertices = [[0, 0, 0], [1, 0, 0], [0, 1, 0]];
    let data = raw_mesh(&vertices, &[triangle(0, [0, 1, 2])], &[(2, -1)]);
    assert_eq!(decode_mesh(&data).unwrap_err().key, "bone-vertex-sum");
}

#[test]
fn bone_parent_below_minus_one_fails() {
    let vertices = [[0, 0, 0]];
    let data = raw_mesh(&vertices, &[], &[(1, -2)]);
    assert_eq!(decode_mesh(&data).unwrap_err().key, "bone-parent");
}

#[test]
fn vertex_index_out_of_range_fails() {
    let vertices = [[0, 0, 0], [1, 0, 0], [0, 1, 0]];
    let data = raw_mesh(&vertices, &[triangle(0, [0, 1, 3])], &[(3, -1)]);
    assert_eq!(decode_mesh(&data).unwrap_err().key, "vertex-index");
}

#[test]
fn disallowed_material_bits_fail() {
    let vertices = [[0, 0, 0], [1, 0, 0], [0, 1, 0]];
    let data = raw_mesh(&vertices, &[triangle(0x40, [0, 1, 2])], &[(3, -1)]);
    assert_eq!(decode_mesh(&data).unwrap_err().key, "material");
}

#[test]
fn truncated_mesh_fails() {
    let vertices = [[0, 0, 0], [1, 0, 0], [0, 1, 0]];
    let mut data = raw_mesh(&vertices, &[triangle(0, [0, 1, 2])], &[(3, -1)]);
    data.truncate(data.len() - 3);
    assert_eq!(decode_mesh(&data).unwrap_err().key, "end-of-stream");
}

#[test]
fn stable_sort_groups_by_blend() {
    let vertices = [[0, 0, 0], [1, 0, 0], [0, 1, 0], [1, 1, 0]];
    // half-blended first in decode order, then opaque
    let data = raw_mesh(
        &vertices,
        &[triangle(0x02, [0, 1, 2]), triangle(0, [1, 2, 3]), triangle(0, [3, 2, 1])],
        &[(4, -1)],
    );
    let mesh = decode_mesh(&data).unwrap();
    assert_eq!(mesh.indices, vec![1, 2, 3, 3, 2, 1, 0, 1, 2]);
    let buckets = mesh.buckets.buckets();
    assert_eq!(buckets.len(), 2);
    assert_eq!((buckets[0].start, buckets[0].count), (0, 6));
    assert_eq!((buckets[1].start, buckets[1].count), (6, 3));
    assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), mesh.indices.len());
}

/// Version 5 with packed vertices, packed normals, colored and textured
/// sections and a two-pattern table.
fn packed_mesh() -> Vec<u8> {
    let mut w = BitWriter::new();
    w.u8(b'M').u8(b'B').u8(5).u8(0);
    w.u8(2).u8(2).u8(3).u8(1);
    // vertices, textured tri/quad, bones
    w.u16(4).u16(0).u16(1).u16(1);
    // colored tri/quad, textures, patterns, colors
    w.u16(1).u16(0).u16(1).u16(2).u16(1);
    // pattern 0: one colored triangle; pattern 1: one textured quad
    w.u16(1).u16(0).u16(0).u16(0);
    w.u16(0).u16(0).u16(0).u16(1);

    // one 8-bit chunk of four vertices
    w.bits(0x03, 8);
    for v in [[0, 0, 0], [10, 0, 0], [0, 10, 0], [-10, -10, 5]] {
        for c in v {
            w.bits(c, 8);
        }
    }
    w.align();

    // normals: pool escape to +Z, then packed (0, 0, -)
    for _ in 0..3 {
        w.bits(64, 7).bits(4, 3);
    }
    w.bits(0, 7).bits(0, 7).bits(1, 1);
    w.align();

    // colored: widths, palette, one triangle
    w.u8(6).u8(2).u8(5).u8(1).u8(0);
    w.bits(31, 5).bits(0, 5).bits(16, 5);
    w.bits(0, 6).bits(0, 2).bits(1, 2).bits(2, 2).bits(0, 1);
    w.align();

    // textured: widths, one lit quad
    w.u8(6).u8(2).u8(8).u8(0);
    w.bits(0x10, 6);
    for i in 0..4 {
        w.bits(i, 2);
    }
    for uv in [[0, 0], [255, 0], [0, 255], [255, 255]] {
        w.bits(uv[0], 8).bits(uv[1], 8);
    }
    w.align();

    w.u16(4).i16(-1).i16s(&common::IDENTITY_FIELDS);
    w.finish()
}

#[test]
fn packed_mesh_decodes_every_section() {
    let mesh = decode_mesh(&packed_mesh()).unwrap();
    assert_eq!(mesh.version, 5);
    assert_eq!(mesh.vertices[3], [-10.0, -10.0, 5.0]);

    let normals = mesh.normals.as_ref().unwrap();
    assert_eq!(normals[0], [0.0, 0.0, 1.0]);
    assert_eq!(normals[3], [0.0, 0.0, -1.0]);
    assert_eq!(normals[4], SENTINEL_NORMAL);

    // textured buckets come first
    assert_eq!(mesh.indices, vec![0, 1, 2, 2, 1, 3, 0, 1, 2]);
    assert_eq!(mesh.textured[0].kind, PolygonKind::Textured);
    assert_eq!(mesh.textured[0].pattern, 1);
    assert_eq!(mesh.colored[0].pattern, 0);

    let us: Vec<u8> = mesh.materials.chunks(5).take(6).map(|m| m[0]).collect();
    assert_eq!(us, vec![0, 255, 0, 0, 255, 255]);
    assert_eq!(&mesh.materials[2..5], &[1, 0, 0]);
    assert_eq!(&mesh.materials[30..35], &[0xF8, 0, 0x80, 0, 0]);
}

#[test]
fn pattern_toggling_is_idempotent() {
    let mesh = decode_mesh(&packed_mesh()).unwrap();
    let mut once = mesh.indices.clone();
    assert_eq!(apply_pattern(&mesh, 0, &mut once), 1);
    assert_eq!(once, vec![4, 4, 4, 4, 4, 4, 0, 1, 2]);

    let mut twice = once.clone();
    apply_pattern(&mesh, 0, &mut twice);
    assert_eq!(twice, once);

    apply_pattern(&mesh, 1, &mut twice);
    assert_eq!(twice, mesh.indices);
}

#[test]
fn animation_with_unknown_type_fails() {
    let mut w = BitWriter::new();
    anim_header(&mut w, 4, 1, 2);
    w.u16(10);
    w.u8(1); // identity
    w.u8(7);
    let err = decode_animation(&w.finish()).unwrap_err();
    assert_eq!(err.key, "unknown-bone-type");
    assert_eq!(err.arg("bone"), Some("1"));
}

#[test]
fn animation_decodes_every_track_type() {
    let mut w = BitWriter::new();
    anim_header(&mut w, 5, 1, 7);
    w.u16(30);
    let vec3 = |w: &mut BitWriter, v: [i16; 3]| {
        w.u16(1).u16(0).i16s(&v);
    };
    let roll = |w: &mut BitWriter| {
        w.u16(1).u16(0).i16(0);
    };
    w.u8(0).i16s(&common::IDENTITY_FIELDS);
    w.u8(1);
    w.u8(2);
    vec3(&mut w, [1, 2, 3]);
    vec3(&mut w, [4096, 4096, 4096]);
    vec3(&mut w, [0, 0, 1]);
    roll(&mut w);
    w.u8(3).i16s(&[5, 6, 7]);
    vec3(&mut w, [0, 1, 0]);
    w.i16(0);
    w.u8(4);
    vec3(&mut w, [1, 0, 0]);
    roll(&mut w);
    w.u8(5);
    vec3(&mut w, [0, 0, -1]);
    w.u8(6);
    vec3(&mut w, [9, 9, 9]);
    vec3(&mut w, [0, 0, 1]);
    roll(&mut w);
    // two pattern events
    w.u16(2).u16(0).u32(1).u16(12).u32(2);

    let clip = decode_animation(&w.finish()).unwrap();
    let tags: Vec<u8> = clip.actions[0].tracks.iter().map(BoneTrack::type_tag).collect();
    assert_eq!(tags, vec![0, 1, 2, 3, 4, 5, 6]);
    match &clip.actions[0].tracks[2] {
        BoneTrack::Full { scale, .. } => assert_eq!(scale.values[0], [1.0, 1.0, 1.0]),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(clip.actions[0].pattern_at(20 << 16), Some(2));
    assert_eq!(clip.num_frames(0), Some(30 << 16));
}

#[test]
fn animation_events_must_ascend() {
    let mut w = BitWriter::new();
    anim_header(&mut w, 5, 1, 1);
    w.u16(10).u8(1);
    w.u16(2).u16(5).u32(1).u16(5).u32(2);
    assert_eq!(decode_animation(&w.finish()).unwrap_err().key, "event-order");
}

#[test]
fn vertex_chunk_past_the_count_fails() {
    let mut w = BitWriter::new();
    mesh_header(&mut w, 4, [2, 0, 1, 1], [2, 0, 0, 0], None);
    // one 8-bit chunk of three vertices
    w.bits(0x02, 8);
    let err = decode_mesh(&w.finish()).unwrap_err();
    assert_eq!(err.key, "vertex-overflow");
    assert_eq!(err.arg("chunk"), Some("3"));
}

#[test]
fn polygon_format_two_uses_seven_bit_uvs() {
    let mut w = BitWriter::new();
    mesh_header(&mut w, 4, [1, 0, 2, 1], [3, 1, 0, 1], None);
    w.i16s(&[0, 0, 0, 8, 0, 0, 0, 8, 0]);
    w.u8(6).u8(2);
    w.bits(0x10, 6).bits(0, 2).bits(1, 2).bits(2, 2);
    for uv in [[127, 0], [0, 64], [5, 6]] {
        w.bits(uv[0], 7).bits(uv[1], 7);
    }
    w.align();
    w.u16(3).i16(-1).i16s(&IDENTITY_FIELDS);

    let mesh = decode_mesh(&w.finish()).unwrap();
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    let entries: Vec<&[u8]> = mesh.materials.chunks(MATERIAL_STRIDE).collect();
    assert_eq!(entries[0], &[127, 0, 1, 0, 0]);
    assert_eq!(entries[1], &[0, 64, 1, 0, 0]);
    assert_eq!(entries[2], &[5, 6, 1, 0, 0]);
}

#[test]
fn raw_normals_are_fixed_point() {
    let mut w = BitWriter::new();
    mesh_header(&mut w, 4, [1, 1, 1, 1], [3, 0, 0, 1], None);
    w.i16s(&[0, 0, 0, 1, 0, 0, 0, 1, 0]);
    w.i16s(&[0, 0, 4096, 2048, 0, 0, 0, -4096, 0]);
    w.u16(3).i16(-1).i16s(&IDENTITY_FIELDS);

    let mesh = decode_mesh(&w.finish()).unwrap();
    let normals = mesh.normals.unwrap();
    assert_eq!(
        normals,
        vec![[0.0, 0.0, 1.0], [0.5, 0.0, 0.0], [0.0, -1.0, 0.0], SENTINEL_NORMAL]
    );
}

fn quad_vertices() -> Vec<[i16; 3]> {
    vec![[0, 0, 0], [8, 0, 0], [0, 8, 0], [8, 8, 0]]
}

#[test]
fn pattern_table_must_match_polygon_counts() {
    let mesh = PackedMesh {
        vertices: quad_vertices(),
        textures: 1,
        patterns: vec![([0, 0], vec![[1, 0]])],
        palette: Vec::new(),
        colored: Vec::new(),
        textured: vec![
            textured([0, 1, 2], [[0, 0]; 3]),
            textured([1, 2, 3], [[0, 0]; 3]),
        ],
    };
    let err = decode_mesh(&mesh.build()).unwrap_err();
    assert_eq!(err.key, "pattern-table");
    assert_eq!(err.arg("list"), Some("textured-tri"));
    assert_eq!(err.arg("table"), Some("1"));
    assert_eq!(err.arg("decoded"), Some("2"));
}

#[test]
fn color_index_past_palette_fails() {
    let mesh = PackedMesh {
        vertices: quad_vertices(),
        textures: 1,
        patterns: vec![([1, 0], vec![[0, 0]])],
        palette: vec![[31, 31, 31]],
        colored: vec![colored([0, 1, 2], 1)],
        textured: Vec::new(),
    };
    let err = decode_mesh(&mesh.build()).unwrap_err();
    assert_eq!(err.key, "color-index");
    assert_eq!(err.arg("index"), Some("1"));
    assert_eq!(err.arg("count"), Some("1"));
}

#[test]
fn pattern_table_walks_slots_within_each_pattern() {
    // decode order: A belongs to pattern 0 slot 1, B to pattern 1 slot 0
    let mesh = PackedMesh {
        vertices: quad_vertices(),
        textures: 2,
        patterns: vec![
            ([0, 0], vec![[0, 0], [1, 0]]),
            ([0, 0], vec![[1, 0], [0, 0]]),
        ],
        palette: Vec::new(),
        colored: Vec::new(),
        textured: vec![
            textured([0, 1, 2], [[1, 1], [2, 2], [3, 3]]),
            textured([3, 2, 1], [[9, 9], [8, 8], [7, 7]]),
        ],
    };
    let mesh = decode_mesh(&mesh.build()).unwrap();
    assert_eq!(mesh.texture_count, 2);

    // slot 0 sorts first
    let b = &mesh.textured[0];
    assert_eq!(b.indices, vec![3, 2, 1]);
    assert_eq!((b.texture, b.pattern), (0, 1));
    let a = &mesh.textured[1];
    assert_eq!(a.indices, vec![0, 1, 2]);
    assert_eq!((a.texture, a.pattern), (1, 0));

    assert_eq!(mesh.indices, vec![3, 2, 1, 0, 1, 2]);
    assert_eq!(mesh.materials[0], 9);
    let slots: Vec<usize> = mesh.buckets.buckets().iter().map(|b| b.slot).collect();
    assert_eq!(slots, vec![0, 1]);

    let mut hidden = mesh.indices.clone();
    assert_eq!(apply_pattern(&mesh, 0, &mut hidden), 1);
    assert_eq!(hidden, vec![4, 4, 4, 0, 1, 2]);
}
