use crate::model::MeshAsset;

/// Rewrite `indices` for the pattern selection `mask`.
///
/// Polygons keep their slots in the shared buffer; a polygon whose pattern bits
/// are not all in `mask` gets every slot pointed at the sentinel vertex. Returns
/// the number of visible polygons.
pub fn apply_pattern(mesh: &MeshAsset, mask: u32, indices: &mut Vec<u32>) -> usize {
    if indices.len() != mesh.indices.len() {
        indices.clear();
        indices.extend_from_slice(&mesh.indices);
    }
    let sentinel = mesh.sentinel_index();
    let mut offset = 0;
    let mut visible = 0;
    for polygon in mesh.polygons() {
        let n = polygon.indices.len();
        let slot = &mut indices[offset..offset + n];
        if polygon.is_visible(mask) {
            slot.copy_from_slice(&polygon.indices);
            visible += 1;
        } else {
            slot.fill(sentinel);
        }
        offset += n;
    }
    visible
}
