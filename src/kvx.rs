use crate::error::Error;
use crate::palette::{Palette, KVX_PALETTE_BYTES};
use crate::placer::CubePlacer;
use log::debug;
use nalgebra::Vector3;

/// The slab format stores up to this many successive levels of detail.
pub const LEVEL_COUNT: u32 = 5;

/// Pivots are fixed-point values with this scale.
const PIVOT_SCALE: f32 = 256.;

struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Reader<'a> {
        Reader { buf, offset: 0 }
    }

    fn bytes(&mut self, count: u64) -> Option<&'a [u8]> {
        if count > (self.buf.len() - self.offset) as u64 {
            return None;
        }
        let start = self.offset;
        self.offset += count as usize;
        Some(&self.buf[start..self.offset])
    }

    fn u32(&mut self) -> Option<u32> {
        let bytes = self.bytes(4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn u32_table(&mut self, count: u64) -> Option<Vec<u32>> {
        let bytes = self.bytes(count.checked_mul(4)?)?;
        let table = bytes
            .chunks_exact(4)
            .map(|entry| u32::from_le_bytes([entry[0], entry[1], entry[2], entry[3]]))
            .collect();
        Some(table)
    }

    fn u16_table(&mut self, count: u64) -> Option<Vec<u16>> {
        let bytes = self.bytes(count.checked_mul(2)?)?;
        let table = bytes
            .chunks_exact(2)
            .map(|entry| u16::from_le_bytes([entry[0], entry[1]]))
            .collect();
        Some(table)
    }
}

/// Decodes a slab-format byte buffer, pushing every solid voxel to the placer.
///
/// Running out of bytes while reading a level's fields is not an error; it
/// means there are no levels left, and whatever was decoded so far stands.
/// Only two conditions are fatal: a buffer too small to hold the palette
/// trailer, and a level record smaller than its own header.
pub fn decode(contents: &[u8], placer: &mut impl CubePlacer) -> Result<(), Error> {
    if contents.len() < KVX_PALETTE_BYTES {
        return Err(Error::FileTooSmall { size: contents.len() });
    }
    // The palette always sits at the end of the file; levels parse out of the
    // prefix in front of it.
    let (levels, palette) = contents.split_at(contents.len() - KVX_PALETTE_BYTES);
    let palette = Palette::from_kvx(palette);

    let mut reader = Reader::new(levels);
    for level in 0..LEVEL_COUNT {
        let Some(record) = reader.u32() else { return Ok(()) };
        let Some(xsiz) = reader.u32() else { return Ok(()) };
        let Some(ysiz) = reader.u32() else { return Ok(()) };
        let Some(zsiz) = reader.u32() else { return Ok(()) };
        let Some(xpivot) = reader.u32() else { return Ok(()) };
        let Some(ypivot) = reader.u32() else { return Ok(()) };
        let Some(zpivot) = reader.u32() else { return Ok(()) };

        let Some(xoffset) = reader.u32_table(xsiz as u64 + 1) else { return Ok(()) };
        let Some(xyoffset) = reader.u16_table(xsiz as u64 * (ysiz as u64 + 1)) else {
            return Ok(());
        };

        // Everything in the record except the record size itself.
        let header = 24 + (xsiz as u64 + 1) * 4 + xsiz as u64 * (ysiz as u64 + 1) * 2;
        if (record as u64) < header {
            return Err(Error::LevelHeader { level, record, header });
        }
        let Some(voxdata) = reader.bytes(record as u64 - header) else { return Ok(()) };

        debug!(
            "slab level read, \x1B[1mlevel\x1B[0m: {level}, \x1B[1msize\x1B[0m: {xsiz}x{ysiz}x{zsiz}"
        );

        placer.set_level(level);
        // Slab files are stored with X=right, Y=front and Z=down; geometry is
        // emitted with X=right, Y=up and Z=front, so (x,y,z) maps to (x,-z,y).
        placer.set_centroid(Vector3::new(
            xpivot as f32 / PIVOT_SCALE,
            -(zpivot as f32 / PIVOT_SCALE),
            ypivot as f32 / PIVOT_SCALE,
        ));

        decode_slabs(
            voxdata,
            &xoffset,
            &xyoffset,
            xsiz as usize,
            ysiz as usize,
            &palette,
            placer,
        );
    }
    Ok(())
}

fn decode_slabs(
    voxdata: &[u8],
    xoffset: &[u32],
    xyoffset: &[u16],
    xsiz: usize,
    ysiz: usize,
    palette: &Palette,
    placer: &mut impl CubePlacer,
) {
    // The offset tables only give each column's byte count; the slab records
    // themselves are consumed through a single running cursor.
    let mut cursor = 0;
    for x in 0..xsiz {
        for y in 0..ysiz {
            let start = xoffset[x] as i64 + xyoffset[x * (ysiz + 1) + y] as i64;
            let end = xoffset[x] as i64 + xyoffset[x * (ysiz + 1) + y + 1] as i64;
            let mut remaining = end - start;
            while remaining > 0 {
                let header: Option<&[u8; 3]> = voxdata
                    .get(cursor..cursor + 3)
                    .and_then(|header| header.try_into().ok());
                let Some(&[top, length, sides]) = header else {
                    return;
                };
                let length = length as usize;
                let Some(colors) = voxdata.get(cursor + 3..cursor + 3 + length) else {
                    return;
                };
                for (below_top, &index) in colors.iter().enumerate() {
                    let z = top as i32 + below_top as i32;
                    placer.place(
                        Vector3::new(x as i32, -z, y as i32),
                        palette.color(index),
                        sides,
                    );
                }
                remaining -= length as i64 + 3;
                cursor += length + 3;
            }
        }
    }
}

#[cfg(test)]
use crate::placer::mesh::MeshCubePlacer;

#[cfg(test)]
fn push_u32(file: &mut Vec<u8>, value: u32) {
    file.extend_from_slice(&value.to_le_bytes());
}

/// One 1x1x1 level holding a single slab run of one voxel with color index 1.
#[cfg(test)]
fn single_voxel_level(sides: u8) -> Vec<u8> {
    let mut level = Vec::new();
    push_u32(&mut level, 40); // 24-byte header + 8 + 4 table bytes + one 4-byte slab
    for dimension in [1, 1, 1] {
        push_u32(&mut level, dimension);
    }
    for pivot in [0, 0, 0] {
        push_u32(&mut level, pivot);
    }
    push_u32(&mut level, 0); // xoffset[0]
    push_u32(&mut level, 4); // xoffset[1]
    level.extend_from_slice(&0u16.to_le_bytes());
    level.extend_from_slice(&4u16.to_le_bytes());
    level.extend_from_slice(&[0, 1, sides, 1]);
    level
}

/// All-black palette except index 1, which is pure red.
#[cfg(test)]
fn red_palette() -> Vec<u8> {
    let mut palette = vec![0; KVX_PALETTE_BYTES];
    palette[3] = 63;
    palette
}

#[test]
fn short_buffers_fail() {
    let mut placer = MeshCubePlacer::new();
    let error = decode(&[0; KVX_PALETTE_BYTES - 1], &mut placer);
    assert!(matches!(error, Err(Error::FileTooSmall { .. })));
    let error = decode(&[], &mut placer);
    assert!(matches!(error, Err(Error::FileTooSmall { .. })));
}

#[test]
fn palette_only_decodes_no_levels() {
    let mut placer = MeshCubePlacer::new();
    decode(&red_palette(), &mut placer).unwrap();
    assert!(placer.into_buffer().points.is_empty());
}

#[test]
fn single_voxel_becomes_a_cube() {
    let mut file = single_voxel_level(0x3f);
    file.extend_from_slice(&red_palette());
    let mut placer = MeshCubePlacer::new();
    decode(&file, &mut placer).unwrap();
    let buffer = placer.into_buffer();
    assert_eq!(buffer.points.len(), 8);
    assert_eq!(buffer.face_vertex_counts.len(), 6);
    assert_eq!(buffer.colors, [Vector3::new(1., 0., 0.); 6]);
}

#[test]
fn sides_mask_culls_faces() {
    let mut file = single_voxel_level(0b000110);
    file.extend_from_slice(&red_palette());
    let mut placer = MeshCubePlacer::new();
    decode(&file, &mut placer).unwrap();
    let buffer = placer.into_buffer();
    assert_eq!(buffer.face_vertex_counts.len(), 2);
    assert_eq!(buffer.normals, [Vector3::new(1., 0., 0.), Vector3::new(0., 0., -1.)]);
}

#[test]
fn record_below_header_size_fails() {
    let mut file = single_voxel_level(0x3f);
    file[0..4].copy_from_slice(&10u32.to_le_bytes());
    file.extend_from_slice(&red_palette());
    let mut placer = MeshCubePlacer::new();
    let error = decode(&file, &mut placer);
    assert!(matches!(error, Err(Error::LevelHeader { level: 0, record: 10, .. })));
}

#[test]
fn truncated_later_level_keeps_earlier_samples() {
    let mut file = single_voxel_level(0x3f);
    // A second level that ends in the middle of its dimension fields.
    file.extend_from_slice(&40u32.to_le_bytes());
    file.extend_from_slice(&[1, 0]);
    file.extend_from_slice(&red_palette());
    let mut placer = MeshCubePlacer::new();
    decode(&file, &mut placer).unwrap();
    assert_eq!(placer.into_buffer().points.len(), 8);
}

#[test]
fn truncated_offset_table_keeps_earlier_samples() {
    let mut file = single_voxel_level(0x3f);
    // A second level whose header promises tables the buffer doesn't hold.
    push_u32(&mut file, 1000);
    for field in [100, 100, 100, 0, 0, 0] {
        push_u32(&mut file, field);
    }
    file.extend_from_slice(&red_palette());
    let mut placer = MeshCubePlacer::new();
    decode(&file, &mut placer).unwrap();
    assert_eq!(placer.into_buffer().points.len(), 8);
}

#[test]
fn coarser_levels_are_decoded_but_not_rendered() {
    let mut file = single_voxel_level(0x3f);
    file.extend_from_slice(&single_voxel_level(0x3f));
    file.extend_from_slice(&red_palette());
    let mut placer = MeshCubePlacer::new();
    decode(&file, &mut placer).unwrap();
    assert_eq!(placer.into_buffer().points.len(), 8);
}

#[test]
fn decoding_is_a_pure_function_of_the_buffer() {
    let mut file = single_voxel_level(0b010101);
    file.extend_from_slice(&single_voxel_level(0x3f));
    file.extend_from_slice(&red_palette());
    let mut first = MeshCubePlacer::new();
    decode(&file, &mut first).unwrap();
    let mut second = MeshCubePlacer::new();
    decode(&file, &mut second).unwrap();
    let first = first.into_buffer();
    let second = second.into_buffer();
    assert_eq!(first.points, second.points);
    assert_eq!(first.face_vertex_indices, second.face_vertex_indices);
    assert_eq!(first.colors, second.colors);
    assert_eq!(first.normals, second.normals);
}

#[test]
fn pivot_shifts_the_centroid() {
    let mut file = single_voxel_level(0x3f);
    // xpivot = 256, ypivot = 512, zpivot = 256.
    file[16..20].copy_from_slice(&256u32.to_le_bytes());
    file[20..24].copy_from_slice(&512u32.to_le_bytes());
    file[24..28].copy_from_slice(&256u32.to_le_bytes());
    file.extend_from_slice(&red_palette());
    let mut placer = MeshCubePlacer::new();
    decode(&file, &mut placer).unwrap();
    let buffer = placer.into_buffer();
    // The voxel sits at (0, 0, 0); the centroid remap puts the cube's low
    // corner at (0,0,0) - (1,-1,2) - 0.5.
    assert_eq!(buffer.points[0], Vector3::new(-1.5, 0.5, -2.5));
}
