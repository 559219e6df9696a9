use nalgebra::Vector3;

pub const PALETTE_LEN: usize = 256;

/// Byte size of the slab-format palette trailer, 3 bytes per entry.
pub const KVX_PALETTE_BYTES: usize = 3 * PALETTE_LEN;

/// Fixed 256-entry color table. Index 0 is reserved for "no voxel" by both
/// file formats; the lookup itself doesn't care, callers skip it where the
/// format requires.
pub struct Palette {
    colors: [Vector3<f32>; PALETTE_LEN],
}

impl Palette {
    /// Slab-format palette, channels scaled 0-63.
    pub fn from_kvx(bytes: &[u8]) -> Palette {
        assert_eq!(bytes.len(), KVX_PALETTE_BYTES);
        let mut colors = [Vector3::zeros(); PALETTE_LEN];
        for (color, entry) in colors.iter_mut().zip(bytes.chunks_exact(3)) {
            *color = Vector3::new(entry[0] as f32, entry[1] as f32, entry[2] as f32) / 63.;
        }
        Palette { colors }
    }

    /// Dense-grid palette, 8 bits per channel. Alpha is not carried into display colors.
    pub fn from_rgba(entries: &[[u8; 4]; PALETTE_LEN]) -> Palette {
        let mut colors = [Vector3::zeros(); PALETTE_LEN];
        for (color, entry) in colors.iter_mut().zip(entries.iter()) {
            *color = Vector3::new(entry[0] as f32, entry[1] as f32, entry[2] as f32) / 255.;
        }
        Palette { colors }
    }

    pub fn color(&self, index: u8) -> Vector3<f32> {
        self.colors[index as usize]
    }
}

#[test]
fn kvx_channels_use_the_six_bit_scale() {
    let mut bytes = [0; KVX_PALETTE_BYTES];
    bytes[3] = 63;
    bytes[4] = 0;
    bytes[5] = 21;
    let palette = Palette::from_kvx(&bytes);
    assert_eq!(palette.color(1), Vector3::new(1., 0., 21. / 63.));
}

#[test]
fn rgba_alpha_is_dropped() {
    let mut entries = [[0; 4]; PALETTE_LEN];
    entries[7] = [255, 51, 0, 9];
    let palette = Palette::from_rgba(&entries);
    assert_eq!(palette.color(7), Vector3::new(1., 51. / 255., 0.));
}

#[test]
fn index_zero_still_looks_up() {
    let mut entries = [[0; 4]; PALETTE_LEN];
    entries[0] = [255, 255, 255, 255];
    let palette = Palette::from_rgba(&entries);
    assert_eq!(palette.color(0), Vector3::new(1., 1., 1.));
}
