//! Per-corner texture selection: keep the four strongest palette entries
//! of a triangle and renormalise each corner's weights over them.

use nebula_terrain::TextureType;

/// Totals below this are left un-normalised to avoid dividing by ~0.
pub const SPLAT_EPSILON: f32 = 1e-4;

/// Indices of the four largest strengths, strongest first.
///
/// Runs a four-slot insertion instead of sorting the whole palette. Equal
/// strengths keep ascending index order; NaN ranks below everything.
pub fn strongest_four(strengths: &[f32; TextureType::COUNT]) -> [usize; 4] {
    let mut top = [0usize; 4];
    let mut vals = [f32::NEG_INFINITY; 4];
    let mut len = 0;

    for (i, &s) in strengths.iter().enumerate() {
        let s = if s.is_nan() { f32::NEG_INFINITY } else { s };
        if len == 4 && s <= vals[3] {
            continue;
        }
        let mut j = len.min(3);
        while j > 0 && s > vals[j - 1] {
            top[j] = top[j - 1];
            vals[j] = vals[j - 1];
            j -= 1;
        }
        top[j] = i;
        vals[j] = s;
        if len < 4 {
            len += 1;
        }
    }
    top
}

/// Scale `weights` to sum to one. Totals under [`SPLAT_EPSILON`] are
/// returned unchanged.
pub fn normalize_weights(weights: [f32; 4]) -> [f32; 4] {
    let total: f32 = weights.iter().sum();
    if total >= SPLAT_EPSILON {
        weights.map(|w| w / total)
    } else {
        weights
    }
}
