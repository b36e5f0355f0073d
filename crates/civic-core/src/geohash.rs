//! Geohash spatial index strings
use crate::data_model::Coordinates;

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Precision used for stored reports (~5m cells)
pub const REPORT_PRECISION: usize = 9;

/// Encode coordinates into a geohash of `precision` characters.
pub fn encode(coords: Coordinates, precision: usize) -> String {
    let mut lat = (-90.0_f64, 90.0_f64);
    let mut lon = (-180.0_f64, 180.0_f64);
    let mut hash = String::with_capacity(precision);
    let mut even_bit = true;
    let mut bits = 0u8;
    let mut idx = 0usize;

    while hash.len() < precision {
        // Longitude on even bits, latitude on odd
        let (range, value) = if even_bit {
            (&mut lon, coords.longitude)
        } else {
            (&mut lat, coords.latitude)
        };
        let mid = (range.0 + range.1) / 2.0;
        idx <<= 1;
        if value >= mid {
            idx |= 1;
            range.0 = mid;
        } else {
            range.1 = mid;
        }
        even_bit = !even_bit;

        bits += 1;
        if bits == 5 {
            hash.push(BASE32[idx] as char);
            bits = 0;
            idx = 0;
        }
    }

    hash
}
