//! Signed normalized 16-bit quantization

/// Largest magnitude a packed component can take.
///
/// The range is symmetric: `-32768` is never produced by [`pack_snorm16`].
pub const SNORM16_MAX: i16 = i16::MAX;

const SNORM16_SCALE: f32 = SNORM16_MAX as f32;

/// Quantize a float nominally in `[-1, 1]` to the nearest signed 16-bit integer.
///
/// Values outside the range saturate to `±32767`. Ties round away from zero.
/// A NaN input packs to `0`.
pub fn pack_snorm16(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * SNORM16_SCALE).round() as i16
}

/// Inverse of [`pack_snorm16`], following the GPU rule for normalized
/// signed attributes (`-32768` also maps to `-1.0`).
pub fn unpack_snorm16(value: i16) -> f32 {
    (f32::from(value) / SNORM16_SCALE).max(-1.0)
}

/// Size of one quantization step in the float domain.
pub fn snorm16_step() -> f32 {
    1.0 / SNORM16_SCALE
}
