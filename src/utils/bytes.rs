/// Return a byte slice view of a slice of plain values.
///
/// Safety: This performs a plain reinterpretation of the memory of `[T]` as bytes.
/// The caller must ensure `T` is POD-like (integers, floats, `#[repr(C)]` structs of them).
pub fn as_bytes<T: Copy>(v: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(v.as_ptr() as *const u8, std::mem::size_of_val(v)) }
}

/// Decode little endian bytes into f32 values. Trailing bytes that don't make up a full value are ignored.
pub fn f32_from_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(std::mem::size_of::<f32>())
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f32_values_survive_byte_view() {
        let values = [1.5f32, -2.0, 0.0, 1024.25];
        let bytes = as_bytes(&values);
        assert_eq!(bytes.len(), 16);
        assert_eq!(f32_from_bytes(bytes), values);
    }

    #[test]
    fn partial_trailing_value_is_dropped() {
        let bytes = [0u8, 0, 128, 63, 7];
        assert_eq!(f32_from_bytes(&bytes), vec![1.0]);
    }
}
