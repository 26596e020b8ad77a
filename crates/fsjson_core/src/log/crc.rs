//! CRC32C checksums with the log's masking transform.
//!
//! A CRC computed over data that itself embeds CRCs is problematic, so the
//! stored value is rotated and offset. This also keeps an all-zero header
//! from carrying a valid checksum.

/// Offset added after rotation when masking.
pub const MASK_DELTA: u32 = 0xA282_EAD8;

/// Masks a raw CRC for storage.
#[inline]
#[must_use]
pub fn mask(crc: u32) -> u32 {
    crc.rotate_right(15).wrapping_add(MASK_DELTA)
}

/// Recovers the raw CRC from its stored form.
#[inline]
#[must_use]
pub fn unmask(masked: u32) -> u32 {
    let rot = masked.wrapping_sub(MASK_DELTA);
    (rot >> 17) | (rot << 15)
}

/// CRC32C over `type_byte || payload`.
#[must_use]
pub fn fragment_checksum(type_byte: u8, payload: &[u8]) -> u32 {
    crc32c::crc32c_append(crc32c::crc32c(&[type_byte]), payload)
}
