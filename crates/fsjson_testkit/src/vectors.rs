//! Known-answer vectors for the log format.
//!
//! The byte strings here were produced independently of this crate, so a
//! reader or writer that drifts from the on-disk format fails them even
//! when it still round-trips with itself.

use fsjson_core::BLOCK_SIZE;

/// A log stream and the records a reader must produce from it.
#[derive(Debug, Clone)]
pub struct LogVector {
    /// Unique identifier for this vector.
    pub id: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Raw log bytes.
    pub input: Vec<u8>,
    /// Records expected with checksum verification enabled.
    pub expected_records: Vec<Vec<u8>>,
    /// Reader position after end of stream.
    pub expected_offset: u64,
}

/// A fragment checksum and its masked on-disk form.
#[derive(Debug, Clone, Copy)]
pub struct ChecksumVector {
    /// Fragment type byte.
    pub type_byte: u8,
    /// Fragment payload.
    pub payload: &'static [u8],
    /// CRC32C over the type byte and payload.
    pub crc: u32,
    /// The crc after masking.
    pub masked: u32,
}

/// `FULL "hello"`.
pub const FULL_HELLO: &str = "0bb9575805000168656c6c6f";
/// `FIRST "A"`.
pub const FIRST_A: &str = "41b5895501000241";
/// `MIDDLE "B"`.
pub const MIDDLE_B: &str = "65b6830601000342";
/// `LAST "C"`.
pub const LAST_C: &str = "59c6109301000443";
/// `FULL ""`.
pub const FULL_EMPTY: &str = "052b2843000001";
/// Header of a `FULL` fragment holding 32756 `'x'` bytes.
pub const FULL_LONG_HEADER: &str = "ca04658df47f01";

/// Decodes a lowercase hex string.
///
/// # Panics
///
/// Panics on odd length or non-hex characters.
pub fn hex(s: &str) -> Vec<u8> {
    assert!(s.len() % 2 == 0, "odd hex length");
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).expect("invalid hex"))
        .collect()
}

fn concat(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

/// Checksum vectors, including the standard CRC32C check value.
pub fn checksum_vectors() -> Vec<ChecksumVector> {
    vec![
        ChecksumVector {
            type_byte: 1,
            payload: b"hello",
            crc: 0x6719_daea,
            masked: 0x5857_b90b,
        },
        ChecksumVector {
            type_byte: 0,
            payload: b"",
            crc: 0x527d_5351,
            masked: 0x4925_8fd2,
        },
        ChecksumVector {
            type_byte: 4,
            payload: b"C",
            crc: 0xedc0_f846,
            masked: 0x9310_c659,
        },
    ]
}

/// Log stream vectors.
pub fn log_vectors() -> Vec<LogVector> {
    let hello = hex(FULL_HELLO);
    let zero_block = vec![0u8; BLOCK_SIZE];

    let mut bad_crc = hello.clone();
    bad_crc[0] ^= 0x01;

    // FULL of 32756 'x' bytes, ending 5 bytes short of the block boundary.
    let long_payload = vec![b'x'; BLOCK_SIZE - 12];
    let long_full = concat(&[&hex(FULL_LONG_HEADER), &long_payload]);

    vec![
        LogVector {
            id: "empty",
            description: "an empty stream holds no records",
            input: Vec::new(),
            expected_records: vec![],
            expected_offset: 0,
        },
        LogVector {
            id: "full_hello",
            description: "a single FULL fragment",
            input: hello.clone(),
            expected_records: vec![b"hello".to_vec()],
            expected_offset: 12,
        },
        LogVector {
            id: "full_empty",
            description: "a FULL fragment with no payload is an empty record",
            input: hex(FULL_EMPTY),
            expected_records: vec![Vec::new()],
            expected_offset: 7,
        },
        LogVector {
            id: "first_middle_last",
            description: "three fragments reassemble into one record",
            input: concat(&[&hex(FIRST_A), &hex(MIDDLE_B), &hex(LAST_C)]),
            expected_records: vec![b"ABC".to_vec()],
            expected_offset: 24,
        },
        LogVector {
            id: "padded_block_then_hello",
            description: "a zeroed block is skipped as padding",
            input: concat(&[&zero_block, &hello]),
            expected_records: vec![b"hello".to_vec()],
            expected_offset: (BLOCK_SIZE + 12) as u64,
        },
        LogVector {
            id: "block_trailer",
            description: "fewer than seven bytes before the boundary are skipped",
            input: concat(&[&long_full, &[0u8; 5], &hello]),
            expected_records: vec![long_payload.clone(), b"hello".to_vec()],
            expected_offset: (BLOCK_SIZE + 12) as u64,
        },
        LogVector {
            id: "bad_checksum",
            description: "a damaged checksum drops the fragment",
            input: bad_crc.clone(),
            expected_records: vec![],
            expected_offset: 12,
        },
        LogVector {
            id: "bad_checksum_then_next_block",
            description: "reading resumes at the next block after a checksum failure",
            input: concat(&[&bad_crc, &vec![0u8; BLOCK_SIZE - 12], &hello]),
            expected_records: vec![b"hello".to_vec()],
            expected_offset: (BLOCK_SIZE + 12) as u64,
        },
        LogVector {
            id: "truncated_fragment",
            description: "a fragment cut short by end of input is not a record",
            input: hello[..9].to_vec(),
            expected_records: vec![],
            expected_offset: 9,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{read_all, read_verified};
    use fsjson_core::{fragment_checksum, mask, unmask, FragmentType, LogWriter, ReaderConfig};

    #[test]
    fn checksum_known_answers() {
        for v in checksum_vectors() {
            assert_eq!(fragment_checksum(v.type_byte, v.payload), v.crc);
            assert_eq!(mask(v.crc), v.masked);
            assert_eq!(unmask(v.masked), v.crc);
        }
    }

    #[test]
    fn crc32c_check_value() {
        // CRC32C("123456789") with the type byte folded into the payload
        assert_eq!(fragment_checksum(b'1', b"23456789"), 0xe306_9283);
    }

    #[test]
    fn reader_matches_vectors() {
        for v in log_vectors() {
            let result = read_verified(v.input.clone());
            assert_eq!(result.records, v.expected_records, "vector {}", v.id);
            assert_eq!(result.end_offset, v.expected_offset, "vector {}", v.id);
        }
    }

    #[test]
    fn unverified_reader_accepts_bad_checksum() {
        let v = log_vectors()
            .into_iter()
            .find(|v| v.id == "bad_checksum")
            .unwrap();
        let result = read_all(v.input, ReaderConfig::new().verify_checksums(false));
        assert_eq!(result.records, vec![b"hello".to_vec()]);
    }

    #[test]
    fn writer_reproduces_vectors() {
        let mut writer = LogWriter::new(Vec::new());
        writer.add_record(b"hello").unwrap();
        assert_eq!(writer.into_inner(), hex(FULL_HELLO));

        let mut writer = LogWriter::new(Vec::new());
        writer.write_fragment(FragmentType::First, b"A").unwrap();
        writer.write_fragment(FragmentType::Middle, b"B").unwrap();
        writer.write_fragment(FragmentType::Last, b"C").unwrap();
        assert_eq!(
            writer.into_inner(),
            concat(&[&hex(FIRST_A), &hex(MIDDLE_B), &hex(LAST_C)])
        );
    }

    #[test]
    fn hex_decodes() {
        assert_eq!(hex("00ff10"), vec![0x00, 0xff, 0x10]);
        assert!(hex("").is_empty());
    }
}
