//! RFC 4648 base32 codec for TOTP secrets.
//!
//! Encoding emits no `=` padding.  Decoding is case-insensitive and
//! skips characters outside the alphabet, so secrets pasted with
//! spaces or stray separators still decode.

/// The RFC 4648 base32 alphabet.
const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Encode bytes as an unpadded base32 string.
pub fn encode(bytes: &[u8]) -> String {
    let mut bits = 0u32;
    let mut value = 0u32;
    let mut output = String::with_capacity(bytes.len().div_ceil(5) * 8);

    for &byte in bytes {
        value = (value << 8) | u32::from(byte);
        bits += 8;

        while bits >= 5 {
            output.push(ALPHABET[(value >> (bits - 5)) as usize & 31] as char);
            bits -= 5;
        }
    }

    if bits > 0 {
        output.push(ALPHABET[(value << (5 - bits)) as usize & 31] as char);
    }

    output
}

/// Decode a base32 string, ignoring case, padding and foreign characters.
pub fn decode(input: &str) -> Vec<u8> {
    let mut bits = 0u32;
    let mut value = 0u32;
    let mut output = Vec::with_capacity(input.len() * 5 / 8);

    for ch in input.chars() {
        let upper = ch.to_ascii_uppercase();
        let Some(idx) = ALPHABET.iter().position(|&a| a as char == upper) else {
            continue;
        };

        value = (value << 5) | idx as u32;
        bits += 5;

        if bits >= 8 {
            output.push((value >> (bits - 8)) as u8);
            bits -= 8;
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_rfc_vectors() {
        // RFC 4648 §10 vectors, stripped of padding.
        assert_eq!(encode(b""), "");
        assert_eq!(encode(b"f"), "MY");
        assert_eq!(encode(b"fo"), "MZXQ");
        assert_eq!(encode(b"foo"), "MZXW6");
        assert_eq!(encode(b"foob"), "MZXW6YQ");
        assert_eq!(encode(b"fooba"), "MZXW6YTB");
        assert_eq!(encode(b"foobar"), "MZXW6YTBOI");
    }

    #[test]
    fn decode_rfc_vectors() {
        assert_eq!(decode("MZXW6YTBOI"), b"foobar");
        assert_eq!(decode("MZXW6"), b"foo");
    }

    #[test]
    fn decode_is_case_insensitive() {
        assert_eq!(decode("mzxw6ytboi"), b"foobar");
    }

    #[test]
    fn decode_skips_padding_and_foreign_characters() {
        assert_eq!(decode("MZXW 6YTB-OI======"), b"foobar");
    }

    #[test]
    fn roundtrip_random_lengths() {
        for len in 0..=20 {
            let bytes: Vec<u8> = (0..len as u8).map(|i| i.wrapping_mul(37)).collect();
            assert_eq!(decode(&encode(&bytes)), bytes, "length {len}");
        }
    }
}
