pub use ed::*;

use std::io::{Read, Write};

// Denoms are stored as NUL-terminated UTF-8 rather than length-prefixed, so
// that encoded denom keys sort the same way as the denoms themselves.

/// Writes `value` followed by a NUL byte.
pub fn encode_str<W: Write>(value: &str, dest: &mut W) -> ed::Result<()> {
    if value.as_bytes().contains(&0) {
        return Err(ed::Error::UnexpectedByte(0));
    }
    dest.write_all(value.as_bytes())?;
    dest.write_all(&[0])?;
    Ok(())
}

pub fn str_encoding_length(value: &str) -> usize {
    value.len() + 1
}

/// Reads a string written by [`encode_str`], consuming its terminator.
pub fn decode_str<R: Read>(mut input: R) -> ed::Result<String> {
    let mut bytes = vec![];
    let mut byte = [0; 1];
    loop {
        input.read_exact(&mut byte[..])?;
        if byte[0] == 0 {
            break;
        }
        bytes.push(byte[0]);
    }
    String::from_utf8(bytes).map_err(|err| {
        let index = err.utf8_error().valid_up_to();
        ed::Error::UnexpectedByte(err.as_bytes()[index])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: &str) -> Vec<u8> {
        let mut bytes = vec![];
        encode_str(value, &mut bytes).unwrap();
        bytes
    }

    #[test]
    fn int_keys_are_big_endian() {
        let bytes = 0x1234567890u64.encode().unwrap();
        assert_eq!(bytes.as_slice(), &[0, 0, 0, 0x12, 0x34, 0x56, 0x78, 0x90]);
        assert!(100i64.encode().unwrap() < 3_800i64.encode().unwrap());
    }

    #[test]
    fn str_keys_sort_lexicographically() {
        let a = encoded("uatom");
        let b = encoded("uatomx");
        let c = encoded("ubtc");
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.len(), str_encoding_length("uatom"));

        let mut input = b.as_slice();
        assert_eq!(decode_str(&mut input).unwrap(), "uatomx");
        assert!(input.is_empty());
    }

    #[test]
    fn invalid_strs_fail() {
        let mut bytes = vec![];
        assert!(encode_str("a\0b", &mut bytes).is_err());
        assert!(decode_str(&b"uatom"[..]).is_err());
        assert!(decode_str(&[0xff, 0][..]).is_err());
    }
}
