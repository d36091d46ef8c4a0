//! LEB128 variable-length integers.
//!
//! Unsigned (ULEB128) for lengths, indices, and `nat`; signed (SLEB128) for
//! type-table opcodes and `int`. Unbounded variants operate on bigints so
//! `nat`/`int` values of any magnitude round-trip.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{ToPrimitive, Zero};

use crate::cursor::Cursor;
use crate::error::CodecError;

pub fn write_uleb(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

pub fn write_sleb(out: &mut Vec<u8>, mut value: i64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let sign_clear = byte & 0x40 == 0;
        if (value == 0 && sign_clear) || (value == -1 && !sign_clear) {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

pub fn write_uleb_big(out: &mut Vec<u8>, value: &BigUint) {
    let mut value = value.clone();
    let mask = BigUint::from(0x7fu8);
    loop {
        let byte = (&value & &mask).to_u8().unwrap_or(0);
        value >>= 7;
        if value.is_zero() {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

pub fn write_sleb_big(out: &mut Vec<u8>, value: &BigInt) {
    let mut value = value.clone();
    let mask = BigInt::from(0x7f);
    loop {
        let byte = (&value & &mask).to_u8().unwrap_or(0);
        value >>= 7; // arithmetic shift, keeps the sign
        let sign_clear = byte & 0x40 == 0;
        let done = match value.sign() {
            Sign::NoSign => sign_clear,
            Sign::Minus => value == BigInt::from(-1) && !sign_clear,
            Sign::Plus => false,
        };
        if done {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

pub fn read_uleb(cursor: &mut Cursor<'_>, context: &'static str) -> Result<u64, CodecError> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = cursor.byte(context)?;
        if shift >= 64 || (shift == 63 && byte & 0x7e != 0) {
            return Err(CodecError::IntOutOfRange("u64"));
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

pub fn read_sleb(cursor: &mut Cursor<'_>, context: &'static str) -> Result<i64, CodecError> {
    let mut value: i64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = cursor.byte(context)?;
        if shift >= 64 {
            return Err(CodecError::IntOutOfRange("i64"));
        }
        value |= i64::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            if shift < 64 && byte & 0x40 != 0 {
                value |= -1i64 << shift;
            }
            return Ok(value);
        }
    }
}

pub fn read_uleb_big(cursor: &mut Cursor<'_>, context: &'static str) -> Result<BigUint, CodecError> {
    let mut value = BigUint::zero();
    let mut shift = 0u64;
    loop {
        let byte = cursor.byte(context)?;
        value |= BigUint::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

pub fn read_sleb_big(cursor: &mut Cursor<'_>, context: &'static str) -> Result<BigInt, CodecError> {
    let mut value = BigInt::zero();
    let mut shift = 0u64;
    loop {
        let byte = cursor.byte(context)?;
        value |= BigInt::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            if byte & 0x40 != 0 {
                value -= BigInt::from(1) << shift;
            }
            return Ok(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uleb(value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        write_uleb(&mut out, value);
        out
    }

    fn sleb(value: i64) -> Vec<u8> {
        let mut out = Vec::new();
        write_sleb(&mut out, value);
        out
    }

    #[test]
    fn uleb_known_vectors() {
        assert_eq!(uleb(0), [0x00]);
        assert_eq!(uleb(1), [0x01]);
        assert_eq!(uleb(127), [0x7f]);
        assert_eq!(uleb(128), [0x80, 0x01]);
        assert_eq!(uleb(300), [0xac, 0x02]);
        assert_eq!(uleb(624485), [0xe5, 0x8e, 0x26]);
    }

    #[test]
    fn sleb_known_vectors() {
        assert_eq!(sleb(0), [0x00]);
        assert_eq!(sleb(-1), [0x7f]);
        assert_eq!(sleb(63), [0x3f]);
        assert_eq!(sleb(64), [0xc0, 0x00]);
        assert_eq!(sleb(-64), [0x40]);
        assert_eq!(sleb(-65), [0xbf, 0x7f]);
        assert_eq!(sleb(-123456), [0xc0, 0xbb, 0x78]);
        // type-table opcodes are small negatives
        assert_eq!(sleb(-20), [0x6c]);
        assert_eq!(sleb(-24), [0x68]);
    }

    #[test]
    fn uleb_round_trips_u64_extremes() {
        for value in [0u64, 1, 127, 128, u32::MAX as u64, u64::MAX] {
            let bytes = uleb(value);
            let mut cursor = Cursor::new(&bytes);
            assert_eq!(read_uleb(&mut cursor, "test").unwrap(), value);
        }
    }

    #[test]
    fn sleb_round_trips_i64_extremes() {
        for value in [0i64, -1, 1, i32::MIN as i64, i64::MIN, i64::MAX] {
            let bytes = sleb(value);
            let mut cursor = Cursor::new(&bytes);
            assert_eq!(read_sleb(&mut cursor, "test").unwrap(), value);
        }
    }

    #[test]
    fn big_variants_round_trip_beyond_64_bits() {
        let huge = BigUint::from(u64::MAX) * BigUint::from(u64::MAX);
        let mut out = Vec::new();
        write_uleb_big(&mut out, &huge);
        let mut cursor = Cursor::new(&out);
        assert_eq!(read_uleb_big(&mut cursor, "test").unwrap(), huge);

        let negative = -BigInt::from(u64::MAX) * BigInt::from(3);
        let mut out = Vec::new();
        write_sleb_big(&mut out, &negative);
        let mut cursor = Cursor::new(&out);
        assert_eq!(read_sleb_big(&mut cursor, "test").unwrap(), negative);
    }

    #[test]
    fn big_and_small_encodings_agree() {
        for value in [0u64, 5, 127, 128, 300, 1_000_000] {
            let mut small = Vec::new();
            write_uleb(&mut small, value);
            let mut big = Vec::new();
            write_uleb_big(&mut big, &BigUint::from(value));
            assert_eq!(small, big);
        }
        for value in [0i64, -1, -64, -65, 42, -1_000_000] {
            let mut small = Vec::new();
            write_sleb(&mut small, value);
            let mut big = Vec::new();
            write_sleb_big(&mut big, &BigInt::from(value));
            assert_eq!(small, big);
        }
    }

    #[test]
    fn truncated_read_fails() {
        let mut cursor = Cursor::new(&[0x80]);
        assert!(matches!(
            read_uleb(&mut cursor, "length"),
            Err(CodecError::TruncatedBuffer { .. })
        ));
    }
}
