//! Bit packing for the adaptive tree coder.
//! Bits are packed MSB first.  Only completed bytes belong to the output,
//! a trailing partial byte is discarded when the stream is closed.

use bit_vec::BitVec;
use crate::Error;

/// Cursor over a bit buffer, used either for writing or for reading, not both.
/// A new cursor is created for every compress or expand call.
pub struct BitStream {
    bits: BitVec,
    ptr: usize
}

impl BitStream {
    /// empty stream ready to be written
    pub fn new() -> Self {
        Self {
            bits: BitVec::new(),
            ptr: 0
        }
    }
    /// stream ready to be read starting from the first bit of `dat`
    pub fn from_bytes(dat: &[u8]) -> Self {
        Self {
            bits: BitVec::from_bytes(dat),
            ptr: 0
        }
    }
    pub fn emit_bit(&mut self,bit: bool) {
        self.bits.push(bit);
    }
    /// emit 8 bits from the MSB down
    pub fn emit_byte(&mut self,val: u8) {
        for i in (0..8).rev() {
            self.bits.push((val >> i) & 1 > 0);
        }
    }
    /// number of completed bytes written so far
    pub fn byte_len(&self) -> usize {
        self.bits.len() / 8
    }
    /// true if no byte is partially filled
    pub fn is_aligned(&self) -> bool {
        self.bits.len() % 8 == 0
    }
    /// close the stream, the partially filled byte (if any) is dropped
    pub fn into_bytes(mut self) -> Vec<u8> {
        let whole = 8 * self.byte_len();
        self.bits.truncate(whole);
        self.bits.to_bytes()
    }
    /// get the next bit, fails with `EndOfStream` once all bits are consumed
    pub fn read_bit(&mut self) -> Result<bool,Error> {
        match self.bits.get(self.ptr) {
            Some(bit) => {
                self.ptr += 1;
                Ok(bit)
            },
            None => Err(Error::EndOfStream)
        }
    }
    /// get the next 8 bits as a byte, MSB first
    pub fn read_byte(&mut self) -> Result<u8,Error> {
        let mut ans: u8 = 0;
        for _i in 0..8 {
            ans <<= 1;
            ans |= self.read_bit()? as u8;
        }
        Ok(ans)
    }
    /// number of bits not yet read
    pub fn remaining(&self) -> usize {
        self.bits.len() - self.ptr
    }
}

#[test]
fn msb_first_packing() {
    let mut bits = BitStream::new();
    bits.emit_bit(true);
    bits.emit_bit(false);
    bits.emit_bit(true);
    assert!(!bits.is_aligned());
    bits.emit_byte(0xff);
    assert_eq!(bits.byte_len(),1);
    assert_eq!(bits.into_bytes(),vec![0xbf]);
}

#[test]
fn partial_byte_dropped() {
    let mut bits = BitStream::new();
    for _i in 0..7 {
        bits.emit_bit(true);
    }
    assert_eq!(bits.byte_len(),0);
    assert_eq!(bits.into_bytes(),Vec::<u8>::new());
}

#[test]
fn read_until_end() {
    let mut bits = BitStream::from_bytes(&[0x80,0x41]);
    assert_eq!(bits.read_bit(),Ok(true));
    assert_eq!(bits.read_bit(),Ok(false));
    assert_eq!(bits.remaining(),14);
    // straddles the byte boundary: 000000 01
    assert_eq!(bits.read_byte(),Ok(0x01));
    assert_eq!(bits.read_byte(),Err(Error::EndOfStream));
    assert_eq!(bits.read_bit(),Err(Error::EndOfStream));
}

#[test]
fn empty_stream() {
    let mut bits = BitStream::from_bytes(&[]);
    assert_eq!(bits.read_bit(),Err(Error::EndOfStream));
}
