//! Literal framing for symbols sent through the NYT leaf.
//!
//! A literal is `len-1` in a short fixed-width field followed by the raw bytes.
//! The field uses the bits of value 8,4,2,1, but a bit is only present if the
//! maximum token length exceeds its value.  So the prefix is 4 bits for a maximum
//! of 9 through 16, and disappears entirely for a maximum of 1.

use crate::Error;
use super::bit_stream::BitStream;

/// place values of the length field, MSB first
const LEN_BITS: [usize;4] = [8,4,2,1];
/// the field cannot express more than this
pub const MAX_TOKEN_LEN: usize = 16;

pub struct LiteralFrame {
    max_len: usize
}

impl LiteralFrame {
    pub fn create(max_len: usize) -> Result<Self,Error> {
        if max_len < 1 || max_len > MAX_TOKEN_LEN {
            return Err(Error::InvalidTokenLength(max_len));
        }
        Ok(Self { max_len })
    }
    pub fn max_len(&self) -> usize {
        self.max_len
    }
    /// width of the length field in bits
    pub fn prefix_bits(&self) -> usize {
        LEN_BITS.iter().filter(|&&v| self.max_len > v).count()
    }
    /// make sure `token` can be framed
    pub fn check(&self,token: &[u8]) -> Result<(),Error> {
        match token.len() {
            0 => Err(Error::EmptyToken),
            len if len > self.max_len => Err(Error::TokenTooLong { len, max: self.max_len }),
            _ => Ok(())
        }
    }
    pub fn emit(&self,token: &[u8],bits: &mut BitStream) -> Result<(),Error> {
        self.check(token)?;
        let ll = token.len() - 1;
        for v in LEN_BITS {
            if self.max_len > v {
                bits.emit_bit(ll & v > 0);
            }
        }
        for c in token {
            bits.emit_byte(*c);
        }
        Ok(())
    }
    /// Read a literal.  A length beyond the maximum is an error, raised before
    /// any bytes are read.
    pub fn read(&self,bits: &mut BitStream) -> Result<Vec<u8>,Error> {
        let mut len = 1;
        for v in LEN_BITS {
            if self.max_len > v && bits.read_bit()? {
                len += v;
            }
        }
        if len > self.max_len {
            log::error!("literal of length {} in stream with maximum {}",len,self.max_len);
            return Err(Error::TokenTooLong { len, max: self.max_len });
        }
        let mut ans = Vec::with_capacity(len);
        for _i in 0..len {
            ans.push(bits.read_byte()?);
        }
        Ok(ans)
    }
}

#[test]
fn prefix_width() {
    let widths: Vec<usize> = (1..=16).map(|n| LiteralFrame::create(n).unwrap().prefix_bits()).collect();
    assert_eq!(widths,vec![0,1,2,2,3,3,3,3,4,4,4,4,4,4,4,4]);
    assert_eq!(LiteralFrame::create(0).err(),Some(Error::InvalidTokenLength(0)));
    assert_eq!(LiteralFrame::create(17).err(),Some(Error::InvalidTokenLength(17)));
}

#[test]
fn framing_layout() {
    let frame = LiteralFrame::create(10).unwrap();
    let mut bits = BitStream::new();
    frame.emit(b"ab",&mut bits).unwrap();
    // 0001 then 'a' then 'b', last 4 bits are in the partial byte
    bits.emit_bit(false);
    bits.emit_bit(false);
    bits.emit_bit(false);
    bits.emit_bit(false);
    assert_eq!(bits.into_bytes(),hex::decode("161620").unwrap());
}

#[test]
fn single_byte_tokens_have_no_prefix() {
    let frame = LiteralFrame::create(1).unwrap();
    let mut bits = BitStream::new();
    frame.emit(b"{",&mut bits).unwrap();
    assert_eq!(bits.into_bytes(),b"{".to_vec());
    assert_eq!(frame.emit(b"{}",&mut BitStream::new()),Err(Error::TokenTooLong { len: 2, max: 1 }));
}

#[test]
fn read_rejects_long_literal() {
    let frame = LiteralFrame::create(3).unwrap();
    // prefix 11 means length 4
    let mut bits = BitStream::from_bytes(&[0xc0,0x00,0x00,0x00,0x00]);
    assert_eq!(frame.read(&mut bits),Err(Error::TokenTooLong { len: 4, max: 3 }));
}

#[test]
fn read_literal() {
    let frame = LiteralFrame::create(4).unwrap();
    // prefix 01, then 'h' 'i'
    let mut bits = BitStream::new();
    bits.emit_bit(false);
    bits.emit_bit(true);
    bits.emit_byte(b'h');
    bits.emit_byte(b'i');
    bits.emit_byte(0);
    let mut inp = BitStream::from_bytes(&bits.into_bytes());
    assert_eq!(frame.read(&mut inp),Ok(b"hi".to_vec()));
    assert!(frame.check(b"").is_err());
}
