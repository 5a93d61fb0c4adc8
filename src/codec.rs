//! Compress and expand streams of short messages
//!
//! A `Codec` owns one adaptive tree.  Every call to `compress` produces a
//! self-contained buffer, but the tree carries over to the next call, so the
//! companion `Codec` on the other side must see the buffers in the same order.
//!
//! * The first occurrence of a token is sent as the NYT code followed by a literal,
//!   later occurrences are sent as the token's current code.
//! * A buffer ends on a byte boundary.  If the last token leaves a partial byte,
//!   the NYT code (and if needed a zero byte) is appended, and the partial byte
//!   left after that is dropped.  The decoder stops when it runs out of bits, which
//!   always happens inside this terminator.
//! * Errors are not rolled back.  Tokens processed before an error have already
//!   updated the tree, so the two sides may disagree from then on.

use crate::{Error,Options,STD_OPTIONS};
use crate::tokenizer::tokenize;
use crate::tools::adaptive_tree::{AdaptiveTree,TreeSnapshot};
use crate::tools::bit_stream::BitStream;
use crate::tools::literal::LiteralFrame;

/// Adaptive compressor and expander for one logical stream.
/// Use one instance for compressing and another for expanding.
pub struct Codec {
    frame: LiteralFrame,
    tree: AdaptiveTree
}

impl Codec {
    /// Create a codec with the standard node table.
    /// `max_token_len` must be in 1..=16, 10 is the usual choice.
    pub fn new(max_token_len: usize) -> Result<Self,Error> {
        Self::with_options(&Options {
            max_token_len,
            ..STD_OPTIONS
        })
    }
    pub fn with_options(opt: &Options) -> Result<Self,Error> {
        let frame = LiteralFrame::create(opt.max_token_len)?;
        log::debug!("literal length prefix is {} bits",frame.prefix_bits());
        Ok(Self {
            frame,
            tree: AdaptiveTree::create(opt.max_nodes)
        })
    }
    /// With `full` the model is discarded and the codec behaves as if new.
    /// Otherwise only the stream state is reset; since every call starts a fresh
    /// stream anyway, this leaves the codec unchanged.
    pub fn reset(&mut self,full: bool) {
        if full {
            log::debug!("discard model with {} symbols",self.tree.symbol_count());
            self.tree.reset();
        }
    }
    pub fn max_token_len(&self) -> usize {
        self.frame.max_len()
    }
    /// number of distinct tokens the model knows
    pub fn symbol_count(&self) -> usize {
        self.tree.symbol_count()
    }
    /// true if the node table is full, new tokens are then never learned
    pub fn is_saturated(&self) -> bool {
        self.tree.is_saturated()
    }
    /// number of new tokens that could not be added to the full node table
    pub fn dropped_inserts(&self) -> usize {
        self.tree.dropped()
    }
    /// copy of the model, two codecs that saw the same tokens have equal snapshots
    pub fn snapshot(&self) -> TreeSnapshot {
        self.tree.snapshot()
    }
    /// Encode a sequence of tokens.  Every token is checked before the model is touched.
    pub fn encode_tokens<T: AsRef<[u8]>>(&mut self,tokens: &[T]) -> Result<Vec<u8>,Error> {
        for tok in tokens {
            self.frame.check(tok.as_ref())?;
        }
        let mut bits = BitStream::new();
        for tok in tokens {
            let tok = tok.as_ref();
            match self.tree.lookup(tok) {
                Some(slot) => {
                    log::trace!("code for slot {}",slot);
                    self.tree.emit_path(slot,&mut bits);
                    self.tree.rebalance(slot);
                },
                None => {
                    log::trace!("literal {:?}",tok);
                    self.tree.emit_path(self.tree.nyt(),&mut bits);
                    self.frame.emit(tok,&mut bits)?;
                    self.tree.insert(tok);
                }
            }
        }
        if !bits.is_aligned() {
            let old_len = bits.byte_len();
            self.tree.emit_path(self.tree.nyt(),&mut bits);
            if bits.byte_len() == old_len {
                bits.emit_byte(0);
            }
        }
        let ans = bits.into_bytes();
        log::debug!("encoded {} tokens into {} bytes",tokens.len(),ans.len());
        Ok(ans)
    }
    /// Decode one token, updating the model.
    fn decode_one(&mut self,bits: &mut BitStream) -> Result<Vec<u8>,Error> {
        let slot = self.tree.read_path(bits)?;
        if let Some(symbol) = self.tree.symbol(slot) {
            let ans = symbol.to_vec();
            self.tree.rebalance(slot);
            return Ok(ans);
        }
        let ans = self.frame.read(bits)?;
        if self.tree.lookup(&ans).is_some() {
            log::error!("literal {:?} is already in the tree",ans);
            return Err(Error::DuplicateLiteral);
        }
        self.tree.insert(&ans);
        Ok(ans)
    }
    /// Decode tokens until the bits run out.
    /// A truncated buffer cannot be detected, it decodes to a shorter token list.
    pub fn decode_tokens(&mut self,dat: &[u8]) -> Result<Vec<Vec<u8>>,Error> {
        let mut ans = Vec::new();
        let mut bits = BitStream::from_bytes(dat);
        loop {
            let tail = bits.remaining();
            match self.decode_one(&mut bits) {
                Ok(tok) => ans.push(tok),
                Err(Error::EndOfStream) => {
                    if tail > 0 {
                        log::debug!("end of stream, {} trailing bits discarded",tail);
                    }
                    break;
                },
                Err(e) => return Err(e)
            }
        }
        log::debug!("decoded {} tokens from {} bytes",ans.len(),dat.len());
        Ok(ans)
    }
    /// Compress a byte string, splitting it into tokens first.
    pub fn compress_bytes(&mut self,dat: &[u8]) -> Result<Vec<u8>,Error> {
        let tokens = tokenize(dat,self.max_token_len());
        self.encode_tokens(&tokens)
    }
    pub fn decompress_bytes(&mut self,dat: &[u8]) -> Result<Vec<u8>,Error> {
        Ok(self.decode_tokens(dat)?.concat())
    }
    /// Compress a string whose characters are all in U+0000..=U+00FF,
    /// each character is coded as one byte.
    pub fn compress(&mut self,msg: &str) -> Result<Vec<u8>,Error> {
        let mut dat = Vec::with_capacity(msg.len());
        for c in msg.chars() {
            match u8::try_from(c) {
                Ok(b) => dat.push(b),
                Err(_) => return Err(Error::UnrepresentableChar(c))
            }
        }
        self.compress_bytes(&dat)
    }
    /// Inverse of `compress`, each byte becomes the character with the same code point.
    pub fn decompress(&mut self,dat: &[u8]) -> Result<String,Error> {
        Ok(self.decompress_bytes(dat)?.into_iter().map(char::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_of(s: &str) -> Vec<u8> {
        hex::decode(s.replace(" ","")).unwrap()
    }

    #[test]
    fn repeated_letters() {
        let mut enc = Codec::new(10).unwrap();
        let mut dec = Codec::new(10).unwrap();
        let first = enc.compress("aaaa").expect("compression failed");
        assert_eq!(first,hex_of("36 16 16 16 10"));
        assert_eq!(dec.decompress(&first).expect("expansion failed"),"aaaa");
        let second = enc.compress("aaaa").expect("compression failed");
        assert_eq!(second,hex_of("80"));
        assert_eq!(dec.decompress(&second).expect("expansion failed"),"aaaa");
    }

    #[test]
    fn json_is_learned() {
        let msg = "{\"a\":1}";
        let mut enc = Codec::new(10).unwrap();
        let mut dec = Codec::new(10).unwrap();
        let first = enc.compress(msg).expect("compression failed");
        assert_eq!(first,hex_of("17 b2 20 30 82 44 75 00 c4 03 ee"));
        assert_eq!(dec.decompress(&first).expect("expansion failed"),msg);
        let second = enc.compress(msg).expect("compression failed");
        assert_eq!(second,hex_of("83 ee"));
        assert!(second.len() <= first.len());
        assert_eq!(dec.decompress(&second).expect("expansion failed"),msg);
        assert_eq!(enc.snapshot(),dec.snapshot());
    }

    #[test]
    fn empty_message() {
        let mut enc = Codec::new(10).unwrap();
        let mut dec = Codec::new(10).unwrap();
        let packed = enc.compress("").expect("compression failed");
        assert!(packed.is_empty());
        assert_eq!(dec.decompress(&packed).expect("expansion failed"),"");
        assert_eq!(enc.symbol_count(),0);
    }

    #[test]
    fn message_stream() {
        let msgs = [
            "{\"id\":1,\"ok\":true}",
            "{\"id\":2,\"ok\":false}",
            "{\"id\":3,\"ok\":true}"
        ];
        let expected = [
            "17b220b4b202447500c40961160b7b5b06e8e4eaca00fb",
            "d1e0197710466616c73659",
            "d4f00cc823b4"
        ];
        let mut enc = Codec::new(10).unwrap();
        let mut dec = Codec::new(10).unwrap();
        for (msg,hex_str) in msgs.iter().zip(expected) {
            let packed = enc.compress(msg).expect("compression failed");
            assert_eq!(packed,hex_of(hex_str));
            assert_eq!(dec.decompress(&packed).expect("expansion failed"),*msg);
            assert_eq!(enc.snapshot(),dec.snapshot());
            assert!(enc.snapshot().is_sibling_ordered());
        }
    }

    #[test]
    fn one_byte_tokens() {
        let mut enc = Codec::new(1).unwrap();
        let mut dec = Codec::new(1).unwrap();
        let first = enc.compress("hello hello").expect("compression failed");
        assert_eq!(first,hex_of("68 32 8d 96 37 e1 07 3e c0"));
        let second = enc.compress("hello hello").expect("compression failed");
        assert_eq!(second,hex_of("4f b2 9f 60"));
        assert_eq!(dec.decompress(&first).expect("expansion failed"),"hello hello");
        assert_eq!(dec.decompress(&second).expect("expansion failed"),"hello hello");
    }

    #[test]
    fn explicit_tokens() {
        let mut enc = Codec::new(4).unwrap();
        let mut dec = Codec::new(4).unwrap();
        let toks: [&[u8];4] = [b"ab",b"c",b"ab",b"ab"];
        let packed = enc.encode_tokens(&toks).expect("compression failed");
        assert_eq!(packed,hex_of("58 58 83 1e"));
        assert_eq!(dec.decode_tokens(&packed).expect("expansion failed"),toks);
    }

    #[test]
    fn bad_tokens_leave_model_alone() {
        let mut enc = Codec::new(4).unwrap();
        enc.compress("abc").expect("compression failed");
        let before = enc.snapshot();
        let toks: [&[u8];2] = [b"ab",b"abcde"];
        assert_eq!(enc.encode_tokens(&toks),Err(Error::TokenTooLong { len: 5, max: 4 }));
        let toks: [&[u8];2] = [b"ab",b""];
        assert_eq!(enc.encode_tokens(&toks),Err(Error::EmptyToken));
        assert_eq!(enc.snapshot(),before);
    }

    #[test]
    fn latin1_only() {
        let mut enc = Codec::new(10).unwrap();
        let mut dec = Codec::new(10).unwrap();
        let packed = enc.compress("caf\u{e9}").expect("compression failed");
        assert_eq!(packed,hex_of("26 36 16 60 74 80"));
        assert_eq!(dec.decompress(&packed).expect("expansion failed"),"caf\u{e9}");
        assert_eq!(enc.compress("5\u{20ac}"),Err(Error::UnrepresentableChar('\u{20ac}')));
    }

    #[test]
    fn token_length_range() {
        assert!(Codec::new(0).is_err());
        assert!(Codec::new(17).is_err());
        assert_eq!(Codec::new(16).unwrap().max_token_len(),16);
    }

    #[test]
    fn long_literal_is_rejected() {
        // prefix 11 asks for 4 bytes, but the maximum is 3
        let mut dec = Codec::new(3).unwrap();
        assert_eq!(dec.decompress_bytes(&[0xc0,0,0,0,0]),Err(Error::TokenTooLong { len: 4, max: 3 }));
    }

    #[test]
    fn duplicate_literal_is_rejected() {
        // literal 'a', then NYT code 0 followed by literal 'a' again
        let mut dec = Codec::new(1).unwrap();
        assert_eq!(dec.decompress_bytes(&[0x61,0x30,0x80]),Err(Error::DuplicateLiteral));
        // the first token was already learned
        assert_eq!(dec.symbol_count(),1);
    }

    #[test]
    fn truncation_goes_unnoticed() {
        let mut enc = Codec::new(10).unwrap();
        let packed = enc.compress("hello world").expect("compression failed");
        assert_eq!(packed,hex_of("46 86 56 c6 c6 f0 10 08 ee de e4 d8 c9"));
        let mut dec = Codec::new(10).unwrap();
        let short = dec.decompress(&packed[0..packed.len()-1]).expect("expansion failed");
        assert_eq!(short,"hello ");
    }

    #[test]
    fn reset_keeps_or_discards_model() {
        let mut enc = Codec::new(10).unwrap();
        let fresh = enc.compress("aaaa").expect("compression failed");
        enc.reset(false);
        enc.reset(false);
        let learned = enc.compress("aaaa").expect("compression failed");
        assert!(learned.len() <= fresh.len());
        enc.reset(true);
        assert_eq!(enc.symbol_count(),0);
        assert_eq!(enc.compress("aaaa").expect("compression failed"),fresh);
    }

    #[test]
    fn saturated_table_still_codes() {
        let opt = Options { max_token_len: 4, max_nodes: 6 };
        let mut enc = Codec::with_options(&opt).unwrap();
        let mut dec = Codec::with_options(&opt).unwrap();
        let msg = "a b c d e d a";
        let packed = enc.compress(msg).expect("compression failed");
        assert!(enc.is_saturated());
        assert_eq!(enc.symbol_count(),3);
        assert_eq!(dec.decompress(&packed).expect("expansion failed"),msg);
        assert_eq!(enc.dropped_inserts(),dec.dropped_inserts());
        assert_eq!(enc.snapshot(),dec.snapshot());
    }

    #[test]
    fn distinct_token_limit() {
        let mut enc = Codec::new(4).unwrap();
        let mut dec = Codec::new(4).unwrap();
        let toks: Vec<Vec<u8>> = (0..1030u32).map(|i| i.to_be_bytes().to_vec()).collect();
        let packed = enc.encode_tokens(&toks).expect("compression failed");
        assert_eq!(enc.symbol_count(),1023);
        assert_eq!(enc.dropped_inserts(),7);
        assert!(enc.snapshot().is_sibling_ordered());
        assert_eq!(dec.decode_tokens(&packed).expect("expansion failed"),toks);
        assert_eq!(enc.snapshot(),dec.snapshot());
        // tokens past the limit are sent as literals every time
        let again = enc.encode_tokens(&toks[1025..]).expect("compression failed");
        assert_eq!(dec.decode_tokens(&again).expect("expansion failed"),toks[1025..].to_vec());
        assert_eq!(enc.dropped_inserts(),12);
    }
}
