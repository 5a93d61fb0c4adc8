//! Segmentation of a message into tokens.
//!
//! Runs of ASCII letters become one token, as do runs of the JSON-ish punctuation
//! `= [ ] , . : " ' { }`.  Anything else is a token by itself.  No token is
//! longer than the maximum token length, and with a maximum of 1 every byte is a
//! token.

#[derive(PartialEq,Clone,Copy)]
enum CharClass {
    Letter,
    Punct,
    Other
}

fn class(c: u8) -> CharClass {
    match c {
        b'A'..=b'Z' | b'a'..=b'z' => CharClass::Letter,
        b'=' | b'[' | b']' | b',' | b'.' | b':' | b'"' | b'\'' | b'{' | b'}' => CharClass::Punct,
        _ => CharClass::Other
    }
}

/// Split `input` into tokens of at most `max_token_len` bytes.
pub fn tokenize(input: &[u8],max_token_len: usize) -> Vec<&[u8]> {
    let mut ans = Vec::new();
    let mut i = 0;
    while i < input.len() {
        let mut end = i + 1;
        let cls = class(input[i]);
        if max_token_len > 1 && cls != CharClass::Other {
            while end < input.len() && end - i < max_token_len && class(input[end]) == cls {
                end += 1;
            }
        }
        ans.push(&input[i..end]);
        i = end;
    }
    ans
}

#[test]
fn json_message() {
    let toks = tokenize(b"{\"name\":\"Sam\",\"n\":12}",10);
    let expected: [&[u8];10] = [b"{\"",b"name",b"\":\"",b"Sam",b"\",\"",b"n",b"\":",b"1",b"2",b"}"];
    assert_eq!(toks,expected);
}

#[test]
fn runs_are_capped() {
    let toks = tokenize(b"abcdefg..",3);
    let expected: [&[u8];4] = [b"abc",b"def",b"g",b".."];
    assert_eq!(toks,expected);
}

#[test]
fn one_byte_tokens() {
    let toks = tokenize(b"ab{}",1);
    let expected: [&[u8];4] = [b"a",b"b",b"{",b"}"];
    assert_eq!(toks,expected);
}

#[test]
fn others_never_group() {
    let toks = tokenize(b"  99\xe9\xe9",10);
    assert_eq!(toks.len(),6);
    assert!(tokenize(b"",10).is_empty());
}
