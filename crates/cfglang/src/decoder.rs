use crate::diagnostics::{CfgError, CfgResult};
use std::io::{self, Read};

const ACCEPT: u32 = 0;
const REJECT: u32 = 12;

// Hoehrmann's DFA: the first 256 entries map bytes to character classes, the
// remainder maps `state + class` to the next state.
#[rustfmt::skip]
static UTF8_LOOKUP: [u8; 364] = [
     0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
     0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
     0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
     0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
     0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
     0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
     0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
     0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
     1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
     9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9,
     7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7,
     7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7,
     8, 8, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
     2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
    10, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 4, 3, 3,
    11, 6, 6, 6, 5, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8,

     0,12,24,36,60,96,84,12,12,12,48,72, 12,12,12,12,12,12,12,12,12,12,12,12,
    12, 0,12,12,12,12,12, 0,12, 0,12,12, 12,24,12,12,12,12,12,24,12,24,12,12,
    12,12,12,12,12,12,12,24,12,12,12,12, 12,24,12,12,12,12,12,12,12,24,12,12,
    12,12,12,12,12,12,12,36,12,36,12,12, 12,36,12,12,12,12,12,36,12,36,12,12,
    12,36,12,12,12,12,12,12,12,12,12,12,
];

/// Streaming UTF-8 decoder: turns a byte stream into Unicode scalar values,
/// reporting malformed input with the byte offset at which it occurred.
#[derive(Debug)]
pub struct Decoder<R> {
    reader: R,
    offset: usize,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, offset: 0 }
    }

    /// The number of bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn next_byte(&mut self) -> CfgResult<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.offset += 1;
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Decode the next scalar value. Clean end of input yields `'\0'`;
    /// end of input in the middle of a sequence is an error.
    pub fn decode(&mut self) -> CfgResult<char> {
        let mut state = ACCEPT;
        let mut code_point = 0u32;
        loop {
            let byte = match self.next_byte()? {
                Some(b) => b,
                None if state == ACCEPT => return Ok('\0'),
                None => {
                    return Err(CfgError::Decoder("Incomplete UTF-8 data".to_string()));
                }
            };
            let class = u32::from(UTF8_LOOKUP[byte as usize]);
            code_point = if state == ACCEPT {
                (0xff >> class) & u32::from(byte)
            } else {
                (u32::from(byte) & 0x3f) | (code_point << 6)
            };
            state = u32::from(UTF8_LOOKUP[(256 + state + class) as usize]);
            match state {
                ACCEPT => {
                    // The DFA only accepts scalar values, so the conversion
                    // cannot fail.
                    return Ok(char::from_u32(code_point)
                        .expect("UTF-8 DFA accepted a non-scalar value"));
                }
                REJECT => {
                    return Err(CfgError::Decoder(format!(
                        "Invalid UTF-8 data: 0x{:02x} at 0x{:04x}",
                        byte,
                        self.offset - 1
                    )));
                }
                _ => {}
            }
        }
    }
}
