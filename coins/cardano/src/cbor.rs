//! Minimal CBOR writer for ledger structures.
//!
//! Only the major types Cardano transactions use are covered, always in their
//! shortest (canonical) head form.

const MAJOR_UINT: u8 = 0;
const MAJOR_BYTES: u8 = 2;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;

const SIMPLE_FALSE: u8 = 0xf4;
const SIMPLE_TRUE: u8 = 0xf5;
const SIMPLE_NULL: u8 = 0xf6;

#[derive(Debug, Default, Clone)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    fn type_len(&mut self, major: u8, len: u64) -> &mut Self {
        let major = major << 5;
        if len < 24 {
            self.buf.push(major | len as u8);
        } else if len <= 0xff {
            self.buf.push(major | 24);
            self.buf.push(len as u8);
        } else if len <= 0xffff {
            self.buf.push(major | 25);
            self.buf.extend_from_slice(&(len as u16).to_be_bytes());
        } else if len <= 0xffff_ffff {
            self.buf.push(major | 26);
            self.buf.extend_from_slice(&(len as u32).to_be_bytes());
        } else {
            self.buf.push(major | 27);
            self.buf.extend_from_slice(&len.to_be_bytes());
        }
        self
    }

    pub fn uint(&mut self, value: u64) -> &mut Self {
        self.type_len(MAJOR_UINT, value)
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.type_len(MAJOR_BYTES, bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Definite-length array header; the caller writes `len` items next
    pub fn array(&mut self, len: usize) -> &mut Self {
        self.type_len(MAJOR_ARRAY, len as u64)
    }

    /// Definite-length map header; the caller writes `len` key/value pairs next
    pub fn map(&mut self, len: usize) -> &mut Self {
        self.type_len(MAJOR_MAP, len as u64)
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.buf.push(if value { SIMPLE_TRUE } else { SIMPLE_FALSE });
        self
    }

    pub fn null(&mut self) -> &mut Self {
        self.buf.push(SIMPLE_NULL);
        self
    }

    /// Splice already-encoded CBOR
    pub fn raw(&mut self, encoded: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(encoded);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}
