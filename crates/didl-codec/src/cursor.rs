use crate::error::CodecError;

/// Byte reader over a wire message. Every read is bounds-checked and failures
/// carry the offset, so a bad buffer reports where it went wrong instead of
/// panicking.
#[derive(Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos == self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn byte(&mut self, context: &'static str) -> Result<u8, CodecError> {
        let byte = *self.buf.get(self.pos).ok_or(CodecError::TruncatedBuffer {
            context,
            offset: self.pos,
        })?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn bytes(&mut self, len: usize, context: &'static str) -> Result<&'a [u8], CodecError> {
        let end = self.pos.checked_add(len).filter(|end| *end <= self.buf.len());
        let end = end.ok_or(CodecError::TruncatedBuffer {
            context,
            offset: self.pos,
        })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], CodecError> {
        let slice = self.bytes(N, context)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }
}
