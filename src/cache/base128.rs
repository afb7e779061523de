use super::CacheError;

/// Growable output buffer
#[derive(Debug, Default)]
pub struct Base128Output {
    buf: Vec<u8>,
}

impl Base128Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u64(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_u64(u64::from(value));
    }

    pub fn write_usize(&mut self, value: usize) {
        self.write_u64(value as u64);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_u32(((value << 1) ^ (value >> 31)) as u32);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    /// Length-prefixed UTF-8
    pub fn write_str(&mut self, value: &str) {
        self.write_usize(value.len());
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reader over an encoded byte slice
#[derive(Debug)]
pub struct Base128Input<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Base128Input<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.data.len()
    }

    fn read_byte(&mut self) -> Result<u8, CacheError> {
        let byte = *self
            .data
            .get(self.position)
            .ok_or(CacheError::InvalidFormat("unexpected end of stream"))?;
        self.position += 1;
        Ok(byte)
    }

    pub fn read_u64(&mut self) -> Result<u64, CacheError> {
        let mut value = 0u64;
        let mut shift = 0;
        loop {
            let byte = self.read_byte()?;
            if shift == 63 && byte > 1 {
                return Err(CacheError::InvalidFormat("varint overflow"));
            }
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift > 63 {
                return Err(CacheError::InvalidFormat("varint overflow"));
            }
        }
    }

    pub fn read_u32(&mut self) -> Result<u32, CacheError> {
        u32::try_from(self.read_u64()?).map_err(|_| CacheError::InvalidFormat("varint overflow"))
    }

    pub fn read_usize(&mut self) -> Result<usize, CacheError> {
        usize::try_from(self.read_u64()?).map_err(|_| CacheError::InvalidFormat("varint overflow"))
    }

    pub fn read_i32(&mut self) -> Result<i32, CacheError> {
        let raw = self.read_u32()?;
        Ok(((raw >> 1) as i32) ^ -((raw & 1) as i32))
    }

    pub fn read_bool(&mut self) -> Result<bool, CacheError> {
        match self.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(CacheError::InvalidFormat("invalid boolean")),
        }
    }

    pub fn read_raw(&mut self, len: usize) -> Result<&'a [u8], CacheError> {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(CacheError::InvalidFormat("unexpected end of stream"))?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    pub fn read_str(&mut self) -> Result<&'a str, CacheError> {
        let len = self.read_usize()?;
        let bytes = self.read_raw(len)?;
        std::str::from_utf8(bytes).map_err(|_| CacheError::InvalidFormat("invalid UTF-8"))
    }

    /// Read a count and reject it when the remaining bytes cannot possibly
    /// hold that many entries
    pub fn read_count(&mut self) -> Result<usize, CacheError> {
        let count = self.read_usize()?;
        if count > self.data.len() - self.position {
            return Err(CacheError::InvalidFormat("count exceeds stream length"));
        }
        Ok(count)
    }
}
