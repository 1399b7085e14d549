use byteorder::{BigEndian, ByteOrder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorError {
    UnexpectedEof { position: usize, wanted: usize },
}

/// Big-endian forward cursor over an immutable byte buffer. All multi-byte
/// reads are big-endian per JVMS §4.1; the same cursor doubles as the
/// bytecode reader in the interpreter.
#[derive(Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Cursor { data, position: 0 }
    }

    pub fn at(data: &'a [u8], position: usize) -> Self {
        Cursor { data, position }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn take(&mut self, count: usize) -> Result<&'a [u8], CursorError> {
        if self.remaining() < count {
            return Err(CursorError::UnexpectedEof {
                position: self.position,
                wanted: count,
            });
        }
        let span = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(span)
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CursorError> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    pub fn read_i8(&mut self) -> Result<i8, CursorError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16, CursorError> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_i32(&mut self) -> Result<i32, CursorError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_f32(&mut self) -> Result<f32, CursorError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, CursorError> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// u16-count-prefixed list of u16 entries (interfaces, exception
    /// index tables).
    pub fn read_u16_table(&mut self) -> Result<Vec<u16>, CursorError> {
        let count = self.read_u16()? as usize;
        let mut table = Vec::with_capacity(count);
        for _ in 0..count {
            table.push(self.read_u16()?);
        }
        Ok(table)
    }

    /// Skips 0..=3 bytes so the next read starts at a 4-byte boundary
    /// relative to `base` (tableswitch / lookupswitch operand padding).
    pub fn align4(&mut self, base: usize) -> Result<(), CursorError> {
        while (self.position - base) % 4 != 0 {
            self.read_u8()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_primitives() {
        let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x34, 0xFF];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_u32().unwrap(), 0xCAFE_BABE);
        assert_eq!(cursor.read_u16().unwrap(), 0x0034);
        assert_eq!(cursor.read_i8().unwrap(), -1);
        assert_eq!(cursor.position(), 7);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn underrun_reports_position_and_want() {
        let mut cursor = Cursor::new(&[0x01]);
        assert_eq!(cursor.read_u8().unwrap(), 1);
        assert_eq!(
            cursor.read_u32(),
            Err(CursorError::UnexpectedEof { position: 1, wanted: 4 })
        );
    }

    #[test]
    fn align4_is_relative_to_base() {
        let data = [0u8; 16];
        let mut cursor = Cursor::at(&data, 5);
        cursor.align4(0).unwrap();
        assert_eq!(cursor.position(), 8);
        let mut cursor = Cursor::at(&data, 8);
        cursor.align4(0).unwrap();
        assert_eq!(cursor.position(), 8);
        // padding counted from the method start, not the buffer start
        let mut cursor = Cursor::at(&data, 6);
        cursor.align4(2).unwrap();
        assert_eq!(cursor.position(), 6);
    }
}
