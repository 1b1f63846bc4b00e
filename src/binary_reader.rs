use crate::error::DecodeError;
use crate::types::{Encode, IndexSize, Vec2, Vec3, Vec4};

macro_rules! read_bin {
    ($F:ident,$T:ty) => {
        pub(crate) fn $F(&mut self) -> Result<$T, DecodeError> {
            Ok(<$T>::from_le_bytes(
                self.read_array::<{ std::mem::size_of::<$T>() }>()?,
            ))
        }
    };
}

/// Forward-only little endian cursor over a borrowed buffer.
///
/// Every read is bounds checked and advances the position only on success.
pub(crate) struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> BinaryReader<'a> {
        BinaryReader { data, position: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Clamp a declared element count so a corrupt count cannot force a huge allocation.
    pub(crate) fn capacity_for(&self, count: u32, min_len: usize) -> usize {
        usize::try_from(count)
            .unwrap_or(usize::MAX)
            .min(self.remaining() / min_len.max(1))
    }

    pub(crate) fn read_vec(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::OutOfBounds {
                position: self.position,
                requested: n,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.position..self.position + n];
        self.position += n;
        Ok(bytes)
    }

    pub(crate) fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut buf = [0_u8; N];
        buf.copy_from_slice(self.read_vec(N)?);
        Ok(buf)
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.read_vec(n).map(|_| ())
    }

    /// `u32` byte length followed by text in the given encoding.
    pub(crate) fn read_text_buf(&mut self, encode: Encode) -> Result<String, DecodeError> {
        let length = self.read_u32()?;
        let position = self.position;
        let bytes = self.read_vec(length as usize)?;
        encode
            .encoding()
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
            .ok_or(DecodeError::InvalidEncoding {
                position,
                encoding: encode,
            })
    }

    /// Face indices, unsigned at every width.
    pub(crate) fn read_vertex_index(&mut self, size: IndexSize) -> Result<u32, DecodeError> {
        Ok(match size {
            IndexSize::Byte => u32::from(self.read_u8()?),
            IndexSize::Short => u32::from(self.read_u16()?),
            IndexSize::Int => self.read_u32()?,
        })
    }

    /// Width-dependent signedness: a single byte is sign extended so `0xFF` reads as -1,
    /// two bytes are unsigned, four bytes are a plain `i32`.
    pub(crate) fn read_sized(&mut self, size: IndexSize) -> Result<i32, DecodeError> {
        Ok(match size {
            IndexSize::Byte => i32::from(self.read_i8()?),
            IndexSize::Short => i32::from(self.read_u16()?),
            IndexSize::Int => self.read_i32()?,
        })
    }

    pub(crate) fn read_vec4(&mut self) -> Result<Vec4, DecodeError> {
        Ok([
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ])
    }

    pub(crate) fn read_vec3(&mut self) -> Result<Vec3, DecodeError> {
        Ok([self.read_f32()?, self.read_f32()?, self.read_f32()?])
    }

    pub(crate) fn read_vec2(&mut self) -> Result<Vec2, DecodeError> {
        Ok([self.read_f32()?, self.read_f32()?])
    }

    read_bin!(read_f32, f32);
    read_bin!(read_i32, i32);
    read_bin!(read_u32, u32);
    read_bin!(read_u16, u16);
    read_bin!(read_i8, i8);
    read_bin!(read_u8, u8);
}

#[cfg(test)]
mod test {
    use super::BinaryReader;
    use crate::binary_writer::BinaryWriter;
    use crate::error::DecodeError;
    use crate::types::{Encode, IndexSize};

    #[test]
    fn reads_little_endian_primitives() {
        let data = [1, 2, 3, 0, 0, 0, 0x80, 0x3f, 0xff];
        let mut reader = BinaryReader::new(&data);
        assert_eq!(reader.read_u8(), Ok(1));
        assert_eq!(reader.read_u16(), Ok(0x0302));
        assert_eq!(reader.read_u8(), Ok(0));
        assert_eq!(reader.read_f32(), Ok(1.0));
        assert_eq!(reader.read_i8(), Ok(-1));
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn out_of_bounds_does_not_advance() {
        let data = [0xAA, 0xBB, 0xCC];
        let mut reader = BinaryReader::new(&data);
        reader.skip(1).unwrap();
        assert_eq!(
            reader.read_i32(),
            Err(DecodeError::OutOfBounds {
                position: 1,
                requested: 4,
                available: 2,
            })
        );
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.read_u16(), Ok(0xCCBB));
    }

    #[test]
    fn sized_read_sign_extends_only_single_bytes() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut reader = BinaryReader::new(&data);
        assert_eq!(reader.read_sized(IndexSize::Byte), Ok(-1));
        assert_eq!(reader.read_sized(IndexSize::Short), Ok(65535));
        assert_eq!(reader.read_sized(IndexSize::Int), Ok(-1));
        assert_eq!(reader.position(), 7);
    }

    #[test]
    fn vertex_index_is_unsigned() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut reader = BinaryReader::new(&data);
        assert_eq!(reader.read_vertex_index(IndexSize::Byte), Ok(255));
        assert_eq!(reader.read_vertex_index(IndexSize::Short), Ok(65535));
        assert_eq!(reader.read_vertex_index(IndexSize::Int), Ok(u32::MAX));
    }

    #[test]
    fn text_round_trip() {
        for encode in [Encode::Utf16Le, Encode::UTF8].iter().copied() {
            for text in ["", "初音ミク", "Miku Hatsune ver.2", "𠮷野家"].iter() {
                let mut writer = BinaryWriter::new();
                writer.write_text_buf(encode, text);
                writer.write_u8(0x7E);
                let data = writer.into_inner();
                let mut reader = BinaryReader::new(&data);
                assert_eq!(reader.read_text_buf(encode).as_deref(), Ok(*text));
                assert_eq!(reader.read_u8(), Ok(0x7E), "{:?} {:?}", encode, text);
            }
        }
    }

    #[test]
    fn length_prefix_counts_bytes() {
        let mut writer = BinaryWriter::new();
        writer.write_text_buf(Encode::Utf16Le, "ab");
        let data = writer.into_inner();
        assert_eq!(&data[..4], &[4, 0, 0, 0]);
    }

    #[test]
    fn malformed_text_is_rejected() {
        let mut utf8 = BinaryWriter::new();
        utf8.write_u32(2);
        utf8.write_vec(&[0xC3, 0x28]);
        let data = utf8.into_inner();
        assert_eq!(
            BinaryReader::new(&data).read_text_buf(Encode::UTF8),
            Err(DecodeError::InvalidEncoding {
                position: 4,
                encoding: Encode::UTF8,
            })
        );

        // unpaired high surrogate
        let mut utf16 = BinaryWriter::new();
        utf16.write_u32(2);
        utf16.write_vec(&[0x00, 0xD8]);
        let data = utf16.into_inner();
        assert!(matches!(
            BinaryReader::new(&data).read_text_buf(Encode::Utf16Le),
            Err(DecodeError::InvalidEncoding { .. })
        ));
    }

    #[test]
    fn truncated_text_is_out_of_bounds() {
        let mut writer = BinaryWriter::new();
        writer.write_u32(10);
        writer.write_vec(b"short");
        let data = writer.into_inner();
        assert!(matches!(
            BinaryReader::new(&data).read_text_buf(Encode::UTF8),
            Err(DecodeError::OutOfBounds {
                position: 4,
                requested: 10,
                available: 5,
            })
        ));
    }

    #[test]
    fn capacity_is_clamped_by_remaining_bytes() {
        let data = [0u8; 40];
        let reader = BinaryReader::new(&data);
        assert_eq!(reader.capacity_for(u32::MAX, 4), 10);
        assert_eq!(reader.capacity_for(3, 4), 3);
    }
}
