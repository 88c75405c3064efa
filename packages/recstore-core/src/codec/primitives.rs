//! Scalar, string and fixed-array encodings.

use super::{Encodable, Reader, Writer};
use crate::error::CodecError;
use crate::schema::FieldKind;

macro_rules! unsigned_encodable {
    ($ty:ty, $kind:ident) => {
        impl Encodable for $ty {
            fn field_kind() -> FieldKind {
                FieldKind::$kind
            }

            fn encoded_len(&self) -> usize {
                std::mem::size_of::<$ty>()
            }

            fn encode(&self, w: &mut Writer<'_>) -> Result<(), CodecError> {
                w.put_slice(&self.to_be_bytes());
                Ok(())
            }

            fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
                Ok(<$ty>::from_be_bytes(r.take_array()?))
            }
        }
    };
}

// Signed values travel as their unsigned bit pattern with the sign bit
// flipped, so negatives sort below zero under unsigned comparison.
macro_rules! signed_encodable {
    ($ty:ty, $uty:ty, $kind:ident) => {
        impl Encodable for $ty {
            fn field_kind() -> FieldKind {
                FieldKind::$kind
            }

            fn encoded_len(&self) -> usize {
                std::mem::size_of::<$ty>()
            }

            fn encode(&self, w: &mut Writer<'_>) -> Result<(), CodecError> {
                let flipped = (*self as $uty) ^ (1 << (<$uty>::BITS - 1));
                w.put_slice(&flipped.to_be_bytes());
                Ok(())
            }

            fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
                let raw = <$uty>::from_be_bytes(r.take_array()?);
                Ok((raw ^ (1 << (<$uty>::BITS - 1))) as $ty)
            }
        }
    };
}

unsigned_encodable!(u8, U8);
unsigned_encodable!(u16, U16);
unsigned_encodable!(u32, U32);
unsigned_encodable!(u64, U64);

signed_encodable!(i8, u8, I8);
signed_encodable!(i16, u16, I16);
signed_encodable!(i32, u32, I32);
signed_encodable!(i64, u64, I64);

/// Platform-width sizes are stored as 8 bytes whatever the host width.
impl Encodable for usize {
    fn field_kind() -> FieldKind {
        FieldKind::Size
    }

    fn encoded_len(&self) -> usize {
        8
    }

    fn encode(&self, w: &mut Writer<'_>) -> Result<(), CodecError> {
        w.put_slice(&(*self as u64).to_be_bytes());
        Ok(())
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let raw = u64::from_be_bytes(r.take_array()?);
        usize::try_from(raw).map_err(|_| CodecError::SizeOverflow(raw))
    }
}

/// Length-prefixed byte string. Longer than `u32::MAX` bytes fails to encode
/// with [`CodecError::LengthOverflow`].
impl Encodable for Vec<u8> {
    fn field_kind() -> FieldKind {
        FieldKind::Bytes
    }

    fn encoded_len(&self) -> usize {
        4 + self.len()
    }

    fn encode(&self, w: &mut Writer<'_>) -> Result<(), CodecError> {
        w.put_len_prefixed(self)
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(r.take_len_prefixed()?.to_vec())
    }
}

/// Length-prefixed UTF-8 text, same wire layout as `Vec<u8>`.
///
/// The length prefix comes first, so encoded keys order by byte length and
/// then by content.
impl Encodable for String {
    fn field_kind() -> FieldKind {
        FieldKind::Text
    }

    fn encoded_len(&self) -> usize {
        4 + self.len()
    }

    fn encode(&self, w: &mut Writer<'_>) -> Result<(), CodecError> {
        w.put_len_prefixed(self.as_bytes())
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let bytes = r.take_len_prefixed()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }
}

/// Fixed-length arrays repeat the element encoding with no count prefix.
impl<T: Encodable, const N: usize> Encodable for [T; N] {
    fn field_kind() -> FieldKind {
        FieldKind::Array {
            element: Box::new(T::field_kind()),
            count: N,
        }
    }

    fn encoded_len(&self) -> usize {
        self.iter().map(Encodable::encoded_len).sum()
    }

    fn encode(&self, w: &mut Writer<'_>) -> Result<(), CodecError> {
        for item in self {
            item.encode(w)?;
        }
        Ok(())
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::decode(r)?);
        }
        items.try_into().map_err(|v: Vec<T>| CodecError::Truncated {
            needed: N,
            remaining: v.len(),
        })
    }
}
