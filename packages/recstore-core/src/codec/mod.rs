//! Order-preserving binary codec.
//!
//! Every supported field type encodes so that unsigned byte-wise comparison
//! of two encodings orders the same way as the typed values:
//! - unsigned integers: fixed-width big-endian
//! - signed integers: big-endian with the sign bit flipped
//! - `usize`: always 8 bytes big-endian
//! - byte strings and text: 4-byte big-endian length, then raw bytes
//! - fixed arrays: each element in index order, no count prefix
//! - [`CompactTimestamp`]: one packed 8-byte word, top bit flipped
//!
//! Composite values (records, key structs, nested values) are the
//! concatenation of their fields in declaration order; see [`impl_encodable!`].
//!
//! [`impl_encodable!`]: crate::impl_encodable

mod guid;
mod primitives;
mod timestamp;

pub use guid::Guid;
pub use timestamp::CompactTimestamp;

use crate::error::CodecError;
use crate::schema::FieldKind;

/// A value with a fixed, order-preserving binary layout.
pub trait Encodable: Sized {
    /// Describes the layout of this type for schema validation and inspection.
    fn field_kind() -> FieldKind;

    /// Number of bytes [`encode`](Self::encode) will write for this value.
    fn encoded_len(&self) -> usize;

    /// Appends the encoding of this value to the writer.
    ///
    /// Fails only when a byte string or text is too long for its 4-byte
    /// length prefix.
    fn encode(&self, w: &mut Writer<'_>) -> Result<(), CodecError>;

    /// Reads one value from the reader, advancing it past the consumed bytes.
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError>;
}

/// Append-only cursor over an owned byte buffer.
#[derive(Debug)]
pub struct Writer<'a> {
    buf: &'a mut Vec<u8>,
}

impl<'a> Writer<'a> {
    /// Wraps a buffer; bytes are appended after its current contents.
    pub fn new(buf: &'a mut Vec<u8>) -> Self {
        Self { buf }
    }

    /// Current end of the buffer.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a 4-byte big-endian length followed by the bytes.
    pub fn put_len_prefixed(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.put_slice(&len_prefix(bytes.len())?);
        self.put_slice(bytes);
        Ok(())
    }
}

/// Big-endian `u32` length prefix for a section of `len` bytes.
pub(crate) fn len_prefix(len: usize) -> Result<[u8; 4], CodecError> {
    u32::try_from(len)
        .map(u32::to_be_bytes)
        .map_err(|_| CodecError::LengthOverflow(len))
}

/// Read cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Consumes `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if len > self.remaining() {
            return Err(CodecError::Truncated {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Consumes exactly `N` bytes into an array.
    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Consumes a 4-byte big-endian length and that many bytes.
    pub fn take_len_prefixed(&mut self) -> Result<&'a [u8], CodecError> {
        let len = u32::from_be_bytes(self.take_array()?) as usize;
        self.take(len)
    }
}

/// Appends the encoding of `value` to `buf`. On failure `buf` is left as it was.
pub fn encode_into<T: Encodable>(value: &T, buf: &mut Vec<u8>) -> Result<(), CodecError> {
    let start = buf.len();
    buf.reserve(value.encoded_len());
    let result = value.encode(&mut Writer::new(buf));
    if result.is_err() {
        buf.truncate(start);
    }
    result
}

/// Encodes `value` into a freshly allocated buffer of exactly the right size.
pub fn encode_to_vec<T: Encodable>(value: &T) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(value.encoded_len());
    value.encode(&mut Writer::new(&mut buf))?;
    Ok(buf)
}

/// Decodes a value that must span the whole slice.
pub fn decode_from_slice<T: Encodable>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut r = Reader::new(bytes);
    let value = T::decode(&mut r)?;
    if !r.is_empty() {
        return Err(CodecError::TrailingBytes(r.remaining()));
    }
    Ok(value)
}

/// Implements [`Encodable`] for a struct from its ordered field list.
///
/// The listed order is the wire order; it must not change once data is stored.
///
/// ```
/// use recstore_core::impl_encodable;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct UserPk {
///     user_id: u64,
/// }
///
/// impl_encodable!(UserPk { user_id: u64 });
/// ```
#[macro_export]
macro_rules! impl_encodable {
    ($ty:ident { $($field:ident : $fty:ty),+ $(,)? }) => {
        impl $crate::codec::Encodable for $ty {
            fn field_kind() -> $crate::schema::FieldKind {
                $crate::schema::FieldKind::Composite(vec![
                    $($crate::schema::FieldDescriptor::new(
                        stringify!($field),
                        <$fty as $crate::codec::Encodable>::field_kind(),
                    ),)+
                ])
            }

            fn encoded_len(&self) -> usize {
                0 $(+ <$fty as $crate::codec::Encodable>::encoded_len(&self.$field))+
            }

            fn encode(
                &self,
                w: &mut $crate::codec::Writer<'_>,
            ) -> ::std::result::Result<(), $crate::error::CodecError> {
                $(<$fty as $crate::codec::Encodable>::encode(&self.$field, w)?;)+
                Ok(())
            }

            fn decode(
                r: &mut $crate::codec::Reader<'_>,
            ) -> ::std::result::Result<Self, $crate::error::CodecError> {
                Ok(Self {
                    $($field: <$fty as $crate::codec::Encodable>::decode(r)?,)+
                })
            }
        }
    };
}
