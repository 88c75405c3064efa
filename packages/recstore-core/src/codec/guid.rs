use serde::Serialize;

use super::{Encodable, Reader, Writer};
use crate::error::CodecError;
use crate::schema::FieldKind;

/// 16-byte identifier stored as a raw fixed-size blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    pub const LEN: usize = 16;

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl From<[u8; 16]> for Guid {
    fn from(bytes: [u8; 16]) -> Self {
        Guid(bytes)
    }
}

impl Encodable for Guid {
    fn field_kind() -> FieldKind {
        FieldKind::Blob { len: Self::LEN }
    }

    fn encoded_len(&self) -> usize {
        Self::LEN
    }

    fn encode(&self, w: &mut Writer<'_>) -> Result<(), CodecError> {
        w.put_slice(&self.0);
        Ok(())
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Guid(r.take_array()?))
    }
}

impl std::fmt::Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}
