//! Compact sortable timestamp.
//!
//! Layout: one 8-byte big-endian word holding the seconds sign-extended to
//! 34 bits in the high part and the nanoseconds in the low 30 bits. The top
//! bit of the whole word is flipped so that the packed value orders
//! chronologically across zero and negative seconds.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use super::{Encodable, Reader, Writer};
use crate::error::CodecError;
use crate::schema::FieldKind;

const NSEC_BITS: u32 = 30;
const SEC_BITS: u32 = 34;
const NSEC_MASK: u64 = (1 << NSEC_BITS) - 1;
const SEC_MASK: u64 = (1 << SEC_BITS) - 1;
const TOP_BIT: u64 = 1 << 63;

/// Seconds plus nanoseconds, restricted to what the packed encoding can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct CompactTimestamp {
    sec: i64,
    nsec: u32,
}

impl CompactTimestamp {
    /// Smallest representable seconds value (-2^33).
    pub const MIN_SEC: i64 = -(1 << (SEC_BITS - 1));
    /// Largest representable seconds value (2^33 - 1).
    pub const MAX_SEC: i64 = (1 << (SEC_BITS - 1)) - 1;
    pub const MAX_NSEC: u32 = 999_999_999;

    pub const EPOCH: CompactTimestamp = CompactTimestamp { sec: 0, nsec: 0 };

    /// Builds a timestamp, rejecting values the packed layout cannot hold.
    pub fn new(sec: i64, nsec: u32) -> Result<Self, CodecError> {
        if !(Self::MIN_SEC..=Self::MAX_SEC).contains(&sec) || nsec > Self::MAX_NSEC {
            return Err(CodecError::TimestampOutOfRange { sec, nsec });
        }
        Ok(Self { sec, nsec })
    }

    /// Whole seconds relative to the Unix epoch.
    pub fn sec(&self) -> i64 {
        self.sec
    }

    pub fn nsec(&self) -> u32 {
        self.nsec
    }

    /// Converts a wall-clock time, including times before the epoch.
    pub fn from_system_time(t: SystemTime) -> Result<Self, CodecError> {
        match t.duration_since(UNIX_EPOCH) {
            Ok(d) => Self::new(d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => {
                // Before the epoch: borrow one second when there is a fraction.
                let d = e.duration();
                let (sec, nsec) = match d.subsec_nanos() {
                    0 => (-(d.as_secs() as i64), 0),
                    n => (-(d.as_secs() as i64) - 1, 1_000_000_000 - n),
                };
                Self::new(sec, nsec)
            }
        }
    }

    pub fn to_system_time(&self) -> SystemTime {
        if self.sec >= 0 {
            UNIX_EPOCH + Duration::new(self.sec as u64, self.nsec)
        } else {
            UNIX_EPOCH - Duration::from_secs(self.sec.unsigned_abs()) + Duration::from_nanos(self.nsec as u64)
        }
    }

    pub fn now() -> Result<Self, CodecError> {
        Self::from_system_time(SystemTime::now())
    }

    fn pack(&self) -> u64 {
        let sec34 = (self.sec as u64) & SEC_MASK;
        ((sec34 << NSEC_BITS) | self.nsec as u64) ^ TOP_BIT
    }

    fn unpack(word: u64) -> Result<Self, CodecError> {
        let packed = word ^ TOP_BIT;
        let nsec = (packed & NSEC_MASK) as u32;
        // Arithmetic shift restores the sign of the 34-bit seconds field.
        let sec = (packed as i64) >> NSEC_BITS;
        Self::new(sec, nsec)
    }
}

impl Encodable for CompactTimestamp {
    fn field_kind() -> FieldKind {
        FieldKind::Timestamp
    }

    fn encoded_len(&self) -> usize {
        8
    }

    fn encode(&self, w: &mut Writer<'_>) -> Result<(), CodecError> {
        w.put_slice(&self.pack().to_be_bytes());
        Ok(())
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Self::unpack(u64::from_be_bytes(r.take_array()?))
    }
}

impl std::fmt::Display for CompactTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nsec)
    }
}
