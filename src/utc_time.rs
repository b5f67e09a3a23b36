use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::macros::offset;
use time::{OffsetDateTime, PrimitiveDateTime};


#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtcDateTime(PrimitiveDateTime);

impl UtcDateTime {
    pub fn now() -> Self { OffsetDateTime::now_utc().into() }

    // Returns `None` if the timestamp is out of range.
    pub fn from_unix_millis(millis: i64) -> Option<Self> {
        let nanos = i128::from(millis) * 1_000_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos).ok().map(Self::from)
    }
    pub fn to_unix_millis(self) -> i64 {
        let nanos = OffsetDateTime::from(self).unix_timestamp_nanos() / 1_000_000;
        // Improvement potential: Report overflow. Not reachable for dates from `from_unix_millis`.
        i64::try_from(nanos).unwrap_or(i64::MAX)
    }

    // Returns `None` if `earlier` is actually later.
    pub fn duration_since(self, earlier: Self) -> Option<Duration> {
        Duration::try_from(OffsetDateTime::from(self) - OffsetDateTime::from(earlier)).ok()
    }
}

impl From<OffsetDateTime> for UtcDateTime {
    fn from(odt: OffsetDateTime) -> Self {
        let utc = odt.to_offset(offset!(UTC));
        Self(PrimitiveDateTime::new(utc.date(), utc.time()))
    }
}

impl From<UtcDateTime> for OffsetDateTime {
    fn from(udt: UtcDateTime) -> Self { udt.0.assume_utc() }
}

impl fmt::Display for UtcDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.0;
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
            t.year(),
            u8::from(t.month()),
            t.day(),
            t.hour(),
            t.minute(),
            t.second()
        )
    }
}
