// NTFS Windows Timestamp Handling
// FILETIME values are kept raw and only converted for presentation

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Number of seconds between 1601-01-01 and the Unix epoch
const WINDOWS_EPOCH_DIFF: i64 = 11_644_473_600;

/// FILETIME is in 100-nanosecond intervals
const FILETIME_TICKS_PER_SECOND: u64 = 10_000_000;

/// Raw Windows FILETIME (100ns ticks since 1601-01-01 UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FileTime(pub u64);

impl FileTime {
    pub fn ticks(&self) -> u64 {
        self.0
    }

    /// Convert to UTC; None for an unset (zero) or unrepresentable value
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        if self.0 == 0 {
            return None;
        }

        let seconds = i64::try_from(self.0 / FILETIME_TICKS_PER_SECOND).ok()? - WINDOWS_EPOCH_DIFF;
        let nanos = ((self.0 % FILETIME_TICKS_PER_SECOND) * 100) as u32;

        DateTime::from_timestamp(seconds, nanos)
    }
}

impl From<u64> for FileTime {
    fn from(ticks: u64) -> Self {
        FileTime(ticks)
    }
}

impl fmt::Display for FileTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "-"),
        }
    }
}

// Serialized as the raw tick count next to its readable form
impl Serialize for FileTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("FileTime", 2)?;
        state.serialize_field("ticks", &self.0)?;
        state.serialize_field("utc", &self.to_datetime())?;
        state.end()
    }
}

/// The four timestamps shared by $STANDARD_INFORMATION and $FILE_NAME
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NtfsTimestamps {
    /// File creation
    pub ctime: FileTime,
    /// File alteration
    pub atime: FileTime,
    /// MFT entry changed
    pub mtime: FileTime,
    /// File read
    pub rtime: FileTime,
}
