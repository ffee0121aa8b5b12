//! Contest option flags
//!
//! Settings shared by every contest kind, stored as a BIGINT bit set.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Per-contest toggles that apply regardless of the contest kind
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContestFlags: u32 {
        /// Only users with a premium platform account may take part
        const PREMIUM_ONLY             = 1 << 0;
        /// Do not require membership of the bot-wide base channel
        const SKIP_BASE_SUBSCRIPTION   = 1 << 1;
        /// Do not require membership of the contest's own channel/group
        const SKIP_TARGET_SUBSCRIPTION = 1 << 2;
        /// Ask an arithmetic challenge before the first join/vote
        const ANTI_BOT                 = 1 << 3;
        /// Drop entries whose user left the target chat before the draw
        const EXCLUDE_LEAVERS          = 1 << 4;
    }
}

impl ContestFlags {
    /// Get the raw bits as i64 (for database storage)
    #[inline]
    pub fn to_i64(self) -> i64 {
        i64::from(self.bits())
    }

    /// Create from raw i64 bits (from database); unknown bits are dropped
    #[inline]
    pub fn from_i64(bits: i64) -> Self {
        ContestFlags::from_bits_truncate(bits as u32)
    }

    /// Names of the flags that are set
    pub fn list(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

impl Default for ContestFlags {
    fn default() -> Self {
        ContestFlags::empty()
    }
}

impl fmt::Display for ContestFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl Serialize for ContestFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

// Deserialize from string or number
impl<'de> Deserialize<'de> for ContestFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct FlagsVisitor;

        impl Visitor<'_> for FlagsVisitor {
            type Value = ContestFlags;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing contest flag bits")
            }

            fn visit_i64<E>(self, value: i64) -> Result<ContestFlags, E>
            where
                E: de::Error,
            {
                Ok(ContestFlags::from_i64(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<ContestFlags, E>
            where
                E: de::Error,
            {
                Ok(ContestFlags::from_bits_truncate(value as u32))
            }

            fn visit_str<E>(self, value: &str) -> Result<ContestFlags, E>
            where
                E: de::Error,
            {
                value
                    .parse::<u32>()
                    .map(ContestFlags::from_bits_truncate)
                    .map_err(|_| de::Error::custom("invalid contest flags string"))
            }
        }

        deserializer.deserialize_any(FlagsVisitor)
    }
}
