//! Strongly typed identifier wrappers.
//!
//! Ids are small `Copy + Ord + Hash` integers, usable directly as map keys
//! and in ordered sets.  Process and channel ids are dense
//! indices handed out by the simulation environment; target ids come from the
//! scenario and are only required to be unique.

use std::fmt;

/// Declares an id newtype over an unsigned integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Slot in the table that owns this id.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a process in the simulation environment's process table.
    pub struct ProcessId(u32);
}

typed_id! {
    /// Index of a delayed pub/sub channel.
    pub struct ChannelId(u32);
}

typed_id! {
    /// Unique identifier of an inspection target.
    pub struct TargetId(u32);
}
