use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

// Ids come from a single per-rig counter, so a joint and a bone never share a
// number. Ids are never reused for the lifetime of the rig.

macro_rules! rig_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub fn get(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u32>().map(Self)
            }
        }
    };
}

rig_id!(
    /// Identity of a [`Joint`](crate::Joint) within its rig.
    JointId
);
rig_id!(
    /// Identity of a [`Bone`](crate::Bone) within its rig.
    BoneId
);
rig_id!(
    /// Identity of a [`SkinAttachment`](crate::SkinAttachment) within its rig.
    AttachmentId
);

#[derive(Clone, Debug, Default)]
pub(crate) struct IdAllocator {
    next: u32,
    used: HashSet<u32>,
}

impl IdAllocator {
    /// Hands out the next unused id. After the counter wraps past `u32::MAX`
    /// it keeps skipping ids that were ever reserved.
    pub(crate) fn next_raw(&mut self) -> u32 {
        while self.used.contains(&self.next) {
            self.next = self.next.wrapping_add(1);
        }
        let id = self.next;
        self.used.insert(id);
        self.next = self.next.wrapping_add(1);
        id
    }

    /// Marks `raw` as taken and moves the counter past it.
    pub(crate) fn reserve(&mut self, raw: u32) {
        self.used.insert(raw);
        if raw >= self.next {
            self.next = raw.wrapping_add(1);
        }
    }

    pub(crate) fn is_used(&self, raw: u32) -> bool {
        self.used.contains(&raw)
    }
}
