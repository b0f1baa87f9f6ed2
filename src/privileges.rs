//! Privilege bitmask (spec GLOSSARY: "Privileges").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Privileges(pub u32);

impl Privileges {
    pub const USER_NORMAL: Privileges = Privileges(1 << 0);
    pub const ADMIN_SEND_ALERTS: Privileges = Privileges(1 << 1);
    pub const ADMIN_MANAGE_USERS: Privileges = Privileges(1 << 2);
    pub const USER_TOURNAMENT_STAFF: Privileges = Privileges(1 << 3);

    pub const NONE: Privileges = Privileges(0);

    /// True if every bit set in `required` is also set in `self`.
    pub fn has(self, required: Privileges) -> bool {
        self.0 & required.0 == required.0
    }

    pub fn union(self, other: Privileges) -> Privileges {
        Privileges(self.0 | other.0)
    }
}

impl std::ops::BitOr for Privileges {
    type Output = Privileges;
    fn bitor(self, rhs: Privileges) -> Privileges {
        self.union(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_requires_all_bits() {
        let sender = Privileges::USER_NORMAL | Privileges::USER_TOURNAMENT_STAFF;
        assert!(sender.has(Privileges::USER_TOURNAMENT_STAFF));
        assert!(!sender.has(Privileges::ADMIN_SEND_ALERTS));
    }

    #[test]
    fn none_has_nothing_but_itself() {
        assert!(Privileges::NONE.has(Privileges::NONE));
        assert!(!Privileges::NONE.has(Privileges::USER_NORMAL));
    }
}
