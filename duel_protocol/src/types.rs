// Core ID types for the duel wire protocol.
//
// `PlayerRole` identifies which of the two participant slots an endpoint
// occupies. It is relay-assigned, stable for the lifetime of a match, and
// appears on the wire both as a bare digit (the role-assignment reply) and
// embedded in kind tokens (`Player1Position`, `Player2Dead`, ...). A
// two-variant enum rather than a raw integer: live roles are a bijection onto
// {1, 2}, and the type makes a third role unrepresentable.

use std::fmt;

/// Participant slot in a match: role 1 or role 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlayerRole {
    One,
    Two,
}

impl PlayerRole {
    /// Both roles, in assignment order.
    pub const ALL: [PlayerRole; 2] = [PlayerRole::One, PlayerRole::Two];

    /// The wire digit for this role.
    pub fn number(self) -> u8 {
        match self {
            PlayerRole::One => 1,
            PlayerRole::Two => 2,
        }
    }

    /// Parse a wire digit. Anything outside {1, 2} is not a role.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(PlayerRole::One),
            2 => Some(PlayerRole::Two),
            _ => None,
        }
    }

    /// The other participant's role.
    pub fn opponent(self) -> Self {
        match self {
            PlayerRole::One => PlayerRole::Two,
            PlayerRole::Two => PlayerRole::One,
        }
    }
}

impl fmt::Display for PlayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_roundtrip() {
        for role in PlayerRole::ALL {
            assert_eq!(PlayerRole::from_number(role.number()), Some(role));
        }
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        assert_eq!(PlayerRole::from_number(0), None);
        assert_eq!(PlayerRole::from_number(3), None);
        assert_eq!(PlayerRole::from_number(255), None);
    }

    #[test]
    fn opponent_is_involutive() {
        assert_eq!(PlayerRole::One.opponent(), PlayerRole::Two);
        assert_eq!(PlayerRole::Two.opponent().opponent(), PlayerRole::Two);
    }

    #[test]
    fn displays_as_wire_digit() {
        assert_eq!(PlayerRole::One.to_string(), "1");
        assert_eq!(PlayerRole::Two.to_string(), "2");
    }
}
