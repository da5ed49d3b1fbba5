//! Computer keyboard → note frequency table.
//!
//! Two piano-like rows: `Z S X D C V G B H N J M` plays C4..B4 and
//! `Q 2 W 3 E R 5 T 6 Y 7 U I 8 O 9 P` plays C5..E6. Keys are identified by
//! their upper-case ASCII code, so `z` and `Z` are the same key (90).

use std::fmt;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(pub u8);

impl KeyId {
    /// Key for a typed character, if it is ASCII.
    pub fn from_char(c: char) -> Option<Self> {
        c.is_ascii().then(|| KeyId(c.to_ascii_uppercase() as u8))
    }

    pub fn as_char(self) -> char {
        self.0 as char
    }

    /// Fundamental frequency for this key, `None` when unmapped.
    pub fn frequency(self) -> Option<f32> {
        frequency_for(self)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

const KEYBOARD: [(u8, f32); 29] = [
    (b'Z', 261.625_58), // C4
    (b'S', 277.182_62),
    (b'X', 293.664_76),
    (b'D', 311.126_98),
    (b'C', 329.627_56),
    (b'V', 349.228_23),
    (b'G', 369.994_42),
    (b'B', 391.995_42),
    (b'H', 415.304_7),
    (b'N', 440.0), // A4
    (b'J', 466.163_76),
    (b'M', 493.883_3),
    (b'Q', 523.251_13), // C5
    (b'2', 554.365_26),
    (b'W', 587.329_53),
    (b'3', 622.253_97),
    (b'E', 659.255_1),
    (b'R', 698.456_46),
    (b'5', 739.988_83),
    (b'T', 783.990_9),
    (b'6', 830.609_4),
    (b'Y', 880.0),
    (b'7', 932.327_5),
    (b'U', 987.766_6),
    (b'I', 1046.502_3), // C6
    (b'8', 1108.730_5),
    (b'O', 1174.659_2),
    (b'9', 1244.508_1),
    (b'P', 1318.510_3),
];

pub fn frequency_for(key: KeyId) -> Option<f32> {
    KEYBOARD
        .iter()
        .find(|&&(code, _)| code == key.0)
        .map(|&(_, freq)| freq)
}

/// Every mapped key in keyboard order, low to high.
pub fn mapped_keys() -> impl Iterator<Item = KeyId> {
    KEYBOARD.iter().map(|&(code, _)| KeyId(code))
}
