use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Host modifier state, using the X11 bit layout the engine also expects.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeyStates(u32);

impl KeyStates {
    pub const NONE: Self = Self(0);
    pub const SHIFT: Self = Self(1 << 0);
    pub const CAPS_LOCK: Self = Self(1 << 1);
    pub const CTRL: Self = Self(1 << 2);
    /// Alt.
    pub const MOD1: Self = Self(1 << 3);
    pub const NUM_LOCK: Self = Self(1 << 4);
    pub const SUPER: Self = Self(1 << 6);
    /// Virtual super bit used by IBus-derived engines.
    pub const SUPER2: Self = Self(1 << 26);
    pub const RELEASE: Self = Self(1 << 30);

    /// Modifiers forwarded to the engine; everything else is dropped.
    const FORWARDED: Self =
        Self(Self::MOD1.0 | Self::CAPS_LOCK.0 | Self::SHIFT.0 | Self::CTRL.0 | Self::SUPER.0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn test_any(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for KeyStates {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for KeyStates {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for KeyStates {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for KeyStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyStates({:#x})", self.0)
    }
}

// X11 keysyms the bridge synthesizes or inspects.
pub mod keysym {
    pub const SPACE: u32 = 0x0020;
    pub const BACKSPACE: u32 = 0xff08;
    pub const RETURN: u32 = 0xff0d;
    pub const ESCAPE: u32 = 0xff1b;
    pub const PAGE_UP: u32 = 0xff55;
    pub const PAGE_DOWN: u32 = 0xff56;
    pub const F4: u32 = 0xffc1;
    pub const F5: u32 = 0xffc2;
}

/// A key event as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub sym: u32,
    pub states: KeyStates,
    pub is_release: bool,
}

impl KeyEvent {
    pub fn press(sym: u32) -> Self {
        Self {
            sym,
            states: KeyStates::NONE,
            is_release: false,
        }
    }

    pub fn release(sym: u32) -> Self {
        Self {
            sym,
            states: KeyStates::NONE,
            is_release: true,
        }
    }

    pub fn with_states(mut self, states: KeyStates) -> Self {
        self.states = states;
        self
    }

    /// Press of the key producing `c`, if `c` has a keysym.
    pub fn from_char(c: char) -> Option<Self> {
        keysym_from_char(c).map(Self::press)
    }

    /// The engine's packed state word for this event.
    pub fn engine_mask(&self) -> u32 {
        engine_mask(self.states, self.is_release)
    }
}

/// Pack host modifiers and the release flag into the engine's state word.
pub fn engine_mask(states: KeyStates, is_release: bool) -> u32 {
    let mut packed = states & KeyStates::FORWARDED;
    if packed.contains(KeyStates::SUPER) {
        packed |= KeyStates::SUPER2;
    }
    if is_release {
        packed |= KeyStates::RELEASE;
    }
    packed.bits()
}

/// Keysym for a unicode scalar: Latin-1 printables map to themselves, control
/// characters have none, everything else uses the `0x0100_0000` unicode range.
pub fn keysym_from_char(c: char) -> Option<u32> {
    let code = c as u32;
    match code {
        0x20..=0x7e | 0xa0..=0xff => Some(code),
        0..=0x1f | 0x7f..=0x9f => None,
        _ => Some(0x0100_0000 | code),
    }
}
