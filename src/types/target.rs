//! Description of the introspected platform. Only the properties that change byte layout live
//! here: the native address width and the width of a wide character.
use super::pointer::AddressWidth;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WideCharWidth {
    /// One UTF-16 code unit (Windows `wchar_t`).
    Utf16,
    /// One UTF-32 code point (most Unix `wchar_t`).
    Utf32,
}

impl WideCharWidth {
    pub const fn bytes(self) -> usize {
        match self {
            WideCharWidth::Utf16 => 2,
            WideCharWidth::Utf32 => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetConfig {
    pub pointer_width: AddressWidth,
    pub wide_char: WideCharWidth,
}

impl TargetConfig {
    pub const fn x86() -> Self {
        Self {
            pointer_width: AddressWidth::W32,
            wide_char: WideCharWidth::Utf16,
        }
    }

    pub const fn x86_64() -> Self {
        Self {
            pointer_width: AddressWidth::W64,
            wide_char: WideCharWidth::Utf16,
        }
    }

    pub const fn linux_x86_64() -> Self {
        Self {
            pointer_width: AddressWidth::W64,
            wide_char: WideCharWidth::Utf32,
        }
    }

    pub fn with_pointer_width(mut self, width: AddressWidth) -> Self {
        self.pointer_width = width;
        self
    }

    pub fn with_wide_char(mut self, wide_char: WideCharWidth) -> Self {
        self.wide_char = wide_char;
        self
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self::x86_64()
    }
}
