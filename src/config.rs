//! Compilation-wide settings shared read-only by the parser, every pass and
//! the code generator.

/// ConfigError represents a rejected configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported cell size: {0} (expected 8, 16 or 32)")]
    UnsupportedCellSize(u32),
}

/// The width of a single memory cell.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CellSize {
    #[default]
    Bits8,
    Bits16,
    Bits32,
}

impl CellSize {
    pub const fn bits(&self) -> u32 {
        match self {
            Self::Bits8 => 8,
            Self::Bits16 => 16,
            Self::Bits32 => 32,
        }
    }

    /// Returns the mask that reduces any value to the cell's width.
    pub const fn mask(&self) -> u64 {
        (1u64 << self.bits()) - 1
    }

    /// Reduces a signed value to its canonical, non-negative representation
    /// in a cell of this width.
    pub const fn wrap(&self, value: i64) -> i64 {
        (value as u64 & self.mask()) as i64
    }

    /// Returns the C type used to store a cell of this width.
    pub const fn c_type(&self) -> &'static str {
        match self {
            Self::Bits8 => "uint8_t",
            Self::Bits16 => "uint16_t",
            Self::Bits32 => "uint32_t",
        }
    }
}

impl TryFrom<u32> for CellSize {
    type Error = ConfigError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(Self::Bits8),
            16 => Ok(Self::Bits16),
            32 => Ok(Self::Bits32),
            other => Err(ConfigError::UnsupportedCellSize(other)),
        }
    }
}

impl std::fmt::Display for CellSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Config is immutable once constructed and handed out by reference.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    cell_size: CellSize,
    debugging: bool,
}

impl Config {
    pub const fn new(cell_size: CellSize, debugging: bool) -> Self {
        Self {
            cell_size,
            debugging,
        }
    }

    pub const fn cell_size(&self) -> CellSize {
        self.cell_size
    }

    /// Whether collaborators should produce more verbose output.
    pub const fn debugging(&self) -> bool {
        self.debugging
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_only_supported_cell_sizes() {
        assert_eq!(Ok(CellSize::Bits8), CellSize::try_from(8));
        assert_eq!(Ok(CellSize::Bits16), CellSize::try_from(16));
        assert_eq!(Ok(CellSize::Bits32), CellSize::try_from(32));
        assert_eq!(
            Err(ConfigError::UnsupportedCellSize(64)),
            CellSize::try_from(64)
        );
    }

    #[test]
    fn should_wrap_values_to_cell_width() {
        assert_eq!(255, CellSize::Bits8.wrap(-1));
        assert_eq!(0, CellSize::Bits8.wrap(256));
        assert_eq!(65535, CellSize::Bits16.wrap(-1));
        assert_eq!(4294967295, CellSize::Bits32.wrap(-1));
        assert_eq!(7, CellSize::Bits32.wrap(7));
    }
}
