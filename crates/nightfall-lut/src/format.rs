//! LUT file format tags.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{LutError, LutResult};

/// Text LUT formats understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LutFormat {
    /// Adobe/Resolve `.cube`, values in `[0, 1]`.
    Cube,
    /// Lustre/Flame `.3dl`, integer values with explicit breakpoints.
    ThreeDl,
}

impl LutFormat {
    /// Detects the format from a file extension (case-insensitive).
    ///
    /// There is no fallback: anything other than `.cube` or `.3dl` is
    /// rejected.
    pub fn from_path<P: AsRef<Path>>(path: P) -> LutResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                LutError::UnsupportedFormat(format!("{} has no extension", path.display()))
            })?;
        ext.parse()
    }

    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Cube => "cube",
            Self::ThreeDl => "3dl",
        }
    }
}

impl FromStr for LutFormat {
    type Err = LutError;

    fn from_str(s: &str) -> LutResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cube" => Ok(Self::Cube),
            "3dl" => Ok(Self::ThreeDl),
            other => Err(LutError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LutFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cube => f.write_str("CUBE"),
            Self::ThreeDl => f.write_str("3DL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_from_extension() {
        assert_eq!(LutFormat::from_path("sunset.cube").unwrap(), LutFormat::Cube);
        assert_eq!(LutFormat::from_path("luts/NIGHT.CUBE").unwrap(), LutFormat::Cube);
        assert_eq!(LutFormat::from_path("night.3DL").unwrap(), LutFormat::ThreeDl);
    }

    #[test]
    fn reject_unknown_extension() {
        assert!(matches!(
            LutFormat::from_path("grade.clf"),
            Err(LutError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            LutFormat::from_path("noext"),
            Err(LutError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn parse_tag() {
        assert_eq!("CUBE".parse::<LutFormat>().unwrap(), LutFormat::Cube);
        assert_eq!("3dl".parse::<LutFormat>().unwrap(), LutFormat::ThreeDl);
        assert!("spi3d".parse::<LutFormat>().is_err());
        assert_eq!(LutFormat::ThreeDl.to_string(), "3DL");
    }
}
