//! Build variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named build configuration.
///
/// The variant is selected once per build invocation and decides which
/// `build/<variant>` and `export/<variant>` trees the build writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Debug,
    Release,
}

impl Variant {
    /// Select the variant from the release switch.
    pub fn from_release(release: bool) -> Self {
        if release {
            Variant::Release
        } else {
            Variant::Debug
        }
    }

    /// The output subdirectory name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Debug => "debug",
            Variant::Release => "release",
        }
    }

    /// All variants, in a stable order.
    pub fn all() -> [Variant; 2] {
        [Variant::Debug, Variant::Release]
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Variant::Debug),
            "release" => Ok(Variant::Release),
            _ => Err(format!(
                "invalid variant '{}'; expected 'debug' or 'release'",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_release_switch() {
        assert_eq!(Variant::from_release(false), Variant::Debug);
        assert_eq!(Variant::from_release(true), Variant::Release);
        assert_eq!(Variant::default(), Variant::Debug);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Release".parse::<Variant>().unwrap(), Variant::Release);
        assert!("profile".parse::<Variant>().is_err());
    }
}
