use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 1-based round number.
///
/// Records are keyed by the decimal label ("1", "2", ... "10"); ordering always goes
/// through the number so that "10" sorts after "9".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoundKey(u32);

impl RoundKey {
    /// Create a round key; round numbers start at 1
    pub fn new(number: u32) -> Option<Self> {
        (number >= 1).then_some(Self(number))
    }

    pub fn number(&self) -> u32 {
        self.0
    }

    /// Label used as the record key
    pub fn label(&self) -> String {
        self.0.to_string()
    }

    /// Label used on chart axes ("R3")
    pub fn chart_label(&self) -> String {
        format!("R{}", self.0)
    }

    /// Parse a record key. Only canonical decimal labels are accepted, so "07" is
    /// rejected and every round has exactly one label.
    pub fn parse(label: &str) -> Option<Self> {
        if label.is_empty() || label.starts_with('0') || !label.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        label.parse().ok().and_then(Self::new)
    }
}

impl fmt::Display for RoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoundKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid round label: {s:?}"))
    }
}

impl Serialize for RoundKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RoundKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(de::Error::custom)
    }
}
