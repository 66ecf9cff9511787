use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of block template families published by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockType {
    Tone,
    Style,
    Formatting,
    Complexity,
    Length,
    OutputType,
    ResponseGoal,
    AudienceLevel,
}

impl BlockType {
    pub const ALL: [BlockType; 8] = [
        BlockType::Tone,
        BlockType::Style,
        BlockType::Formatting,
        BlockType::Complexity,
        BlockType::Length,
        BlockType::OutputType,
        BlockType::ResponseGoal,
        BlockType::AudienceLevel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Tone => "tone",
            BlockType::Style => "style",
            BlockType::Formatting => "formatting",
            BlockType::Complexity => "complexity",
            BlockType::Length => "length",
            BlockType::OutputType => "outputType",
            BlockType::ResponseGoal => "responseGoal",
            BlockType::AudienceLevel => "audienceLevel",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBlockType(pub String);

impl fmt::Display for UnknownBlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown block template type `{}`", self.0)
    }
}

impl std::error::Error for UnknownBlockType {}

impl FromStr for BlockType {
    type Err = UnknownBlockType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownBlockType(s.to_string()))
    }
}
