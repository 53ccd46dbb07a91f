use serde::{Deserialize, Serialize};

/// The fixed color vocabulary shared between detection and order records.
///
/// `Unknown` is a valid detection outcome, not an error: it means the mean
/// HSV of the garment fell outside every decision band and the pixel vote
/// was inconclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedColor {
    White,
    Black,
    Red,
    Orange,
    Blue,
    Yellow,
    Green,
    Unknown,
}

impl NamedColor {
    /// Every classifiable color, i.e. the set with an HSV box attached.
    /// `Unknown` is excluded: it has no box to threshold against.
    pub const CLASSIFIABLE: [NamedColor; 7] = [
        NamedColor::White,
        NamedColor::Black,
        NamedColor::Red,
        NamedColor::Orange,
        NamedColor::Blue,
        NamedColor::Yellow,
        NamedColor::Green,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NamedColor::White => "white",
            NamedColor::Black => "black",
            NamedColor::Red => "red",
            NamedColor::Orange => "orange",
            NamedColor::Blue => "blue",
            NamedColor::Yellow => "yellow",
            NamedColor::Green => "green",
            NamedColor::Unknown => "unknown",
        }
    }

    /// Case-insensitive parse of the color strings the order API sends.
    pub fn parse(s: &str) -> Option<NamedColor> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Some(NamedColor::White),
            "black" => Some(NamedColor::Black),
            "red" => Some(NamedColor::Red),
            "orange" => Some(NamedColor::Orange),
            "blue" => Some(NamedColor::Blue),
            "yellow" => Some(NamedColor::Yellow),
            "green" => Some(NamedColor::Green),
            "unknown" => Some(NamedColor::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for NamedColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
