use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// A spatial reference system identified by its EPSG code.
///
/// Accepts the spellings that show up in GeoJSON and web APIs:
/// `EPSG:4326`, `urn:ogc:def:crs:EPSG::4326`, `urn:ogc:def:crs:OGC:1.3:CRS84`
/// and `CRS84`. CRS84 is stored as 4326; coordinates are always handled
/// in (lon, lat) order internally so the axis-order difference is moot.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Srs(pub u32);

/// WGS84 geographic
pub const WGS84: Srs = Srs(4326);

#[derive(Debug, PartialEq, Eq, Clone, Error)]
#[error("unrecognised spatial reference system name: {0:?}")]
pub struct SrsParseError(pub String);

impl Srs {
    pub fn epsg(&self) -> u32 {
        self.0
    }
}

impl FromStr for Srs {
    type Err = SrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lowered = trimmed.to_lowercase();
        if lowered == "crs84" || lowered.ends_with(":crs84") {
            return Ok(WGS84);
        }
        // "epsg:4326", "urn:ogc:def:crs:epsg::4326", "urn:ogc:def:crs:epsg:9.9.1:4326"
        let code = match lowered.rfind("epsg") {
            Some(idx) => lowered[idx + 4..].rsplit(':').next().unwrap_or(""),
            None => lowered.as_str(),
        };
        code.parse::<u32>()
            .map(Srs)
            .map_err(|_| SrsParseError(trimmed.to_string()))
    }
}

impl TryFrom<String> for Srs {
    type Error = SrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Srs> for String {
    fn from(value: Srs) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for Srs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spellings() {
        assert_eq!("EPSG:4326".parse::<Srs>().unwrap(), WGS84);
        assert_eq!("epsg:3006".parse::<Srs>().unwrap(), Srs(3006));
        assert_eq!(
            "urn:ogc:def:crs:EPSG::3310".parse::<Srs>().unwrap(),
            Srs(3310)
        );
        assert_eq!(
            "urn:ogc:def:crs:OGC:1.3:CRS84".parse::<Srs>().unwrap(),
            WGS84
        );
        assert_eq!("CRS84".parse::<Srs>().unwrap(), WGS84);
        assert_eq!("32610".parse::<Srs>().unwrap(), Srs(32610));
    }

    #[test]
    fn test_parse_garbage() {
        assert!("".parse::<Srs>().is_err());
        assert!("EPSG:".parse::<Srs>().is_err());
        assert!("web mercator".parse::<Srs>().is_err());
    }

    #[test]
    fn test_parse_error_message() {
        let err = "web mercator".parse::<Srs>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unrecognised spatial reference system name: \"web mercator\""
        );
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn test_display_round_trip() {
        let name = String::from(Srs(5070));
        assert_eq!(name, "EPSG:5070");
        assert_eq!(Srs::try_from(name).unwrap(), Srs(5070));
    }
}
