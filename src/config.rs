//! Configuration loader - YAML manifest describing datasets, attributes,
//! palette and classification settings.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// An RGB color, written as `#RRGGBB` in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn parse(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 {
            anyhow::bail!("expected #RRGGBB color, got '{}'", s);
        }
        let r = u8::from_str_radix(&hex[0..2], 16)?;
        let g = u8::from_str_radix(&hex[2..4], 16)?;
        let b = u8::from_str_radix(&hex[4..6], 16)?;
        Ok(Rgb(r, g, b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(s: String) -> Result<Self, String> {
        Rgb::parse(&s).map_err(|e| e.to_string())
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> String {
        c.to_string()
    }
}

/// Paths to the three data sources loaded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Delimited text, header row defines attribute column names.
    pub tabular: PathBuf,
    /// GeoJSON FeatureCollection of choropleth regions keyed by LABEL.
    pub regions: PathBuf,
    /// GeoJSON FeatureCollection drawn as a background outline layer.
    pub boundary: PathBuf,
}

/// Albers conic equal-area parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// [longitude, latitude] the projection is centered on.
    pub center: [f64; 2],
    /// Standard parallels, degrees latitude.
    pub parallels: [f64; 2],
}

/// Main configuration loaded from atlas.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataPaths,
    /// Ordered attribute set; defines the selectable dimensions and
    /// their dropdown order.
    pub attributes: Vec<String>,
    /// Ordered classification palette, darkest last.
    pub palette: Vec<Rgb>,
    /// Color for missing / unparseable values.
    pub no_data: Rgb,
    /// Number of natural-breaks classes.
    pub classes: usize,
    pub projection: ProjectionConfig,
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.attributes.is_empty() {
            anyhow::bail!("config: attribute set is empty");
        }
        if self.palette.is_empty() {
            anyhow::bail!("config: palette is empty");
        }
        if self.classes < 1 || self.classes > self.palette.len() {
            anyhow::bail!(
                "config: classes must be between 1 and palette size ({})",
                self.palette.len()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_color() {
        assert_eq!(Rgb::parse("#91C4D9").unwrap(), Rgb(0x91, 0xC4, 0xD9));
        assert_eq!(Rgb::parse("ccc000").unwrap(), Rgb(0xCC, 0xC0, 0x00));
        assert!(Rgb::parse("#91C4").is_err());
        assert!(Rgb::parse("#91C4ZZ").is_err());
    }

    #[test]
    fn hex_color_round_trips() {
        let c = Rgb(0x0A, 0x31, 0x40);
        assert_eq!(Rgb::parse(&c.to_string()).unwrap(), c);
    }

    #[test]
    fn validate_rejects_bad_class_count() {
        let mut config = crate::default_config();
        config.classes = config.palette.len() + 1;
        assert!(config.validate().is_err());
        config.classes = 0;
        assert!(config.validate().is_err());
        config.classes = config.palette.len();
        assert!(config.validate().is_ok());
    }
}
