//! Data sources - tabular CSV records and GeoJSON region features.
//!
//! All three sources load concurrently at startup; rendering only begins
//! once every one of them has succeeded. Field values stay raw strings so
//! numeric parsing happens at point of use: anything unparseable becomes
//! NaN, never zero.

use geo::{Geometry, MultiPolygon};
use geojson::GeoJson;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::Config;

/// Column in the tabular source (and property on each feature) holding the
/// join key.
pub const KEY_COLUMN: &str = "LABEL";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bad tabular data in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path:?} has no {KEY_COLUMN:?} column")]
    MissingKeyColumn { path: PathBuf },

    #[error("bad GeoJSON in {path:?}: {source}")]
    GeoJson {
        path: PathBuf,
        #[source]
        source: geojson::Error,
    },

    #[error("{path:?} is not a GeoJSON FeatureCollection")]
    NotAFeatureCollection { path: PathBuf },
}

/// A tabular row keyed by LABEL. Values are kept as the raw strings from
/// the source file.
#[derive(Debug, Clone)]
pub struct Record {
    pub label: String,
    pub fields: HashMap<String, String>,
}

impl Record {
    /// Numeric value of an attribute. NaN for missing or unparseable
    /// fields ("N/A", empty string, ...).
    pub fn value(&self, attribute: &str) -> f64 {
        self.fields
            .get(attribute)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(f64::NAN)
    }
}

/// A spatial feature keyed by LABEL, carrying the attribute values copied
/// in by the join.
#[derive(Debug, Clone)]
pub struct Region {
    pub label: String,
    pub geometry: MultiPolygon<f64>,
    pub values: HashMap<String, f64>,
}

impl Region {
    pub fn new(label: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            label: label.into(),
            geometry,
            values: HashMap::new(),
        }
    }

    /// Joined value of an attribute, NaN when the join left none.
    pub fn value(&self, attribute: &str) -> f64 {
        self.values.get(attribute).copied().unwrap_or(f64::NAN)
    }
}

/// Everything the coordinator needs, produced by the load barrier.
#[derive(Debug)]
pub struct LoadedData {
    pub records: Vec<Record>,
    pub regions: Vec<Region>,
    /// Background outline layer (state boundaries), drawn but never joined.
    pub boundary: Vec<MultiPolygon<f64>>,
}

/// Load all three sources concurrently. The first failure aborts the whole
/// load; no partial data ever escapes.
pub async fn load_all(config: &Config) -> Result<LoadedData, LoadError> {
    let (records, regions, boundary) = tokio::try_join!(
        read_records(&config.data.tabular),
        read_regions(&config.data.regions),
        read_boundary(&config.data.boundary),
    )?;

    tracing::info!(
        records = records.len(),
        regions = regions.len(),
        boundary = boundary.len(),
        "All data sources loaded"
    );

    Ok(LoadedData {
        records,
        regions,
        boundary,
    })
}

async fn read_records(path: &Path) -> Result<Vec<Record>, LoadError> {
    let text = read_text(path).await?;
    parse_records(&text).map_err(|source| match source {
        RecordsError::Csv(source) => LoadError::Csv {
            path: path.to_path_buf(),
            source,
        },
        RecordsError::MissingKeyColumn => LoadError::MissingKeyColumn {
            path: path.to_path_buf(),
        },
    })
}

async fn read_regions(path: &Path) -> Result<Vec<Region>, LoadError> {
    let text = read_text(path).await?;
    let features = parse_features(&text, path)?;

    let mut regions = Vec::with_capacity(features.len());
    for (label, geometry) in features {
        match label {
            Some(label) => regions.push(Region::new(label, geometry)),
            None => warn!("Region feature without a {} property, skipped", KEY_COLUMN),
        }
    }
    Ok(regions)
}

async fn read_boundary(path: &Path) -> Result<Vec<MultiPolygon<f64>>, LoadError> {
    let text = read_text(path).await?;
    let features = parse_features(&text, path)?;
    Ok(features.into_iter().map(|(_, geometry)| geometry).collect())
}

async fn read_text(path: &Path) -> Result<String, LoadError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

enum RecordsError {
    Csv(csv::Error),
    MissingKeyColumn,
}

impl From<csv::Error> for RecordsError {
    fn from(e: csv::Error) -> Self {
        RecordsError::Csv(e)
    }
}

fn parse_records(text: &str) -> Result<Vec<Record>, RecordsError> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let key_index = headers
        .iter()
        .position(|h| h == KEY_COLUMN)
        .ok_or(RecordsError::MissingKeyColumn)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let label = match row.get(key_index) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => {
                warn!("Tabular row without a {} value, skipped", KEY_COLUMN);
                continue;
            }
        };
        let fields = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        records.push(Record { label, fields });
    }
    Ok(records)
}

/// Parse a FeatureCollection into (LABEL, areal geometry) pairs. Features
/// with non-areal geometry are skipped with a warning.
fn parse_features(
    text: &str,
    path: &Path,
) -> Result<Vec<(Option<String>, MultiPolygon<f64>)>, LoadError> {
    let geojson: GeoJson = text.parse().map_err(|source| LoadError::GeoJson {
        path: path.to_path_buf(),
        source,
    })?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(LoadError::NotAFeatureCollection {
                path: path.to_path_buf(),
            })
        }
    };

    let mut features = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let label = feature
            .properties
            .as_ref()
            .and_then(|p| p.get(KEY_COLUMN))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let Some(gj) = feature.geometry else {
            warn!("Feature without geometry, skipped");
            continue;
        };
        let geometry: Geometry<f64> = match gj.value.try_into() {
            Ok(g) => g,
            Err(e) => {
                warn!("Unsupported feature geometry, skipped: {}", e);
                continue;
            }
        };
        let multi = match geometry {
            Geometry::Polygon(p) => p.into(),
            Geometry::MultiPolygon(m) => m,
            other => {
                warn!("Non-areal geometry {:?}, skipped", kind_of(&other));
                continue;
            }
        };
        features.push((label, multi));
    }
    Ok(features)
}

fn kind_of(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) => "areal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
LABEL,Employment,Unemployment
Denver,123.4,8
Boulder,N/A,
";

    #[test]
    fn parse_records_keeps_raw_fields() {
        let records = parse_records(CSV).unwrap_or_else(|_| panic!("parse failed"));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label, "Denver");
        assert_eq!(records[0].value("Employment"), 123.4);
        assert_eq!(records[1].fields["Employment"], "N/A");
    }

    #[test]
    fn unparseable_value_is_nan_not_zero() {
        let records = parse_records(CSV).unwrap_or_else(|_| panic!("parse failed"));
        assert!(records[1].value("Employment").is_nan());
        assert!(records[1].value("Unemployment").is_nan());
        assert!(records[0].value("No Such Column").is_nan());
    }

    #[test]
    fn missing_key_column_is_an_error() {
        let result = parse_records("Name,Employment\nDenver,1\n");
        assert!(matches!(result, Err(RecordsError::MissingKeyColumn)));
    }

    #[test]
    fn parse_features_reads_labels_and_geometry() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"LABEL": "Denver"},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,1.0],[0.0,0.0]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}
                }
            ]
        }"#;
        let features = parse_features(text, Path::new("test.geojson")).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].0.as_deref(), Some("Denver"));
        assert_eq!(features[0].1 .0.len(), 1);
    }

    #[test]
    fn non_collection_geojson_is_an_error() {
        let text = r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#;
        let result = parse_features(text, Path::new("test.geojson"));
        assert!(matches!(
            result,
            Err(LoadError::NotAFeatureCollection { .. })
        ));
    }
}
