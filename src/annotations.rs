//! Ground-truth polygons from a VGG Image Annotator (VIA) export.
//!
//! Bad regions are skipped with a warning; only a file that cannot be read or is not
//! JSON at all fails the load.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AnnotationError, RegionError};
use crate::models::{Point, Polygon};

/// Shape attributes of one VIA region.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShapeAttributes {
    pub name: Option<String>,
    pub all_points_x: Option<Vec<f64>>,
    pub all_points_y: Option<Vec<f64>>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl ShapeAttributes {
    /// Zip the coordinate arrays pairwise, in array order. Rectangles become their
    /// four corners.
    pub fn to_polygon(&self) -> Result<Polygon, RegionError> {
        match (&self.all_points_x, &self.all_points_y) {
            (Some(xs), Some(ys)) => {
                if xs.len() != ys.len() {
                    return Err(RegionError::MismatchedLengths {
                        x: xs.len(),
                        y: ys.len(),
                    });
                }
                if xs.len() < 3 {
                    return Err(RegionError::TooFewPoints(xs.len()));
                }
                let points = xs
                    .iter()
                    .zip(ys.iter())
                    .map(|(&x, &y)| Point::new(x, y))
                    .collect();
                Ok(Polygon::new(points))
            }
            (Some(xs), None) => Err(RegionError::MismatchedLengths { x: xs.len(), y: 0 }),
            (None, Some(ys)) => Err(RegionError::MismatchedLengths { x: 0, y: ys.len() }),
            (None, None) => self.rect_polygon(),
        }
    }

    fn rect_polygon(&self) -> Result<Polygon, RegionError> {
        match (self.name.as_deref(), self.x, self.y, self.width, self.height) {
            (Some("rect"), Some(x), Some(y), Some(w), Some(h)) => Ok(Polygon::from(vec![
                (x, y),
                (x + w, y),
                (x + w, y + h),
                (x, y + h),
            ])),
            (Some(name), ..) if name != "rect" && name != "polygon" && name != "polyline" => {
                Err(RegionError::UnsupportedShape(name.to_string()))
            }
            _ => Err(RegionError::MissingShape),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Region {
    #[serde(alias = "shape")]
    pub shape_attributes: Option<ShapeAttributes>,
}

impl Region {
    pub fn to_polygon(&self) -> Result<Polygon, RegionError> {
        self.shape_attributes
            .as_ref()
            .ok_or(RegionError::MissingShape)?
            .to_polygon()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Entry {
    filename: String,
    #[serde(default)]
    regions: Value,
}

/// Image file name -> ground-truth polygons, in the order they were annotated.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    polygons: HashMap<String, Vec<Polygon>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AnnotationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| AnnotationError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|source| AnnotationError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_value(&value))
    }

    /// Like [`AnnotationStore::load`], but degrades to an empty store with a warning.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(store) => store,
            Err(e) => {
                warn!("{e}; continuing without ground truth");
                Self::default()
            }
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }

    /// Build from a parsed document: either an object of entries (VIA project
    /// layout) or an array of entries.
    pub fn from_value(value: &Value) -> Self {
        let mut store = Self::default();

        let entries: Vec<&Value> = match value {
            Value::Object(map) => map.values().collect(),
            Value::Array(items) => items.iter().collect(),
            _ => {
                warn!("annotation document is neither an object nor an array");
                Vec::new()
            }
        };

        for (entry_index, raw) in entries.into_iter().enumerate() {
            let entry: Entry = match Entry::deserialize(raw) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping annotation entry {entry_index}: {e}");
                    continue;
                }
            };

            let regions: Vec<&Value> = match &entry.regions {
                Value::Array(items) => items.iter().collect(),
                Value::Object(map) => map.values().collect(),
                Value::Null => Vec::new(),
                _ => {
                    warn!("skipping {}: regions is not a list", entry.filename);
                    continue;
                }
            };

            for (region_index, raw_region) in regions.into_iter().enumerate() {
                let polygon = Region::deserialize(raw_region)
                    .map_err(|e| e.to_string())
                    .and_then(|region| region.to_polygon().map_err(|e| e.to_string()));
                match polygon {
                    Ok(polygon) => store.insert(&entry.filename, polygon),
                    Err(e) => warn!(
                        "skipping region {region_index} of {}: {e}",
                        entry.filename
                    ),
                }
            }
        }

        debug!("loaded ground truth for {} images", store.len());
        store
    }

    /// Append a polygon to the list for `key`.
    pub fn insert(&mut self, key: &str, polygon: Polygon) {
        self.polygons.entry(key.to_string()).or_default().push(polygon);
    }

    pub fn get(&self, key: &str) -> Option<&[Polygon]> {
        self.polygons.get(key).map(Vec::as_slice)
    }

    pub fn first(&self, key: &str) -> Option<&Polygon> {
        self.get(key).and_then(|polygons| polygons.first())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.polygons.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Keys in lexicographic order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.polygons.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
