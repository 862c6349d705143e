use std::path::PathBuf;

use thiserror::Error;

/// Failure to read the annotation file as a whole.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("unable to open annotation file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse annotation file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A single region that cannot be turned into a polygon.
#[derive(Debug, Error, PartialEq)]
pub enum RegionError {
    #[error("all_points_x has {x} values but all_points_y has {y}")]
    MismatchedLengths { x: usize, y: usize },

    #[error("polygon needs at least 3 points, got {0}")]
    TooFewPoints(usize),

    #[error("region has no shape attributes")]
    MissingShape,

    #[error("unsupported shape {0:?}")]
    UnsupportedShape(String),
}

#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
