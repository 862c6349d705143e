pub mod annotations;
pub mod detection;
pub mod error;
pub mod evaluation;
pub mod metrics;
pub mod models;

pub use annotations::AnnotationStore;
pub use detection::RectangleDetector;
pub use evaluation::{
    EvaluationRecord, Evaluator, MatchStrategy, ReportFormat, ReportSink, Status, Summary,
};
pub use metrics::{IouCanvas, iou};
pub use models::{DetectionResult, Point, Polygon, Quad, RotatedRect};
