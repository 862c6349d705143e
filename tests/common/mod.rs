mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from quadeval for tests
pub use quadeval::evaluation::{TextReport, collect_images};
pub use quadeval::{
    AnnotationStore, EvaluationRecord, Evaluator, IouCanvas, MatchStrategy, Point, Polygon,
    RectangleDetector, Status, iou,
};
