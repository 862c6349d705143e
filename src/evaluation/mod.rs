//! Batch evaluation: detect a rectangle per image, score it against ground truth and
//! hand one record per image to a report sink.

pub mod overlay;
pub mod report;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures::{StreamExt, stream};
use image::{DynamicImage, ImageReader};
use log::{debug, warn};
use serde::Serialize;
use tokio::task::JoinError;

use crate::annotations::AnnotationStore;
use crate::detection::RectangleDetector;
use crate::error::ImageLoadError;
use crate::metrics::IouCanvas;
use crate::models::{Polygon, Quad};

pub use overlay::OverlayWriter;
pub use report::{JsonLinesReport, ReportFormat, ReportSink, TextReport};

/// Lower-case extensions treated as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp"];

/// List the images directly inside `dir`, sorted by path.
pub fn collect_images<P: AsRef<Path>>(dir: P) -> anyhow::Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut images = Vec::new();

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("cannot read image directory {}", dir.display()))?
    {
        let path = entry?.path();
        let recognized = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if recognized && path.is_file() {
            images.push(path);
        }
    }

    images.sort();
    Ok(images)
}

/// Ground-truth lookup key: the file name, cut right after the first recognized image
/// extension (`scan.jpg123` -> `scan.jpg`).
pub fn image_key(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lower = name.to_ascii_lowercase();

    let cut = IMAGE_EXTENSIONS
        .iter()
        .filter_map(|ext| {
            let needle = format!(".{ext}");
            lower.find(&needle).map(|pos| (pos, pos + needle.len()))
        })
        .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    match cut {
        Some((_, end)) => name[..end].to_string(),
        None => name,
    }
}

pub fn load_image(path: &Path) -> Result<DynamicImage, ImageLoadError> {
    let open_err = |source: std::io::Error| ImageLoadError::Open {
        path: path.to_path_buf(),
        source,
    };
    ImageReader::open(path)
        .map_err(open_err)?
        .with_guessed_format()
        .map_err(open_err)?
        .decode()
        .map_err(|source| ImageLoadError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

/// How a detection is compared with an image's ground-truth regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MatchStrategy {
    /// Score against the first annotated region only.
    #[default]
    First,
    /// Score against every region and keep the best IoU.
    Best,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Scored,
    NoGroundTruth,
    NoRectangle,
    LoadFailed,
    TimedOut,
    Failed,
}

/// Outcome for one image.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRecord {
    pub path: PathBuf,
    pub key: String,
    pub iou: f64,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<Quad>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<Polygon>,
}

impl EvaluationRecord {
    fn unscored(path: &Path, status: Status, note: Option<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            key: image_key(path),
            iou: 0.0,
            status,
            note,
            detection: None,
            ground_truth: None,
        }
    }

    pub fn load_failed(path: &Path, reason: impl Into<String>) -> Self {
        Self::unscored(path, Status::LoadFailed, Some(reason.into()))
    }

    pub fn timed_out(path: &Path, limit: Duration) -> Self {
        Self::unscored(
            path,
            Status::TimedOut,
            Some(format!("exceeded {:.1}s", limit.as_secs_f64())),
        )
    }

    pub fn failed(path: &Path, reason: impl Into<String>) -> Self {
        Self::unscored(path, Status::Failed, Some(reason.into()))
    }

    /// The line written to the plain-text report.
    pub fn report_line(&self) -> String {
        let path = self.path.display();
        match self.status {
            Status::Scored => format!("Image: {path}, IoU: {:.4}", self.iou),
            Status::NoGroundTruth => {
                format!("Image: {path}, IoU: {:.4} (no ground truth)", self.iou)
            }
            Status::NoRectangle => format!("No rectangle found for: {path}"),
            Status::LoadFailed => format!("Cannot load image: {path}"),
            Status::TimedOut => format!("Timed out processing: {path}"),
            Status::Failed => format!("Processing failed for: {path}"),
        }
    }
}

/// Counts per status plus the mean IoU over scored images.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub scored: usize,
    pub no_ground_truth: usize,
    pub no_rectangle: usize,
    pub load_failed: usize,
    pub timed_out: usize,
    pub failed: usize,
    iou_sum: f64,
}

impl Summary {
    pub fn add(&mut self, record: &EvaluationRecord) {
        self.total += 1;
        match record.status {
            Status::Scored => {
                self.scored += 1;
                self.iou_sum += record.iou;
            }
            Status::NoGroundTruth => self.no_ground_truth += 1,
            Status::NoRectangle => self.no_rectangle += 1,
            Status::LoadFailed => self.load_failed += 1,
            Status::TimedOut => self.timed_out += 1,
            Status::Failed => self.failed += 1,
        }
    }

    pub fn mean_iou(&self) -> f64 {
        if self.scored == 0 {
            return 0.0;
        }
        self.iou_sum / self.scored as f64
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} images: {} scored (mean IoU {:.4}), {} without ground truth, {} without rectangle, {} unreadable",
            self.total,
            self.scored,
            self.mean_iou(),
            self.no_ground_truth,
            self.no_rectangle,
            self.load_failed,
        )?;
        if self.timed_out + self.failed > 0 {
            write!(f, ", {} timed out, {} failed", self.timed_out, self.failed)?;
        }
        Ok(())
    }
}

/// Drives detection and scoring over a list of images.
///
/// Cheap to clone: the annotation table and overlay writer are shared.
#[derive(Debug, Clone)]
pub struct Evaluator {
    detector: RectangleDetector,
    annotations: Arc<AnnotationStore>,
    canvas: IouCanvas,
    strategy: MatchStrategy,
    overlay: Option<Arc<OverlayWriter>>,
    jobs: usize,
    timeout: Option<Duration>,
}

impl Evaluator {
    pub fn new(annotations: Arc<AnnotationStore>) -> Self {
        Self {
            detector: RectangleDetector::default(),
            annotations,
            canvas: IouCanvas::default(),
            strategy: MatchStrategy::default(),
            overlay: None,
            jobs: 1,
            timeout: None,
        }
    }

    pub fn with_detector(mut self, detector: RectangleDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_canvas(mut self, canvas: IouCanvas) -> Self {
        self.canvas = canvas;
        self
    }

    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_overlay(mut self, overlay: OverlayWriter) -> Self {
        self.overlay = Some(Arc::new(overlay));
        self
    }

    /// Number of images processed at once; values below 1 mean 1.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load, detect and score a single image. Never fails: problems become the
    /// record's status.
    pub fn evaluate_path(&self, path: &Path) -> EvaluationRecord {
        debug!("processing image: {}", path.display());
        match load_image(path) {
            Ok(img) => self.evaluate_image(path, &img),
            Err(e) => {
                warn!("{e}");
                EvaluationRecord::load_failed(path, e.to_string())
            }
        }
    }

    /// Detect and score an already decoded image.
    pub fn evaluate_image(&self, path: &Path, img: &DynamicImage) -> EvaluationRecord {
        let key = image_key(path);
        let truths = self.annotations.get(&key).unwrap_or(&[]);
        if truths.is_empty() {
            debug!("no ground truth for: {key}");
        }

        let detection = self.detector.detect(img);
        let (status, iou, ground_truth) = match &detection {
            None => (Status::NoRectangle, 0.0, truths.first().cloned()),
            Some(quad) => match self.score(quad, truths) {
                Some((iou, gt)) => (Status::Scored, iou, Some(gt.clone())),
                None => (Status::NoGroundTruth, 0.0, None),
            },
        };

        let record = EvaluationRecord {
            path: path.to_path_buf(),
            key,
            iou,
            status,
            note: None,
            detection,
            ground_truth,
        };

        if let Some(overlay) = &self.overlay {
            if let Err(e) = overlay.write(img, &record) {
                warn!("overlay for {} not written: {e:#}", path.display());
            }
        }

        record
    }

    fn score<'a>(&self, quad: &Quad, truths: &'a [Polygon]) -> Option<(f64, &'a Polygon)> {
        let detected = quad.to_polygon();
        match self.strategy {
            MatchStrategy::First => truths
                .first()
                .map(|gt| (self.canvas.iou(&detected, gt), gt)),
            MatchStrategy::Best => truths
                .iter()
                .map(|gt| (self.canvas.iou(&detected, gt), gt))
                .fold(None, |best: Option<(f64, &Polygon)>, candidate| match best {
                    Some(b) if b.0 >= candidate.0 => Some(b),
                    _ => Some(candidate),
                }),
        }
    }

    /// Evaluate every image and write the records to `sink` in input order.
    ///
    /// Up to `jobs` images run concurrently on blocking worker threads. A panic or
    /// timeout on one image is recorded and the batch moves on.
    pub async fn run(
        &self,
        images: Vec<PathBuf>,
        sink: &mut dyn ReportSink,
    ) -> anyhow::Result<Summary> {
        let mut summary = Summary::default();
        let mut records = stream::iter(images)
            .map(|path| self.spawn_one(path))
            .buffered(self.jobs);

        while let Some(record) = records.next().await {
            sink.write_record(&record)?;
            summary.add(&record);
        }
        sink.finish()?;

        Ok(summary)
    }

    async fn spawn_one(&self, path: PathBuf) -> EvaluationRecord {
        let evaluator = self.clone();
        let task_path = path.clone();
        let task = tokio::task::spawn_blocking(move || evaluator.evaluate_path(&task_path));

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("timed out processing: {}", path.display());
                    return EvaluationRecord::timed_out(&path, limit);
                }
            },
            None => task.await,
        };

        record_from_join(&path, joined)
    }
}

/// A panic inside the blocking task becomes a `Failed` record for that image.
fn record_from_join(
    path: &Path,
    joined: Result<EvaluationRecord, JoinError>,
) -> EvaluationRecord {
    joined.unwrap_or_else(|e| {
        warn!("processing {} failed: {e}", path.display());
        EvaluationRecord::failed(path, e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_strips_directories_and_trailing_suffix() {
        assert_eq!(image_key(Path::new("/data/img1.jpg")), "img1.jpg");
        assert_eq!(image_key(Path::new("scan.jpg12345")), "scan.jpg");
        assert_eq!(image_key(Path::new("Photo.JPEG")), "Photo.JPEG");
        assert_eq!(image_key(Path::new("page.tiff")), "page.tiff");
        assert_eq!(image_key(Path::new("notes.txt")), "notes.txt");
    }

    #[test]
    fn report_lines() {
        let path = Path::new("imgs/a.jpg");
        let mut record = EvaluationRecord::load_failed(path, "bad");
        assert_eq!(record.report_line(), "Cannot load image: imgs/a.jpg");

        record.status = Status::Scored;
        record.iou = 0.91234;
        assert_eq!(record.report_line(), "Image: imgs/a.jpg, IoU: 0.9123");

        record.status = Status::NoGroundTruth;
        record.iou = 0.0;
        assert_eq!(
            record.report_line(),
            "Image: imgs/a.jpg, IoU: 0.0000 (no ground truth)"
        );

        record.status = Status::NoRectangle;
        assert_eq!(record.report_line(), "No rectangle found for: imgs/a.jpg");
    }

    #[test]
    fn summary_mean_ignores_unscored() {
        let path = Path::new("x.png");
        let mut summary = Summary::default();
        let mut scored = EvaluationRecord::failed(path, "");
        scored.status = Status::Scored;
        scored.iou = 0.5;
        summary.add(&scored);
        scored.iou = 1.0;
        summary.add(&scored);
        summary.add(&EvaluationRecord::load_failed(path, "nope"));

        assert_eq!(summary.total, 3);
        assert_eq!(summary.load_failed, 1);
        assert!((summary.mean_iou() - 0.75).abs() < 1e-12);
        assert_eq!(Summary::default().mean_iou(), 0.0);
    }

    #[tokio::test]
    async fn panicking_task_is_reported_as_failed() {
        let path = Path::new("imgs/crash.png");
        let joined = tokio::task::spawn_blocking(|| -> EvaluationRecord {
            panic!("decoder blew up");
        })
        .await;
        assert!(joined.is_err());

        let record = record_from_join(path, joined);
        assert_eq!(record.status, Status::Failed);
        assert_eq!(record.iou, 0.0);
        assert!(record.note.as_deref().is_some_and(|n| n.contains("panic")));
        assert_eq!(record.report_line(), "Processing failed for: imgs/crash.png");

        let mut summary = Summary::default();
        summary.add(&record);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn finished_task_passes_through() {
        let path = PathBuf::from("imgs/ok.png");
        let task_path = path.clone();
        let joined = tokio::task::spawn_blocking(move || {
            EvaluationRecord::load_failed(&task_path, "unreadable")
        })
        .await;
        assert_eq!(record_from_join(&path, joined).status, Status::LoadFailed);
    }
}
