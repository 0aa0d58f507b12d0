use std::path::{Path, PathBuf};
use log::{error, info};
use crate::config::{FailurePolicy, RunConfig};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::provenance::MetadataWriter;
use crate::request::GenerationRequest;
use crate::scheduler::SchedulerFactory;
use crate::seed::SeedController;

#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Complete,
    Failed(String),
}

impl RunStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    pub fn icon(&self) -> &str {
        match self {
            Self::Complete => "✅",
            Self::Failed(_) => "❌",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub index: u32,
    pub output: PathBuf,
    pub status: RunStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub runs: Vec<RunOutcome>,
}

impl BatchReport {
    pub fn failed(&self) -> impl Iterator<Item = &RunOutcome> {
        self.runs.iter().filter(|r| !r.status.is_complete())
    }

    pub fn completed(&self) -> usize {
        self.runs.iter().filter(|r| r.status.is_complete()).count()
    }
}

/// Output path for run `index` of a batch of `count`.
///
/// A single run writes to `base` as given. Batched runs get `_<index>`
/// appended to the file stem and always end in `.png`; parent directories
/// are never touched. A base without a file name cannot be numbered.
pub fn output_path_for(base: &Path, index: u32, count: u32) -> Result<PathBuf> {
    if count <= 1 {
        return Ok(base.to_path_buf());
    }

    let stem = base.file_stem().ok_or_else(|| {
        Error::Configuration(format!(
            "output '{}' has no file name to number batch runs from",
            base.display()
        ))
    })?;
    let name = format!("{}_{}.png", stem.to_string_lossy(), index);

    Ok(match base.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    })
}

/// Drives the runs of a batch one after another
pub struct BatchRunner<E: Engine> {
    engine: E,
    on_start: Option<Box<dyn FnMut(u32, &Path)>>,
}

impl<E: Engine> BatchRunner<E> {
    pub fn new(engine: E) -> Self {
        Self { engine, on_start: None }
    }

    /// Called with the index and output path before each run begins
    pub fn on_run_start(mut self, callback: impl FnMut(u32, &Path) + 'static) -> Self {
        self.on_start = Some(Box::new(callback));
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn run(&mut self, config: &RunConfig) -> Result<BatchReport> {
        config.validate()?;
        // Bad scheduler settings fail every run alike, so stop before the first one
        SchedulerFactory::build(config)?;

        let count = config.run_count();
        output_path_for(&config.output, 1, count)?;
        let mut report = BatchReport::default();

        info!(
            "Starting {} run(s) in {} mode on {}",
            count,
            config.mode().id(),
            self.engine.name()
        );

        for index in 1..=count {
            let output = output_path_for(&config.output, index, count)?;
            if let Some(callback) = self.on_start.as_mut() {
                callback(index, &output);
            }

            let status = match self.run_once(config, &output) {
                Ok(()) => RunStatus::Complete,
                Err(e) => match config.failure_policy {
                    FailurePolicy::AbortOnFirstFailure => return Err(e),
                    FailurePolicy::ContinueAndReport => {
                        error!("Run {} of {} failed: {}", index, count, e);
                        RunStatus::Failed(e.to_string())
                    }
                },
            };
            report.runs.push(RunOutcome { index, output, status });
        }

        let indices: Vec<u32> = report.failed().map(|r| r.index).collect();
        if !indices.is_empty() {
            return Err(Error::BatchFailed {
                failed: indices.len(),
                total: count as usize,
                indices,
            });
        }

        Ok(report)
    }

    fn run_once(&mut self, config: &RunConfig, output: &Path) -> Result<()> {
        let mut generator = SeedController::apply(config.seed);
        let scheduler = SchedulerFactory::build(config)?;
        let request = GenerationRequest::build(config, scheduler)?;
        let result = self.engine.invoke(request, &mut generator)?;
        MetadataWriter::embed_and_save(result, config, output)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use rand::Rng;
    use crate::config::Mode;
    use crate::engine::GenerationResult;
    use crate::pixels::{BgrImage, OUTPUT_SIZE};
    use crate::scheduler::{SchedulerKind, SchedulerSpec};
    use crate::seed::GeneratorHandle;
    use super::*;

    #[derive(Debug, Clone)]
    struct Seen {
        mode: Mode,
        scheduler: SchedulerSpec,
        first_draw: u64,
    }

    /// Records every request and fails on the listed call numbers
    #[derive(Default)]
    struct MockEngine {
        seen: Vec<Seen>,
        fail_on: Vec<usize>,
    }

    impl Engine for MockEngine {
        fn name(&self) -> &str {
            "mock"
        }

        fn invoke(
            &mut self,
            request: GenerationRequest,
            generator: &mut GeneratorHandle,
        ) -> Result<GenerationResult> {
            self.seen.push(Seen {
                mode: request.mode(),
                scheduler: request.scheduler.clone(),
                first_draw: generator.r#gen(),
            });
            if self.fail_on.contains(&self.seen.len()) {
                return Err(Error::Engine("device lost".to_string()));
            }
            let data = vec![0; (OUTPUT_SIZE * OUTPUT_SIZE * 3) as usize];
            GenerationResult::new(BgrImage::new(OUTPUT_SIZE, OUTPUT_SIZE, data)?)
        }
    }

    fn config_in(dir: &Path) -> RunConfig {
        RunConfig {
            prompt: "a red cube".into(),
            seed: Some(42),
            num_inference_steps: 10,
            output: dir.join("out.png"),
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_output_path_single_run_unmodified() {
        for count in [0, 1] {
            assert_eq!(output_path_for(Path::new("out.png"), 1, count).unwrap(), PathBuf::from("out.png"));
            assert_eq!(output_path_for(Path::new("weird.png.png"), 1, count).unwrap(), PathBuf::from("weird.png.png"));
        }
    }

    #[test]
    fn test_output_path_batched() {
        let path = |base: &str, index, count| output_path_for(Path::new(base), index, count).unwrap();
        assert_eq!(path("out.png", 1, 3), PathBuf::from("out_1.png"));
        assert_eq!(path("out.png", 3, 3), PathBuf::from("out_3.png"));
        assert_eq!(path("renders.png/out.png", 2, 2), PathBuf::from("renders.png/out_2.png"));
        assert_eq!(path("a.png.png", 1, 2), PathBuf::from("a.png_1.png"));
        assert_eq!(path("out", 1, 2), PathBuf::from("out_1.png"));
    }

    #[test]
    fn test_output_path_without_file_name() {
        for base in ["", "renders/.."] {
            assert!(matches!(
                output_path_for(Path::new(base), 1, 2),
                Err(Error::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_batch_without_file_name_fails_before_engine() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig { batch: 2, output: dir.path().join(".."), ..config_in(dir.path()) };
        let mut runner = BatchRunner::new(MockEngine::default());

        assert!(matches!(runner.run(&config), Err(Error::Configuration(_))));
        assert!(runner.engine().seen.is_empty());
    }

    #[test]
    fn test_single_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut runner = BatchRunner::new(MockEngine::default());

        let report = runner.run(&config).unwrap();

        assert_eq!(report.runs.len(), 1);
        assert_eq!(report.runs[0].output, dir.path().join("out.png"));
        assert!(dir.path().join("out.png").exists());
        assert_eq!(runner.engine().seen.len(), 1);
    }

    #[test]
    fn test_batch_of_three() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig { batch: 3, ..config_in(dir.path()) };
        let started = Rc::new(RefCell::new(Vec::new()));
        let log = started.clone();
        let mut runner = BatchRunner::new(MockEngine::default())
            .on_run_start(move |i, path| log.borrow_mut().push((i, path.to_path_buf())));

        let report = runner.run(&config).unwrap();

        assert_eq!(report.completed(), 3);
        for i in 1..=3 {
            assert!(dir.path().join(format!("out_{}.png", i)).exists());
        }
        assert!(!dir.path().join("out.png").exists());
        let indices: Vec<u32> = started.borrow().iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, [1, 2, 3]);
    }

    #[test]
    fn test_seed_reapplied_every_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig { batch: 3, ..config_in(dir.path()) };
        let mut runner = BatchRunner::new(MockEngine::default());
        runner.run(&config).unwrap();

        let draws: Vec<u64> = runner.engine().seen.iter().map(|s| s.first_draw).collect();
        assert!(draws.iter().all(|d| *d == draws[0]));
    }

    #[test]
    fn test_scheduler_routing() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("photo.png");
        let mask = dir.path().join("mask.png");
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])).save(&photo).unwrap();
        GrayImage::from_pixel(4, 4, Luma([255])).save(&mask).unwrap();

        let mut runner = BatchRunner::new(MockEngine::default());
        runner.run(&config_in(dir.path())).unwrap();
        runner
            .run(&RunConfig {
                init_image: Some(photo),
                mask: Some(mask),
                strength: 0.3,
                ..config_in(dir.path())
            })
            .unwrap();

        let seen = &runner.engine().seen;
        assert_eq!(seen[0].mode, Mode::Text2Img);
        assert_eq!(seen[0].scheduler.kind, SchedulerKind::Lms);
        assert_eq!(seen[1].mode, Mode::Inpaint);
        assert_eq!(seen[1].scheduler.kind, SchedulerKind::Pndm);
        assert_eq!(seen[1].scheduler.skip_prk_steps, Some(true));
    }

    #[test]
    fn test_bad_schedule_fails_before_engine() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig {
            beta_schedule: "not-a-curve".into(),
            batch: 2,
            ..config_in(dir.path())
        };
        let mut runner = BatchRunner::new(MockEngine::default());

        let err = runner.run(&config).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(runner.engine().seen.is_empty());
    }

    #[test]
    fn test_abort_on_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig { batch: 3, ..config_in(dir.path()) };
        let mut runner = BatchRunner::new(MockEngine { fail_on: vec![2], ..Default::default() });

        let err = runner.run(&config).unwrap_err();
        assert!(matches!(err, Error::Engine(_)));
        assert_eq!(runner.engine().seen.len(), 2);
        assert!(dir.path().join("out_1.png").exists());
        assert!(!dir.path().join("out_3.png").exists());
    }

    #[test]
    fn test_continue_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig {
            batch: 3,
            failure_policy: FailurePolicy::ContinueAndReport,
            ..config_in(dir.path())
        };
        let mut runner = BatchRunner::new(MockEngine { fail_on: vec![2], ..Default::default() });

        let err = runner.run(&config).unwrap_err();
        match err {
            Error::BatchFailed { failed, total, indices } => {
                assert_eq!((failed, total), (1, 3));
                assert_eq!(indices, [2]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(runner.engine().seen.len(), 3);
        assert!(dir.path().join("out_3.png").exists());
    }
}
