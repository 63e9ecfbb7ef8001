//! Record orchestration
//!
//! The [`Orchestrator`] owns one instance of every stage and drives each
//! record through them:
//!
//! ```text
//! Pending -> FilteredOut
//!         -> Normalized -> Segmented -> Featurized -> Embedded -> Assembled
//! ```
//!
//! A failure in any stage is captured as a [`RecordFailure`] for that record
//! only; the batch keeps going. Records run on a bounded pool of blocking
//! tasks and come back in input order.

use crate::embedding::TextEncoder;
use crate::heuristics::{HeuristicFeatureExtractor, KeywordScorer};
use crate::language::{LanguageDetector, LanguageFilter, LanguageVerdict, WhatlangDetector};
use crate::normalizer::TextNormalizer;
use crate::segmenter::{LexiconSegmenter, WordSegmenter};
use crate::table::{self, InputRow};
use crate::PipelineConfig;
use futures::stream::{self, StreamExt};
use scamlens_core::{
    BatchSummary, CommentSource, Error, ErrorKind, FeatureRecord, RawComment, RecordFailure,
    RecordState, Result,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What happened to one input row
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// Features were produced
    Written(FeatureRecord),

    /// Dropped by the language gate
    Filtered(LanguageVerdict),

    /// A stage failed
    Failed(RecordFailure),
}

impl RecordOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Written(_) => "written",
            Self::Filtered(_) => "filtered",
            Self::Failed(_) => "failed",
        }
    }
}

/// Everything a batch run produced
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Feature records in input order
    pub records: Vec<FeatureRecord>,

    /// Failed rows in input order
    pub failures: Vec<RecordFailure>,

    /// Per-outcome counts
    pub summary: BatchSummary,
}

impl BatchResult {
    fn from_outcomes(outcomes: Vec<RecordOutcome>) -> Self {
        let mut result = Self {
            summary: BatchSummary {
                total: outcomes.len(),
                ..Default::default()
            },
            ..Default::default()
        };

        for outcome in outcomes {
            metrics::counter!("scamlens_records_total", "outcome" => outcome.label()).increment(1);
            match outcome {
                RecordOutcome::Written(record) => result.records.push(record),
                RecordOutcome::Filtered(_) => result.summary.filtered += 1,
                RecordOutcome::Failed(failure) => result.failures.push(failure),
            }
        }

        result.summary.failed = result.failures.len();
        result.summary.written = result.records.len();
        result
    }
}

/// Stage handles shared by all workers
struct Stages {
    filter: LanguageFilter,
    normalizer: TextNormalizer,
    segmenter: Arc<dyn WordSegmenter>,
    heuristics: HeuristicFeatureExtractor,
    encoder: Arc<dyn TextEncoder>,
}

impl Stages {
    fn process(&self, index: usize, comment: RawComment) -> RecordOutcome {
        let fail = |state: RecordState, error: Error| {
            RecordOutcome::Failed(RecordFailure {
                index,
                comment_id: Some(comment.comment_id.clone()),
                state,
                kind: error.kind(),
                message: error.to_string(),
            })
        };

        let verdict = self.filter.check(&comment.text);
        if !verdict.is_target() {
            debug!(
                comment_id = %comment.comment_id,
                verdict = ?verdict,
                "Excluded by language filter"
            );
            return RecordOutcome::Filtered(verdict);
        }

        let text_clean = self.normalizer.clean(&comment.text);
        let url_features = self.heuristics.url_features(&comment.text);

        let tokens = match self.segmenter.segment(&text_clean) {
            Ok(tokens) => tokens,
            Err(e) => return fail(RecordState::Normalized, e),
        };

        let num_scam_keywords = self.heuristics.scam_keyword_count(&text_clean);

        let embedding = match self.encoder.embed(&tokens) {
            Ok(embedding) => embedding,
            Err(e) => return fail(RecordState::Featurized, e),
        };
        let dimension = self.encoder.dimension();
        if embedding.len() != dimension {
            return fail(
                RecordState::Featurized,
                Error::embedding(format!(
                    "encoder '{}' returned {} components, expected {}",
                    self.encoder.name(),
                    embedding.len(),
                    dimension
                )),
            );
        }

        RecordOutcome::Written(FeatureRecord {
            num_words: FeatureRecord::count_words(&tokens),
            num_urls: url_features.num_urls(),
            domains: url_features.domains,
            comment_id: comment.comment_id,
            video_id: comment.video_id,
            text_clean,
            tokens,
            num_scam_keywords,
            embedding,
        })
    }
}

/// Drives comments through every feature stage
#[derive(Clone)]
pub struct Orchestrator {
    stages: Arc<Stages>,
    workers: usize,
}

impl Orchestrator {
    /// Start building an orchestrator around an encoder
    pub fn builder(encoder: Arc<dyn TextEncoder>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(encoder)
    }

    /// Build every stage from configuration, loading the PhoBERT encoder.
    ///
    /// Model loading is slow; call this once per process.
    #[cfg(feature = "ml-models")]
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let encoder = crate::embedding::PhobertEncoder::load(&config.encoder.to_options())?;
        Self::from_config_with_encoder(config, Arc::new(encoder))
    }

    /// Build from configuration with an already constructed encoder
    pub fn from_config_with_encoder(
        config: &PipelineConfig,
        encoder: Arc<dyn TextEncoder>,
    ) -> Result<Self> {
        config.validate()?;

        let segmenter = LexiconSegmenter::load(config.segmenter.lexicon.as_deref())?
            .with_joiner(config.segmenter.joiner)
            .with_max_syllables(config.segmenter.max_word_syllables);

        Self::builder(encoder)
            .target_language(config.target_language.clone())
            .keywords(KeywordScorer::new(&config.keywords)?)
            .segmenter(Arc::new(segmenter))
            .workers(config.workers)
            .build()
    }

    /// Number of records processed concurrently
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Hidden dimension of every embedding this orchestrator produces
    pub fn embedding_dimension(&self) -> usize {
        self.stages.encoder.dimension()
    }

    /// Run one comment through all stages on the current thread
    pub fn process(&self, index: usize, comment: RawComment) -> RecordOutcome {
        self.stages.process(index, comment)
    }

    /// Process a batch of input rows, keeping input order
    pub async fn run(&self, rows: Vec<InputRow>) -> BatchResult {
        let start = Instant::now();
        info!(
            "Processing {} rows with {} workers",
            rows.len(),
            self.workers
        );

        let outcomes: Vec<RecordOutcome> = stream::iter(rows.into_iter().enumerate())
            .map(|(index, row)| {
                let stages = Arc::clone(&self.stages);
                async move {
                    let comment = match row {
                        Ok(comment) => comment,
                        Err(e) => {
                            return RecordOutcome::Failed(RecordFailure {
                                index,
                                comment_id: None,
                                state: RecordState::Pending,
                                kind: e.kind(),
                                message: e.to_string(),
                            })
                        }
                    };

                    let comment_id = comment.comment_id.clone();
                    tokio::task::spawn_blocking(move || stages.process(index, comment))
                        .await
                        .unwrap_or_else(|e| {
                            RecordOutcome::Failed(RecordFailure {
                                index,
                                comment_id: Some(comment_id),
                                state: RecordState::Pending,
                                kind: ErrorKind::Internal,
                                message: format!("worker task failed: {}", e),
                            })
                        })
                }
            })
            .buffered(self.workers)
            .collect()
            .await;

        let result = BatchResult::from_outcomes(outcomes);
        for failure in &result.failures {
            warn!(
                index = failure.index,
                comment_id = failure.comment_id.as_deref().unwrap_or("-"),
                state = %failure.state,
                kind = ?failure.kind,
                "Skipping record: {}",
                failure.message
            );
        }

        info!(
            "Batch finished in {:.2?}: {}",
            start.elapsed(),
            result.summary
        );
        result
    }

    /// Read an input table, process it and write the feature table.
    ///
    /// Missing columns and output failures abort the run; anything else is
    /// reported in the returned summary.
    pub async fn run_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<BatchSummary> {
        let rows = table::read_comments(input)?;
        let result = self.run(rows).await;
        table::write_features(output, &result.records)?;
        Ok(result.summary)
    }

    /// Fetch comment threads for each video from a source and process them
    pub async fn run_from_source(
        &self,
        source: &dyn CommentSource,
        video_ids: &[String],
    ) -> Result<BatchResult> {
        let mut rows = Vec::new();
        for video_id in video_ids {
            let comments = source.fetch_comment_threads(video_id).await?;
            debug!(
                "Fetched {} comments for video {} from {}",
                comments.len(),
                video_id,
                source.name()
            );
            rows.extend(comments.into_iter().map(Ok));
        }

        Ok(self.run(rows).await)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("target", &self.stages.filter.target())
            .field("segmenter", &self.stages.segmenter.name())
            .field("encoder", &self.stages.encoder.name())
            .field("workers", &self.workers)
            .finish()
    }
}

/// Builder for [`Orchestrator`]; every stage except the encoder has a default
pub struct OrchestratorBuilder {
    encoder: Arc<dyn TextEncoder>,
    detector: Option<Arc<dyn LanguageDetector>>,
    target_language: String,
    segmenter: Option<Arc<dyn WordSegmenter>>,
    keywords: Option<KeywordScorer>,
    workers: usize,
}

impl OrchestratorBuilder {
    fn new(encoder: Arc<dyn TextEncoder>) -> Self {
        Self {
            encoder,
            detector: None,
            target_language: "vi".to_string(),
            segmenter: None,
            keywords: None,
            workers: num_cpus::get().max(1),
        }
    }

    /// Language detector (default: whatlang)
    pub fn detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Language tag records must match
    pub fn target_language(mut self, target: impl Into<String>) -> Self {
        self.target_language = target.into();
        self
    }

    /// Word segmenter (default: built-in lexicon)
    pub fn segmenter(mut self, segmenter: Arc<dyn WordSegmenter>) -> Self {
        self.segmenter = Some(segmenter);
        self
    }

    /// Scam keyword scorer (default lexicon otherwise)
    pub fn keywords(mut self, keywords: KeywordScorer) -> Self {
        self.keywords = Some(keywords);
        self
    }

    /// Concurrent records
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Build the orchestrator
    pub fn build(self) -> Result<Orchestrator> {
        if self.workers == 0 {
            return Err(Error::config("workers must be at least 1"));
        }

        let detector = self
            .detector
            .unwrap_or_else(|| Arc::new(WhatlangDetector::new()));
        let segmenter = match self.segmenter {
            Some(segmenter) => segmenter,
            None => Arc::new(LexiconSegmenter::load(None)?),
        };
        let keywords = match self.keywords {
            Some(keywords) => keywords,
            None => KeywordScorer::with_default_keywords()?,
        };

        info!(
            "Orchestrator ready (target '{}', segmenter '{}', encoder '{}', dim {})",
            self.target_language,
            segmenter.name(),
            self.encoder.name(),
            self.encoder.dimension()
        );

        Ok(Orchestrator {
            stages: Arc::new(Stages {
                filter: LanguageFilter::new(detector, self.target_language),
                normalizer: TextNormalizer::new()?,
                segmenter,
                heuristics: HeuristicFeatureExtractor::new(keywords)?,
                encoder: self.encoder,
            }),
            workers: self.workers,
        })
    }
}
