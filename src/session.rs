//! The review session: owner of the extraction run state machine.
//!
//! One session corresponds to one document-review surface (one operator,
//! one open record). It owns at most one active [`ExtractionRun`] at a
//! time, drives it through the pipeline stages, and exposes the evolving
//! field set for operator review and editing.
//!
//! ## Supersession by generation counter
//!
//! Every run gets a monotonically increasing generation number. Async
//! stage results carry the generation they were issued for and are applied
//! only while it is still current — a late OCR result from a replaced
//! upload is dropped on arrival, never merged into the newer run's state.
//! The in-flight HTTP call itself is left to finish in the background;
//! dropping its result is the cancellation.
//!
//! ## Merge-time empty checks
//!
//! The non-clobber policy for AI completions is evaluated against the
//! *live* field set at merge time, not against the snapshot taken when the
//! request was issued. An operator who fills in a field while the AI call
//! is in flight therefore always wins.
//!
//! [`ExtractionRun`]: RunState

use crate::config::ExtractionConfig;
use crate::document::UploadedDocument;
use crate::error::ExtractError;
use crate::fields::{FieldOrigin, FieldSet};
use crate::pipeline::classify::{classify, DocumentRoute};
use crate::pipeline::extract::extract;
use crate::pipeline::gapfill::{parse_completion, Completer};
use crate::pipeline::rasterize::Rasterizer;
use crate::pipeline::recognize::{ImageSource, Recognizer};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Lifecycle of one extraction run.
///
/// `Done` is reached only by explicit operator action ([`ReviewSession::finalize`]);
/// there is no automatic success terminal because manual review of
/// `Extracted` is expected and unbounded. `Failed` is reachable from any
/// non-terminal state.
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Idle,
    Classifying,
    /// PDF path only: waiting on the conversion service.
    Converting,
    Recognizing,
    /// Draft fields available; operator may edit or request gap-fill.
    Extracted,
    /// A gap-fill request is in flight. Edits remain allowed.
    AwaitingCompletion,
    Done,
    Failed(String),
}

/// How an [`ReviewSession::ingest`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The run reached `Extracted`; draft fields are available.
    Extracted,
    /// A newer upload replaced this run mid-flight; its results were
    /// dropped and the session state belongs to the newer run.
    Superseded,
}

struct Inner {
    generation: u64,
    state: RunState,
    file_name: String,
    /// Recognition output as produced by the engine. Kept for audit and
    /// re-extraction even after the operator edits the working copy.
    original_text: Option<String>,
    /// Operator-editable copy; the AI completion input.
    working_text: Option<String>,
    fields: FieldSet,
}

impl Inner {
    /// Invalidate the current run: everything issued under the old
    /// generation is stale from here on.
    fn supersede(&mut self) {
        self.generation += 1;
        self.original_text = None;
        self.working_text = None;
        self.fields = FieldSet::new();
        self.file_name.clear();
    }
}

/// Cheaply cloneable handle on one document-review session.
#[derive(Clone)]
pub struct ReviewSession {
    inner: Arc<Mutex<Inner>>,
    rasterizer: Arc<dyn Rasterizer>,
    recognizer: Arc<dyn Recognizer>,
    completer: Arc<dyn Completer>,
    language: String,
}

impl ReviewSession {
    /// Build a session, resolving collaborators from the config.
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                generation: 0,
                state: RunState::Idle,
                file_name: String::new(),
                original_text: None,
                working_text: None,
                fields: FieldSet::new(),
            })),
            rasterizer: config.resolve_rasterizer()?,
            recognizer: config.resolve_recognizer()?,
            completer: config.resolve_completer()?,
            language: config.language.clone(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another caller panicked mid-update;
        // the session data itself is still structurally sound.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run the upload through classification, conversion (PDF path),
    /// recognition and pattern extraction.
    ///
    /// Any run already in progress is invalidated first; its in-flight
    /// results will be dropped when they arrive. Stage failures put the
    /// run in `Failed` and surface the stage-tagged error — unless the
    /// run was itself superseded meanwhile, in which case the failure
    /// belongs to a dead run and [`IngestOutcome::Superseded`] is
    /// returned instead.
    pub async fn ingest(&self, doc: UploadedDocument) -> Result<IngestOutcome, ExtractError> {
        let generation = {
            let mut g = self.lock();
            g.supersede();
            g.state = RunState::Classifying;
            g.file_name = doc.file_name().to_string();
            g.generation
        };
        info!(
            "Ingesting '{}' ({} bytes, declared '{}')",
            doc.file_name(),
            doc.len(),
            doc.mime_type()
        );

        let source = match classify(&doc) {
            DocumentRoute::Unsupported => {
                let err = ExtractError::UnsupportedType {
                    mime: doc.mime_type().to_string(),
                    file_name: doc.file_name().to_string(),
                };
                return self.stage_failed(generation, err);
            }
            DocumentRoute::Image => ImageSource::Bytes {
                data: doc.bytes().to_vec(),
                mime: image_mime(&doc),
            },
            DocumentRoute::Pdf => {
                if !self.enter_stage(generation, RunState::Converting) {
                    return Ok(IngestOutcome::Superseded);
                }
                match self.rasterizer.rasterize(doc.bytes()).await {
                    Ok(url) => ImageSource::Url(url),
                    Err(e) => return self.stage_failed(generation, e),
                }
            }
        };

        if !self.enter_stage(generation, RunState::Recognizing) {
            return Ok(IngestOutcome::Superseded);
        }
        let text = match self.recognizer.recognize(&source, &self.language).await {
            Ok(t) => t,
            Err(e) => return self.stage_failed(generation, e),
        };

        let fields = extract(&text);

        let mut g = self.lock();
        if g.generation != generation {
            debug!("Dropping recognition result for superseded run {generation}");
            return Ok(IngestOutcome::Superseded);
        }
        info!(
            "Extracted {}/{} fields from {} chars of text",
            fields.snapshot().values().filter(|v| !v.is_empty()).count(),
            crate::fields::FIELD_NAMES.len(),
            text.len()
        );
        g.original_text = Some(text.clone());
        g.working_text = Some(text);
        g.fields = fields;
        g.state = RunState::Extracted;
        Ok(IngestOutcome::Extracted)
    }

    /// Ask the AI completion service for values of the fields that are
    /// still empty, and merge the answer under the non-clobber policy.
    ///
    /// Returns the number of fields actually filled. Returns `Ok(0)`
    /// without any network call when nothing is missing, when the
    /// response is unparsable (best-effort contract), when the run was
    /// superseded mid-call, or when no run is reviewable. A network
    /// failure propagates, but the run stays in `Extracted` — gap-fill
    /// never kills a reviewable run.
    pub async fn fill_missing(&self) -> Result<usize, ExtractError> {
        let (generation, text, snapshot) = {
            let mut g = self.lock();
            if !matches!(g.state, RunState::Extracted | RunState::AwaitingCompletion) {
                debug!("fill_missing outside a reviewable run (state {:?})", g.state);
                return Ok(0);
            }
            let missing = g.fields.missing_fields();
            if missing.is_empty() {
                info!("No fields missing; skipping completion call");
                return Ok(0);
            }
            info!("Requesting AI values for {}", missing.join(", "));
            g.state = RunState::AwaitingCompletion;
            (
                g.generation,
                g.working_text.clone().unwrap_or_default(),
                g.fields.snapshot(),
            )
        };

        let raw = match self.completer.complete(&text, Some(&snapshot)).await {
            Ok(raw) => raw,
            Err(e) => {
                let mut g = self.lock();
                if g.generation != generation {
                    return Ok(0);
                }
                if g.state == RunState::AwaitingCompletion {
                    g.state = RunState::Extracted;
                }
                drop(g);
                if let ExtractError::CompletionParse { detail } = &e {
                    // Best-effort: an answer we cannot read is no answer.
                    warn!("Ignoring unreadable completion: {detail}");
                    return Ok(0);
                }
                return Err(e);
            }
        };

        let completion = parse_completion(&raw);

        let mut g = self.lock();
        if g.generation != generation {
            debug!("Dropping completion for superseded run {generation}");
            return Ok(0);
        }
        // Empty-check runs against the live fields, here, under the lock:
        // operator edits made while the call was in flight win.
        let applied = g.fields.merge_completion(&completion);
        if g.state == RunState::AwaitingCompletion {
            g.state = RunState::Extracted;
        }
        info!("Applied {applied} AI-filled fields");
        Ok(applied)
    }

    /// Operator edit of one field. Allowed while a run is reviewable
    /// (including during an in-flight completion). Returns false for
    /// unknown names or when no run is reviewable.
    pub fn edit_field(&self, name: &str, value: &str) -> bool {
        let mut g = self.lock();
        if !matches!(g.state, RunState::Extracted | RunState::AwaitingCompletion) {
            return false;
        }
        g.fields.set(name, value, FieldOrigin::Operator)
    }

    /// Operator edit of the working text (the AI completion input). The
    /// original recognition output is untouched.
    pub fn edit_text(&self, text: impl Into<String>) -> bool {
        let mut g = self.lock();
        if !matches!(g.state, RunState::Extracted | RunState::AwaitingCompletion) {
            return false;
        }
        g.working_text = Some(text.into());
        true
    }

    /// Re-run the pattern extractor over the original recognition output,
    /// replacing the current draft fields. Operator escape hatch for
    /// "my edits made it worse".
    pub fn re_extract(&self) -> bool {
        let mut g = self.lock();
        if !matches!(g.state, RunState::Extracted | RunState::AwaitingCompletion) {
            return false;
        }
        let Some(ref original) = g.original_text else {
            return false;
        };
        g.fields = extract(original);
        g.state = RunState::Extracted;
        true
    }

    /// Conclude the run: hand the field set to the caller for persistence
    /// and enter `Done`. Returns `None` unless the run is in `Extracted`.
    pub fn finalize(&self) -> Option<FieldSet> {
        let mut g = self.lock();
        if g.state != RunState::Extracted {
            return None;
        }
        g.state = RunState::Done;
        info!("Run for '{}' handed off", g.file_name);
        Some(g.fields.clone())
    }

    /// Discard the current run and return to `Idle`. In-flight results
    /// for the discarded run will be dropped on arrival.
    pub fn reset(&self) {
        let mut g = self.lock();
        g.supersede();
        g.state = RunState::Idle;
    }

    // ── Read accessors ───────────────────────────────────────────────────

    pub fn state(&self) -> RunState {
        self.lock().state.clone()
    }

    pub fn fields(&self) -> FieldSet {
        self.lock().fields.clone()
    }

    pub fn original_text(&self) -> Option<String> {
        self.lock().original_text.clone()
    }

    pub fn working_text(&self) -> Option<String> {
        self.lock().working_text.clone()
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    /// Move to `state` iff `generation` is still current.
    fn enter_stage(&self, generation: u64, state: RunState) -> bool {
        let mut g = self.lock();
        if g.generation != generation {
            debug!("Skipping stage {state:?} for superseded run {generation}");
            return false;
        }
        g.state = state;
        true
    }

    /// Record a stage failure for the owning run. A failure belonging to
    /// a superseded run is dropped like any other stale result.
    fn stage_failed(
        &self,
        generation: u64,
        err: ExtractError,
    ) -> Result<IngestOutcome, ExtractError> {
        let mut g = self.lock();
        if g.generation != generation {
            debug!("Dropping failure of superseded run {generation}: {err}");
            return Ok(IngestOutcome::Superseded);
        }
        warn!("Run for '{}' failed: {err}", g.file_name);
        g.state = RunState::Failed(err.to_string());
        drop(g);
        Err(err)
    }
}

/// Content type to describe uploaded image bytes to the OCR engine.
fn image_mime(doc: &UploadedDocument) -> String {
    let declared = doc.mime_type().trim().to_ascii_lowercase();
    if declared.starts_with("image/") {
        declared
    } else {
        // Suffix-classified upload with an unhelpful declared type; let
        // the engine sniff the bytes.
        "application/octet-stream".to_string()
    }
}
