use crate::api::{ApiError, ExampleEntry, HealthStatus, TranslationRequest, TranslationResponse};
use crate::clipboard::ClipboardError;
use crate::config::{Config, MAX_BEAMS, MIN_BEAMS};
use std::fmt;
use std::time::{Duration, Instant};

pub const CHAR_BUDGET: usize = 1000;
pub const CHAR_WARN_THRESHOLD: usize = 900;
pub const OUTPUT_PLACEHOLDER: &str = "Translation will appear here...";
pub const OUTPUT_PROCESSING: &str = "Processing...";
pub const COPY_FEEDBACK: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub enum Command {
    Translate(TranslationRequest),
    FetchExamples,
    CopyText(String),
    CheckHealth,
}

#[derive(Debug)]
pub enum Event {
    Translated(Result<TranslationResponse, ApiError>),
    ExamplesLoaded(Result<Vec<ExampleEntry>, ApiError>),
    Copied(Result<(), ClipboardError>),
    Health(Result<HealthStatus, ApiError>),
}

/// User input errors, shown as a blocking dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    EmptyInput,
    NothingToCopy,
    CopyFailed,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Alert::EmptyInput => "Please enter some text to translate",
            Alert::NothingToCopy => "No translation to copy",
            Alert::CopyFailed => "Failed to copy",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCounter {
    pub len: usize,
    pub warning: bool,
}

impl CharCounter {
    pub fn text(&self) -> String {
        format!("{}/{}", self.len, CHAR_BUDGET)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataView {
    pub confidence_percent: u32,
    pub input_words: String,
    pub output_words: String,
    pub device: String,
}

impl MetadataView {
    pub fn from_response(resp: &TranslationResponse) -> Self {
        let confidence_percent = (resp.confidence * 100.0).round().max(0.0) as u32;
        Self {
            confidence_percent,
            input_words: format!("{} words", resp.metadata.input_length),
            output_words: format!("{} words", resp.metadata.output_length),
            device: resp.metadata.device.clone(),
        }
    }

    pub fn confidence_text(&self) -> String {
        format!("{}%", self.confidence_percent)
    }

    pub fn bar_fraction(&self) -> f32 {
        (self.confidence_percent.min(100) as f32) / 100.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub text: String,
    pub has_translation: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self { text: OUTPUT_PLACEHOLDER.to_string(), has_translation: false }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExampleList {
    #[default]
    NotLoaded,
    Loaded(Vec<ExampleEntry>),
    Failed,
}

/// Where a click inside the open examples modal landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalTarget {
    Backdrop,
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyIcon {
    Copy,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum BackendStatus {
    #[default]
    Unknown,
    Healthy(HealthStatus),
    Unreachable(String),
}

#[derive(Debug)]
pub struct TranslationPanel {
    input: String,
    num_beams: u32,
    preserve_numbers: bool,
    output: Output,
    metadata: Option<MetadataView>,
    current_translation: String,
    busy: bool,
    copied_at: Option<Instant>,
    examples_open: bool,
    examples: ExampleList,
    alert: Option<Alert>,
    backend: BackendStatus,
}

impl TranslationPanel {
    pub fn new(cfg: &Config) -> Self {
        Self {
            input: String::new(),
            num_beams: cfg.num_beams.clamp(MIN_BEAMS, MAX_BEAMS),
            preserve_numbers: cfg.preserve_numbers,
            output: Output::default(),
            metadata: None,
            current_translation: String::new(),
            busy: false,
            copied_at: None,
            examples_open: false,
            examples: ExampleList::NotLoaded,
            alert: None,
            backend: BackendStatus::Unknown,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn char_counter(&self) -> CharCounter {
        let len = self.input.chars().count();
        CharCounter { len, warning: len > CHAR_WARN_THRESHOLD }
    }

    pub fn num_beams_mut(&mut self) -> &mut u32 {
        &mut self.num_beams
    }

    pub fn preserve_numbers_mut(&mut self) -> &mut bool {
        &mut self.preserve_numbers
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn metadata(&self) -> Option<&MetadataView> {
        self.metadata.as_ref()
    }

    pub fn current_translation(&self) -> &str {
        &self.current_translation
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn submit_label(&self) -> &'static str {
        if self.busy {
            "Translating..."
        } else {
            "Translate"
        }
    }

    pub fn alert(&self) -> Option<Alert> {
        self.alert
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn examples_open(&self) -> bool {
        self.examples_open
    }

    pub fn examples(&self) -> &ExampleList {
        &self.examples
    }

    pub fn backend_status(&self) -> &BackendStatus {
        &self.backend
    }

    pub fn startup(&self) -> Command {
        Command::CheckHealth
    }

    // No guard against a request already in flight; the last answer wins.
    pub fn submit(&mut self) -> Option<Command> {
        let text = self.input.trim();
        if text.is_empty() {
            self.alert = Some(Alert::EmptyInput);
            return None;
        }
        let request = TranslationRequest {
            text: text.to_string(),
            num_beams: self.num_beams.clamp(MIN_BEAMS, MAX_BEAMS),
            preserve_numbers: self.preserve_numbers,
        };

        self.busy = true;
        self.output = Output { text: OUTPUT_PROCESSING.to_string(), has_translation: false };
        self.metadata = None;
        tracing::info!("Translating {} chars (beams={}, preserve_numbers={})",
            request.text.chars().count(), request.num_beams, request.preserve_numbers);
        Some(Command::Translate(request))
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.output = Output::default();
        self.metadata = None;
        self.current_translation.clear();
    }

    pub fn copy(&mut self) -> Option<Command> {
        if self.current_translation.is_empty() {
            self.alert = Some(Alert::NothingToCopy);
            return None;
        }
        Some(Command::CopyText(self.current_translation.clone()))
    }

    pub fn copy_icon(&self, now: Instant) -> CopyIcon {
        match self.copied_at {
            Some(at) if now.saturating_duration_since(at) < COPY_FEEDBACK => CopyIcon::Confirmed,
            _ => CopyIcon::Copy,
        }
    }

    pub fn copy_feedback_remaining(&self, now: Instant) -> Option<Duration> {
        let at = self.copied_at?;
        COPY_FEEDBACK.checked_sub(now.saturating_duration_since(at)).filter(|d| !d.is_zero())
    }

    pub fn open_examples(&mut self) -> Command {
        self.examples_open = true;
        Command::FetchExamples
    }

    pub fn close_examples(&mut self) {
        self.examples_open = false;
    }

    pub fn modal_clicked(&mut self, target: ModalTarget) {
        if target == ModalTarget::Backdrop {
            self.close_examples();
        }
    }

    pub fn choose_example(&mut self, index: usize) -> Option<Command> {
        let english = match &self.examples {
            ExampleList::Loaded(list) => list.get(index)?.english.clone(),
            _ => return None,
        };
        self.input = english;
        self.close_examples();
        self.submit()
    }

    pub fn apply(&mut self, event: Event) {
        match event {
            Event::Translated(result) => {
                match result {
                    Ok(resp) => {
                        self.current_translation = resp.translation.clone();
                        self.output = Output { text: resp.translation.clone(), has_translation: true };
                        self.metadata = Some(MetadataView::from_response(&resp));
                    }
                    Err(e) => {
                        tracing::error!("Translation error: {}", e);
                        self.output.text = format!("Error: {}", e);
                    }
                }
                self.busy = false;
            }
            Event::ExamplesLoaded(Ok(list)) => {
                tracing::info!("Loaded {} examples", list.len());
                self.examples = ExampleList::Loaded(list);
            }
            Event::ExamplesLoaded(Err(e)) => {
                tracing::error!("Examples error: {}", e);
                self.examples = ExampleList::Failed;
            }
            Event::Copied(Ok(())) => {
                self.copied_at = Some(Instant::now());
            }
            Event::Copied(Err(e)) => {
                tracing::warn!("Copy failed: {}", e);
                self.alert = Some(Alert::CopyFailed);
            }
            Event::Health(Ok(status)) => {
                tracing::info!("Backend {} ({} on {})", status.status, status.model, status.device);
                self.backend = BackendStatus::Healthy(status);
            }
            Event::Health(Err(e)) => {
                tracing::warn!("Backend health check failed: {}", e);
                self.backend = BackendStatus::Unreachable(e.to_string());
            }
        }
    }
}
