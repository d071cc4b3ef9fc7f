//! Application state machine for inksolve.
//!
//! This crate contains the [`App`] without TUI dependencies. The event loop
//! owns the `App`, turns user input into [`Command`]s for [`App::dispatch`],
//! and calls [`App::tick`] every frame to collect finished network calls.

use std::collections::BTreeSet;
use std::time::Duration;

use inksolve_core::{parse_solution, render_png};

mod config;
mod draft;
mod operation;

pub use config::{
    API_KEY_ENV, AppConfig, CanvasConfig, ConfigError, GoogleConfig, InkConfig, config_path,
    expand_env_vars, resolve_api_key,
};
pub use draft::{DraftInput, EditAction};
pub use inksolve_core::StrokeStyle;
pub use inksolve_providers::{GeminiClient, GeminiSettings};
pub use inksolve_types::{
    ApiKey, ChartKind, ChartSeries, ChartSpec, Drawing, EmptyInputKind, FlowError, ModelName,
    Point, SolutionView, StepMark, StepView, StrokeInput, SurfaceSize, Touch, UiOptions,
    Workflow, WorkflowStep, sanitize_terminal_text,
};
pub use operation::CallKind;

use operation::{CallOutcome, CallPoll, PendingCall};

/// Surface pixels per terminal cell, horizontally.
pub const CELL_WIDTH_PX: u32 = 8;
/// Surface pixels per terminal cell, vertically.
pub const CELL_HEIGHT_PX: u32 = 16;

// ============================================================================
// Canvas geometry
// ============================================================================

/// Terminal cells covered by the drawing canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanvasViewport {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl CanvasViewport {
    #[must_use]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[must_use]
    pub fn contains(self, column: u16, row: u16) -> bool {
        column >= self.x
            && row >= self.y
            && u32::from(column) < u32::from(self.x) + u32::from(self.width)
            && u32::from(row) < u32::from(self.y) + u32::from(self.height)
    }

    #[must_use]
    pub fn surface_size(self) -> SurfaceSize {
        SurfaceSize::new(
            u32::from(self.width) * CELL_WIDTH_PX,
            u32::from(self.height) * CELL_HEIGHT_PX,
        )
    }

    /// Surface point at the centre of a cell, or `None` outside the canvas.
    #[must_use]
    pub fn point_at(self, column: u16, row: u16) -> Option<Point> {
        if !self.contains(column, row) {
            return None;
        }
        let col = u32::from(column - self.x);
        let row = u32::from(row - self.y);
        Some(Point::new(
            f64::from(col * CELL_WIDTH_PX + CELL_WIDTH_PX / 2),
            f64::from(row * CELL_HEIGHT_PX + CELL_HEIGHT_PX / 2),
        ))
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Everything the front end can ask the app to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Stroke(StrokeInput),
    UndoStroke,
    ClearCanvas,
    Recognize,
    /// Skip drawing and type the expression by hand.
    TypeExpression,
    /// Re-run the call owned by the current step.
    Retry,
    BackToDraw,
    BackToEdit,
    Edit(EditAction),
    Solve,
    SelectPreviousStep,
    SelectNextStep,
    ToggleSupplement,
    OpenKeyEntry,
    KeyEntry(EditAction),
    ToggleKeyVisibility,
    SubmitKey,
    CloseKeyEntry,
    Reset,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Keystrokes go to the expression editor.
    Editing,
    /// The credential modal is open.
    KeyEntry,
}

/// A failure pinned to the step that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepError {
    pub step: WorkflowStep,
    pub error: FlowError,
}

#[derive(Debug, Default)]
pub struct KeyEntry {
    draft: DraftInput,
    revealed: bool,
}

impl KeyEntry {
    #[must_use]
    pub fn draft(&self) -> &DraftInput {
        &self.draft
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }
}

// ============================================================================
// App
// ============================================================================

/// Ticks a status message stays up before the key hints return.
pub const STATUS_TICKS: usize = 375;

struct StatusMessage {
    text: String,
    set_at: usize,
}

pub struct App {
    drawing: Drawing,
    workflow: Workflow,
    viewport: CanvasViewport,
    stroke_style: StrokeStyle,
    recognized: Option<String>,
    editor: DraftInput,
    solution: Option<SolutionView>,
    expanded_steps: BTreeSet<usize>,
    selected_step: usize,
    step_error: Option<StepError>,
    pending: Option<PendingCall>,
    api_key: Option<ApiKey>,
    key_entry: Option<KeyEntry>,
    client: GeminiClient,
    ui_options: UiOptions,
    status: Option<StatusMessage>,
    tick_count: usize,
    should_quit: bool,
}

impl App {
    #[must_use]
    pub fn new(client: GeminiClient, api_key: Option<ApiKey>) -> Self {
        Self {
            drawing: Drawing::new(),
            workflow: Workflow::new(),
            viewport: CanvasViewport::default(),
            stroke_style: StrokeStyle::default(),
            recognized: None,
            editor: DraftInput::default(),
            solution: None,
            expanded_steps: BTreeSet::new(),
            selected_step: 0,
            step_error: None,
            pending: None,
            api_key,
            key_entry: None,
            client,
            ui_options: UiOptions::default(),
            status: None,
            tick_count: 0,
            should_quit: false,
        }
    }

    pub fn with_ui_options(mut self, options: UiOptions) -> Self {
        self.ui_options = options;
        self
    }

    pub fn with_stroke_style(mut self, style: StrokeStyle) -> Self {
        self.stroke_style = style;
        self
    }

    // ------------------------------------------------------------------------
    // Read access for the front end
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    #[must_use]
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    #[must_use]
    pub fn current_step(&self) -> WorkflowStep {
        self.workflow.current()
    }

    #[must_use]
    pub fn viewport(&self) -> CanvasViewport {
        self.viewport
    }

    /// Record where the canvas was laid out this frame.
    pub fn set_viewport(&mut self, viewport: CanvasViewport) {
        self.viewport = viewport;
    }

    /// Raster size used for recognition. Falls back to the default size
    /// before the canvas has been laid out.
    #[must_use]
    pub fn surface_size(&self) -> SurfaceSize {
        if self.viewport.is_empty() {
            SurfaceSize::default()
        } else {
            self.viewport.surface_size()
        }
    }

    #[must_use]
    pub fn stroke_style(&self) -> &StrokeStyle {
        &self.stroke_style
    }

    #[must_use]
    pub fn recognized_text(&self) -> Option<&str> {
        self.recognized.as_deref()
    }

    #[must_use]
    pub fn editor(&self) -> &DraftInput {
        &self.editor
    }

    #[must_use]
    pub fn solution(&self) -> Option<&SolutionView> {
        self.solution.as_ref()
    }

    #[must_use]
    pub fn is_step_expanded(&self, number: usize) -> bool {
        self.expanded_steps.contains(&number)
    }

    /// Index into the solution's step list.
    #[must_use]
    pub fn selected_step(&self) -> usize {
        self.selected_step
    }

    #[must_use]
    pub fn step_error(&self) -> Option<&StepError> {
        self.step_error.as_ref()
    }

    /// The error to show next to `step`, if any.
    #[must_use]
    pub fn error_for(&self, step: WorkflowStep) -> Option<&FlowError> {
        self.step_error
            .as_ref()
            .filter(|e| e.step == step)
            .map(|e| &e.error)
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn busy_kind(&self) -> Option<CallKind> {
        self.pending.as_ref().map(PendingCall::kind)
    }

    #[must_use]
    pub fn busy_elapsed(&self) -> Option<Duration> {
        self.pending.as_ref().map(PendingCall::elapsed)
    }

    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    #[must_use]
    pub fn api_key_masked(&self) -> Option<String> {
        self.api_key.as_ref().map(ApiKey::masked)
    }

    #[must_use]
    pub fn key_entry(&self) -> Option<&KeyEntry> {
        self.key_entry.as_ref()
    }

    #[must_use]
    pub fn model(&self) -> &ModelName {
        self.client.model()
    }

    #[must_use]
    pub fn input_mode(&self) -> InputMode {
        if self.key_entry.is_some() {
            InputMode::KeyEntry
        } else if self.workflow.current() == WorkflowStep::Edit {
            InputMode::Editing
        } else {
            InputMode::Normal
        }
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.ui_options
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|status| status.text.as_str())
    }

    #[must_use]
    pub fn tick_count(&self) -> usize {
        self.tick_count
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::Stroke(input) => self.apply_stroke(input),
            Command::UndoStroke => self.undo_stroke(),
            Command::ClearCanvas => self.clear_canvas(),
            Command::Recognize => self.start_recognition(),
            Command::TypeExpression => self.type_expression(),
            Command::Retry => self.retry(),
            Command::BackToDraw => self.back_to_draw(),
            Command::BackToEdit => self.back_to_edit(),
            Command::Edit(action) => self.edit(action),
            Command::Solve => self.start_solve(),
            Command::SelectPreviousStep => self.move_selection(false),
            Command::SelectNextStep => self.move_selection(true),
            Command::ToggleSupplement => self.toggle_supplement(),
            Command::OpenKeyEntry => self.key_entry = Some(KeyEntry::default()),
            Command::KeyEntry(action) => {
                if let Some(entry) = self.key_entry.as_mut() {
                    entry.draft.apply(action);
                }
            }
            Command::ToggleKeyVisibility => {
                if let Some(entry) = self.key_entry.as_mut() {
                    entry.revealed = !entry.revealed;
                }
            }
            Command::SubmitKey => self.submit_key(),
            Command::CloseKeyEntry => self.key_entry = None,
            Command::Reset => self.reset(),
            Command::Quit => self.quit(),
        }
    }

    fn apply_stroke(&mut self, input: StrokeInput) {
        if self.workflow.current() != WorkflowStep::Draw {
            return;
        }
        if matches!(input, StrokeInput::PointerDown(_) | StrokeInput::TouchStart(_)) {
            self.clear_error_for(WorkflowStep::Draw);
        }
        self.drawing.apply(input);
    }

    fn undo_stroke(&mut self) {
        if self.workflow.current() != WorkflowStep::Draw {
            return;
        }
        if self.drawing.undo_last().is_some() {
            self.set_status(format!("Undid stroke ({} left)", self.drawing.stroke_count()));
        }
    }

    fn clear_canvas(&mut self) {
        if self.workflow.current() != WorkflowStep::Draw {
            return;
        }
        self.drawing.clear();
        self.set_status("Canvas cleared");
    }

    fn type_expression(&mut self) {
        if self.workflow.current() != WorkflowStep::Draw {
            return;
        }
        self.recognized = None;
        self.editor.clear();
        self.step_error = None;
        self.advance(WorkflowStep::Edit);
    }

    fn retry(&mut self) {
        match self.workflow.current() {
            WorkflowStep::Recognize => self.start_recognition(),
            WorkflowStep::Solve => self.start_solve(),
            WorkflowStep::Draw | WorkflowStep::Edit => {}
        }
    }

    fn back_to_draw(&mut self) {
        if self.workflow.current() != WorkflowStep::Recognize {
            return;
        }
        self.cancel_pending();
        match self.workflow.back_to_draw() {
            Ok(()) => {
                self.step_error = None;
                self.status = None;
            }
            Err(e) => tracing::warn!("{e}"),
        }
    }

    fn back_to_edit(&mut self) {
        if self.workflow.current() != WorkflowStep::Solve {
            return;
        }
        self.cancel_pending();
        match self.workflow.back_to_edit() {
            Ok(()) => {
                self.step_error = None;
                self.status = None;
            }
            Err(e) => tracing::warn!("{e}"),
        }
    }

    fn edit(&mut self, action: EditAction) {
        if self.workflow.current() != WorkflowStep::Edit {
            return;
        }
        self.clear_error_for(WorkflowStep::Edit);
        self.editor.apply(action);
    }

    fn move_selection(&mut self, forward: bool) {
        let Some(count) = self.solution.as_ref().map(|s| s.steps.len()) else {
            return;
        };
        if count == 0 || self.workflow.current() != WorkflowStep::Solve {
            return;
        }
        self.selected_step = if forward {
            (self.selected_step + 1).min(count - 1)
        } else {
            self.selected_step.saturating_sub(1)
        };
    }

    fn toggle_supplement(&mut self) {
        if self.workflow.current() != WorkflowStep::Solve {
            return;
        }
        let Some(step) = self
            .solution
            .as_ref()
            .and_then(|s| s.steps.get(self.selected_step))
            .filter(|step| step.is_expandable())
        else {
            return;
        };
        let number = step.number;
        if !self.expanded_steps.remove(&number) {
            self.expanded_steps.insert(number);
        }
    }

    fn submit_key(&mut self) {
        let Some(entry) = self.key_entry.take() else {
            return;
        };
        self.api_key = ApiKey::new(entry.draft.text());
        let status = match &self.api_key {
            Some(key) => format!("API key set ({})", key.masked()),
            None => "API key cleared".to_string(),
        };
        self.set_status(status);
        if self
            .step_error
            .as_ref()
            .is_some_and(|e| e.error == FlowError::MissingCredential)
        {
            self.step_error = None;
        }
    }

    /// Back to an empty Draw step. The credential is kept.
    fn reset(&mut self) {
        self.cancel_pending();
        self.drawing.clear();
        self.workflow.reset();
        self.recognized = None;
        self.editor.clear();
        self.solution = None;
        self.expanded_steps.clear();
        self.selected_step = 0;
        self.step_error = None;
        self.set_status("Reset");
    }

    fn quit(&mut self) {
        self.cancel_pending();
        self.should_quit = true;
    }

    // ------------------------------------------------------------------------
    // Network calls
    // ------------------------------------------------------------------------

    fn start_recognition(&mut self) {
        let step = self.workflow.current();
        if self.pending.is_some() || !matches!(step, WorkflowStep::Draw | WorkflowStep::Recognize)
        {
            return;
        }
        let Some(key) = self.require_key(step) else {
            return;
        };
        if self.drawing.is_empty() {
            self.fail(step, FlowError::EmptyInput(EmptyInputKind::Drawing));
            return;
        }

        self.step_error = None;
        self.advance(WorkflowStep::Recognize);

        let drawing = self.drawing.clone();
        let size = self.surface_size();
        let style = self.stroke_style;
        let client = self.client.clone();
        tracing::info!(
            strokes = drawing.stroke_count(),
            points = drawing.point_count(),
            width = size.width,
            height = size.height,
            "Starting recognition"
        );

        self.pending = Some(PendingCall::spawn(CallKind::Recognition, async move {
            let result = match render_png(&drawing, size, &style) {
                Ok(png) => client.recognize(&key, &png).await,
                Err(e) => Err(e),
            };
            CallOutcome::Recognized(result)
        }));
    }

    fn start_solve(&mut self) {
        let step = self.workflow.current();
        if self.pending.is_some() || !matches!(step, WorkflowStep::Edit | WorkflowStep::Solve) {
            return;
        }
        let Some(key) = self.require_key(step) else {
            return;
        };
        let expression = self.editor.text().trim().to_string();
        if expression.is_empty() {
            self.fail(step, FlowError::EmptyInput(EmptyInputKind::Expression));
            return;
        }

        self.step_error = None;
        self.solution = None;
        self.expanded_steps.clear();
        self.selected_step = 0;
        self.advance(WorkflowStep::Solve);

        let client = self.client.clone();
        tracing::info!(chars = expression.chars().count(), "Starting solve");

        self.pending = Some(PendingCall::spawn(CallKind::Solution, async move {
            let result = client
                .solve(&key, &expression)
                .await
                .and_then(|raw| parse_solution(&raw));
            CallOutcome::Solved(result)
        }));
    }

    /// Advance spinners and collect a finished call, if any.
    pub fn tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
        if self
            .status
            .as_ref()
            .is_some_and(|status| self.tick_count.wrapping_sub(status.set_at) >= STATUS_TICKS)
        {
            self.status = None;
        }

        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        let poll = pending.poll();
        if matches!(poll, CallPoll::Pending) {
            return;
        }
        let Some(finished) = self.pending.take() else {
            return;
        };
        let elapsed_ms = finished.elapsed().as_millis() as u64;

        match poll {
            CallPoll::Pending => {}
            CallPoll::Finished(CallOutcome::Recognized(Ok(text))) => {
                tracing::info!(elapsed_ms, "Recognition finished");
                self.editor.set_text(text.clone());
                self.recognized = Some(text);
                self.advance(WorkflowStep::Edit);
                self.set_status("Expression recognized; edit it and press Enter");
            }
            CallPoll::Finished(CallOutcome::Solved(Ok(view))) => {
                tracing::info!(elapsed_ms, steps = view.steps.len(), "Solve finished");
                self.set_status(format!("Solved in {} steps", view.steps.len()));
                self.solution = Some(view);
            }
            CallPoll::Finished(
                CallOutcome::Recognized(Err(error)) | CallOutcome::Solved(Err(error)),
            ) => {
                let step = self.workflow.current();
                tracing::warn!(elapsed_ms, ?step, %error, "Call failed");
                self.fail(step, error);
            }
            CallPoll::Lost => {
                let step = self.workflow.current();
                tracing::error!(kind = ?finished.kind(), "Call task ended without a result");
                self.fail(
                    step,
                    FlowError::transport(None, "request task ended unexpectedly"),
                );
            }
        }
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn require_key(&mut self, step: WorkflowStep) -> Option<ApiKey> {
        let key = self.api_key.clone();
        if key.is_none() {
            self.fail(step, FlowError::MissingCredential);
        }
        key
    }

    fn fail(&mut self, step: WorkflowStep, error: FlowError) {
        self.status = None;
        self.step_error = Some(StepError { step, error });
    }

    fn clear_error_for(&mut self, step: WorkflowStep) {
        if self.step_error.as_ref().is_some_and(|e| e.step == step) {
            self.step_error = None;
        }
    }

    fn advance(&mut self, step: WorkflowStep) {
        match self.workflow.advance(step) {
            Ok(()) => self.status = None,
            Err(e) => tracing::warn!("{e}"),
        }
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            set_at: self.tick_count,
        });
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}
