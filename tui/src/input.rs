//! Input handling for the inksolve TUI.
//!
//! Terminal events are read on a blocking thread and translated into engine
//! [`Command`]s; the frame loop drains a bounded number per frame.

use anyhow::{Result, anyhow};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;
use tracing::debug;

use inksolve_engine::{App, Command, EditAction, InputMode, StrokeInput, WorkflowStep};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 1024; // bounded: no OOM
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering

enum InputMsg {
    Event(Event),
    Error(String),
}

pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl InputPump {
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();

        let join = tokio::task::spawn_blocking(move || input_loop(stop2, tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        // Close the receiver first so a reader blocked on a full channel wakes up.
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Best-effort stop if caller exits early; do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: Arc<AtomicBool>, tx: mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    // Bounded queue: apply backpressure instead of dropping
                    // events, so a fast drag never loses stroke points.
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Drain pending terminal events into `app`. Returns `true` once the app
/// wants to quit.
pub fn handle_events(app: &mut App, input: &mut InputPump) -> Result<bool> {
    let mut processed = 0;
    while processed < MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };

        if let Some(command) = command_for_event(app, ev) {
            debug!(?command, "Dispatching");
            app.dispatch(command);
        }
        if app.should_quit() {
            return Ok(true);
        }
        processed += 1;
    }
    Ok(app.should_quit())
}

/// Translate one terminal event into the command it stands for, if any.
#[must_use]
pub fn command_for_event(app: &App, event: Event) -> Option<Command> {
    match event {
        Event::Key(key) => command_for_key(app, key),
        Event::Mouse(mouse) => command_for_mouse(app, mouse),
        Event::Paste(text) => {
            let text = text.replace("\r\n", " ").replace(['\r', '\n'], " ");
            match app.input_mode() {
                InputMode::KeyEntry => Some(Command::KeyEntry(EditAction::InsertText(text))),
                InputMode::Editing => Some(Command::Edit(EditAction::InsertText(text))),
                InputMode::Normal => None,
            }
        }
        _ => None,
    }
}

#[must_use]
pub fn command_for_key(app: &App, key: KeyEvent) -> Option<Command> {
    if matches!(key.kind, KeyEventKind::Release) {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl {
        match key.code {
            KeyCode::Char('c') => return Some(Command::Quit),
            KeyCode::Char('n') => return Some(Command::Reset),
            KeyCode::Char('k') if app.input_mode() != InputMode::KeyEntry => {
                return Some(Command::OpenKeyEntry);
            }
            _ => {}
        }
    }

    match app.input_mode() {
        InputMode::KeyEntry => match key.code {
            KeyCode::Esc => Some(Command::CloseKeyEntry),
            KeyCode::Enter => Some(Command::SubmitKey),
            KeyCode::Tab => Some(Command::ToggleKeyVisibility),
            _ => edit_action(key).map(Command::KeyEntry),
        },
        InputMode::Editing => match key.code {
            KeyCode::Enter => Some(Command::Solve),
            _ => edit_action(key).map(Command::Edit),
        },
        InputMode::Normal => normal_command(app.current_step(), key),
    }
}

fn normal_command(step: WorkflowStep, key: KeyEvent) -> Option<Command> {
    match (step, key.code) {
        (WorkflowStep::Draw, KeyCode::Char('u')) => Some(Command::UndoStroke),
        (WorkflowStep::Draw, KeyCode::Char('c')) => Some(Command::ClearCanvas),
        (WorkflowStep::Draw, KeyCode::Enter) => Some(Command::Recognize),
        (WorkflowStep::Draw, KeyCode::Char('t')) => Some(Command::TypeExpression),
        (WorkflowStep::Draw, KeyCode::Char('q')) => Some(Command::Quit),

        (WorkflowStep::Recognize | WorkflowStep::Solve, KeyCode::Char('r')) => {
            Some(Command::Retry)
        }
        (WorkflowStep::Recognize, KeyCode::Esc) => Some(Command::BackToDraw),

        (WorkflowStep::Solve, KeyCode::Up | KeyCode::Char('k')) => {
            Some(Command::SelectPreviousStep)
        }
        (WorkflowStep::Solve, KeyCode::Down | KeyCode::Char('j')) => {
            Some(Command::SelectNextStep)
        }
        (WorkflowStep::Solve, KeyCode::Enter | KeyCode::Char(' ')) => {
            Some(Command::ToggleSupplement)
        }
        (WorkflowStep::Solve, KeyCode::Esc) => Some(Command::BackToEdit),
        _ => None,
    }
}

/// Single-line editing keys shared by the expression editor and key modal.
fn edit_action(key: KeyEvent) -> Option<EditAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    match key.code {
        KeyCode::Char('w') if ctrl => Some(EditAction::DeleteWordBackward),
        KeyCode::Char('u') if ctrl => Some(EditAction::Clear),
        KeyCode::Char('a') if ctrl => Some(EditAction::Home),
        KeyCode::Char('e') if ctrl => Some(EditAction::End),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(c) => Some(EditAction::Insert(c)),
        KeyCode::Backspace if ctrl || alt => Some(EditAction::DeleteWordBackward),
        KeyCode::Backspace => Some(EditAction::Backspace),
        KeyCode::Delete => Some(EditAction::Delete),
        KeyCode::Left => Some(EditAction::Left),
        KeyCode::Right => Some(EditAction::Right),
        KeyCode::Home => Some(EditAction::Home),
        KeyCode::End => Some(EditAction::End),
        _ => None,
    }
}

/// Left-button mouse events over the canvas become stroke input.
///
/// A drag that leaves the canvas ends the stroke, as a pointer leaving the
/// drawing surface does.
#[must_use]
pub fn command_for_mouse(app: &App, mouse: MouseEvent) -> Option<Command> {
    if app.input_mode() != InputMode::Normal || app.current_step() != WorkflowStep::Draw {
        return None;
    }
    let viewport = app.viewport();
    let input = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            StrokeInput::PointerDown(viewport.point_at(mouse.column, mouse.row)?)
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if !app.drawing().is_drawing() {
                return None;
            }
            match viewport.point_at(mouse.column, mouse.row) {
                Some(point) => StrokeInput::PointerMove(point),
                None => StrokeInput::PointerLeave,
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if !app.drawing().is_drawing() {
                return None;
            }
            StrokeInput::PointerUp
        }
        _ => return None,
    };
    Some(Command::Stroke(input))
}
