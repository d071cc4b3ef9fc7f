//! The whole draw → recognize → edit → solve loop driven by terminal events.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use wiremock::{MockServer, ResponseTemplate};

use inksolve_engine::{App, InputMode, WorkflowStep};
use inksolve_tui::command_for_event;

use crate::common::{
    FENCED_SOLUTION, app_for, mount_recognition, mount_solution, render, settle, text_response,
};

fn send(app: &mut App, event: Event) {
    if let Some(command) = command_for_event(app, event) {
        app.dispatch(command);
    }
}

fn press(app: &mut App, code: KeyCode) {
    send(app, Event::Key(KeyEvent::new(code, KeyModifiers::NONE)));
}

fn mouse(app: &mut App, kind: MouseEventKind, column: u16, row: u16) {
    send(
        app,
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }),
    );
}

fn drag_stroke(app: &mut App, from: (u16, u16), to: (u16, u16)) {
    mouse(app, MouseEventKind::Down(MouseButton::Left), from.0, from.1);
    let steps = 6;
    for i in 1..=steps {
        let column = from.0 + (to.0 - from.0) * i / steps;
        let row = from.1 + (to.1 - from.1) * i / steps;
        mouse(app, MouseEventKind::Drag(MouseButton::Left), column, row);
    }
    mouse(app, MouseEventKind::Up(MouseButton::Left), to.0, to.1);
}

#[tokio::test]
async fn draw_recognize_edit_solve_from_the_keyboard() {
    let server = MockServer::start().await;
    mount_recognition(&server, text_response("2x + 3 = 13")).await;
    mount_solution(&server, text_response(FENCED_SOLUTION)).await;

    let mut app = app_for(&server);
    // The first frame lays out the canvas so mouse cells can be mapped.
    render(&mut app, 80, 24);

    drag_stroke(&mut app, (5, 5), (30, 10));
    drag_stroke(&mut app, (40, 4), (40, 12));
    press(&mut app, KeyCode::Char('u'));
    drag_stroke(&mut app, (45, 4), (50, 12));
    assert_eq!(app.drawing().stroke_count(), 2);
    assert!(render(&mut app, 80, 24).contains("2 strokes"));

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.current_step(), WorkflowStep::Recognize);
    settle(&mut app).await;

    assert_eq!(app.current_step(), WorkflowStep::Edit);
    assert_eq!(app.input_mode(), InputMode::Editing);
    let screen = render(&mut app, 80, 24);
    assert!(screen.contains("Recognized: 2x + 3 = 13"), "{screen}");

    // Fix up the recognized text before solving.
    press(&mut app, KeyCode::End);
    press(&mut app, KeyCode::Char(' '));
    press(&mut app, KeyCode::Backspace);
    assert_eq!(app.editor().text(), "2x + 3 = 13");

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.current_step(), WorkflowStep::Solve);
    settle(&mut app).await;

    let screen = render(&mut app, 80, 24);
    assert!(screen.contains("Step 1. Subtract 3"), "{screen}");
    assert!(screen.contains("Step 2. Divide by 2"), "{screen}");
    assert!(screen.contains("Answer: $$x=5$$"), "{screen}");
    assert!(!screen.contains("Subtract 3 from both sides."), "{screen}");

    press(&mut app, KeyCode::Char(' '));
    let screen = render(&mut app, 80, 24);
    assert!(screen.contains("Subtract 3 from both sides."), "{screen}");

    press(&mut app, KeyCode::Down);
    assert_eq!(app.selected_step(), 1);

    press(&mut app, KeyCode::Esc);
    assert_eq!(app.current_step(), WorkflowStep::Edit);
    assert_eq!(app.editor().text(), "2x + 3 = 13");

    send(
        &mut app,
        Event::Key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL)),
    );
    assert_eq!(app.current_step(), WorkflowStep::Draw);
    assert!(app.drawing().is_empty());
}

#[tokio::test]
async fn recognition_failure_offers_retry_and_back() {
    let server = MockServer::start().await;
    mount_recognition(&server, ResponseTemplate::new(500).set_body_string("boom")).await;

    let mut app = app_for(&server);
    render(&mut app, 80, 24);
    drag_stroke(&mut app, (5, 5), (20, 8));
    press(&mut app, KeyCode::Enter);
    settle(&mut app).await;

    assert_eq!(app.current_step(), WorkflowStep::Recognize);
    let screen = render(&mut app, 80, 24);
    assert!(screen.contains("API error 500: boom"), "{screen}");
    assert!(screen.contains("back to draw"), "{screen}");

    press(&mut app, KeyCode::Esc);
    assert_eq!(app.current_step(), WorkflowStep::Draw);
    assert_eq!(app.drawing().stroke_count(), 1, "strokes survive the error");
}
