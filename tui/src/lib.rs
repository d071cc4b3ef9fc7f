//! TUI rendering for inksolve using ratatui.

mod canvas;
mod chart;
mod input;
mod theme;

pub use canvas::SegmentSurface;
pub use input::{
    InputPump, command_for_event, command_for_key, command_for_mouse, handle_events,
};
pub use theme::{Glyphs, Palette, glyphs, palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use inksolve_engine::{
    App, CanvasViewport, InputMode, SolutionView, WorkflowStep, sanitize_terminal_text,
};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
    let options = app.ui_options();
    let palette = palette(options);
    let glyphs = glyphs(options);
    // Clear with background color
    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Step indicator
            Constraint::Min(3),    // Active step
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0], &palette, &glyphs);
    match app.current_step() {
        WorkflowStep::Draw => draw_canvas_view(frame, app, chunks[1], &palette, &glyphs),
        WorkflowStep::Recognize => {
            draw_recognize_view(frame, app, chunks[1], &palette, &glyphs);
        }
        WorkflowStep::Edit => draw_edit_view(frame, app, chunks[1], &palette, &glyphs),
        WorkflowStep::Solve => draw_solve_view(frame, app, chunks[1], &palette, &glyphs),
    }
    draw_status_bar(frame, app, chunks[2], &palette, &glyphs);

    if app.key_entry().is_some() {
        draw_key_modal(frame, app, &palette, &glyphs);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let model = format!(" {} ", app.model());
    let [left, right] = Layout::horizontal([
        Constraint::Min(1),
        Constraint::Length(model.width() as u16),
    ])
    .areas(area);

    let mut spans = vec![Span::styled(" inksolve  ", styles::title(palette))];
    for (index, (step, mark)) in app.workflow().indicator().into_iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(
                format!(" {} ", glyphs.step_separator),
                Style::default().fg(palette.bg_border),
            ));
        }
        let mut style = Style::default().fg(palette.step_mark(mark));
        if step == app.current_step() {
            style = style.add_modifier(Modifier::BOLD);
        }
        spans.push(Span::styled(
            format!("{} {} {}", glyphs.step_mark(mark), step.number(), step.label()),
            style,
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), left);
    frame.render_widget(
        Paragraph::new(model)
            .style(Style::default().fg(palette.text_muted))
            .alignment(Alignment::Right),
        right,
    );
}

fn panel<'a>(title: &'a str, palette: &Palette) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .title(Span::styled(title, styles::title(palette)))
}

/// Carve one row off the bottom of `area` for an inline error.
fn split_error(area: Rect, has_error: bool) -> (Rect, Option<Rect>) {
    if !has_error || area.height < 4 {
        return (area, None);
    }
    let [body, error] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);
    (body, Some(error))
}

fn error_line<'a>(message: &str, palette: &Palette, glyphs: &Glyphs) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!(" {} ", glyphs.error), styles::error(palette)),
        Span::styled(
            sanitize_terminal_text(message).into_owned(),
            Style::default().fg(palette.error),
        ),
    ])
}

fn draw_canvas_view(
    frame: &mut Frame,
    app: &mut App,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let error = app.error_for(WorkflowStep::Draw).map(ToString::to_string);
    let (canvas_area, error_area) = split_error(area, error.is_some());

    let drawing = app.drawing();
    let stats = format!(
        " {} strokes {} {} points ",
        drawing.stroke_count(),
        glyphs.separator,
        drawing.point_count()
    );
    let block = panel(" Draw an expression ", palette)
        .title_bottom(
            Line::from(Span::styled(stats, styles::key_hint(palette))).right_aligned(),
        );

    let inner = block.inner(canvas_area);
    app.set_viewport(CanvasViewport::new(
        inner.x,
        inner.y,
        inner.width,
        inner.height,
    ));
    canvas::render_drawing(frame, canvas_area, block, app, palette);

    if let (Some(error), Some(error_area)) = (error, error_area) {
        frame.render_widget(
            Paragraph::new(error_line(&error, palette, glyphs)),
            error_area,
        );
    }
}

/// Spinner line for the in-flight call, e.g. `⠋ Recognizing... 3s`.
fn busy_line<'a>(app: &App, palette: &Palette) -> Option<Line<'a>> {
    let kind = app.busy_kind()?;
    let elapsed = app.busy_elapsed().map_or(0, |d| d.as_secs());
    Some(Line::from(vec![
        Span::styled(
            format!("{} ", spinner_frame(app.tick_count(), app.ui_options())),
            Style::default().fg(palette.accent),
        ),
        Span::styled(
            format!("{}...", kind.label()),
            Style::default().fg(palette.text_primary),
        ),
        Span::styled(format!(" {elapsed}s"), styles::key_hint(palette)),
    ]))
}

fn draw_recognize_view(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let mut lines = Vec::new();
    if let Some(line) = busy_line(app, palette) {
        lines.push(line);
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "Reading {} strokes from the canvas. Esc cancels.",
                app.drawing().stroke_count()
            ),
            styles::key_hint(palette),
        )));
    } else if let Some(error) = app.error_for(WorkflowStep::Recognize) {
        lines.push(error_line(&error.to_string(), palette, glyphs));
        lines.push(Line::from(""));
        lines.push(hint_line(
            &[("r", "retry"), ("Esc", "back to draw")],
            palette,
            glyphs,
        ));
    }

    let block = panel(" Recognize ", palette).padding(Padding::uniform(1));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_edit_view(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let error = app.error_for(WorkflowStep::Edit).map(ToString::to_string);
    let [preview_area, editor_area, rest] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    let preview = match app.recognized_text() {
        Some(text) => Line::from(vec![
            Span::styled(" Recognized: ", styles::key_hint(palette)),
            Span::styled(
                sanitize_terminal_text(text).into_owned(),
                styles::equation(palette),
            ),
        ]),
        None => Line::from(Span::styled(
            " Type the expression to solve (LaTeX or plain text).",
            styles::key_hint(palette),
        )),
    };
    frame.render_widget(Paragraph::new(preview), preview_area);

    let editor = app.editor();
    let text = sanitize_terminal_text(editor.text()).into_owned();
    let before_cursor = sanitize_terminal_text(editor.text_before_cursor());
    let block = panel(" Expression ", palette);
    let inner = block.inner(editor_area);
    let (scroll, cursor_x) = horizontal_scroll(before_cursor.width(), inner.width);
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(palette.text_primary))
            .scroll((0, scroll))
            .block(block),
        editor_area,
    );
    if app.input_mode() == InputMode::Editing {
        frame.set_cursor_position(Position::new(inner.x + cursor_x, inner.y));
    }

    let mut lines = Vec::new();
    if let Some(error) = error {
        lines.push(error_line(&error, palette, glyphs));
    }
    lines.push(hint_line(&[("Enter", "solve"), ("Ctrl+N", "start over")], palette, glyphs));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), rest);
}

/// Column offset that keeps the cursor inside a one-line field, and the
/// cursor's column relative to the field.
fn horizontal_scroll(cursor_width: usize, field_width: u16) -> (u16, u16) {
    let field = usize::from(field_width.max(1));
    let scroll = (cursor_width + 1).saturating_sub(field);
    let scroll = u16::try_from(scroll).unwrap_or(u16::MAX);
    let cursor = u16::try_from(cursor_width).unwrap_or(u16::MAX).saturating_sub(scroll);
    (scroll, cursor)
}

fn draw_solve_view(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let expression = sanitize_terminal_text(app.editor().text().trim()).into_owned();
    let title = format!(" Solve: {expression} ");

    if let Some(line) = busy_line(app, palette) {
        let block = panel(&title, palette).padding(Padding::uniform(1));
        frame.render_widget(Paragraph::new(line).block(block), area);
        return;
    }

    if let Some(error) = app.error_for(WorkflowStep::Solve) {
        let lines = vec![
            error_line(&error.to_string(), palette, glyphs),
            Line::from(""),
            hint_line(&[("r", "retry"), ("Esc", "back to edit")], palette, glyphs),
        ];
        let block = panel(&title, palette).padding(Padding::uniform(1));
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            area,
        );
        return;
    }

    let Some(solution) = app.solution() else {
        return;
    };

    let chart_height = if solution.chart.is_some() {
        (area.height / 2).min(16)
    } else {
        0
    };
    let [steps_area, chart_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(chart_height)]).areas(area);

    let (lines, selected_line) = solution_lines(
        solution,
        app.selected_step(),
        |number| app.is_step_expanded(number),
        palette,
        glyphs,
    );
    let block = panel(&title, palette).padding(Padding::horizontal(1));
    let inner = block.inner(steps_area);
    let rows = wrapped_line_rows(&lines, inner.width);
    let scroll = selection_scroll(&rows, selected_line, usize::from(inner.height));
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0)),
        steps_area,
    );

    if let Some(spec) = &solution.chart
        && chart_height > 0
    {
        chart::render_chart(frame, chart_area, panel(" Graph ", palette), spec, palette);
    }
}

fn wrapped_line_rows(lines: &[Line], width: u16) -> Vec<usize> {
    let width = width.max(1);
    lines
        .iter()
        .map(|line| {
            Paragraph::new(line.clone())
                .wrap(Wrap { trim: false })
                .line_count(width)
        })
        .collect()
}

/// Rows to scroll so the selected heading and the two lines after it stay
/// on screen. The heading wins when they don't all fit.
fn selection_scroll(rows: &[usize], selected_line: usize, visible: usize) -> usize {
    let start: usize = rows.iter().take(selected_line).sum();
    let end: usize = rows.iter().take(selected_line + 3).sum();
    end.saturating_sub(visible).min(start)
}

/// Lines for the step list and final answer, plus the index of the
/// selected step's heading.
fn solution_lines<'a>(
    solution: &SolutionView,
    selected: usize,
    is_expanded: impl Fn(usize) -> bool,
    palette: &Palette,
    glyphs: &Glyphs,
) -> (Vec<Line<'a>>, usize) {
    let mut lines = Vec::new();
    let mut selected_line = 0;

    if solution.steps.is_empty() {
        lines.push(Line::from(Span::styled(
            "No steps were returned.",
            styles::key_hint(palette),
        )));
    }

    for (index, step) in solution.steps.iter().enumerate() {
        let is_selected = index == selected;
        if is_selected {
            selected_line = lines.len();
        }
        let expanded = is_expanded(step.number);
        let pointer = if is_selected { glyphs.selected } else { " " };
        let marker = match (step.is_expandable(), expanded) {
            (true, true) => glyphs.expanded,
            (true, false) => glyphs.collapsed,
            (false, _) => glyphs.bullet,
        };
        let mut title_style = Style::default().fg(palette.text_primary);
        if is_selected {
            title_style = title_style.add_modifier(Modifier::BOLD);
        }
        lines.push(Line::from(vec![
            Span::styled(format!("{pointer} "), Style::default().fg(palette.peach)),
            Span::styled(format!("{marker} "), Style::default().fg(palette.text_muted)),
            Span::styled(format!("Step {}. ", step.number), styles::title(palette)),
            Span::styled(sanitize_terminal_text(&step.title).into_owned(), title_style),
        ]));
        if let Some(equation) = &step.equation {
            lines.push(Line::from(Span::styled(
                format!("      {}", sanitize_terminal_text(equation)),
                styles::equation(palette),
            )));
        }
        if expanded && let Some(supplement) = &step.supplement {
            for text in sanitize_terminal_text(supplement).lines() {
                lines.push(Line::from(Span::styled(
                    format!("      {text}"),
                    Style::default().fg(palette.text_secondary),
                )));
            }
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Answer: ", styles::title(palette)),
        Span::styled(
            sanitize_terminal_text(&solution.final_answer).into_owned(),
            Style::default()
                .fg(palette.success)
                .add_modifier(Modifier::BOLD),
        ),
    ]));

    (lines, selected_line)
}

fn hint_line<'a>(hints: &[(&'a str, &'a str)], palette: &Palette, glyphs: &Glyphs) -> Line<'a> {
    let mut spans = Vec::new();
    for (index, (key, action)) in hints.iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(
                format!(" {} ", glyphs.separator),
                styles::key_hint(palette),
            ));
        }
        spans.push(Span::styled(*key, styles::key_highlight(palette)));
        spans.push(Span::styled(format!(" {action}"), styles::key_hint(palette)));
    }
    Line::from(spans)
}

fn step_hints(app: &App) -> &'static [(&'static str, &'static str)] {
    if app.key_entry().is_some() {
        return &[("Enter", "save"), ("Tab", "show/hide"), ("Esc", "cancel")];
    }
    match app.current_step() {
        WorkflowStep::Draw => &[
            ("drag", "draw"),
            ("u", "undo"),
            ("c", "clear"),
            ("Enter", "recognize"),
            ("t", "type"),
            ("q", "quit"),
        ],
        WorkflowStep::Recognize => &[("r", "retry"), ("Esc", "back")],
        WorkflowStep::Edit => &[("Enter", "solve"), ("Ctrl+K", "key")],
        WorkflowStep::Solve => &[
            ("Up/Down", "select"),
            ("Space", "expand"),
            ("r", "retry"),
            ("Esc", "edit"),
        ],
    }
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let (badge, badge_style) = match (app.busy_kind(), app.input_mode()) {
        (Some(kind), _) => (kind.label().to_uppercase(), styles::mode_busy(palette)),
        (None, InputMode::KeyEntry) => ("KEY".to_string(), styles::mode_badge(palette)),
        (None, InputMode::Editing) => ("EDIT".to_string(), styles::mode_badge(palette)),
        (None, InputMode::Normal) => (
            app.current_step().label().to_uppercase(),
            styles::mode_badge(palette),
        ),
    };

    let key_state = match app.api_key_masked() {
        Some(masked) => Span::styled(
            format!("{} key {masked} ", glyphs.status_ready),
            Style::default().fg(palette.success),
        ),
        None => Span::styled(
            format!("{} no key (Ctrl+K) ", glyphs.status_missing),
            Style::default().fg(palette.warning),
        ),
    };
    let right = Line::from(key_state);
    let [left_area, right_area] = Layout::horizontal([
        Constraint::Min(1),
        Constraint::Length(right.width() as u16),
    ])
    .areas(area);

    let mut left = vec![
        Span::styled(format!(" {badge} "), badge_style),
        Span::raw(" "),
    ];
    match app.status() {
        Some(status) => left.push(Span::styled(
            sanitize_terminal_text(status).into_owned(),
            Style::default().fg(palette.text_secondary),
        )),
        None => left.extend(hint_line(step_hints(app), palette, glyphs).spans),
    }

    frame.render_widget(
        Paragraph::new(Line::from(left)).style(Style::default().bg(palette.bg_panel)),
        left_area,
    );
    frame.render_widget(
        Paragraph::new(right)
            .style(Style::default().bg(palette.bg_panel))
            .alignment(Alignment::Right),
        right_area,
    );
}

fn draw_key_modal(frame: &mut Frame, app: &App, palette: &Palette, glyphs: &Glyphs) {
    let Some(entry) = app.key_entry() else {
        return;
    };
    let area = frame.area();
    let width = 64.min(area.width.saturating_sub(4));
    let height = 7.min(area.height);
    let modal = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    let draft = entry.draft();
    let mask_char = if app.ui_options().ascii_only { "*" } else { "•" };
    let shown = if entry.is_revealed() {
        sanitize_terminal_text(draft.text()).into_owned()
    } else {
        mask_char.repeat(draft.text().chars().count())
    };
    let cursor_width = if entry.is_revealed() {
        sanitize_terminal_text(draft.text_before_cursor()).width()
    } else {
        draft.text_before_cursor().chars().count()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.primary))
        .title(Span::styled(" Gemini API key ", styles::title(palette)))
        .style(Style::default().bg(palette.bg_popup))
        .padding(Padding::horizontal(1));
    let inner = block.inner(modal);
    frame.render_widget(Clear, modal);
    frame.render_widget(block, modal);

    let [help_area, _, input_area, _, hint_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(
        Paragraph::new("Kept in memory for this session only.")
            .style(styles::key_hint(palette)),
        help_area,
    );
    let (scroll, cursor_x) = horizontal_scroll(cursor_width, input_area.width);
    frame.render_widget(
        Paragraph::new(shown)
            .style(
                Style::default()
                    .fg(palette.text_primary)
                    .bg(palette.bg_highlight),
            )
            .scroll((0, scroll)),
        input_area,
    );
    frame.render_widget(Paragraph::new(hint_line(step_hints(app), palette, glyphs)), hint_area);
    if input_area.height > 0 {
        frame.set_cursor_position(Position::new(input_area.x + cursor_x, input_area.y));
    }
}
