use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{event, terminal};
use folio_application::{
    AppContext, LoadTicket, ModalSession, grid_neighbor, group_by_category,
};
use folio_core::{AssetSource, BookId, ContactService, TextKey, ViewMode};
use folio_engine::{ShelfEngine, TextFetcher};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui_image::picker::Picker;

mod contact;
mod grid_view;
mod image_protocol;
mod keymap;
mod markdown;
mod modal_view;
mod scene_view;
mod theme;

use contact::ContactForm;
use grid_view::{GridState, GridView};
use image_protocol::CoverProtocols;
use keymap::{ModalShortcut, Shortcut, help_lines, main_shortcut, modal_shortcut};
use modal_view::{ModalView, NotesMetrics};
use scene_view::{SceneCanvas, aspect_for, cell_to_ndc};
use theme::{Palette, rgb};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);
const ORBIT_KEY_STEP: f32 = 6.0;
const WHEEL_SCROLL_ROWS: i32 = 3;

#[derive(Debug, Clone)]
pub struct UiOutcome {
    pub ctx: AppContext,
}

/// Mouse cursor hint; terminals cannot change the pointer shape, so it is drawn in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum CursorHint {
    #[default]
    Default,
    Pointer,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    button: MouseButton,
    column: u16,
    row: u16,
    moved: bool,
}

pub struct Ui<'a> {
    ctx: AppContext,
    contact: &'a mut dyn ContactService,
    engine: ShelfEngine,
    fetcher: TextFetcher<LoadTicket>,
    modal: ModalSession,
    contact_form: ContactForm,
    picker: Picker,
    protocols: CoverProtocols,
    grid: GridState,
    scene_area: Rect,
    notes: NotesMetrics,
    drag: Option<Drag>,
    cursor: CursorHint,
    help_open: bool,
}

impl<'a> Ui<'a> {
    pub fn new(
        mut ctx: AppContext,
        assets: Arc<dyn AssetSource>,
        contact: &'a mut dyn ContactService,
    ) -> Self {
        ctx.settings.normalize();
        let mut engine = ShelfEngine::new(&ctx.catalog, Arc::clone(&assets));
        engine.set_reduced_motion(ctx.settings.reduced_motion);
        let modal = ModalSession::new(ctx.settings.language);
        Self {
            ctx,
            contact,
            engine,
            fetcher: TextFetcher::new(assets),
            modal,
            contact_form: ContactForm::default(),
            picker: Picker::halfblocks(),
            protocols: CoverProtocols::default(),
            grid: GridState::default(),
            scene_area: Rect::default(),
            notes: NotesMetrics::default(),
            drag: None,
            cursor: CursorHint::Default,
            help_open: false,
        }
    }

    pub fn run(&mut self) -> anyhow::Result<UiOutcome> {
        let mut terminal = setup_terminal()?;
        self.picker = image_protocol::detect_picker();
        log::info!(
            "terminal graphics: {}",
            image_protocol::protocol_label(&self.picker)
        );
        self.protocols.clear();
        terminal.clear().ok();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        let restore_result = restore_terminal(&mut terminal);

        match (result, restore_result) {
            (Ok(Ok(outcome)), Ok(())) => Ok(outcome),
            (Ok(Ok(_)), Err(err)) => Err(err),
            (Ok(Err(err)), _) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<UiOutcome> {
        let mut last = Instant::now();
        loop {
            let now = Instant::now();
            self.step(now.duration_since(last).as_secs_f32());
            last = now;
            terminal.draw(|frame| self.draw(frame.area(), frame))?;

            let mut timeout = FRAME_INTERVAL.saturating_sub(now.elapsed());
            while event::poll(timeout)? {
                let quit = match event::read()? {
                    Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
                    Event::Mouse(mouse) => {
                        self.handle_mouse(mouse);
                        false
                    }
                    Event::Resize(_, _) => {
                        self.protocols.clear();
                        false
                    }
                    _ => false,
                };
                if quit {
                    return Ok(UiOutcome {
                        ctx: self.ctx.clone(),
                    });
                }
                timeout = Duration::ZERO;
            }
        }
    }

    /// One frame of background work: notes results, modal sync, scene animation.
    fn step(&mut self, dt: f32) {
        for (ticket, result) in self.fetcher.poll() {
            self.modal.resolve(&ticket, result);
        }

        let snapshot = self.ctx.store.snapshot();
        if let Some(ticket) = self.modal.sync(&snapshot) {
            let reference = ticket.content_ref.clone();
            self.fetcher.spawn(ticket, &reference);
        }

        for event in self.engine.tick(dt, snapshot.hovered_book_id()) {
            log::debug!("cover {} settled (loaded: {})", event.reference, event.loaded);
        }
    }

    fn palette(&self) -> Palette {
        Palette::for_theme(self.ctx.settings.theme)
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.contact_form.open {
            self.contact_form.handle_key(key, &mut *self.contact);
            return false;
        }
        if self.help_open {
            self.help_open = false;
            return false;
        }
        if self.ctx.store.snapshot().is_modal_open() {
            self.handle_modal_key(key);
            return false;
        }
        let Some(shortcut) = main_shortcut(key) else {
            return false;
        };
        self.apply_shortcut(shortcut)
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        match modal_shortcut(key, self.notes.page) {
            Some(ModalShortcut::Close) => self.ctx.store.close_book_modal(),
            Some(ModalShortcut::Previous) => {
                self.ctx.open_relative(-1);
            }
            Some(ModalShortcut::Next) => {
                self.ctx.open_relative(1);
            }
            Some(ModalShortcut::Scroll(delta)) => self.modal.scroll_by(delta, self.notes.max_scroll),
            None => {}
        }
    }

    fn apply_shortcut(&mut self, shortcut: Shortcut) -> bool {
        let scene = self.ctx.settings.view_mode == ViewMode::Scene;
        match shortcut {
            Shortcut::Quit => return true,
            Shortcut::Navigate(direction) => {
                let hovered = self.ctx.store.snapshot().hovered_book_id().cloned();
                let groups = group_by_category(&self.ctx.catalog);
                let next = grid_neighbor(&groups, hovered.as_ref(), direction);
                if next.is_some() {
                    self.ctx.store.set_hovered_book(next);
                }
                self.cursor = CursorHint::Default;
            }
            Shortcut::Open => {
                if let Some(id) = self.ctx.store.snapshot().hovered_book_id() {
                    self.ctx.open_book(id);
                }
            }
            Shortcut::ToggleView => {
                self.ctx.settings.cycle_view_mode();
                self.drag = None;
                log::info!("view mode: {}", self.ctx.settings.view_mode.as_str());
            }
            Shortcut::CycleTheme => self.ctx.settings.cycle_theme(),
            Shortcut::CycleLanguage => {
                self.ctx.settings.cycle_language();
                self.modal.set_language(self.ctx.settings.language);
            }
            Shortcut::ToggleReducedMotion => {
                self.ctx.settings.reduced_motion = !self.ctx.settings.reduced_motion;
                self.engine.set_reduced_motion(self.ctx.settings.reduced_motion);
            }
            Shortcut::Contact => self.contact_form.open(),
            Shortcut::Help => self.help_open = true,
            Shortcut::Orbit { dx, dy } if scene => self
                .engine
                .orbit_mut()
                .rotate(f32::from(dx) * ORBIT_KEY_STEP, f32::from(dy) * ORBIT_KEY_STEP),
            Shortcut::Zoom(steps) if scene => self.engine.orbit_mut().zoom(f32::from(steps)),
            Shortcut::ResetCamera if scene => self.engine.orbit_mut().reset(),
            Shortcut::Orbit { .. } | Shortcut::Zoom(_) | Shortcut::ResetCamera => {}
        }
        false
    }

    fn book_at(&self, column: u16, row: u16) -> Option<BookId> {
        match self.ctx.settings.view_mode {
            ViewMode::Scene => cell_to_ndc(self.scene_area, column, row)
                .and_then(|point| self.engine.pick(point, aspect_for(self.scene_area))),
            ViewMode::Grid => self.grid.hit(column, row).cloned(),
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.contact_form.open || self.help_open {
            return;
        }
        if self.ctx.store.snapshot().is_modal_open() {
            match mouse.kind {
                MouseEventKind::ScrollUp => {
                    self.modal.scroll_by(-WHEEL_SCROLL_ROWS, self.notes.max_scroll)
                }
                MouseEventKind::ScrollDown => {
                    self.modal.scroll_by(WHEEL_SCROLL_ROWS, self.notes.max_scroll)
                }
                _ => {}
            }
            return;
        }

        let scene = self.ctx.settings.view_mode == ViewMode::Scene;
        match mouse.kind {
            MouseEventKind::Moved => {
                let picked = self.book_at(mouse.column, mouse.row);
                self.cursor = if picked.is_some() {
                    CursorHint::Pointer
                } else {
                    CursorHint::Default
                };
                self.ctx.store.set_hovered_book(picked);
            }
            MouseEventKind::Down(button) => {
                self.drag = Some(Drag {
                    button,
                    column: mouse.column,
                    row: mouse.row,
                    moved: false,
                });
            }
            MouseEventKind::Drag(_) => {
                let Some(drag) = self.drag.as_mut() else {
                    return;
                };
                let dx = f32::from(mouse.column) - f32::from(drag.column);
                let dy = f32::from(mouse.row) - f32::from(drag.row);
                drag.column = mouse.column;
                drag.row = mouse.row;
                drag.moved = true;
                let button = drag.button;
                if scene {
                    match button {
                        MouseButton::Left => self.engine.orbit_mut().rotate(dx, dy * 2.0),
                        _ => self.engine.orbit_mut().pan(dx, dy * 2.0),
                    }
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let clicked = self.drag.take().is_some_and(|drag| !drag.moved);
                if clicked && let Some(id) = self.book_at(mouse.column, mouse.row) {
                    self.ctx.open_book(&id);
                }
            }
            MouseEventKind::Up(_) => self.drag = None,
            MouseEventKind::ScrollUp if scene => self.engine.orbit_mut().zoom(1.0),
            MouseEventKind::ScrollDown if scene => self.engine.orbit_mut().zoom(-1.0),
            MouseEventKind::ScrollUp => {
                self.grid.scroll = self.grid.scroll.saturating_sub(WHEEL_SCROLL_ROWS as u16)
            }
            MouseEventKind::ScrollDown => {
                self.grid.scroll = self.grid.scroll.saturating_add(WHEEL_SCROLL_ROWS as u16)
            }
            _ => {}
        }
    }

    fn header_line(&self, palette: &Palette) -> Line<'static> {
        let language = self.ctx.settings.language;
        let view = match self.ctx.settings.view_mode {
            ViewMode::Scene => TextKey::SceneView,
            ViewMode::Grid => TextKey::GridView,
        };
        Line::from(vec![
            Span::styled(
                language.text(TextKey::SiteTitle),
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    "  {}  ·  {}  ·  {}",
                    language.text(view),
                    self.ctx.settings.theme.as_str(),
                    language.as_str()
                ),
                Style::default().fg(palette.muted),
            ),
        ])
    }

    fn footer_lines(&self, palette: &Palette) -> Vec<Line<'static>> {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let status = match self.ctx.hovered_book() {
            Some(book) => {
                let marker = match self.cursor {
                    CursorHint::Pointer => "☛ ",
                    CursorHint::Default => "▸ ",
                };
                Line::from(vec![
                    Span::styled(marker, Style::default().fg(palette.accent)),
                    Span::styled(book.title.clone(), bold.fg(palette.text)),
                    Span::styled(format!("  {}", book.category), Style::default().fg(rgb(book.accent_color))),
                ])
            }
            None => Line::raw(""),
        };
        let mut hints = vec![
            Span::styled("←↑↓→", bold),
            Span::raw(" move  "),
            Span::styled("Enter", bold),
            Span::raw(" open  "),
            Span::styled("v", bold),
            Span::raw(" view  "),
            Span::styled("?", bold),
            Span::raw(format!(" {}  ", self.ctx.settings.language.text(TextKey::Help))),
            Span::styled("q", bold),
            Span::raw(" quit"),
        ];
        let pending = self.engine.covers().pending();
        if pending > 0 {
            hints.push(Span::styled(
                format!("  ({pending} covers loading)"),
                Style::default().fg(palette.muted),
            ));
        }
        vec![status, Line::from(hints)]
    }

    fn draw(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let palette = self.palette();
        frame.render_widget(Clear, area);
        frame.render_widget(
            Block::default().style(Style::default().bg(rgb(palette.background))),
            area,
        );

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(area);

        frame.render_widget(
            Paragraph::new(self.header_line(&palette)).block(Block::default().borders(Borders::BOTTOM)),
            layout[0],
        );

        let snapshot = self.ctx.store.snapshot();
        let hovered = snapshot.hovered_book_id();
        match self.ctx.settings.view_mode {
            ViewMode::Scene => {
                self.scene_area = layout[1];
                self.grid.hits.clear();
                frame.render_widget(
                    SceneCanvas {
                        engine: &self.engine,
                        hovered,
                        background: palette.background,
                        label_style: Style::default().add_modifier(Modifier::BOLD),
                    },
                    layout[1],
                );
            }
            ViewMode::Grid => {
                self.scene_area = Rect::default();
                let groups = group_by_category(&self.ctx.catalog);
                GridView {
                    groups: &groups,
                    hovered,
                    covers: self.engine.covers(),
                    picker: &self.picker,
                    palette: &palette,
                    language: self.ctx.settings.language,
                }
                .draw(layout[1], frame, &mut self.grid, &mut self.protocols);
            }
        }

        frame.render_widget(
            Paragraph::new(Text::from(self.footer_lines(&palette)))
                .block(Block::default().borders(Borders::TOP)),
            layout[2],
        );

        if let Some(book) = self
            .modal
            .open_for()
            .and_then(|id| self.ctx.catalog.book(id))
        {
            let view = ModalView {
                book,
                category: self.ctx.catalog.category(&book.category),
                session: &self.modal,
                cover: self.engine.covers().image(&book.cover_image_ref),
                picker: &self.picker,
                palette: &palette,
                language: self.ctx.settings.language,
                time: self.engine.time(),
            };
            self.notes = view.draw(area, frame, &mut self.protocols);
        }

        if self.contact_form.open {
            self.contact_form
                .draw(area, frame, self.ctx.settings.language, &palette);
        }

        if self.help_open {
            self.draw_help(area, frame, &palette);
        }
    }

    fn draw_help(&self, area: Rect, frame: &mut ratatui::Frame, palette: &Palette) {
        let popup = centered_rect(50, 60, area);
        frame.render_widget(Clear, popup);
        let lines: Vec<Line<'static>> = help_lines()
            .iter()
            .map(|(keys, action)| {
                Line::from(vec![
                    Span::styled(
                        format!("{keys:>10}  "),
                        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(*action, Style::default().fg(palette.text)),
                ])
            })
            .collect();
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(self.ctx.settings.language.text(TextKey::Help)),
            ),
            popup,
        );
    }
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)
        .context("leave alt screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
