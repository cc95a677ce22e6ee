//! Demo host: a small dashboard with a tour running over it.
//!
//! The host owns the terminal and the input layer; the tour owns sequencing
//! and placement. Every key press, click, resize, and tick is translated
//! into a [`TourEvent`] and dispatched — the tour never reads the terminal
//! itself.

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect as TermRect, Terminal};
use std::io;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::events::{TourButton, TourEvent, TourKey};
use crate::tour::Tour;
use crate::ui::demo::{DemoScreen, STATUS_TARGET};
use crate::ui::TuiRenderer;

pub struct App {
    config: Config,
    tour: Tour<TuiRenderer>,
    screen: DemoScreen,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let initial_area = terminal_area()?;
        let document = DemoScreen::build_document(initial_area);
        let renderer = TuiRenderer::new(config.tour.clone());
        let tour = Tour::with_options(document, renderer, config.tour.clone());

        Ok(Self {
            config,
            tour,
            screen: DemoScreen::new(),
            should_quit: false,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(self.config.ui.tick_rate_ms);

        while !self.should_quit {
            // Keep target geometry honest before drawing
            let area = terminal.get_frame().area();
            DemoScreen::sync_document(self.tour.document_mut(), area);

            terminal.draw(|frame| {
                self.screen.render(frame);
                self.tour.renderer_mut().draw(frame);
            })?;

            // Handle events
            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key.code);
                    }
                    Event::Mouse(mouse) => {
                        if let MouseEventKind::Down(_) = mouse.kind {
                            self.handle_click(mouse.column, mouse.row);
                        }
                    }
                    Event::Resize(width, height) => {
                        DemoScreen::sync_document(
                            self.tour.document_mut(),
                            TermRect::new(0, 0, width, height),
                        );
                        self.tour.dispatch(TourEvent::Resized);
                    }
                    _ => {}
                }
            }

            // Fire any elapsed settle/advance/dismiss deadlines
            self.tour.poll_timers(Instant::now());
        }

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        // A running tour (or visible badge) owns the keyboard.
        if self.tour.input_attached() || self.tour.badge_visible() {
            match key {
                KeyCode::Esc => self.tour.dispatch(TourEvent::Key(TourKey::Escape)),
                KeyCode::Left => self.tour.dispatch(TourEvent::Key(TourKey::Left)),
                KeyCode::Right => self.tour.dispatch(TourEvent::Key(TourKey::Right)),
                KeyCode::Enter => self.tour.dispatch(TourEvent::Key(TourKey::Enter)),
                KeyCode::Char('n') => self.tour.dispatch(TourEvent::ButtonPressed(TourButton::Next)),
                KeyCode::Char('p') => {
                    self.tour.dispatch(TourEvent::ButtonPressed(TourButton::Previous));
                }
                KeyCode::Char('s') => self.tour.dispatch(TourEvent::ButtonPressed(TourButton::Skip)),
                KeyCode::Char(digit @ '1'..='9') => {
                    let number = i32::from(digit as u8 - b'0');
                    self.tour.dispatch(TourEvent::Goto(number));
                }
                _ => {}
            }
            return;
        }

        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Char('s') => {
                self.tour.start();
            }
            KeyCode::Char('b') => {
                self.tour.show_badge(STATUS_TARGET, None, Some(3));
            }
            _ => {}
        }
    }

    fn handle_click(&mut self, column: u16, row: u16) {
        if !self.tour.input_attached() && !self.tour.badge_visible() {
            return;
        }
        // Clicks inside the tooltip belong to its buttons (keyboard-driven
        // here); anything else is an overlay click.
        let inside_tooltip = self.tour.renderer().tooltip_area().is_some_and(|rect| {
            let (x, y) = (i32::from(column), i32::from(row));
            x >= rect.left && x < rect.right() && y >= rect.top && y < rect.bottom()
        });
        if !inside_tooltip {
            self.tour.dispatch(TourEvent::OverlayClicked);
        }
    }
}

/// Current terminal size, with a sane fallback for headless contexts.
fn terminal_area() -> Result<TermRect> {
    let (width, height) = crossterm::terminal::size().unwrap_or((120, 40));
    Ok(TermRect::new(0, 0, width, height))
}
