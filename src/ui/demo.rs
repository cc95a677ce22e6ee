//! The sample dashboard the demo binary runs a tour over.
//!
//! Panels double as tour targets: each one is registered in the
//! [`Document`] and annotated with a step, so the default demo tour comes
//! entirely from the declarative source. The status bar carries no step and
//! exists to show off one-shot badges.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect as TermRect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::document::{Document, StepAnnotation, Target};
use crate::geometry::{Rect, Viewport};

pub const HEADER_TARGET: &str = "header";
pub const QUEUE_TARGET: &str = "queue-panel";
pub const ACTIVITY_TARGET: &str = "activity-panel";
pub const LOG_TARGET: &str = "log-panel";
pub const STATUS_TARGET: &str = "status-bar";

/// Computed panel areas for one frame.
#[derive(Debug, Clone, Copy)]
pub struct DemoLayout {
    pub header: TermRect,
    pub queue: TermRect,
    pub activity: TermRect,
    pub log: TermRect,
    pub status: TermRect,
}

#[derive(Debug, Default)]
pub struct DemoScreen;

impl DemoScreen {
    pub fn new() -> Self {
        Self
    }

    pub fn layout(area: TermRect) -> DemoLayout {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(8),
                Constraint::Length(1),
            ])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(40),
                Constraint::Percentage(30),
            ])
            .split(rows[1]);

        DemoLayout {
            header: rows[0],
            queue: columns[0],
            activity: columns[1],
            log: columns[2],
            status: rows[2],
        }
    }

    /// Build the document for an initial terminal size, annotating each
    /// panel with its tour step.
    pub fn build_document(area: TermRect) -> Document {
        let layout = Self::layout(area);
        let mut document = Document::new(Viewport::new(
            i32::from(area.width),
            i32::from(area.height),
        ));

        let mut add = |id: &str, rect: TermRect, annotation: Option<StepAnnotation>| {
            let target = Target {
                id: id.to_string(),
                parent: None,
                rect: page_rect(rect),
                annotation,
            };
            if let Err(err) = document.add_target(target) {
                tracing::warn!(%err, "skipping demo target");
            }
        };

        add(
            HEADER_TARGET,
            layout.header,
            Some(StepAnnotation {
                step: 1,
                kind: Some("tooltip".to_string()),
                text: Some("This is the dashboard header. Press Enter or \u{2192} to continue.".to_string()),
                ..StepAnnotation::default()
            }),
        );
        add(
            QUEUE_TARGET,
            layout.queue,
            Some(StepAnnotation {
                step: 2,
                kind: Some("tooltip".to_string()),
                text: Some("Waiting work lands in the queue panel.".to_string()),
                ..StepAnnotation::default()
            }),
        );
        add(
            ACTIVITY_TARGET,
            layout.activity,
            Some(StepAnnotation {
                step: 3,
                kind: Some("tooltip".to_string()),
                text: Some("Running jobs report progress here. This step advances on its own when autoplay is enabled.".to_string()),
                duration: Some(4),
                ..StepAnnotation::default()
            }),
        );
        add(
            LOG_TARGET,
            layout.log,
            Some(StepAnnotation {
                step: 4,
                kind: Some("tooltip".to_string()),
                text: Some("Recent events scroll through the log panel. That's the tour!".to_string()),
                ..StepAnnotation::default()
            }),
        );
        add(STATUS_TARGET, layout.status, None);

        document
    }

    /// Keep target rects and the viewport in step with the real layout.
    pub fn sync_document(document: &mut Document, area: TermRect) {
        let layout = Self::layout(area);
        document.set_viewport(Viewport::new(
            i32::from(area.width),
            i32::from(area.height),
        ));
        document.set_rect(HEADER_TARGET, page_rect(layout.header));
        document.set_rect(QUEUE_TARGET, page_rect(layout.queue));
        document.set_rect(ACTIVITY_TARGET, page_rect(layout.activity));
        document.set_rect(LOG_TARGET, page_rect(layout.log));
        document.set_rect(STATUS_TARGET, page_rect(layout.status));
    }

    pub fn render(&self, frame: &mut Frame) {
        let layout = Self::layout(frame.area());

        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                " cicerone ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" guided tour demo"),
        ]));
        frame.render_widget(header, layout.header);

        let queue_items: Vec<ListItem> = ["refresh cache", "rebuild index", "compact storage"]
            .iter()
            .map(|item| ListItem::new(format!("\u{2022} {item}")))
            .collect();
        let queue = List::new(queue_items).block(
            Block::default()
                .title(" QUEUE ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        );
        frame.render_widget(queue, layout.queue);

        let activity_lines = vec![
            Line::from("rebuild index   \u{2588}\u{2588}\u{2588}\u{2588}\u{2591}\u{2591} 64%"),
            Line::from("refresh cache   queued"),
        ];
        let activity = Paragraph::new(activity_lines).block(
            Block::default()
                .title(" ACTIVITY ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        );
        frame.render_widget(activity, layout.activity);

        let log_lines = vec![
            Line::from("12:01 cache refreshed"),
            Line::from("12:04 index rebuild started"),
            Line::from("12:05 2 warnings"),
        ];
        let log = Paragraph::new(log_lines).block(
            Block::default()
                .title(" LOG ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        );
        frame.render_widget(log, layout.log);

        let status = Paragraph::new(
            " s: start tour   b: badge   q: quit   (Esc/\u{2190}/\u{2192}/Enter inside a tour)",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(status, layout.status);
    }
}

fn page_rect(rect: TermRect) -> Rect {
    Rect::new(
        i32::from(rect.y),
        i32::from(rect.x),
        i32::from(rect.width),
        i32::from(rect.height),
    )
}
