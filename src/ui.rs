use std::time::Duration;

use itertools::{EitherOrBoth, Itertools};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::session::TypingSession;
use crate::theme::Theme;

const HORIZONTAL_MARGIN: u16 = 5;

/// Everything the practice screen needs for one frame.
pub struct SessionView<'a> {
    pub session: &'a TypingSession,
    pub theme: Theme,
    pub elapsed: Duration,
    pub status: Option<&'a str>,
}

impl Widget for &SessionView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = self.session;
        let theme = self.theme;

        if session.is_paused() {
            let paused = Paragraph::new(Span::styled(
                "PAUSED - ctrl+p to resume",
                theme.status().add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            paused.render(area, buf);
            return;
        }

        let chunk_text_width: usize = session
            .chunk_words()
            .iter()
            .map(|w| w.width() + 1)
            .sum();
        let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
        let chunk_lines =
            ((chunk_text_width as f64 / max_chars_per_line as f64).ceil() as u16).max(1) + 1;

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints(
                [
                    Constraint::Length(1),
                    Constraint::Min(chunk_lines),
                    Constraint::Length(1),
                    Constraint::Length(1),
                ]
                .as_ref(),
            )
            .split(area);

        let progress = Gauge::default()
            .gauge_style(theme.accent())
            .percent(session.progress_percent() as u16)
            .label(format!("{}%", session.progress_percent()));
        progress.render(rows[0], buf);

        let words = if session.is_complete() {
            completion_line(session, theme)
        } else {
            chunk_line(session, theme)
        };
        Paragraph::new(words)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true })
            .render(rows[1], buf);

        let footer = Line::from(vec![
            Span::styled(format!("{} wpm", session.wpm()), theme.accent()),
            Span::raw("   "),
            Span::styled(format!("{}% acc", session.accuracy()), theme.accent()),
            Span::raw("   "),
            Span::raw(format_elapsed(self.elapsed)),
        ]);
        Paragraph::new(footer)
            .alignment(Alignment::Center)
            .render(rows[2], buf);

        if let Some(message) = self.status {
            Paragraph::new(Span::styled(message.to_owned(), theme.status()))
                .alignment(Alignment::Center)
                .render(rows[3], buf);
        }
    }
}

/// The current chunk as one styled line: submitted words colored by outcome,
/// the active word compared character-by-character against the live input,
/// upcoming words dimmed.
fn chunk_line<'a>(session: &'a TypingSession, theme: Theme) -> Line<'a> {
    let chunk = session.chunk_words();
    let word_index = session.cursor().word;
    let mut spans: Vec<Span> = Vec::new();

    // Words before the cursor: colored by outcome when this session typed
    // them, dimmed when the session resumed past them mid-chunk.
    let prefix = &chunk[..word_index.min(chunk.len())];
    for pair in prefix.iter().zip_longest(session.typed_history().iter()) {
        let span = match pair {
            EitherOrBoth::Both(expected, typed) if typed == expected => {
                Span::styled(expected.as_str(), theme.correct())
            }
            EitherOrBoth::Both(expected, _) => Span::styled(expected.as_str(), theme.incorrect()),
            EitherOrBoth::Left(expected) => Span::styled(expected.as_str(), theme.upcoming()),
            EitherOrBoth::Right(_) => continue,
        };
        spans.push(span);
        spans.push(Span::raw(" "));
    }

    if let Some(active) = chunk.get(word_index) {
        spans.extend(active_word_spans(active, session.live_input(), theme));
        spans.push(Span::raw(" "));
    }

    for word in chunk.iter().skip(word_index + 1) {
        spans.push(Span::styled(word.as_str(), theme.upcoming()));
        spans.push(Span::raw(" "));
    }

    Line::from(spans)
}

/// Character-level comparison of the active word against the live buffer.
/// Overflow characters the user typed past the word's end show as errors;
/// untyped characters keep the active-word style.
fn active_word_spans<'a>(expected: &'a str, live: &str, theme: Theme) -> Vec<Span<'a>> {
    expected
        .chars()
        .zip_longest(live.chars())
        .map(|pair| match pair {
            EitherOrBoth::Both(e, t) if e == t => Span::styled(e.to_string(), theme.correct()),
            EitherOrBoth::Both(e, _) => Span::styled(e.to_string(), theme.incorrect()),
            EitherOrBoth::Left(e) => Span::styled(e.to_string(), theme.active_word()),
            EitherOrBoth::Right(t) => Span::styled(
                match t {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                theme.incorrect(),
            ),
        })
        .collect()
}

fn completion_line(session: &TypingSession, theme: Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!(
                "Session complete - {} wpm / {}% acc over {} words",
                session.wpm(),
                session.accuracy(),
                session.total_words()
            ),
            theme.accent().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("(esc to exit)", theme.upcoming()),
    ])
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Instant;

    fn render(view: &SessionView) -> String {
        let backend = TestBackend::new(100, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| f.render_widget(view, f.area())).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn renders_chunk_words_and_metrics() {
        let session = TypingSession::load(1, "alpha beta gamma", 0).unwrap();
        let view = SessionView {
            session: &session,
            theme: Theme::Dark,
            elapsed: Duration::from_secs(65),
            status: None,
        };
        let content = render(&view);
        assert!(content.contains("alpha"));
        assert!(content.contains("gamma"));
        assert!(content.contains("wpm"));
        assert!(content.contains("01:05"));
    }

    #[test]
    fn renders_pause_overlay() {
        let now = Instant::now();
        let mut session = TypingSession::load(1, "alpha beta", 0).unwrap();
        session.type_char('a', now);
        session.pause(now);

        let view = SessionView {
            session: &session,
            theme: Theme::Dark,
            elapsed: Duration::ZERO,
            status: None,
        };
        let content = render(&view);
        assert!(content.contains("PAUSED"));
        assert!(!content.contains("beta"));
    }

    #[test]
    fn renders_completion_summary() {
        let now = Instant::now();
        let mut session = TypingSession::load(1, "hi yo", 0).unwrap();
        for c in "hi yo ".chars() {
            session.type_char(c, now);
        }
        assert!(session.is_complete());

        let view = SessionView {
            session: &session,
            theme: Theme::Light,
            elapsed: Duration::from_secs(3),
            status: None,
        };
        let content = render(&view);
        assert!(content.contains("Session complete"));
    }

    #[test]
    fn renders_status_message() {
        let session = TypingSession::load(1, "alpha beta", 0).unwrap();
        let view = SessionView {
            session: &session,
            theme: Theme::Dark,
            elapsed: Duration::ZERO,
            status: Some("Progress saved"),
        };
        let content = render(&view);
        assert!(content.contains("Progress saved"));
    }

    #[test]
    fn active_word_marks_mismatches() {
        let spans = active_word_spans("hello", "hxl", Theme::Dark);
        assert_eq!(spans.len(), 5);
        assert_eq!(spans[0].style, Theme::Dark.correct());
        assert_eq!(spans[1].style, Theme::Dark.incorrect());
        assert_eq!(spans[2].style, Theme::Dark.correct());
        assert_eq!(spans[3].style, Theme::Dark.active_word());
    }

    #[test]
    fn overflow_characters_render_as_errors() {
        let spans = active_word_spans("hi", "hi!", Theme::Dark);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[2].style, Theme::Dark.incorrect());
        assert_eq!(spans[2].content, "!");
    }

    #[test]
    fn format_elapsed_is_mm_ss() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "00:00");
        assert_eq!(format_elapsed(Duration::from_secs(59)), "00:59");
        assert_eq!(format_elapsed(Duration::from_secs(601)), "10:01");
    }
}
