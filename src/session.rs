use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::checkpoint::Checkpoint;
use crate::chunk::{ChunkPaginator, Cursor};
use crate::content::{ContentError, ContentRepository};
use crate::matcher::score_word;
use crate::timing::MetricsTracker;
use crate::words::tokenize;

/// The orchestrating state machine of one practice session.
///
/// Owns the cursor, the typed history for the current chunk, the live input
/// buffer, and the metrics tracker. All mutation happens through discrete
/// events (keystroke, tick, pause toggle); methods take `now` explicitly so
/// the engine never reads the clock itself.
#[derive(Debug)]
pub struct TypingSession {
    project_id: i64,
    paginator: ChunkPaginator,
    word_index: usize,
    typed_history: Vec<String>,
    live_input: String,
    char_index: usize,
    tracker: MetricsTracker,
    complete: bool,
}

impl TypingSession {
    /// Tokenizes `source_text` and positions the session at `resume_offset`
    /// (the `completed_words` of a prior checkpoint, 0 for a fresh start).
    ///
    /// Fails with `ContentError::Empty` when the text yields no words. An
    /// offset at or past the end of the document loads as already complete
    /// with the final chunk on display.
    pub fn load(
        project_id: i64,
        source_text: &str,
        resume_offset: usize,
    ) -> Result<Self, ContentError> {
        let tokens = tokenize(source_text);
        if tokens.is_empty() {
            return Err(ContentError::Empty);
        }

        let (paginator, cursor, complete) = ChunkPaginator::initialize(tokens, resume_offset);
        Ok(Self {
            project_id,
            paginator,
            word_index: cursor.word,
            typed_history: Vec::new(),
            live_input: String::new(),
            char_index: 0,
            tracker: MetricsTracker::new(),
            complete,
        })
    }

    /// Fetches a project through the content repository and loads a session
    /// from it. Repository failures pass through as `ContentError`.
    pub fn open(
        repo: &dyn ContentRepository,
        project_id: i64,
        resume_offset: usize,
    ) -> Result<Self, ContentError> {
        let project = repo.fetch_content(project_id)?;
        Self::load(project.id, &project.content, resume_offset)
    }

    /// Appends one typed character and applies the resulting input value.
    pub fn type_char(&mut self, c: char, now: Instant) {
        if self.complete || self.tracker.is_paused() {
            return;
        }
        let mut value = self.live_input.clone();
        value.push(c);
        self.apply_input(&value, now);
    }

    /// Removes the last character of the live input buffer.
    pub fn backspace(&mut self) {
        if self.complete || self.tracker.is_paused() {
            return;
        }
        self.live_input.pop();
        self.char_index = self.live_input.chars().count();
    }

    /// Applies a full input value, the engine's keystroke entry point.
    ///
    /// The first call starts the session timer. A value ending in whitespace
    /// submits the trimmed word against the word at the cursor exactly once
    /// and clears the buffer; any other value only updates the buffer and the
    /// in-progress character offset used for display.
    pub fn apply_input(&mut self, value: &str, now: Instant) {
        if self.complete {
            return;
        }
        self.tracker.start(now);

        if value.ends_with(char::is_whitespace) {
            let typed = value.trim().to_owned();
            self.submit_word(typed, now);
            self.live_input.clear();
            self.char_index = 0;
        } else {
            self.live_input = value.to_owned();
            self.char_index = value.chars().count();
        }
    }

    fn submit_word(&mut self, typed: String, now: Instant) {
        let chunk = self.paginator.current_chunk();
        let expected = &chunk[self.word_index];
        let score = score_word(expected, &typed);
        self.tracker.record_word(score);
        self.typed_history.push(typed);

        if self.word_index + 1 < chunk.len() {
            self.word_index += 1;
        } else if self.paginator.advance() {
            self.word_index = 0;
            self.typed_history.clear();
        } else {
            // End of content: hold the last chunk on display, leave the
            // cursor where it is, and refuse further advancement.
            self.complete = true;
            self.tracker.finish(now);
        }
    }

    /// Forwards the periodic tick to the metrics recompute cadence.
    pub fn on_tick(&mut self, now: Instant) {
        self.tracker.on_tick(now);
    }

    /// Pauses the timer. The live input buffer and typed history are kept.
    pub fn pause(&mut self, now: Instant) {
        self.tracker.pause(now);
    }

    pub fn resume(&mut self, now: Instant) {
        self.tracker.resume(now);
    }

    pub fn toggle_pause(&mut self, now: Instant) {
        if self.tracker.is_paused() {
            self.resume(now);
        } else {
            self.pause(now);
        }
    }

    /// Overall progress through the document, capped at 100 even when the
    /// resume offset or counters are inconsistent.
    pub fn progress_percent(&self) -> u8 {
        if self.complete {
            return 100;
        }
        let total = self.paginator.total_words();
        let done = self.cursor().word_offset();
        let pct = (100.0 * done as f64 / total as f64).round();
        pct.min(100.0) as u8
    }

    /// Builds a checkpoint snapshot for the persistence layer. A finished
    /// session reports the full document as completed.
    pub fn checkpoint(&self, timestamp: DateTime<Local>) -> Checkpoint {
        let completed_words = if self.complete {
            self.paginator.total_words()
        } else {
            self.cursor().word_offset()
        };
        Checkpoint {
            project_id: self.project_id,
            wpm: self.tracker.wpm(),
            accuracy: self.tracker.accuracy(),
            completed_words,
            timestamp,
        }
    }

    pub fn cursor(&self) -> Cursor {
        Cursor {
            chunk: self.paginator.chunk_index(),
            word: self.word_index,
        }
    }

    /// Words of the chunk currently on display.
    pub fn chunk_words(&self) -> &[String] {
        self.paginator.current_chunk()
    }

    /// Submitted words of the current chunk, oldest first.
    pub fn typed_history(&self) -> &[String] {
        &self.typed_history
    }

    pub fn live_input(&self) -> &str {
        &self.live_input
    }

    /// In-progress character offset within the active word.
    pub fn char_index(&self) -> usize {
        self.char_index
    }

    pub fn total_words(&self) -> usize {
        self.paginator.total_words()
    }

    pub fn project_id(&self) -> i64 {
        self.project_id
    }

    pub fn wpm(&self) -> u32 {
        self.tracker.wpm()
    }

    pub fn accuracy(&self) -> u32 {
        self.tracker.accuracy()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.tracker.elapsed(now)
    }

    pub fn has_started(&self) -> bool {
        self.tracker.has_started()
    }

    pub fn is_paused(&self) -> bool {
        self.tracker.is_paused()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}
