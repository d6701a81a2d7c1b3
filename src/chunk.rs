/// Number of words presented to the user at once.
pub const CHUNK_SIZE: usize = 50;

/// Position of the active word: chunk index plus within-chunk word index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub chunk: usize,
    pub word: usize,
}

impl Cursor {
    /// Absolute word offset from the start of the document.
    pub fn word_offset(&self) -> usize {
        self.chunk * CHUNK_SIZE + self.word
    }
}

/// Windows the full token sequence into fixed-size chunks.
///
/// The paginator owns the token sequence for the session's lifetime; only the
/// current chunk index mutates. The last chunk may be shorter than
/// `CHUNK_SIZE`; a chunk is never empty while tokens remain.
#[derive(Debug, Clone)]
pub struct ChunkPaginator {
    tokens: Vec<String>,
    chunk: usize,
}

impl ChunkPaginator {
    /// Positions the paginator at `resume_offset` (an absolute word offset
    /// from a prior checkpoint) and returns the paginator, the cursor, and
    /// whether the offset already covers the whole document.
    ///
    /// Offsets at or beyond the token count are clamped: the final chunk is
    /// selected and the session reports complete instead of slicing out of
    /// range.
    pub fn initialize(tokens: Vec<String>, resume_offset: usize) -> (Self, Cursor, bool) {
        let total = tokens.len();
        debug_assert!(total > 0, "caller rejects empty token sequences");

        if resume_offset >= total {
            let last = total.saturating_sub(1);
            let chunk = last / CHUNK_SIZE;
            let cursor = Cursor {
                chunk,
                word: last % CHUNK_SIZE,
            };
            return (Self { tokens, chunk }, cursor, true);
        }

        let chunk = resume_offset / CHUNK_SIZE;
        let cursor = Cursor {
            chunk,
            word: resume_offset % CHUNK_SIZE,
        };
        (Self { tokens, chunk }, cursor, false)
    }

    /// The words of the chunk currently on screen.
    pub fn current_chunk(&self) -> &[String] {
        let start = self.chunk * CHUNK_SIZE;
        let end = (start + CHUNK_SIZE).min(self.tokens.len());
        &self.tokens[start..end]
    }

    pub fn chunk_index(&self) -> usize {
        self.chunk
    }

    pub fn total_words(&self) -> usize {
        self.tokens.len()
    }

    /// Moves to the next chunk, or returns false at end-of-content. The
    /// current chunk is left in place on failure so the final words stay on
    /// screen.
    pub fn advance(&mut self) -> bool {
        let next_start = (self.chunk + 1) * CHUNK_SIZE;
        if next_start >= self.tokens.len() {
            return false;
        }
        self.chunk += 1;
        true
    }
}
