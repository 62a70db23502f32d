//! Segment merger: turns recognizer events into buffer mutations.
//!
//! Streaming recognizers re-send the full text of the current segment on
//! every update (cumulative transcripts), so each event must wholesale
//! replace whatever the previous event wrote. The merger tracks the buffer
//! range owned by the in-progress segment and emits one mutation per event,
//! normalized so the result reads like hand-typed text.

use crate::buffer::Mutation;
use crate::channel::TranscriptEvent;
use crate::normalize::{
    apply_capitalization, clean_spacing, needs_space_after, needs_space_before, should_capitalize,
};

/// The buffer range currently owned by the in-progress transcript segment.
///
/// `start` is fixed for the segment's lifetime; `end` advances as cumulative
/// text replaces prior output. Dropped when a final event lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSegment {
    pub start: usize,
    pub end: usize,
    /// Most recent interim text, kept so a session stop can finalize it.
    pub last_interim: String,
}

/// Stateful merger for one dictation session.
///
/// Call [`SegmentMerger::merge`] for every transcript event in arrival
/// order, apply the returned mutation, and call [`SegmentMerger::flush`]
/// when the session stops so a pending interim is not silently dropped.
#[derive(Debug, Default)]
pub struct SegmentMerger {
    active: Option<ActiveSegment>,
}

impl SegmentMerger {
    pub fn new() -> Self {
        Self { active: None }
    }

    /// True while an unfinalized segment owns a buffer range.
    pub fn has_active_segment(&self) -> bool {
        self.active.is_some()
    }

    /// Clears segment state. The next event starts a fresh segment anchored
    /// at the buffer's then-current selection.
    pub fn reset(&mut self) {
        self.active = None;
    }

    /// Translates one transcript event into a buffer mutation.
    ///
    /// `selection` is the buffer's live cursor/selection; it only anchors
    /// the *first* event of a segment. While a segment is active the merge
    /// keeps targeting the stored range even if the user moved the cursor,
    /// privileging transcript continuity over cursor-following.
    ///
    /// Returns `None` for events whose cleaned text is empty; they must
    /// leave the buffer untouched and produce no stray spaces.
    pub fn merge(
        &mut self,
        buffer: &str,
        selection: (usize, usize),
        event: &TranscriptEvent,
    ) -> Option<Mutation> {
        let cleaned = clean_spacing(&event.text);
        if cleaned.is_empty() {
            if event.is_final {
                self.active = None;
            }
            return None;
        }

        let (start, end) = match &self.active {
            Some(segment) => (segment.start, segment.end),
            None => selection,
        };

        // Capitalization first: forcing a leading capital to lowercase must
        // see the recognizer's text, not a space we prepended ourselves.
        let mut text = apply_capitalization(&cleaned, should_capitalize(buffer, start));
        if needs_space_before(buffer, start, &text) {
            text.insert(0, ' ');
        }
        if needs_space_after(buffer, end) {
            text.push(' ');
        }

        let mutation = Mutation::replace(start, end, text);
        let segment_end = mutation.cursor_after();

        if event.is_final {
            self.active = None;
        } else {
            self.active = Some(ActiveSegment {
                start,
                end: segment_end,
                last_interim: event.text.clone(),
            });
        }

        Some(mutation)
    }

    /// Finalizes a pending interim segment on session stop by replaying its
    /// last text as final. Returns `None` when nothing is pending, so a
    /// second stop is a no-op.
    pub fn flush(&mut self, buffer: &str, selection: (usize, usize)) -> Option<Mutation> {
        let pending = self.active.as_ref()?.last_interim.clone();
        let event = TranscriptEvent {
            text: pending,
            is_final: true,
        };
        self.merge(buffer, selection, &event)
    }
}
