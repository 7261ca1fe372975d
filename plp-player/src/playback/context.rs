//! Playback context owned by the state machine

use plp_common::Track;

/// Mutable data the machine's actions operate on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackContext {
    /// Playlist in playback order, replaced wholesale on LOAD
    pub(crate) tracks: Vec<Track>,
    /// Track to play next/now
    pub(crate) selected_index: usize,
    /// Resume point in seconds
    pub(crate) saved_position: f64,
}

impl PlaybackContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn saved_position(&self) -> f64 {
        self.saved_position
    }

    /// Selected track, None when the index is past the end
    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.selected_index)
    }

    pub fn selected_in_bounds(&self) -> bool {
        self.selected_index < self.tracks.len()
    }

    /// Resolve a signed index to a playlist position
    pub fn index_in_range(&self, index: i64) -> Option<usize> {
        usize::try_from(index)
            .ok()
            .filter(|index| *index < self.tracks.len())
    }

    /// Reset selection and position to the start of the playlist
    pub(crate) fn rewind(&mut self) {
        self.selected_index = 0;
        self.saved_position = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with(len: usize) -> PlaybackContext {
        PlaybackContext {
            tracks: (0..len)
                .map(|i| Track::from_location(format!("{}.mp3", i)))
                .collect(),
            selected_index: 0,
            saved_position: 0.0,
        }
    }

    #[test]
    fn test_new_context_is_empty() {
        let context = PlaybackContext::new();
        assert!(context.tracks().is_empty());
        assert_eq!(context.selected_index(), 0);
        assert_eq!(context.saved_position(), 0.0);
        assert!(!context.selected_in_bounds());
    }

    #[test]
    fn test_index_in_range() {
        let context = context_with(2);
        assert_eq!(context.index_in_range(0), Some(0));
        assert_eq!(context.index_in_range(1), Some(1));
        assert_eq!(context.index_in_range(2), None);
        assert_eq!(context.index_in_range(-1), None);
    }

    #[test]
    fn test_rewind() {
        let mut context = context_with(3);
        context.selected_index = 2;
        context.saved_position = 41.0;

        context.rewind();
        assert_eq!(context.selected_index(), 0);
        assert_eq!(context.saved_position(), 0.0);
        assert_eq!(context.selected_track().map(|t| t.location.as_str()), Some("0.mp3"));
    }
}
