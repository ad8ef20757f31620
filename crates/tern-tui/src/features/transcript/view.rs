use super::style::StyledLine;

/// Rendered transcript: cached lines for completed entries followed by the
/// live tail of the exchange in flight.
///
/// Borrows the cache, so the history is never copied per frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptView<'a> {
    committed: &'a [StyledLine],
    live: Vec<StyledLine>,
}

impl<'a> TranscriptView<'a> {
    pub(super) fn new(committed: &'a [StyledLine], live: Vec<StyledLine>) -> Self {
        Self { committed, live }
    }

    pub fn len(&self) -> usize {
        self.committed.len() + self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn committed(&self) -> &[StyledLine] {
        self.committed
    }

    pub fn live(&self) -> &[StyledLine] {
        &self.live
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyledLine> {
        self.committed.iter().chain(self.live.iter())
    }

    /// Up to `height` lines starting at `offset`.
    pub fn window(&self, offset: usize, height: usize) -> impl Iterator<Item = &StyledLine> {
        self.iter().skip(offset).take(height)
    }

    /// All lines as owned values.
    pub fn to_lines(&self) -> Vec<StyledLine> {
        self.iter().cloned().collect()
    }

    /// Text content joined with newlines, styling dropped.
    pub fn plain_text(&self) -> String {
        self.iter()
            .map(StyledLine::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
