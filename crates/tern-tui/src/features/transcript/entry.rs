use super::accumulator::Drained;
use crate::features::input::PromptHistory;

/// One prompt and what came back for it.
///
/// Created with only `prompt`; the other fields are filled once when the
/// exchange completes and never change afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub prompt: String,
    pub reasoning: String,
    pub response: String,
    pub error: String,
}

impl Entry {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub(super) fn complete(&mut self, drained: Drained) {
        self.reasoning = drained.reasoning;
        self.response = drained.response;
        self.error = drained.error;
    }
}

impl PromptHistory for [Entry] {
    fn prompt_count(&self) -> usize {
        self.len()
    }

    fn prompt(&self, index: usize) -> Option<&str> {
        self.get(index).map(|e| e.prompt.as_str())
    }
}
