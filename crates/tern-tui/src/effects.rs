//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They cover provider calls only; state changes happen in the reducer.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Send `prompt` and start streaming the reply.
    StartExchange { prompt: String },
    /// Commit the finished exchange to the provider's conversation.
    FinishExchange { response: String },
    /// Forget the provider's conversation.
    ClearHistory,
}
