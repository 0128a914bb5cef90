/// Why `generate()` did not produce a summary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// No notes, recording or file to work from; the client is not called
    #[error("Nothing to summarize: add notes, a recording or a file first")]
    NothingToSummarize,

    /// Another generation is still in flight; the client is not called
    #[error("A summary is already being generated")]
    AlreadyGenerating,

    /// Lifetime summary allowance used up; the client is not called
    #[error("You have reached your free summary limit. Please upgrade for more.")]
    QuotaExceeded,

    /// The summarizer reported a failure or could not be reached
    #[error("{0}")]
    SummarizationFailure(String),
}
