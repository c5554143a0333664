use thiserror::Error;

/// Rejections raised before any synthesis or chat work is submitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Input cannot be empty.")]
    Empty,

    #[error("No valid characters found.")]
    NoValidCharacters,

    #[error("Please input some text first.")]
    Blank,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Unsupported document type: {0}")]
    UnsupportedType(String),

    #[error("Error reading file: {0}")]
    Read(String),
}

/// Backend failures. Every message is safe to show to an end user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("Could not reach the speech service. Check your network connection.")]
    Unreachable,

    #[error("The speech service quota was exceeded (429). Try again later.")]
    QuotaExceeded,

    #[error("The speech service rejected the request ({status}).")]
    Rejected { status: u16 },

    #[error("The speech service returned an unreadable response.")]
    MalformedResponse,

    #[error("No speech engine is installed on this machine.")]
    NoVoiceDriver,

    #[error("The speech engine failed: {0}")]
    EngineFailed(String),

    #[error("The speech engine timed out after {0} seconds.")]
    Timeout(u64),

    #[error("The speech engine produced no audio.")]
    EmptyOutput,

    #[error("Could not write the audio file: {0}")]
    Io(String),
}

impl From<std::io::Error> for SynthesisError {
    fn from(err: std::io::Error) -> Self {
        SynthesisError::Io(err.kind().to_string())
    }
}

/// Transcript invariant violations. These indicate a caller bug.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    #[error("an unresolved assistant placeholder already exists")]
    PlaceholderPending,

    #[error("no unresolved assistant placeholder to resolve")]
    NoPendingPlaceholder,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("The assistant is still replying to the previous message.")]
    AwaitingReply,

    #[error("Please configure a chat API key.")]
    MissingCredential,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Turn {0} does not exist.")]
    TurnOutOfRange(usize),

    #[error("Turn {0} is not a completed assistant reply.")]
    TurnNotPlayable(usize),

    #[error(transparent)]
    Conversation(#[from] ConversationError),
}
