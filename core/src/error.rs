use thiserror::Error;

/// A source position, used to anchor lex/parse diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors raised while turning query text into tokens.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("lex error at {pos}: {message}")]
pub struct LexError {
    pub pos: Position,
    pub message: String,
}

/// Errors raised while building the AST from a token stream.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("parse error at {pos}: {message}")]
pub struct ParseError {
    pub pos: Position,
    pub message: String,
}

/// Errors raised while lowering an AST to a program.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("program too large: {0} instructions exceeds capacity {1}")]
    ProgramTooLarge(usize, usize),
    #[error("unresolved label: {0}")]
    UnresolvedLabel(String),
}

/// Errors raised while executing a compiled program.
///
/// A well-formed compiled program never produces one of these; they exist
/// to turn "this should be impossible" into a propagated error instead of
/// a panic or a silently wrong match result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VmError {
    #[error("VM is already running")]
    Busy,
    #[error("program exceeds capacity: {0} > {1}")]
    ProgramTooLarge(usize, usize),
    #[error("stack underflow at pc={0}")]
    StackUnderflow(usize),
    #[error("stack overflow at pc={0}")]
    StackOverflow(usize),
    #[error("program ran past its end without RET")]
    Overrun,
    #[error("jump target out of range: {0}")]
    BadJumpTarget(usize),
    #[error("operand kind mismatch at pc={0}")]
    BadOperand(usize),
}

/// Errors raised while decoding a raw log line into a record.
#[derive(Debug, Error)]
#[error("could not decode line as a JSON object: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// Errors raised while compiling and evaluating a query against one line.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Vm(#[from] VmError),
}

/// Sentinel errors from the reverse/forward line reader, plus genuine I/O
/// failures. `Bof`/`Eof` are expected loop terminators, not exceptional
/// failures, and callers must be able to tell them apart from `Io`.
#[derive(Debug, Error)]
pub enum MemFileError {
    #[error("beginning of file")]
    Bof,
    #[error("end of file")]
    Eof,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
