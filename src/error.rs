use crate::registers;
use std::{convert::From, fmt};

/// Simple custom Error for the Byte8 project
pub struct Error {
    pub kind: ErrorKind,
    pub ctx: Option<registers::Set>,
    pub msg: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    /// error in syntax of assembly code
    Syntax,
    /// error accessing the machine's code or data space
    Memory,
    /// underlying io error
    IO,
    /// test criterion evaluated to false
    Test,
    /// fetched a byte that is not a valid opcode
    UnknownOpcode,
    /// an instruction's operands extend past the end of the program
    TruncatedInstruction,
    /// the call stack exceeded the configured depth limit
    CallStackOverflow,
    /// catch-all for other errors
    General,
}
impl ErrorKind {
    /// True for the error kinds raised by the execution engine itself.
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            ErrorKind::UnknownOpcode | ErrorKind::TruncatedInstruction | ErrorKind::CallStackOverflow
        )
    }
}

impl Error {
    pub fn new(kind: ErrorKind, ctx: Option<registers::Set>, message: &str) -> Error {
        Error {
            kind,
            ctx,
            msg: String::from(message),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self { Error::new(ErrorKind::IO, None, e.to_string().as_str()) }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}: {}", red!("byte8::Error"), self.msg) }
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut res = write!(f, "{}", self.msg);
        if res.is_ok() {
            if let Some(ctx) = self.ctx {
                res = write!(f, "\nContext: {}", ctx);
            }
        }
        res
    }
}
impl std::error::Error for Error {}
