use codemap::SpanLoc;
use std::fmt::Debug;

/// A trait to allow replacing logging mechanisms
///
/// The parser emits warnings for deprecated constructs it still accepts,
/// e.g. `@elseif` and `&&`.
pub trait Logger: Debug {
    /// Logs a warning with the location of the construct that produced it
    fn warn(&self, location: SpanLoc, message: &str);
}

/// Logs events to standard error, through [`eprintln!`]
#[derive(Debug)]
pub struct StdLogger;

impl Logger for StdLogger {
    #[inline]
    fn warn(&self, location: SpanLoc, message: &str) {
        eprintln!(
            "Warning: {}\n    ./{}:{}:{}",
            message,
            location.file.name(),
            location.begin.line + 1,
            location.begin.column + 1
        );
    }
}

/// Discards all logs
#[derive(Debug)]
pub struct NullLogger;

impl Logger for NullLogger {
    #[inline]
    fn warn(&self, _location: SpanLoc, _message: &str) {}
}
