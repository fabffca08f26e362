use std::{
    error::Error,
    fmt::{self, Display},
};

use codemap::{Span, SpanLoc};

pub type SassResult<T> = Result<T, Box<SassError>>;

/// The maximum number of code points shown on either side of the failing
/// column before the source context is elided.
const CONTEXT_WIDTH: usize = 18;

/// An error produced while parsing.
///
/// The best way to interact with an error is to print it: the `Display`
/// implementation mirrors the framed output of the reference implementation,
/// e.g.
///```scss
/// Error: expected ";".
///   ╷
/// 3 │   color: red
///   ╵
/// ./input.scss:3:13
///```
#[derive(Debug, Clone)]
pub struct SassError {
    kind: SassErrorKind,
}

impl SassError {
    #[must_use]
    pub fn kind(self) -> PublicSassErrorKind {
        match self.kind {
            SassErrorKind::ParseError {
                message,
                loc,
                unicode,
                trace,
            } => PublicSassErrorKind::ParseError {
                message,
                loc,
                unicode,
                trace,
            },
            SassErrorKind::FromUtf8Error { message, offset } => {
                PublicSassErrorKind::FromUtf8Error { message, offset }
            }
            SassErrorKind::UnsupportedEncoding(message) => {
                PublicSassErrorKind::UnsupportedEncoding(message)
            }
            SassErrorKind::Raw(..) => unreachable!("raw errors should not be accessible by users"),
        }
    }

    pub(crate) fn raw(self) -> (String, Span, Vec<Span>) {
        match self.kind {
            SassErrorKind::Raw(string, span, trace) => (string, span, trace),
            e => unreachable!("unable to get raw of {:?}", e),
        }
    }

    /// Appends a back-trace frame recording the outer location of a nested
    /// parse that failed.
    pub(crate) fn with_trace_frame(mut self: Box<Self>, frame: Span) -> Box<Self> {
        if let SassErrorKind::Raw(_, _, ref mut trace) = self.kind {
            trace.push(frame);
        }
        self
    }

    pub(crate) fn from_loc(
        message: String,
        loc: SpanLoc,
        unicode: bool,
        trace: Vec<SpanLoc>,
    ) -> Self {
        SassError {
            kind: SassErrorKind::ParseError {
                message,
                loc,
                unicode,
                trace,
            },
        }
    }

    pub(crate) fn from_utf8(message: String, offset: usize) -> Self {
        SassError {
            kind: SassErrorKind::FromUtf8Error { message, offset },
        }
    }

    pub(crate) fn unsupported_encoding(message: String) -> Self {
        SassError {
            kind: SassErrorKind::UnsupportedEncoding(message),
        }
    }
}

#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum PublicSassErrorKind {
    ParseError {
        /// The message related to this parse error.
        ///
        /// Error messages should only be used to assist in debugging for the
        /// end user. They may change significantly between bugfix versions
        /// and should not be relied on to remain stable.
        message: String,
        loc: SpanLoc,

        /// Whether or not the user allows unicode characters to be emitted
        /// in error messages.
        ///
        /// This is configurable with [`crate::Options::unicode_error_messages`]
        unicode: bool,

        /// Locations of enclosing parses, innermost first, recorded when the
        /// failure happened inside a nested re-parse (e.g. a selector whose
        /// shape depended on interpolation).
        trace: Vec<SpanLoc>,
    },

    /// The input was not valid UTF-8. The offset is the byte position of the
    /// first invalid sequence.
    FromUtf8Error { message: String, offset: usize },

    /// The input began with the byte-order mark of an unsupported encoding.
    UnsupportedEncoding(String),
}

#[derive(Debug, Clone)]
enum SassErrorKind {
    /// A raw error containing only a message, the failing span, and the
    /// spans of enclosing nested parses. Never exposed to users; resolved
    /// against the code map at the API boundary.
    Raw(String, Span, Vec<Span>),
    ParseError {
        message: String,
        loc: SpanLoc,
        unicode: bool,
        trace: Vec<SpanLoc>,
    },
    FromUtf8Error {
        message: String,
        offset: usize,
    },
    UnsupportedEncoding(String),
}

/// Elides a source line to a window of at most `CONTEXT_WIDTH` code points
/// on either side of `col`, returning the trimmed text and the column of the
/// failure within it.
fn trim_context(line: &str, col: usize) -> (String, usize) {
    let chars: Vec<char> = line.chars().collect();
    let col = col.min(chars.len());

    let start = col.saturating_sub(CONTEXT_WIDTH);
    let end = (col + CONTEXT_WIDTH).min(chars.len());

    let mut out = String::new();
    let mut new_col = col - start;

    if start > 0 {
        out.push_str("...");
        new_col += 3;
    }
    out.extend(&chars[start..end]);
    if end < chars.len() {
        out.push_str("...");
    }

    (out, new_col)
}

impl Display for SassError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (message, loc, unicode, trace) = match &self.kind {
            SassErrorKind::ParseError {
                message,
                loc,
                unicode,
                trace,
            } => (message, loc, *unicode, trace),
            SassErrorKind::FromUtf8Error { message, .. } => {
                return writeln!(f, "Error: {}", message)
            }
            SassErrorKind::UnsupportedEncoding(message) => {
                return writeln!(f, "Error: {}", message)
            }
            SassErrorKind::Raw(..) => unreachable!(),
        };

        let first_bar = if unicode { '╷' } else { ',' };
        let second_bar = if unicode { '│' } else { '|' };
        let third_bar = if unicode { '│' } else { '|' };
        let fourth_bar = if unicode { '╵' } else { '\'' };

        let line = loc.begin.line + 1;
        let col = loc.begin.column + 1;

        let (context, context_col) = trim_context(loc.file.source_line(loc.begin.line), loc.begin.column);
        let caret_width = if loc.end.line == loc.begin.line {
            (loc.end.column.max(loc.begin.column) - loc.begin.column).max(1)
        } else {
            1
        }
        .min(context.chars().count().saturating_sub(context_col).max(1));

        writeln!(f, "Error: {}", message)?;
        let padding = vec![' '; format!("{}", line).len() + 1]
            .iter()
            .collect::<String>();
        writeln!(f, "{}{}", padding, first_bar)?;
        writeln!(f, "{} {} {}", line, second_bar, context)?;
        writeln!(
            f,
            "{}{} {}{}",
            padding,
            third_bar,
            vec![' '; context_col].iter().collect::<String>(),
            vec!['^'; caret_width].iter().collect::<String>()
        )?;
        writeln!(f, "{}{}", padding, fourth_bar)?;

        if unicode {
            writeln!(f, "./{}:{}:{}", loc.file.name(), line, col)?;
        } else {
            writeln!(f, "  {} {}:{}  root stylesheet", loc.file.name(), line, col)?;
        }

        for frame in trace {
            writeln!(
                f,
                "  {} {}:{}",
                frame.file.name(),
                frame.begin.line + 1,
                frame.begin.column + 1
            )?;
        }

        Ok(())
    }
}

impl From<(&str, Span)> for Box<SassError> {
    #[inline]
    fn from(error: (&str, Span)) -> Box<SassError> {
        Box::new(SassError {
            kind: SassErrorKind::Raw(error.0.to_owned(), error.1, Vec::new()),
        })
    }
}

impl From<(String, Span)> for Box<SassError> {
    #[inline]
    fn from(error: (String, Span)) -> Box<SassError> {
        Box::new(SassError {
            kind: SassErrorKind::Raw(error.0, error.1, Vec::new()),
        })
    }
}

impl Error for SassError {
    #[inline]
    fn description(&self) -> &'static str {
        "SCSS parsing error"
    }
}

#[cfg(test)]
mod tests {
    use super::trim_context;

    #[test]
    fn trim_context_short_line() {
        let (text, col) = trim_context("a { color: red; }", 4);
        assert_eq!(text, "a { color: red; }");
        assert_eq!(col, 4);
    }

    #[test]
    fn trim_context_elides_both_sides() {
        let line = "x".repeat(100);
        let (text, col) = trim_context(&line, 50);
        assert!(text.starts_with("..."));
        assert!(text.ends_with("..."));
        assert_eq!(col, 18 + 3);
        assert_eq!(text.chars().count(), 3 + 36 + 3);
    }
}
