//! Event log parser
//!
//! Each log line carries one event:
//!
//! ```text
//! <any prefix>{executor: <int>, chain: <int>, callback: <int>, start: <int>, duration: <int>}
//! ```
//!
//! Everything before the first `{` belongs to the logging harness and is
//! skipped. The payload is split into tokens and checked field by field, so a
//! partially matching line is always rejected. Parsing is fail-fast: the first
//! bad line aborts the whole log and no events are returned.

use crate::config::{AnalysisConfig, ResponseTimeMode};
use crate::types::{AnalysisError, Event, LineError, Result};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Event layout expected from the log producer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSchema {
    /// `{executor, chain, callback, start, duration}` - all five fields required
    WithCallback,
    /// `{executor, chain, [callback,] start, duration}` - callback may be omitted
    CallbackOptional,
}

impl LogSchema {
    /// Schema required by a response-time mode
    pub fn for_mode(mode: ResponseTimeMode) -> Self {
        match mode {
            ResponseTimeMode::PathMatching => LogSchema::WithCallback,
            ResponseTimeMode::PerEvent => LogSchema::CallbackOptional,
        }
    }
}

/// Parse an event log file
pub fn parse_file(path: &Path, config: &AnalysisConfig) -> Result<Vec<Event>> {
    log::info!("Parsing event log: {:?}", path);

    let file = File::open(path).map_err(|e| AnalysisError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let events = parse_reader(BufReader::new(file), &path.display().to_string(), config)?;
    log::info!("Parsed {} events from {:?}", events.len(), path);
    Ok(events)
}

/// Parse an in-memory event log
pub fn parse_str(text: &str, config: &AnalysisConfig) -> Result<Vec<Event>> {
    parse_reader(text.as_bytes(), "<memory>", config)
}

/// Parse events from any buffered reader
///
/// `source_name` is only used to label errors. Lines are read with a hard
/// bound of `config.max_line_len` bytes (not counting a `\n` or `\r\n`
/// terminator) so an oversized line fails without being buffered in full.
pub fn parse_reader<R: BufRead>(
    mut reader: R,
    source_name: &str,
    config: &AnalysisConfig,
) -> Result<Vec<Event>> {
    let schema = LogSchema::for_mode(config.mode);
    let limit = config.max_line_len;
    let mut events = Vec::new();
    let mut buf = Vec::with_capacity(limit.min(256) + 1);
    let mut line_no = 0usize;

    loop {
        buf.clear();
        let read = (&mut reader)
            .take((limit as u64).saturating_add(2))
            .read_until(b'\n', &mut buf)
            .map_err(|e| AnalysisError::Io {
                path: source_name.into(),
                source: e,
            })?;
        if read == 0 {
            break;
        }
        line_no += 1;

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        if buf.len() > limit {
            return Err(line_error(source_name, line_no, LineError::TooLong { limit }));
        }

        let event = parse_line(&buf, schema).map_err(|reason| line_error(source_name, line_no, reason))?;
        log::trace!("{}:{} -> {:?}", source_name, line_no, event);
        events.push(event);
    }

    Ok(events)
}

/// Parse a single log line (without its newline)
pub fn parse_line(line: &[u8], schema: LogSchema) -> std::result::Result<Event, LineError> {
    let open = line
        .iter()
        .position(|&b| b == b'{')
        .ok_or(LineError::DelimiterNotFound)?;
    let payload = std::str::from_utf8(&line[open..]).map_err(|_| LineError::Encoding)?;

    let mut parser = LineParser::new(payload);
    parser.expect(Token::Open)?;
    let executor = parser.field("executor")?;
    parser.expect(Token::Comma)?;
    let chain = parser.field("chain")?;
    parser.expect(Token::Comma)?;

    let callback = match schema {
        LogSchema::WithCallback => Some(parser.field("callback")?),
        LogSchema::CallbackOptional if parser.next_is_key("callback") => Some(parser.field("callback")?),
        LogSchema::CallbackOptional => None,
    };
    if callback.is_some() {
        parser.expect(Token::Comma)?;
    }

    let start = parser.field("start")?;
    parser.expect(Token::Comma)?;
    let duration = parser.field("duration")?;
    parser.expect(Token::Close)?;
    parser.finish()?;

    if duration.value < 0 {
        return Err(LineError::NegativeDuration(duration.value));
    }

    Ok(Event {
        executor: executor.as_u32()?,
        chain: chain.as_u32()?,
        callback: callback.map(|cb| cb.as_u32()).transpose()?,
        start_us: start.value,
        duration_us: duration.value,
    })
}

fn line_error(source_name: &str, line: usize, reason: LineError) -> AnalysisError {
    AnalysisError::LogFormat {
        source_name: source_name.to_string(),
        line,
        reason,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    Colon,
    Comma,
    Ident(&'a str),
    Int(&'a str),
    Other(char),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Open => write!(f, "'{{'"),
            Token::Close => write!(f, "'}}'"),
            Token::Colon => write!(f, "':'"),
            Token::Comma => write!(f, "','"),
            Token::Ident(name) => write!(f, "'{}'", name),
            Token::Int(text) => write!(f, "integer {}", text),
            Token::Other(c) => write!(f, "{:?}", c),
        }
    }
}

/// Splits an event payload into tokens, skipping whitespace
struct Lexer<'a> {
    rest: &'a str,
}

impl<'a> Lexer<'a> {
    fn take_while(&mut self, skip: usize, pred: impl Fn(char) -> bool) -> &'a str {
        let end = self.rest[skip..]
            .find(|c: char| !pred(c))
            .map_or(self.rest.len(), |i| i + skip);
        let (token, rest) = self.rest.split_at(end);
        self.rest = rest;
        token
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rest = self.rest.trim_start();
        let c = self.rest.chars().next()?;

        let single = match c {
            '{' => Some(Token::Open),
            '}' => Some(Token::Close),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = single {
            self.rest = &self.rest[1..];
            return Some(token);
        }

        if c.is_ascii_alphabetic() || c == '_' {
            return Some(Token::Ident(
                self.take_while(0, |c| c.is_ascii_alphanumeric() || c == '_'),
            ));
        }
        if c.is_ascii_digit() || c == '-' || c == '+' {
            let sign = usize::from(!c.is_ascii_digit());
            return Some(Token::Int(self.take_while(sign, |c| c.is_ascii_digit())));
        }

        self.rest = &self.rest[c.len_utf8()..];
        Some(Token::Other(c))
    }
}

/// A parsed integer field, remembered with its name for error reporting
struct Field {
    name: &'static str,
    value: i64,
}

impl Field {
    fn as_u32(&self) -> std::result::Result<u32, LineError> {
        u32::try_from(self.value).map_err(|_| LineError::InvalidInteger {
            field: self.name,
            text: self.value.to_string(),
        })
    }
}

struct LineParser<'a> {
    tokens: std::iter::Peekable<Lexer<'a>>,
}

impl<'a> LineParser<'a> {
    fn new(payload: &'a str) -> Self {
        Self {
            tokens: Lexer { rest: payload }.peekable(),
        }
    }

    fn found(token: Option<Token<'_>>) -> String {
        token.map_or_else(|| "end of line".to_string(), |t| t.to_string())
    }

    fn expect(&mut self, want: Token<'a>) -> std::result::Result<(), LineError> {
        match self.tokens.next() {
            Some(token) if token == want => Ok(()),
            other => Err(LineError::Expected {
                expected: want.to_string(),
                found: Self::found(other),
            }),
        }
    }

    fn next_is_key(&mut self, name: &str) -> bool {
        matches!(self.tokens.peek(), Some(Token::Ident(ident)) if *ident == name)
    }

    /// `<name>: <int>`
    fn field(&mut self, name: &'static str) -> std::result::Result<Field, LineError> {
        match self.tokens.next() {
            Some(Token::Ident(ident)) if ident == name => {}
            other => {
                return Err(LineError::Expected {
                    expected: format!("field '{}'", name),
                    found: Self::found(other),
                })
            }
        }
        self.expect(Token::Colon)?;

        match self.tokens.next() {
            Some(Token::Int(text)) => text
                .parse::<i64>()
                .map(|value| Field { name, value })
                .map_err(|_| LineError::InvalidInteger {
                    field: name,
                    text: text.to_string(),
                }),
            other => Err(LineError::Expected {
                expected: format!("integer value for '{}'", name),
                found: Self::found(other),
            }),
        }
    }

    fn finish(&mut self) -> std::result::Result<(), LineError> {
        match self.tokens.next() {
            None => Ok(()),
            Some(token) => Err(LineError::TrailingInput(token.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "{executor: 1, chain: 0, callback: 3, start: 15, duration: 20}";

    fn parse(line: &str) -> std::result::Result<Event, LineError> {
        parse_line(line.as_bytes(), LogSchema::WithCallback)
    }

    #[test]
    fn test_parse_plain_line() {
        let event = parse(GOOD).unwrap();
        assert_eq!(
            event,
            Event {
                executor: 1,
                chain: 0,
                callback: Some(3),
                start_us: 15,
                duration_us: 20,
            }
        );
    }

    #[test]
    fn test_harness_prefix_is_skipped() {
        let line = format!("[INFO] [1690000000.123456] [executor]: {}", GOOD);
        assert_eq!(parse(&line).unwrap(), parse(GOOD).unwrap());
    }

    #[test]
    fn test_missing_delimiter() {
        assert_eq!(
            parse("executor: 1, chain: 0").unwrap_err(),
            LineError::DelimiterNotFound
        );
        assert_eq!(parse("").unwrap_err(), LineError::DelimiterNotFound);
    }

    #[test]
    fn test_missing_field_fails() {
        let err = parse("{executor: 1, chain: 0, start: 15, duration: 20}").unwrap_err();
        assert!(matches!(err, LineError::Expected { .. }));
        assert!(err.to_string().contains("callback"));
    }

    #[test]
    fn test_truncated_line_fails() {
        let err = parse("{executor: 1, chain: 0, callback: 3, start: 15").unwrap_err();
        assert_eq!(
            err,
            LineError::Expected {
                expected: "','".to_string(),
                found: "end of line".to_string(),
            }
        );
    }

    #[test]
    fn test_malformed_integer_fails() {
        let err = parse("{executor: x, chain: 0, callback: 3, start: 15, duration: 20}").unwrap_err();
        assert!(matches!(err, LineError::Expected { .. }));

        let err = parse("{executor: -, chain: 0, callback: 3, start: 15, duration: 20}").unwrap_err();
        assert!(matches!(err, LineError::InvalidInteger { field: "executor", .. }));
    }

    #[test]
    fn test_out_of_range_id_fails() {
        let err = parse("{executor: 1, chain: -2, callback: 3, start: 15, duration: 20}").unwrap_err();
        assert!(matches!(err, LineError::InvalidInteger { field: "chain", .. }));
    }

    #[test]
    fn test_negative_duration_fails() {
        let err = parse("{executor: 1, chain: 0, callback: 3, start: 15, duration: -1}").unwrap_err();
        assert_eq!(err, LineError::NegativeDuration(-1));
    }

    #[test]
    fn test_trailing_input_fails() {
        let err = parse(&format!("{} extra", GOOD)).unwrap_err();
        assert!(matches!(err, LineError::TrailingInput(_)));
        // Trailing whitespace is fine
        assert!(parse(&format!("{}   ", GOOD)).is_ok());
    }

    #[test]
    fn test_wrong_field_order_fails() {
        let err = parse("{chain: 0, executor: 1, callback: 3, start: 15, duration: 20}").unwrap_err();
        assert!(err.to_string().contains("executor"));
    }

    #[test]
    fn test_optional_callback_schema() {
        let event = parse_line(
            b"{executor: 2, chain: 5, start: 100, duration: 42}",
            LogSchema::CallbackOptional,
        )
        .unwrap();
        assert_eq!(event.callback, None);
        assert_eq!(event.duration_us, 42);

        let event = parse_line(GOOD.as_bytes(), LogSchema::CallbackOptional).unwrap();
        assert_eq!(event.callback, Some(3));
    }

    #[test]
    fn test_parse_str_keeps_file_order() {
        let log = "\
{executor: 0, chain: 1, callback: 2, start: 50, duration: 1}
{executor: 0, chain: 1, callback: 2, start: 10, duration: 1}
{executor: 0, chain: 1, callback: 2, start: 50, duration: 1}\r
";
        let events = parse_str(log, &AnalysisConfig::new()).unwrap();
        let starts: Vec<i64> = events.iter().map(|e| e.start_us).collect();
        assert_eq!(starts, vec![50, 10, 50]);
    }

    #[test]
    fn test_bad_line_aborts_with_line_number() {
        let log = format!("{}\n{}\nnot an event\n{}\n", GOOD, GOOD, GOOD);
        let err = parse_str(&log, &AnalysisConfig::new()).unwrap_err();
        assert!(err.is_format_error());
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_blank_line_is_rejected() {
        let log = format!("{}\n\n{}\n", GOOD, GOOD);
        let err = parse_str(&log, &AnalysisConfig::new()).unwrap_err();
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_line_length_bound() {
        let config = AnalysisConfig::new().with_max_line_len(GOOD.len());
        assert_eq!(parse_str(GOOD, &config).unwrap().len(), 1);

        let long = format!("{}{}", "x".repeat(100), GOOD);
        let err = parse_str(&long, &config).unwrap_err();
        match err {
            AnalysisError::LogFormat { line, reason, .. } => {
                assert_eq!(line, 1);
                assert_eq!(reason, LineError::TooLong { limit: GOOD.len() });
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_line_terminator_not_counted_in_bound() {
        let config = AnalysisConfig::new().with_max_line_len(GOOD.len());
        let lf = format!("{}\n{}\n", GOOD, GOOD);
        let crlf = format!("{}\r\n{}\r\n", GOOD, GOOD);
        assert_eq!(parse_str(&lf, &config).unwrap().len(), 2);
        assert_eq!(parse_str(&crlf, &config).unwrap(), parse_str(&lf, &config).unwrap());

        // One byte over the bound still fails with either terminator
        let config = AnalysisConfig::new().with_max_line_len(GOOD.len() - 1);
        assert_eq!(parse_str(&lf, &config).unwrap_err().line(), Some(1));
        assert_eq!(parse_str(&crlf, &config).unwrap_err().line(), Some(1));
    }

    #[test]
    fn test_unbounded_line_length() {
        let config = AnalysisConfig::new().with_max_line_len(usize::MAX);
        let log = format!("{}\n{}\n", GOOD, GOOD);
        let events = parse_str(&log, &config).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], parse(GOOD).unwrap());
    }

    #[test]
    fn test_empty_log_has_no_events() {
        assert!(parse_str("", &AnalysisConfig::new()).unwrap().is_empty());
    }
}
