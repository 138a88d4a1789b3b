//! Parser for pie request files.
//!
//! A hand-written recursive-descent parser over the raw source text. The grammar
//! is line oriented:
//!
//! ```text
//! # comment
//! $name = "string" | 42              variable definition
//! Name: raw value to end of line     header definition
//! @env:                              environment block of indented definitions
//!     $name = "value"
//! METHOD path [| processor]          request line
//! Header: value                      request headers (no blank line before them)
//! body lines...                      optional body, up to the next blank line
//! PROCESSOR name ```script```        processor definition
//! ```
//!
//! Every node records the byte [`Interval`] it was parsed from. A failure is
//! reported as a single [`SyntaxError`] at the point the grammar could not continue.

pub mod error;

use crate::lines::LineTracker;
use crate::models::ast::is_name_byte;
use crate::models::{
    EnvironmentDef, Entry, HttpMethod, Interval, PieFile, ProcessorDef, RequestDef, Var, VarValue,
};
use error::{SyntaxError, SyntaxErrorKind};

const PROCESSOR_KEYWORD: &str = "PROCESSOR";
const FENCE: &str = "```";

type ParseResult<T> = Result<T, SyntaxError>;

/// Parses the content of a request file.
///
/// # Arguments
///
/// * `text` - The full file content
///
/// # Returns
///
/// The file's entries in source order, or the first `SyntaxError` with its line
/// and column.
///
/// # Examples
///
/// ```
/// use pie::parser::parse;
///
/// let file = parse("$ship = \"serenity\"\n\nGET /cargo/$ship\n").unwrap();
/// assert_eq!(file.entries.len(), 2);
/// assert_eq!(file.requests().next().unwrap().path, "/cargo/$ship");
/// ```
pub fn parse(text: &str) -> Result<PieFile, SyntaxError> {
    let entries = Parser::new(text).entries()?;
    log::trace!("parsed {} top-level entries", entries.len());
    Ok(PieFile::new(text, entries))
}

fn is_ident_byte(b: &u8) -> bool {
    is_name_byte(*b)
}

struct Parser<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(src: &'s str) -> Self {
        Self { src, pos: 0 }
    }

    fn entries(&mut self) -> ParseResult<Vec<Entry>> {
        let mut entries = Vec::new();
        loop {
            self.skip_blank_lines();
            if self.at_eof() {
                return Ok(entries);
            }

            self.skip_inline_ws();
            let entry = match self.peek() {
                Some('$') => Entry::Var(self.variable_def()?),
                Some('@') => Entry::Environment(self.environment_def()?),
                _ if self.at_header() => Entry::Var(self.header_def()?),
                _ if self.at_keyword(PROCESSOR_KEYWORD) => Entry::Processor(self.processor_def()?),
                Some(c) if c.is_ascii_uppercase() => Entry::Request(self.request_def()?),
                _ => {
                    return Err(self.expected(
                        "a variable, header, environment, request or processor definition",
                    ))
                }
            };
            entries.push(entry);
        }
    }

    // $name = value
    fn variable_def(&mut self) -> ParseResult<Var> {
        let start = self.pos;
        self.pos += 1;
        let name = self.identifier("a variable name")?;
        self.skip_inline_ws();
        self.expect_char('=', "\"=\"")?;
        self.skip_inline_ws();
        let value = self.value()?;
        let end = self.pos;
        self.skip_trailing()?;
        Ok(Var::variable(name, value, Interval::new(start, end)))
    }

    // Name: raw value
    fn header_def(&mut self) -> ParseResult<Var> {
        let start = self.pos;
        let name = self.identifier("a header name")?;
        self.expect_char(':', "\":\"")?;
        let colon_end = self.pos;
        self.skip_inline_ws();

        let value_start = self.pos;
        self.skip_to_eol();
        let src = self.src;
        let value = src[value_start..self.pos].trim_end();
        let end = if value.is_empty() {
            colon_end
        } else {
            value_start + value.len()
        };
        self.consume_eol();
        Ok(Var::header(name, value, Interval::new(start, end)))
    }

    fn environment_def(&mut self) -> ParseResult<EnvironmentDef> {
        let start = self.pos;
        self.pos += 1;
        let id = self.identifier("an environment name")?;
        self.expect_char(':', "\":\"")?;
        self.skip_trailing()?;

        let mut vars: Vec<Var> = Vec::new();
        loop {
            let resume = self.pos;
            self.skip_blank_lines();
            if !matches!(self.peek(), Some(' ') | Some('\t')) {
                if vars.is_empty() {
                    return Err(self.expected("an indented header or variable definition"));
                }
                self.pos = resume;
                break;
            }

            self.skip_inline_ws();
            let var = match self.peek() {
                Some('$') => self.variable_def()?,
                _ if self.at_header() => self.header_def()?,
                _ => return Err(self.expected("an indented header or variable definition")),
            };
            vars.push(var);
        }

        let end = vars.last().map_or(start, |v| v.interval.end);
        Ok(EnvironmentDef {
            id: id.to_string(),
            vars,
            interval: Interval::new(start, end),
        })
    }

    fn request_def(&mut self) -> ParseResult<RequestDef> {
        let start = self.pos;
        let rest = self.rest();
        let word_len = rest.bytes().take_while(u8::is_ascii_alphanumeric).count();
        let word = &rest[..word_len];
        let method: HttpMethod = word
            .parse()
            .map_err(|_| self.error(start, SyntaxErrorKind::UnknownMethod(word.to_string())))?;
        self.pos += word_len;

        if !matches!(self.peek(), Some(' ') | Some('\t')) {
            return Err(self.expected("a request path"));
        }
        self.skip_inline_ws();
        let path_start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
        if self.pos == path_start {
            return Err(self.expected("a request path"));
        }
        let path = self.src[path_start..self.pos].to_string();
        let mut end = self.pos;

        self.skip_inline_ws();
        let mut processor_name = None;
        if self.peek() == Some('|') {
            self.pos += 1;
            self.skip_inline_ws();
            processor_name = Some(self.identifier("a processor name")?.to_string());
            end = self.pos;
        }
        self.skip_trailing()?;

        // `#` lines are comments up to the first body line; from there on they are body text
        let mut headers = Vec::new();
        while !self.at_eof() && !self.line_is_blank() {
            if self.line_is_comment() {
                self.skip_line();
                continue;
            }
            let line_start = self.pos;
            self.skip_inline_ws();
            if !self.at_header() {
                self.pos = line_start;
                break;
            }
            let header = self.header_def()?;
            end = header.interval.end;
            headers.push(header);
        }

        let mut body = None;
        if !self.at_eof() && !self.line_is_blank() {
            let mut lines = Vec::new();
            while !self.at_eof() && !self.line_is_blank() {
                let line_start = self.pos;
                self.skip_to_eol();
                let line = &self.src[line_start..self.pos];
                end = line_start + line.trim_end().len();
                lines.push(line);
                self.consume_eol();
            }
            body = Some(lines.join("\n").trim().to_string());
        }

        Ok(RequestDef {
            method,
            path,
            body,
            processor_name,
            headers,
            interval: Interval::new(start, end),
        })
    }

    // PROCESSOR name ```source```
    fn processor_def(&mut self) -> ParseResult<ProcessorDef> {
        let start = self.pos;
        self.pos += PROCESSOR_KEYWORD.len();
        self.skip_inline_ws();
        let name = self.identifier("a processor name")?.to_string();
        self.skip_inline_ws();
        if !self.rest().starts_with(FENCE) {
            return Err(self.expected("\"```\""));
        }
        self.pos += FENCE.len();

        let body_start = self.pos;
        let close = self
            .rest()
            .find(FENCE)
            .ok_or_else(|| self.error(self.src.len(), SyntaxErrorKind::UnterminatedProcessor))?;
        let source = self.src[body_start..body_start + close].trim().to_string();
        self.pos = body_start + close + FENCE.len();
        let end = self.pos;
        self.skip_trailing()?;

        Ok(ProcessorDef {
            name,
            source,
            interval: Interval::new(start, end),
        })
    }

    fn value(&mut self) -> ParseResult<VarValue> {
        match self.peek() {
            Some('"') => self.string_literal().map(VarValue::Str),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number_literal().map(VarValue::Num),
            _ => Err(self.expected("a number or a string literal")),
        }
    }

    // only \" and \\ are valid escapes
    fn string_literal(&mut self) -> ParseResult<String> {
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    return Err(self.error(self.pos, SyntaxErrorKind::UnterminatedString))
                }
                Some('"') => {
                    self.pos += 1;
                    return Ok(value);
                }
                Some('\\') => {
                    let escape_at = self.pos;
                    self.pos += 1;
                    match self.peek() {
                        Some(c @ ('"' | '\\')) => {
                            value.push(c);
                            self.pos += 1;
                        }
                        None | Some('\n') | Some('\r') => {
                            return Err(self.error(self.pos, SyntaxErrorKind::UnterminatedString))
                        }
                        Some(c) => {
                            return Err(self.error(escape_at, SyntaxErrorKind::InvalidEscape(c)))
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
    }

    fn number_literal(&mut self) -> ParseResult<i64> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        let digits = self.rest().bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(self.expected("a digit"));
        }
        self.pos += digits;
        let literal = &self.src[start..self.pos];
        literal.parse::<i64>().map_err(|_| {
            self.error(
                start,
                SyntaxErrorKind::IntegerOutOfRange(literal.to_string()),
            )
        })
    }

    fn identifier(&mut self, what: &'static str) -> ParseResult<&'s str> {
        let start = self.pos;
        let len = self.rest().bytes().take_while(is_ident_byte).count();
        if len == 0 {
            return Err(self.expected(what));
        }
        self.pos += len;
        let src = self.src;
        Ok(&src[start..self.pos])
    }

    fn expect_char(&mut self, c: char, what: &'static str) -> ParseResult<()> {
        if self.peek() != Some(c) {
            return Err(self.expected(what));
        }
        self.pos += c.len_utf8();
        Ok(())
    }

    /// Optional comment, then the end of the line.
    fn skip_trailing(&mut self) -> ParseResult<()> {
        self.skip_inline_ws();
        if self.peek() == Some('#') {
            self.skip_to_eol();
        }
        if !self.at_eol() {
            return Err(self.expected("end of line"));
        }
        self.consume_eol();
        Ok(())
    }

    fn skip_blank_lines(&mut self) {
        while !self.at_eof() && (self.line_is_blank() || self.line_is_comment()) {
            self.skip_line();
        }
    }

    fn skip_inline_ws(&mut self) {
        let len = self
            .rest()
            .bytes()
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        self.pos += len;
    }

    fn skip_to_eol(&mut self) {
        let len = self
            .rest()
            .find(|c: char| c == '\n' || c == '\r')
            .unwrap_or(self.rest().len());
        self.pos += len;
    }

    fn consume_eol(&mut self) {
        let rest = self.rest();
        if rest.starts_with("\r\n") {
            self.pos += 2;
        } else if rest.starts_with('\n') || rest.starts_with('\r') {
            self.pos += 1;
        }
    }

    fn skip_line(&mut self) {
        self.skip_to_eol();
        self.consume_eol();
    }

    /// Text of the current line after leading whitespace, without its terminator.
    fn line_content(&self) -> &'s str {
        let rest = self.rest();
        let line = rest
            .find(|c: char| c == '\n' || c == '\r')
            .map_or(rest, |end| &rest[..end]);
        line.trim_start_matches(|c: char| c == ' ' || c == '\t')
    }

    fn line_is_blank(&self) -> bool {
        self.line_content().trim_end().is_empty()
    }

    fn line_is_comment(&self) -> bool {
        self.line_content().starts_with('#')
    }

    fn at_header(&self) -> bool {
        let rest = self.rest().as_bytes();
        let len = rest.iter().take_while(|b| is_ident_byte(b)).count();
        len > 0 && rest.get(len) == Some(&b':')
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.rest()
            .strip_prefix(keyword)
            .map_or(false, |after| after.starts_with(|c: char| c == ' ' || c == '\t'))
    }

    fn rest(&self) -> &'s str {
        let src = self.src;
        &src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn at_eol(&self) -> bool {
        matches!(self.peek(), None | Some('\n') | Some('\r'))
    }

    fn error(&self, offset: usize, kind: SyntaxErrorKind) -> SyntaxError {
        let (line, column) = LineTracker::new(self.src).position(offset);
        SyntaxError {
            kind,
            line,
            column,
            offset,
        }
    }

    fn expected(&self, what: &'static str) -> SyntaxError {
        self.error(self.pos, SyntaxErrorKind::Expected(what))
    }
}
