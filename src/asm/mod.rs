//! Text assembly form.
//!
//! ```text
//! header {
//!   5
//!   0
//! }
//! # comment
//! ADD 0 1
//! INPUT 1
//! ```
//!
//! The first line opens the header. Header values are decimal words indented
//! by exactly two spaces, one per line. After the closing brace, every
//! non-blank, non-comment line is a mnemonic followed by exactly as many
//! decimal parameters as the opcode declares.

use tracing::debug;

use crate::bytecode::Image;
use crate::isa::{Instruction, MAX_PARAMS, Opcode, Program, Word};
use crate::lexer::{self, Token};

pub mod disasm;

pub use disasm::{disassemble, disassemble_bytes};

const HEADER_OPEN: &str = "header {";
const HEADER_CLOSE: &str = "}";
const INDENT: &str = "  ";

/// Byte range within source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const UNKNOWN: Span = Span { start: 0, end: 0 };

    fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct AsmError {
    pub code: &'static str,
    /// 1-based source line.
    pub line: usize,
    pub span: Span,
    pub message: String,
    pub suggestion: Option<String>,
}

type Result<T> = std::result::Result<T, AsmError>;

struct Line<'a> {
    number: usize,
    offset: usize,
    text: &'a str,
}

impl Line<'_> {
    fn error(&self, code: &'static str, range: std::ops::Range<usize>, message: String) -> AsmError {
        AsmError {
            code,
            line: self.number,
            span: Span::new(self.offset + range.start, self.offset + range.end),
            message,
            suggestion: None,
        }
    }

    fn whole(&self) -> std::ops::Range<usize> {
        0..self.text.len().max(1)
    }
}

fn lines(source: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    source.split_inclusive('\n').enumerate().map(move |(i, raw)| {
        let text = raw.strip_suffix('\n').unwrap_or(raw);
        let line = Line {
            number: i + 1,
            offset,
            text: text.strip_suffix('\r').unwrap_or(text),
        };
        offset += raw.len();
        line
    })
}

/// Assemble source text into an image. Stops at the first error.
pub fn assemble(source: &str) -> Result<Image> {
    let mut lines = lines(source);

    let first = lines.next().ok_or_else(|| AsmError {
        code: "LP-A001",
        line: 1,
        span: Span::UNKNOWN,
        message: "the header is missing".to_string(),
        suggestion: Some(format!("start the file with '{HEADER_OPEN}'")),
    })?;
    if first.text.trim_end() != HEADER_OPEN {
        let mut e = first.error("LP-A001", first.whole(), "the header is missing".to_string());
        e.suggestion = Some(format!("start the file with '{HEADER_OPEN}'"));
        return Err(e);
    }

    let mut header = Vec::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.text.trim_end() == HEADER_CLOSE {
            closed = true;
            break;
        }
        header.push(header_value(&line)?);
    }
    if !closed {
        let mut e = first.error(
            "LP-A004",
            first.whole(),
            "the header is never closed".to_string(),
        );
        e.suggestion = Some(format!("end the header with a line containing only '{HEADER_CLOSE}'"));
        return Err(e);
    }

    let mut instructions = Vec::new();
    for line in lines {
        if let Some(ins) = instruction(&line)? {
            instructions.push(ins);
        }
    }

    debug!(header = header.len(), instructions = instructions.len(), "assembled");
    Ok(Image::new(header, Program::new(instructions)))
}

fn header_value(line: &Line<'_>) -> Result<Word> {
    let indented = line.text.starts_with(INDENT)
        && line.text[INDENT.len()..].starts_with(|c: char| !c.is_whitespace());
    if !indented {
        let mut e = line.error(
            "LP-A002",
            line.whole(),
            "improper indentation in the header".to_string(),
        );
        e.suggestion = Some("indent header values by exactly two spaces".to_string());
        return Err(e);
    }

    let value = line.text[INDENT.len()..].trim_end();
    let range = INDENT.len()..INDENT.len() + value.len();
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(line.error(
            "LP-A003",
            range,
            format!("header value '{value}' is not an unsigned decimal number"),
        ));
    }
    value.parse::<Word>().map_err(|_| {
        let mut e = line.error(
            "LP-A003",
            range.clone(),
            format!("header value '{value}' does not fit in a word"),
        );
        e.suggestion = Some(format!("values must be at most {}", Word::MAX));
        e
    })
}

fn instruction(line: &Line<'_>) -> Result<Option<Instruction>> {
    let tokens = lexer::lex_line(line.text).map_err(|e| {
        let mut err = line.error(
            "LP-A006",
            e.position..e.position + e.snippet.len().max(1),
            format!("invalid token '{}'", e.snippet),
        );
        err.suggestion = Some(e.suggestion);
        err
    })?;

    let mut tokens = tokens.into_iter();
    let Some((first, first_span)) = tokens.next() else {
        return Ok(None);
    };

    let opcode = match first {
        Token::Mnemonic(name) => name.parse::<Opcode>().map_err(|_| {
            let mut e = line.error("LP-A005", first_span.clone(), format!("invalid command '{name}'"));
            e.suggestion = closest_mnemonic(&name).map(|m| format!("did you mean '{m}'?"));
            e
        })?,
        Token::Number(n) => {
            return Err(line.error(
                "LP-A005",
                first_span,
                format!("expected a command, found the number {n}"),
            ));
        }
    };

    let mut params = [0; MAX_PARAMS];
    let mut count = 0;
    for (i, (token, span)) in tokens.enumerate() {
        let Token::Number(n) = token else {
            return Err(line.error(
                "LP-A006",
                span,
                format!("invalid value for parameter {} of {opcode}", i + 1),
            ));
        };
        if i < opcode.arity() {
            params[i] = n;
        }
        count += 1;
    }

    if count != opcode.arity() {
        let mut e = line.error(
            "LP-A007",
            line.whole(),
            format!(
                "{opcode} takes {} parameter{}, found {count}",
                opcode.arity(),
                if opcode.arity() == 1 { "" } else { "s" },
            ),
        );
        e.suggestion = Some(usage(opcode));
        return Err(e);
    }

    Ok(Some(Instruction::new(opcode, params)))
}

fn usage(opcode: Opcode) -> String {
    let names: &[&str] = match opcode {
        Opcode::Not => &["target", "unused"],
        Opcode::Shift => &["target", "amount"],
        Opcode::Less | Opcode::Equ => &["a", "b"],
        Opcode::Copy => &["from", "to"],
        Opcode::Goto => &["hops", "target"],
        Opcode::Input => &["target"],
        Opcode::Load => &["target", "holder"],
        _ => &["target", "operand"],
    };
    format!("usage: {} <{}>", opcode, names.join("> <"))
}

fn closest_mnemonic(name: &str) -> Option<&'static str> {
    let upper = name.to_ascii_uppercase();
    let mut best: Option<(&'static str, usize)> = None;
    for op in Opcode::ALL {
        let dist = levenshtein(&upper, op.mnemonic());
        if dist <= 2 && best.is_none_or(|(_, d)| dist < d) {
            best = Some((op.mnemonic(), dist));
        }
    }
    best.map(|(m, _)| m)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());
    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in dp.iter_mut().enumerate().take(m + 1) { row[0] = i; }
    for (j, val) in dp[0].iter_mut().enumerate().take(n + 1) { *val = j; }
    for i in 1..=m {
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[m][n]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "header {\n  5\n  0\n}\n# add one\nADD 0 1\n\nINPUT 1\nGOTO 0 1\n";

    #[test]
    fn assemble_sample() {
        let image = assemble(SAMPLE).unwrap();
        assert_eq!(image.header, vec![5, 0]);
        assert_eq!(
            image.program.instructions(),
            &[
                Instruction::new(Opcode::Add, [0, 1]),
                Instruction::new(Opcode::Input, [1, 0]),
                Instruction::new(Opcode::Goto, [0, 1]),
            ]
        );
    }

    #[test]
    fn empty_header_and_no_code() {
        let image = assemble("header {\n}").unwrap();
        assert!(image.header.is_empty());
        assert!(image.program.is_empty());
    }

    #[test]
    fn crlf_line_endings() {
        let image = assemble("header {\r\n  3\r\n}\r\nNOT 0 0\r\n").unwrap();
        assert_eq!(image.header, vec![3]);
        assert_eq!(image.program.len(), 1);
    }

    #[test]
    fn missing_header() {
        let e = assemble("ADD 0 1\n").unwrap_err();
        assert_eq!((e.code, e.line), ("LP-A001", 1));
        let e = assemble("").unwrap_err();
        assert_eq!((e.code, e.line), ("LP-A001", 1));
    }

    #[test]
    fn unclosed_header() {
        let e = assemble("header {\n  1\n  2\n").unwrap_err();
        assert_eq!(e.code, "LP-A004");
    }

    #[test]
    fn header_indentation_must_be_two_spaces() {
        for bad in ["header {\n1\n}", "header {\n 1\n}", "header {\n   1\n}", "header {\n\t1\n}", "header {\n\n}"] {
            let e = assemble(bad).unwrap_err();
            assert_eq!((e.code, e.line), ("LP-A002", 2), "source: {bad:?}");
        }
    }

    #[test]
    fn header_values_must_be_numbers() {
        let e = assemble("header {\n  1\n  x1\n}").unwrap_err();
        assert_eq!((e.code, e.line), ("LP-A003", 3));
        assert_eq!(e.span, Span { start: 15, end: 17 });
        let e = assemble("header {\n  -4\n}").unwrap_err();
        assert_eq!(e.code, "LP-A003");
        let e = assemble("header {\n  99999999999999999999\n}").unwrap_err();
        assert_eq!(e.code, "LP-A003");
    }

    #[test]
    fn unknown_mnemonic_reports_line_and_suggestion() {
        let e = assemble("header {\n}\nADD 0 1\nADDD 0 1\n").unwrap_err();
        assert_eq!((e.code, e.line), ("LP-A005", 4));
        assert_eq!(e.suggestion.as_deref(), Some("did you mean 'ADD'?"));
        let e = assemble("header {\n}\nadd 0 1\n").unwrap_err();
        assert_eq!(e.suggestion.as_deref(), Some("did you mean 'ADD'?"));
        let e = assemble("header {\n}\nFROBNICATE 0 1\n").unwrap_err();
        assert!(e.suggestion.is_none());
    }

    #[test]
    fn number_in_command_position() {
        let e = assemble("header {\n}\n12 0 1\n").unwrap_err();
        assert_eq!((e.code, e.line), ("LP-A005", 3));
    }

    #[test]
    fn parameter_count_is_enforced() {
        let e = assemble("header {\n}\nADD 0\n").unwrap_err();
        assert_eq!((e.code, e.line), ("LP-A007", 3));
        assert!(e.message.contains("takes 2 parameters, found 1"));
        let e = assemble("header {\n}\nINPUT 0 1\n").unwrap_err();
        assert_eq!(e.code, "LP-A007");
        assert!(e.message.contains("takes 1 parameter, found 2"));
        assert_eq!(e.suggestion.as_deref(), Some("usage: INPUT <target>"));
    }

    #[test]
    fn non_numeric_parameter() {
        let e = assemble("header {\n}\nADD 0 x\n").unwrap_err();
        assert_eq!((e.code, e.line), ("LP-A006", 3));
        assert!(e.message.contains("parameter 2"));
        let e = assemble("header {\n}\nADD 0 -1\n").unwrap_err();
        assert_eq!(e.code, "LP-A006");
    }

    #[test]
    fn error_spans_point_into_source() {
        let src = "header {\n}\nADD 0 ?\n";
        let e = assemble(src).unwrap_err();
        assert_eq!(&src[e.span.start..e.span.end], "?");
    }

    #[test]
    fn levenshtein_distances() {
        assert_eq!(levenshtein("ADD", "ADD"), 0);
        assert_eq!(levenshtein("AD", "ADD"), 1);
        assert_eq!(levenshtein("GOTOO", "GOTO"), 1);
    }
}
