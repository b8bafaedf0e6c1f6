use logos::Logos;

/// Tokens of one code-section line. Header lines are checked separately
/// because their indentation is significant.
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t]+")]
pub enum Token {
    #[regex(r"[A-Za-z][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Mnemonic(String),

    // Values past u64::MAX fail the callback and surface as a lex error.
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    Number(u64),
}

/// Lex a single line into tokens with byte ranges relative to the line.
/// Everything from `#` onwards is a comment.
pub fn lex_line(line: &str) -> Result<Vec<(Token, std::ops::Range<usize>)>, LexError> {
    let code = line.find('#').map_or(line, |i| &line[..i]);
    let mut lexer = Token::lexer(code);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                let span = lexer.span();
                let snippet = &line[span.clone()];
                return Err(LexError {
                    position: span.start,
                    snippet: snippet.to_string(),
                    suggestion: suggest_fix(snippet, &line[span.start..]),
                });
            }
        }
    }

    Ok(tokens)
}

fn suggest_fix(bad_token: &str, rest: &str) -> String {
    if bad_token.chars().all(|c| c.is_ascii_digit()) {
        format!("Values must fit in a 64-bit word (at most {}).", u64::MAX)
    } else if bad_token == "-" && rest[1..].starts_with(|c: char| c.is_ascii_digit()) {
        "Parameters are unsigned. Store the two's-complement word in the header and pass its address.".to_string()
    } else {
        format!("Unexpected character(s): '{}'. Lines are a mnemonic followed by decimal parameters.", bad_token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Lex error at column {}: '{snippet}'. {suggestion}", .position + 1)]
pub struct LexError {
    pub position: usize,
    pub snippet: String,
    pub suggestion: String,
}
