//! Splits a command's argument string into arguments.
//!
//! Whitespace separates arguments. A pair of unescaped double quotes keeps
//! everything between them as one argument. `\` escapes `"` and `\`.

/// Why an argument string was rejected. Offsets are byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum TokenizeError {
    #[display("An opening double quote must be preceded by whitespace (at {_0}).")]
    QuoteNotPreceded(usize),

    #[display("A closing double quote must be followed by whitespace (at {_0}).")]
    QuoteNotFollowed(usize),

    #[display("The double quote at {_0} is never closed.")]
    UnclosedQuote(usize),

    #[display("A backslash must be followed by a \" or \\ (at {_0}).")]
    InvalidEscape(usize),
}

/// Tokenizes `input` following the rules posted by `tokenizer-info`.
///
/// Quoted arguments that contain only whitespace are dropped.
pub fn tokenize(input: &str) -> Result<Vec<String>, TokenizeError> {
    let mut args = Vec::new();
    let mut current = String::new();
    // true once the current unquoted token has any content, escaped or not
    let mut in_token = false;
    let mut quote_start: Option<usize> = None;
    let mut prev_is_space = true;

    let mut chars = input.char_indices().peekable();
    while let Some((pos, ch)) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some((_, escaped @ ('"' | '\\'))) => {
                    current.push(escaped);
                    if quote_start.is_none() {
                        in_token = true;
                    }
                    prev_is_space = false;
                }
                _ => return Err(TokenizeError::InvalidEscape(pos)),
            },

            '"' if quote_start.is_none() => {
                if !prev_is_space {
                    return Err(TokenizeError::QuoteNotPreceded(pos));
                }
                quote_start = Some(pos);
                prev_is_space = false;
            }

            '"' => {
                if chars.peek().is_some_and(|&(_, next)| !next.is_whitespace()) {
                    return Err(TokenizeError::QuoteNotFollowed(pos));
                }
                quote_start = None;
                in_token = false;
                if current.chars().any(|c| !c.is_whitespace()) {
                    args.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
                prev_is_space = false;
            }

            c if c.is_whitespace() && quote_start.is_none() => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
                prev_is_space = true;
            }

            c => {
                current.push(c);
                if quote_start.is_none() {
                    in_token = true;
                }
                prev_is_space = false;
            }
        }
    }

    if let Some(pos) = quote_start {
        return Err(TokenizeError::UnclosedQuote(pos));
    }
    if in_token {
        args.push(current);
    }

    Ok(args)
}
