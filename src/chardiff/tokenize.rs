use super::offset::ByteOffset;

/// Operators kept together as one token, longest first
const OPERATORS: [&str; 10] = ["...", "&&", "||", "==", "!=", "<=", ">=", ":=", "->", ".."];

/// A maximal token and where it starts in its string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Token<'a> {
    pub text: &'a str,
    pub start: ByteOffset,
}

/// Split `text` into tokens that cover it completely and in order.
///
/// Rules, in priority order: identifier (`[A-Za-z_][A-Za-z0-9_]*`), number
/// with at most one decimal point, a multi-character operator, a run of
/// whitespace, or any other single character.
pub(super) fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(first) = text[pos..].chars().next() {
        let rest = &text[pos..];
        let len = if first.is_ascii_alphabetic() || first == '_' {
            ascii_run(rest, |b| b.is_ascii_alphanumeric() || b == b'_')
        } else if first.is_ascii_digit() {
            number_len(rest)
        } else if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(*op)) {
            op.len()
        } else if first.is_whitespace() {
            rest.char_indices()
                .find(|(_, c)| !c.is_whitespace())
                .map_or(rest.len(), |(i, _)| i)
        } else {
            first.len_utf8()
        };

        tokens.push(Token {
            text: &rest[..len],
            start: ByteOffset(pos),
        });
        pos += len;
    }

    tokens
}

/// Length of the leading run of ASCII bytes matching `keep`
fn ascii_run(text: &str, keep: impl Fn(u8) -> bool) -> usize {
    text.bytes().take_while(|&b| keep(b)).count()
}

/// `\d+(\.\d+)?`
fn number_len(text: &str) -> usize {
    let integer = ascii_run(text, |b| b.is_ascii_digit());
    let after = &text[integer..];

    match after.strip_prefix('.') {
        Some(fraction) => match ascii_run(fraction, |b| b.is_ascii_digit()) {
            0 => integer,
            digits => integer + 1 + digits,
        },
        None => integer,
    }
}
