//! Line comment stripping and quote tracking.
//!
//! Quote state is only tracked within a physical line. Multi-line strings
//! of the host grammar are not recognised: a `//` on the continuation line
//! of such a string is treated as a comment.

/// Which quote, if any, the scanner is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteState {
    #[default]
    None,
    Single,
    Double,
}

impl QuoteState {
    /// State after reading `c`, where `prev` is the character before it.
    fn step(self, c: char, prev: Option<char>) -> Self {
        if prev == Some('\\') {
            return self;
        }
        match (self, c) {
            (QuoteState::None, '\'') => QuoteState::Single,
            (QuoteState::None, '"') => QuoteState::Double,
            (QuoteState::Single, '\'') | (QuoteState::Double, '"') => QuoteState::None,
            (state, _) => state,
        }
    }

    pub fn is_quoted(self) -> bool {
        self != QuoteState::None
    }
}

/// Strip a trailing `//` comment that is not inside a quote.
///
/// Returns the sanitized line and the quote state at its end.
pub fn sanitize_line(line: &str, carried: QuoteState) -> (String, QuoteState) {
    let mut state = carried;
    let mut prev = None;
    let mut chars = line.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !state.is_quoted() && c == '/' && matches!(chars.peek(), Some((_, '/'))) {
            return (line[..i].to_string(), state);
        }
        state = state.step(c, prev);
        prev = Some(c);
    }

    (line.to_string(), state)
}

/// Characters of `line` that sit outside quotes, with their byte offsets.
///
/// Quote characters themselves are not yielded.
pub fn structural_char_indices(line: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut state = QuoteState::None;
    let mut prev = None;
    line.char_indices().filter(move |&(_, c)| {
        let before = state;
        state = state.step(c, prev);
        prev = Some(c);
        !before.is_quoted() && !state.is_quoted()
    })
}

/// Net count of `open` minus `close` outside quotes.
pub fn net_delimiters(line: &str, open: char, close: char) -> i64 {
    structural_char_indices(line).fold(0, |depth, (_, c)| {
        if c == open {
            depth + 1
        } else if c == close {
            depth - 1
        } else {
            depth
        }
    })
}
