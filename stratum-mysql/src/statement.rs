//! Client-side statement splitting.
//!
//! A migration section arrives as one batch of SQL. MySQL executes one
//! statement per round trip here, so the batch is split on semicolons that
//! sit outside string literals, quoted identifiers, and comments. Pieces
//! that hold nothing but comments and whitespace are dropped; sending an
//! empty query to MySQL is an error.

/// Split a batch into executable statements, preserving statement text
/// (including any leading comments) verbatim.
pub(crate) fn split_statements(sql: &str) -> Vec<String> {
    #[derive(PartialEq)]
    enum State {
        Normal,
        SingleQuote,
        DoubleQuote,
        Backtick,
        LineComment,
        BlockComment,
    }

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_content = false;
    let mut state = State::Normal;
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        match state {
            State::Normal => match ch {
                ';' => {
                    if has_content {
                        statements.push(current.trim().to_string());
                    }
                    current.clear();
                    has_content = false;
                    continue;
                }
                '\'' => {
                    state = State::SingleQuote;
                    has_content = true;
                }
                '"' => {
                    state = State::DoubleQuote;
                    has_content = true;
                }
                '`' => {
                    state = State::Backtick;
                    has_content = true;
                }
                '-' if chars.peek() == Some(&'-') => {
                    current.push(ch);
                    current.push(chars.next().unwrap_or('-'));
                    state = State::LineComment;
                    continue;
                }
                '#' => {
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    current.push(ch);
                    current.push(chars.next().unwrap_or('*'));
                    state = State::BlockComment;
                    continue;
                }
                c if !c.is_whitespace() => {
                    has_content = true;
                }
                _ => {}
            },
            State::SingleQuote => match ch {
                '\\' => {
                    current.push(ch);
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                    continue;
                }
                '\'' => state = State::Normal,
                _ => {}
            },
            State::DoubleQuote => match ch {
                '\\' => {
                    current.push(ch);
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                    continue;
                }
                '"' => state = State::Normal,
                _ => {}
            },
            State::Backtick => {
                if ch == '`' {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if ch == '\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    current.push(ch);
                    current.push(chars.next().unwrap_or('/'));
                    state = State::Normal;
                    continue;
                }
            }
        }
        current.push(ch);
    }

    if has_content {
        statements.push(current.trim().to_string());
    }
    statements
}
