//! Translation of driver-reported SQL error positions into locations in the
//! original migration file.
//!
//! Drivers report a 1-based character offset into the SQL string they were
//! handed. Because a section starts partway through its file, the section's
//! offset is added back to produce a whole-file location. Counting is in
//! Unicode characters throughout: lines split on `\n`, and a `\r` preceding
//! the `\n` belongs to the line it terminates.

/// A located error position within a migration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePosition {
    /// 1-indexed line number.
    pub line: usize,
    /// 1-indexed character column within the line.
    pub column: usize,
    /// 1-indexed character offset from the start of the file.
    pub position: usize,
}

/// Locate a driver-reported position within the original file.
///
/// `section_offset` is the byte offset of the section start within
/// `contents` (always a line start, so always a character boundary);
/// `sql_position` is the driver's 1-based character offset into the section
/// text.
pub fn locate(contents: &str, section_offset: usize, sql_position: usize) -> SourcePosition {
    let chars_before = contents[..section_offset].chars().count();
    let position = chars_before + sql_position.max(1);

    let mut line = 1;
    let mut line_start = 1;
    for (index, ch) in contents.chars().enumerate() {
        let char_pos = index + 1;
        if char_pos >= position {
            break;
        }
        if ch == '\n' {
            line += 1;
            line_start = char_pos + 1;
        }
    }

    SourcePosition {
        line,
        column: position - line_start + 1,
        position,
    }
}
