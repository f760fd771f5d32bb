use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// 既定のタブ幅。
pub const DEFAULT_TAB_WIDTH: usize = 8;

/// ソース上の現在位置。行・列は 1 起点。
///
/// 位置の比較は (line, column) のみで行い、ソース名とタブ幅は
/// 同一パース内で不変のため比較対象に含めない。
#[derive(Clone, Debug)]
pub struct SourcePos {
    pub name: Option<Arc<str>>,
    pub line: usize,
    pub column: usize,
    pub tab_width: usize,
}

impl SourcePos {
    pub fn new(name: Option<Arc<str>>, line: usize, column: usize, tab_width: usize) -> Self {
        Self {
            name,
            line,
            column,
            tab_width: tab_width.max(1),
        }
    }

    /// 次の列へ進める。
    pub fn next_column(&self) -> Self {
        Self {
            column: self.column + 1,
            ..self.clone()
        }
    }

    /// 次の行頭へ進める。
    pub fn next_line(&self) -> Self {
        Self {
            line: self.line + 1,
            column: 1,
            ..self.clone()
        }
    }

    /// 次のタブストップへ進める。
    pub fn next_tab(&self) -> Self {
        let width = self.tab_width;
        Self {
            column: self.column + width - ((self.column - 1) % width),
            ..self.clone()
        }
    }

    /// 文字に応じて位置を進める。改行は行送り、タブはタブストップ、
    /// それ以外は 1 列進む。
    pub fn advance_char(&self, ch: char) -> Self {
        match ch {
            '\n' => self.next_line(),
            '\t' => self.next_tab(),
            _ => self.next_column(),
        }
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        if let Some(name) = self.name.as_deref() {
            obj.insert("source".into(), Value::String(name.to_string()));
        }
        obj.insert("line".into(), Value::from(self.line as u64));
        obj.insert("column".into(), Value::from(self.column as u64));
        Value::Object(obj)
    }
}

impl Default for SourcePos {
    fn default() -> Self {
        Self {
            name: None,
            line: 1,
            column: 1,
            tab_width: DEFAULT_TAB_WIDTH,
        }
    }
}

impl PartialEq for SourcePos {
    fn eq(&self, other: &Self) -> bool {
        self.line == other.line && self.column == other.column
    }
}

impl Eq for SourcePos {}

impl PartialOrd for SourcePos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SourcePos {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.line, self.column).cmp(&(other.line, other.column))
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_deref() {
            Some(name) => write!(f, "in {}, at line {}, column {}", name, self.line, self.column),
            None => write!(f, "at line {}, column {}", self.line, self.column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, 9; "行頭のタブは次のストップへ")]
    #[test_case(5, 9; "途中のタブも同じストップへ")]
    #[test_case(8, 9; "ストップ直前")]
    #[test_case(9, 17; "ストップ直後は次のストップへ")]
    fn tab_advances_to_next_stop(column: usize, expected: usize) {
        let pos = SourcePos {
            column,
            ..SourcePos::default()
        };
        assert_eq!(pos.next_tab().column, expected);
    }

    #[test]
    fn newline_resets_column() {
        let pos = SourcePos {
            line: 3,
            column: 7,
            ..SourcePos::default()
        };
        let next = pos.advance_char('\n');
        assert_eq!((next.line, next.column), (4, 1));
    }

    #[test]
    fn ordering_ignores_source_name() {
        let a = SourcePos::new(Some(Arc::from("a.txt")), 1, 5, 8);
        let b = SourcePos::new(None, 1, 5, 4);
        assert_eq!(a, b);
        assert!(a < b.next_column());
    }
}
