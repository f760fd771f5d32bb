use crate::pos::{SourcePos, DEFAULT_TAB_WIDTH};
use std::sync::Arc;

/// パース実行時の設定。未指定のフィールドは既定値のまま使う。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// エラー表示に使うソース名。
    pub source_name: Option<String>,
    /// タブストップの幅。
    pub tab_width: usize,
    /// 開始行（1 起点）。
    pub initial_line: usize,
    /// 開始列（1 起点）。
    pub initial_column: usize,
    /// 成功時に未消費の入力が残っていたら失敗として扱う。
    pub require_eof: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            source_name: None,
            tab_width: DEFAULT_TAB_WIDTH,
            initial_line: 1,
            initial_column: 1,
            require_eof: false,
        }
    }
}

impl RunConfig {
    /// 設定から開始位置を組み立てる。
    pub fn initial_pos(&self) -> SourcePos {
        SourcePos::new(
            self.source_name.as_deref().map(Arc::from),
            self.initial_line.max(1),
            self.initial_column.max(1),
            self.tab_width,
        )
    }
}
