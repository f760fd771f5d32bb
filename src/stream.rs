use crate::pos::SourcePos;
use std::fmt;
use std::sync::Arc;

/// ストリームを流れるトークン。位置の進め方と診断用の表示を定める。
///
/// 文字以外のトークンは既定では位置を変えない。行・列を持つトークン型は
/// `advance_pos` を上書きする。
pub trait Token: Clone + Send + Sync + 'static {
    /// このトークンを 1 つ消費したあとの位置。
    fn advance_pos(&self, pos: &SourcePos) -> SourcePos {
        pos.clone()
    }

    /// エラーメッセージ用の表示。
    fn render(&self) -> String;
}

impl Token for char {
    fn advance_pos(&self, pos: &SourcePos) -> SourcePos {
        pos.advance_char(*self)
    }

    fn render(&self) -> String {
        format!("\"{}\"", self.escape_default())
    }
}

/// トークン列の抽象。`uncons` で先頭と残りに分解する。
///
/// クローンで任意の時点から再開できること（restartable-on-clone）が
/// 前提で、提供する実装は共有バッファ＋オフセットでこれを満たす。
pub trait Stream: Clone + Send + Sync + 'static {
    type Item: Token;

    fn uncons(&self) -> Option<(Self::Item, Self)>;
}

/// 文字列入力。`Arc<str>` を共有しつつバイトオフセットだけを進める。
#[derive(Clone, PartialEq, Eq)]
pub struct CharStream {
    source: Arc<str>,
    byte_offset: usize,
}

impl CharStream {
    pub fn new(source: impl AsRef<str>) -> Self {
        Self::from_arc_str(Arc::<str>::from(source.as_ref()))
    }

    pub fn from_arc_str(source: Arc<str>) -> Self {
        Self {
            source,
            byte_offset: 0,
        }
    }

    pub fn remaining(&self) -> &str {
        &self.source[self.byte_offset..]
    }

    pub fn is_empty(&self) -> bool {
        self.byte_offset >= self.source.len()
    }

    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    /// 指定バイト数だけ進めた新しいビューを返す。UTF-8 境界であること。
    pub fn advance(&self, bytes: usize) -> Self {
        let end = (self.byte_offset + bytes).min(self.source.len());
        debug_assert!(
            self.source.is_char_boundary(end),
            "CharStream.advance が UTF-8 境界でない位置へ進もうとしました: {end}"
        );
        Self {
            source: Arc::clone(&self.source),
            byte_offset: end,
        }
    }
}

impl Stream for CharStream {
    type Item = char;

    fn uncons(&self) -> Option<(char, Self)> {
        let ch = self.remaining().chars().next()?;
        Some((ch, self.advance(ch.len_utf8())))
    }
}

impl fmt::Debug for CharStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharStream")
            .field("remaining", &self.remaining())
            .finish()
    }
}

impl From<&str> for CharStream {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for CharStream {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl From<Arc<str>> for CharStream {
    fn from(source: Arc<str>) -> Self {
        Self::from_arc_str(source)
    }
}

/// 任意トークン列の入力。`Arc<[T]>` を共有してオフセットだけを進める。
#[derive(Clone, Debug)]
pub struct SliceStream<T> {
    items: Arc<[T]>,
    offset: usize,
}

impl<T> SliceStream<T> {
    pub fn new(items: impl Into<Arc<[T]>>) -> Self {
        Self {
            items: items.into(),
            offset: 0,
        }
    }

    pub fn remaining(&self) -> &[T] {
        &self.items[self.offset.min(self.items.len())..]
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.items.len()
    }
}

impl<T: Token> Stream for SliceStream<T> {
    type Item = T;

    fn uncons(&self) -> Option<(T, Self)> {
        let item = self.items.get(self.offset)?.clone();
        Some((
            item,
            Self {
                items: Arc::clone(&self.items),
                offset: self.offset + 1,
            },
        ))
    }
}

impl<T> From<Vec<T>> for SliceStream<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}
