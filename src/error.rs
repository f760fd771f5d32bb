use crate::pos::SourcePos;
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// 遅延評価されるエラー本文。サンク（thunk）は高々一度だけ評価され、
/// 同じエラーが複数回レンダリングされても再計算しない。
#[derive(Clone)]
pub struct ErrorText {
    cell: Arc<OnceCell<String>>,
    thunk: Arc<dyn Fn() -> String + Send + Sync>,
}

impl ErrorText {
    /// サンクから構築する。
    pub fn lazy<F>(thunk: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            cell: Arc::new(OnceCell::new()),
            thunk: Arc::new(thunk),
        }
    }

    /// 評価済みの文字列から構築する。
    pub fn ready(text: impl Into<String>) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(text.into());
        Self {
            cell: Arc::new(cell),
            thunk: Arc::new(String::new),
        }
    }

    /// 本文を取り出す。未評価ならここで一度だけ評価する。
    pub fn resolve(&self) -> &str {
        self.cell.get_or_init(|| (self.thunk)())
    }
}

impl From<&str> for ErrorText {
    fn from(text: &str) -> Self {
        Self::ready(text)
    }
}

impl From<String> for ErrorText {
    fn from(text: String) -> Self {
        Self::ready(text)
    }
}

impl PartialEq for ErrorText {
    fn eq(&self, other: &Self) -> bool {
        self.resolve() == other.resolve()
    }
}

impl Eq for ErrorText {}

impl fmt::Debug for ErrorText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorText").field(&self.resolve()).finish()
    }
}

impl fmt::Display for ErrorText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resolve())
    }
}

/// パースエラーを構成するメッセージ。タグと本文で等価比較する。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// トークン不一致や入力終端など、ライブラリが生成した unexpected。
    SysUnexpect(ErrorText),
    /// 利用者が与えた unexpected。
    Unexpect(ErrorText),
    /// この位置で期待していたもの。複数あれば or で結んで表示する。
    Expect(ErrorText),
    /// 自由形式の失敗メッセージ。
    Plain(ErrorText),
}

impl Message {
    pub fn text(&self) -> &str {
        match self {
            Self::SysUnexpect(text)
            | Self::Unexpect(text)
            | Self::Expect(text)
            | Self::Plain(text) => text.resolve(),
        }
    }
}

/// 位置とメッセージ集合から成るパースエラー。継続プロトコルで値として
/// 運搬され、例外にはならない。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub pos: SourcePos,
    messages: Vec<Message>,
}

impl ParseError {
    /// メッセージを持たない空のエラー。成功系継続の残余として使う。
    pub fn empty(pos: SourcePos) -> Self {
        Self {
            pos,
            messages: Vec::new(),
        }
    }

    pub fn new(message: Message, pos: SourcePos) -> Self {
        Self {
            pos,
            messages: vec![message],
        }
    }

    pub fn sys_unexpect(pos: SourcePos, text: impl Into<ErrorText>) -> Self {
        Self::new(Message::SysUnexpect(text.into()), pos)
    }

    pub fn unexpect(pos: SourcePos, text: impl Into<ErrorText>) -> Self {
        Self::new(Message::Unexpect(text.into()), pos)
    }

    pub fn expect(pos: SourcePos, text: impl Into<ErrorText>) -> Self {
        Self::new(Message::Expect(text.into()), pos)
    }

    pub fn plain(pos: SourcePos, text: impl Into<ErrorText>) -> Self {
        Self::new(Message::Plain(text.into()), pos)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// メッセージを追加する（重複は足さない）。
    pub fn with_message(mut self, message: Message) -> Self {
        if !self.messages.contains(&message) {
            self.messages.push(message);
        }
        self
    }

    /// 二つのエラーを統合する。片方が空ならもう片方を返し、位置が
    /// 異なる場合はより進んだ位置のエラーを残す（最長一致規則）。
    /// 同じ位置ならメッセージ集合の和を取る。
    pub fn merge(self, other: ParseError) -> ParseError {
        if self.is_empty() && !other.is_empty() {
            return other;
        }
        if other.is_empty() && !self.is_empty() {
            return self;
        }
        match self.pos.cmp(&other.pos) {
            Ordering::Greater => self,
            Ordering::Less => other,
            Ordering::Equal => {
                let mut merged = self;
                for message in other.messages {
                    if !merged.messages.contains(&message) {
                        merged.messages.push(message);
                    }
                }
                merged
            }
        }
    }

    /// Expect 集合だけを差し替える。既存の Expect を全て取り除き、
    /// 本文が空でなければ新しい Expect を一つ加える。他の種別は残す。
    pub fn relabel(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.messages
            .retain(|message| !matches!(message, Message::Expect(_)));
        if !text.is_empty() {
            self.messages.push(Message::Expect(ErrorText::ready(text)));
        }
        self
    }

    /// ソートと重複除去を済ませた Expect 本文の一覧。
    fn expects_sorted(&self) -> Vec<&str> {
        let mut expects: Vec<&str> = self
            .messages
            .iter()
            .filter_map(|message| match message {
                Message::Expect(text) => Some(text.resolve()),
                _ => None,
            })
            .collect();
        expects.sort_unstable();
        expects.dedup();
        expects
    }

    /// unexpected 行の本文。Unexpect を優先し、無ければ SysUnexpect。
    /// 空の SysUnexpect は入力終端を表す。
    fn unexpected_text(&self) -> Option<&str> {
        let user = self.messages.iter().find_map(|message| match message {
            Message::Unexpect(text) => Some(text.resolve()),
            _ => None,
        });
        user.or_else(|| {
            self.messages.iter().find_map(|message| match message {
                Message::SysUnexpect(text) => {
                    let text = text.resolve();
                    Some(if text.is_empty() { "end of input" } else { text })
                }
                _ => None,
            })
        })
    }

    /// 外部ツール向けの JSON 形式。
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("position".into(), self.pos.to_json());
        if let Some(unexpected) = self.unexpected_text() {
            obj.insert("unexpected".into(), Value::String(unexpected.to_string()));
        }
        let expects = self.expects_sorted();
        if !expects.is_empty() {
            obj.insert(
                "expected".into(),
                Value::Array(
                    expects
                        .iter()
                        .map(|text| Value::String((*text).to_string()))
                        .collect(),
                ),
            );
        }
        let notes: Vec<Value> = self
            .messages
            .iter()
            .filter_map(|message| match message {
                Message::Plain(text) => Some(Value::String(text.resolve().to_string())),
                _ => None,
            })
            .collect();
        if !notes.is_empty() {
            obj.insert("messages".into(), Value::Array(notes));
        }
        obj.insert("rendered".into(), Value::String(self.to_string()));
        Value::Object(obj)
    }
}

impl fmt::Display for ParseError {
    /// 決定的なレンダリング。Expect はソート・重複除去済みで、
    /// 同じ文法と入力からは常にバイト単位で同じ出力になる。
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.pos)?;
        if self.is_empty() {
            return write!(f, "\nunknown parse error");
        }
        if let Some(unexpected) = self.unexpected_text() {
            write!(f, "\nunexpected {}", unexpected)?;
        }
        let expects = self.expects_sorted();
        if !expects.is_empty() {
            write!(f, "\nexpecting {}", expects.join(" or "))?;
        }
        for message in &self.messages {
            if let Message::Plain(text) = message {
                write!(f, "\n{}", text.resolve())?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}
