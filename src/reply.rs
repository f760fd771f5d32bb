use crate::error::ParseError;
use crate::state::State;

/// パーサーの結果。consumed フラグと成功／失敗の組で、
/// consumed-ok / consumed-err / empty-ok / empty-err の四通りを表す。
///
/// 成功側の `error` は「ここまでに期待していたもの」の残余で、後続の
/// コンビネーターが同じ位置で空失敗したときに統合される。ランナーの
/// 終端文脈は恒等写像であり、この Reply がそのまま最終結果になる。
#[derive(Clone, Debug)]
pub enum Reply<S, U, T> {
    Ok {
        value: T,
        state: State<S, U>,
        error: ParseError,
        consumed: bool,
    },
    Err {
        error: ParseError,
        consumed: bool,
    },
}

impl<S, U, T> Reply<S, U, T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn is_err(&self) -> bool {
        matches!(self, Self::Err { .. })
    }

    pub fn consumed(&self) -> bool {
        match self {
            Self::Ok { consumed, .. } | Self::Err { consumed, .. } => *consumed,
        }
    }

    /// 成功値を取り出す。
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Ok { value, .. } => Some(value),
            Self::Err { .. } => None,
        }
    }

    /// 失敗時のエラーを参照する。
    pub fn error(&self) -> Option<&ParseError> {
        match self {
            Self::Err { error, .. } => Some(error),
            Self::Ok { .. } => None,
        }
    }

    /// 成功・失敗を `Result` へ畳む。
    pub fn into_result(self) -> Result<T, ParseError> {
        match self {
            Self::Ok { value, .. } => Ok(value),
            Self::Err { error, .. } => Err(error),
        }
    }
}
