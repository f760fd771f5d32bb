use crate::combinator::ok;
use crate::error::{ErrorText, ParseError};
use crate::reply::Reply;
use crate::state::State;
use crate::stream::Stream;
use std::fmt;
use std::sync::Arc;

/// 繰り返し系コンビネーターが空成功を検知したときのパニック文言。
/// 入力を消費せずに成功するパーサーを繰り返すと無限ループになるため、
/// これはパースエラーではなくプログラミングエラーとして扱う。
pub(crate) const EMPTY_REPEAT_PANIC: &str = "繰り返し本体が入力を消費せずに成功しました";

/// パーサー本体。State を受け取り Reply を返すクロージャを Arc で共有する。
///
/// 値として自由に複製・合成でき、同一のパーサーを独立した入力に対して
/// 並行に走らせてもよい。実行は純粋で、同じ入力と設定からは常に同じ
/// Reply が得られる。
pub struct Parser<S, U, T> {
    f: Arc<dyn Fn(State<S, U>) -> Reply<S, U, T> + Send + Sync>,
}

impl<S, U, T> Clone for Parser<S, U, T> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

impl<S, U, T> fmt::Debug for Parser<S, U, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser").finish_non_exhaustive()
    }
}

impl<S, U, T> Parser<S, U, T>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(State<S, U>) -> Reply<S, U, T> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// 状態を与えて実行する。継続は Reply のタグ＋consumed で表現され、
    /// 呼び出しごとに四通りのうちちょうど一つが返る。
    pub fn parse(&self, state: State<S, U>) -> Reply<S, U, T> {
        (self.f)(state)
    }

    /// 値を変換する。
    pub fn map<V, F>(self, f: F) -> Parser<S, U, V>
    where
        V: Clone + Send + Sync + 'static,
        F: Fn(T) -> V + Send + Sync + 'static,
    {
        Parser::new(move |state| match self.parse(state) {
            Reply::Ok {
                value,
                state,
                error,
                consumed,
            } => Reply::Ok {
                value: f(value),
                state,
                error,
                consumed,
            },
            Reply::Err { error, consumed } => Reply::Err { error, consumed },
        })
    }

    /// モナド的な逐次合成。消費の有無に応じて後続の空系結果へ
    /// 残余エラーを前置し、同じ位置で競合した期待集合を統合する。
    pub fn and_then<V, F>(self, f: F) -> Parser<S, U, V>
    where
        V: Clone + Send + Sync + 'static,
        F: Fn(T) -> Parser<S, U, V> + Send + Sync + 'static,
    {
        Parser::new(move |state| match self.parse(state) {
            Reply::Ok {
                value,
                state,
                error,
                consumed: true,
            } => match f(value).parse(state) {
                Reply::Ok {
                    value,
                    state,
                    error: next_error,
                    consumed: false,
                } => Reply::Ok {
                    value,
                    state,
                    error: error.merge(next_error),
                    consumed: true,
                },
                Reply::Ok {
                    value,
                    state,
                    error,
                    consumed: true,
                } => Reply::Ok {
                    value,
                    state,
                    error,
                    consumed: true,
                },
                Reply::Err {
                    error: next_error,
                    consumed: false,
                } => Reply::Err {
                    error: error.merge(next_error),
                    consumed: true,
                },
                Reply::Err {
                    error,
                    consumed: true,
                } => Reply::Err {
                    error,
                    consumed: true,
                },
            },
            Reply::Ok {
                value,
                state,
                error,
                consumed: false,
            } => {
                if error.is_empty() {
                    f(value).parse(state)
                } else {
                    match f(value).parse(state) {
                        Reply::Ok {
                            value,
                            state,
                            error: next_error,
                            consumed: false,
                        } => Reply::Ok {
                            value,
                            state,
                            error: error.merge(next_error),
                            consumed: false,
                        },
                        Reply::Err {
                            error: next_error,
                            consumed: false,
                        } => Reply::Err {
                            error: error.merge(next_error),
                            consumed: false,
                        },
                        reply => reply,
                    }
                }
            }
            Reply::Err { error, consumed } => Reply::Err { error, consumed },
        })
    }

    /// 直列合成。両方の値を組で返す。
    pub fn then<V>(self, other: Parser<S, U, V>) -> Parser<S, U, (T, V)>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.and_then(move |left| other.clone().map(move |right| (left.clone(), right)))
    }

    /// 左側を捨てて右側を返す。
    pub fn skip_l<V>(self, other: Parser<S, U, V>) -> Parser<S, U, V>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.and_then(move |_| other.clone())
    }

    /// 右側を捨てて左側を返す。
    pub fn skip_r<V>(self, other: Parser<S, U, V>) -> Parser<S, U, T>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.then(other).map(|(left, _)| left)
    }

    /// 予測型の選択。左側が入力を消費せずに失敗したときだけ右側を試し、
    /// 両者の期待集合を統合する。左側が 1 トークンでも消費していれば
    /// 右側は試さない。
    pub fn or(self, other: Parser<S, U, T>) -> Parser<S, U, T> {
        Parser::new(move |state: State<S, U>| match self.parse(state.clone()) {
            Reply::Err {
                error,
                consumed: false,
            } => match other.parse(state) {
                Reply::Ok {
                    value,
                    state,
                    error: next_error,
                    consumed: false,
                } => Reply::Ok {
                    value,
                    state,
                    error: error.merge(next_error),
                    consumed: false,
                },
                Reply::Err {
                    error: next_error,
                    consumed: false,
                } => Reply::Err {
                    error: error.merge(next_error),
                    consumed: false,
                },
                reply => reply,
            },
            reply => reply,
        })
    }

    /// 消費付き失敗を空失敗へ変換する。選択の左枝で無制限の先読みを
    /// 使いたいときに明示的に選ぶ。エラー自体は変更しない。
    pub fn attempt(self) -> Parser<S, U, T> {
        Parser::new(move |state| match self.parse(state) {
            Reply::Err { error, .. } => Reply::Err {
                error,
                consumed: false,
            },
            reply => reply,
        })
    }

    /// 先読み。成功しても元の状態のまま値だけを返す。失敗はそのまま
    /// 通すので、消費も巻き戻したい場合は attempt と組み合わせる。
    pub fn lookahead(self) -> Parser<S, U, T> {
        Parser::new(move |state: State<S, U>| {
            let origin = state.clone();
            match self.parse(state) {
                Reply::Ok { value, .. } => {
                    let error = ParseError::empty(origin.pos.clone());
                    Reply::Ok {
                        value,
                        state: origin,
                        error,
                        consumed: false,
                    }
                }
                reply => reply,
            }
        })
    }

    /// 否定先読み。内側が成功したら unexpected として空失敗し、
    /// 失敗したら空成功する。どちらの場合も入力は消費しない。
    pub fn not_followed_by(self) -> Parser<S, U, ()>
    where
        T: fmt::Debug,
    {
        Parser::new(move |state: State<S, U>| {
            let origin = state.clone();
            match self.parse(state) {
                Reply::Ok { value, .. } => Reply::Err {
                    error: ParseError::unexpect(
                        origin.pos.clone(),
                        ErrorText::lazy(move || format!("{value:?}")),
                    ),
                    consumed: false,
                },
                Reply::Err { .. } => {
                    let error = ParseError::empty(origin.pos.clone());
                    Reply::Ok {
                        value: (),
                        state: origin,
                        error,
                        consumed: false,
                    }
                }
            }
        })
    }

    /// 0 回または 1 回。
    pub fn opt(self) -> Parser<S, U, Option<T>> {
        self.map(Some).or(ok(None))
    }

    /// 失敗時に既定値で成功する 0/1 回。
    pub fn option(self, default: T) -> Parser<S, U, T> {
        self.or(ok(default))
    }

    /// 0 回以上の繰り返し。本体が入力を消費せずに成功した場合は
    /// プログラミングエラーとして panic する。
    pub fn many(self) -> Parser<S, U, Vec<T>> {
        Parser::new(move |state: State<S, U>| {
            let mut values = Vec::new();
            let mut current = state;
            let mut any_consumed = false;
            loop {
                match self.parse(current.clone()) {
                    Reply::Ok {
                        consumed: false, ..
                    } => panic!("{EMPTY_REPEAT_PANIC}"),
                    Reply::Ok {
                        value,
                        state,
                        consumed: true,
                        ..
                    } => {
                        values.push(value);
                        current = state;
                        any_consumed = true;
                    }
                    Reply::Err {
                        error,
                        consumed: false,
                    } => {
                        return Reply::Ok {
                            value: values,
                            state: current,
                            error,
                            consumed: any_consumed,
                        };
                    }
                    Reply::Err {
                        error,
                        consumed: true,
                    } => {
                        return Reply::Err {
                            error,
                            consumed: true,
                        };
                    }
                }
            }
        })
    }

    /// 1 回以上の繰り返し。
    pub fn many1(self) -> Parser<S, U, Vec<T>> {
        let rest = self.clone();
        self.and_then(move |first| {
            rest.clone().many().map(move |mut tail| {
                let mut values = vec![first.clone()];
                values.append(&mut tail);
                values
            })
        })
    }

    /// 値を捨てる 0 回以上の繰り返し。空成功の検知は many と同じ。
    pub fn skip_many(self) -> Parser<S, U, ()> {
        Parser::new(move |state: State<S, U>| {
            let mut current = state;
            let mut any_consumed = false;
            loop {
                match self.parse(current.clone()) {
                    Reply::Ok {
                        consumed: false, ..
                    } => panic!("{EMPTY_REPEAT_PANIC}"),
                    Reply::Ok {
                        state,
                        consumed: true,
                        ..
                    } => {
                        current = state;
                        any_consumed = true;
                    }
                    Reply::Err {
                        error,
                        consumed: false,
                    } => {
                        return Reply::Ok {
                            value: (),
                            state: current,
                            error,
                            consumed: any_consumed,
                        };
                    }
                    Reply::Err {
                        error,
                        consumed: true,
                    } => {
                        return Reply::Err {
                            error,
                            consumed: true,
                        };
                    }
                }
            }
        })
    }

    /// 値を捨てる 1 回以上の繰り返し。
    pub fn skip_many1(self) -> Parser<S, U, ()> {
        let rest = self.clone();
        self.and_then(move |_| rest.clone().skip_many())
    }

    /// セパレータ区切り（0 回以上）。
    pub fn sep_by<V>(self, sep: Parser<S, U, V>) -> Parser<S, U, Vec<T>>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.sep_by1(sep).or(ok(Vec::new()))
    }

    /// セパレータ区切り（1 回以上）。
    pub fn sep_by1<V>(self, sep: Parser<S, U, V>) -> Parser<S, U, Vec<T>>
    where
        V: Clone + Send + Sync + 'static,
    {
        let item = self.clone();
        self.and_then(move |first| {
            sep.clone().skip_l(item.clone()).many().map(move |mut tail| {
                let mut values = vec![first.clone()];
                values.append(&mut tail);
                values
            })
        })
    }

    /// 各要素の後ろに必ずセパレータが付く（0 回以上）。
    pub fn end_by<V>(self, sep: Parser<S, U, V>) -> Parser<S, U, Vec<T>>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.skip_r(sep).many()
    }

    /// 各要素の後ろに必ずセパレータが付く（1 回以上）。
    pub fn end_by1<V>(self, sep: Parser<S, U, V>) -> Parser<S, U, Vec<T>>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.skip_r(sep).many1()
    }

    /// セパレータ区切りで末尾のセパレータを許す（0 回以上）。
    pub fn sep_end_by<V>(self, sep: Parser<S, U, V>) -> Parser<S, U, Vec<T>>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.sep_end_by1(sep).or(ok(Vec::new()))
    }

    /// セパレータ区切りで末尾のセパレータを許す（1 回以上）。
    pub fn sep_end_by1<V>(self, sep: Parser<S, U, V>) -> Parser<S, U, Vec<T>>
    where
        V: Clone + Send + Sync + 'static,
    {
        Parser::new(move |state: State<S, U>| {
            let (first, mut current, mut any_consumed) = match self.parse(state) {
                Reply::Ok {
                    value,
                    state,
                    consumed,
                    ..
                } => (value, state, consumed),
                Reply::Err { error, consumed } => return Reply::Err { error, consumed },
            };
            let mut values = vec![first];
            loop {
                match sep.parse(current.clone()) {
                    Reply::Err {
                        error,
                        consumed: false,
                    } => {
                        return Reply::Ok {
                            value: values,
                            state: current,
                            error,
                            consumed: any_consumed,
                        };
                    }
                    Reply::Err {
                        error,
                        consumed: true,
                    } => {
                        return Reply::Err {
                            error,
                            consumed: true,
                        };
                    }
                    Reply::Ok {
                        state: after_sep,
                        consumed: sep_consumed,
                        ..
                    } => match self.parse(after_sep.clone()) {
                        Reply::Ok {
                            value,
                            state,
                            consumed,
                            ..
                        } => {
                            if !(sep_consumed || consumed) {
                                panic!("{EMPTY_REPEAT_PANIC}");
                            }
                            values.push(value);
                            current = state;
                            any_consumed = true;
                        }
                        Reply::Err {
                            error,
                            consumed: false,
                        } => {
                            // 末尾セパレータとして受理する
                            return Reply::Ok {
                                value: values,
                                state: after_sep,
                                error,
                                consumed: any_consumed || sep_consumed,
                            };
                        }
                        Reply::Err {
                            error,
                            consumed: true,
                        } => {
                            return Reply::Err {
                                error,
                                consumed: true,
                            };
                        }
                    },
                }
            }
        })
    }

    /// end が成功するまで本体を読み続ける。
    pub fn many_till<V>(self, end: Parser<S, U, V>) -> Parser<S, U, Vec<T>>
    where
        V: Clone + Send + Sync + 'static,
    {
        Parser::new(move |state: State<S, U>| {
            let mut values = Vec::new();
            let mut current = state;
            let mut any_consumed = false;
            loop {
                match end.parse(current.clone()) {
                    Reply::Ok {
                        state,
                        error,
                        consumed,
                        ..
                    } => {
                        return Reply::Ok {
                            value: values,
                            state,
                            error,
                            consumed: any_consumed || consumed,
                        };
                    }
                    Reply::Err {
                        error,
                        consumed: true,
                    } => {
                        return Reply::Err {
                            error,
                            consumed: true,
                        };
                    }
                    Reply::Err {
                        error: end_error,
                        consumed: false,
                    } => match self.parse(current.clone()) {
                        Reply::Ok {
                            value,
                            state,
                            consumed,
                            ..
                        } => {
                            if !consumed {
                                panic!("{EMPTY_REPEAT_PANIC}");
                            }
                            values.push(value);
                            current = state;
                            any_consumed = true;
                        }
                        Reply::Err {
                            error,
                            consumed: false,
                        } => {
                            return Reply::Err {
                                error: end_error.merge(error),
                                consumed: any_consumed,
                            };
                        }
                        Reply::Err {
                            error,
                            consumed: true,
                        } => {
                            return Reply::Err {
                                error,
                                consumed: true,
                            };
                        }
                    },
                }
            }
        })
    }

    /// ちょうど n 回の繰り返し。n が 0 なら入力を見ずに空リストで成功する。
    pub fn count(self, n: usize) -> Parser<S, U, Vec<T>> {
        Parser::new(move |state: State<S, U>| {
            let mut values = Vec::with_capacity(n);
            let mut current = state;
            let mut any_consumed = false;
            let mut residue = ParseError::empty(current.pos.clone());
            for _ in 0..n {
                match self.parse(current) {
                    Reply::Ok {
                        value,
                        state,
                        error,
                        consumed,
                    } => {
                        residue = if consumed { error } else { residue.merge(error) };
                        values.push(value);
                        any_consumed |= consumed;
                        current = state;
                    }
                    Reply::Err { error, consumed } => {
                        let error = if consumed { error } else { residue.merge(error) };
                        return Reply::Err {
                            error,
                            consumed: any_consumed || consumed,
                        };
                    }
                }
            }
            Reply::Ok {
                value: values,
                state: current,
                error: residue,
                consumed: any_consumed,
            }
        })
    }

    /// 左結合の演算子チェーン（1 項以上）。
    pub fn chainl1<F>(self, op: Parser<S, U, F>) -> Parser<S, U, T>
    where
        F: Fn(T, T) -> T + Clone + Send + Sync + 'static,
    {
        Parser::new(move |state: State<S, U>| {
            let (mut acc, mut current, mut any_consumed, mut residue) = match self.parse(state) {
                Reply::Ok {
                    value,
                    state,
                    error,
                    consumed,
                } => (value, state, consumed, error),
                Reply::Err { error, consumed } => return Reply::Err { error, consumed },
            };
            loop {
                let (combine, after_op, op_consumed) = match op.parse(current.clone()) {
                    Reply::Ok {
                        value,
                        state,
                        consumed,
                        ..
                    } => (value, state, consumed),
                    Reply::Err {
                        error,
                        consumed: false,
                    } => {
                        return Reply::Ok {
                            value: acc,
                            state: current,
                            error: residue.merge(error),
                            consumed: any_consumed,
                        };
                    }
                    Reply::Err {
                        error,
                        consumed: true,
                    } => {
                        return Reply::Err {
                            error,
                            consumed: true,
                        };
                    }
                };
                match self.parse(after_op) {
                    Reply::Ok {
                        value,
                        state,
                        error,
                        consumed,
                    } => {
                        if !(op_consumed || consumed) {
                            panic!("{EMPTY_REPEAT_PANIC}");
                        }
                        acc = combine(acc, value);
                        current = state;
                        any_consumed = true;
                        residue = error;
                    }
                    Reply::Err { error, consumed } => {
                        return Reply::Err {
                            error,
                            consumed: any_consumed || op_consumed || consumed,
                        };
                    }
                }
            }
        })
    }

    /// 左結合チェーン。1 項も無ければ既定値で成功する。
    pub fn chainl<F>(self, op: Parser<S, U, F>, default: T) -> Parser<S, U, T>
    where
        F: Fn(T, T) -> T + Clone + Send + Sync + 'static,
    {
        self.chainl1(op).or(ok(default))
    }

    /// 右結合の演算子チェーン（1 項以上）。項と演算子を集めてから
    /// 右畳み込みする。
    pub fn chainr1<F>(self, op: Parser<S, U, F>) -> Parser<S, U, T>
    where
        F: Fn(T, T) -> T + Clone + Send + Sync + 'static,
    {
        Parser::new(move |state: State<S, U>| {
            let (first, mut current, mut any_consumed, mut residue) = match self.parse(state) {
                Reply::Ok {
                    value,
                    state,
                    error,
                    consumed,
                } => (value, state, consumed, error),
                Reply::Err { error, consumed } => return Reply::Err { error, consumed },
            };
            let mut operands = vec![first];
            let mut operators: Vec<F> = Vec::new();
            loop {
                let (combine, after_op, op_consumed) = match op.parse(current.clone()) {
                    Reply::Ok {
                        value,
                        state,
                        consumed,
                        ..
                    } => (value, state, consumed),
                    Reply::Err {
                        error,
                        consumed: false,
                    } => {
                        residue = residue.merge(error);
                        break;
                    }
                    Reply::Err {
                        error,
                        consumed: true,
                    } => {
                        return Reply::Err {
                            error,
                            consumed: true,
                        };
                    }
                };
                match self.parse(after_op) {
                    Reply::Ok {
                        value,
                        state,
                        error,
                        consumed,
                    } => {
                        if !(op_consumed || consumed) {
                            panic!("{EMPTY_REPEAT_PANIC}");
                        }
                        operators.push(combine);
                        operands.push(value);
                        current = state;
                        any_consumed = true;
                        residue = error;
                    }
                    Reply::Err { error, consumed } => {
                        return Reply::Err {
                            error,
                            consumed: any_consumed || op_consumed || consumed,
                        };
                    }
                }
            }
            let mut result = operands
                .pop()
                .expect("chainr1 で operands が空になることはありません");
            while let Some(lhs) = operands.pop() {
                if let Some(combine) = operators.pop() {
                    result = combine(lhs, result);
                }
            }
            Reply::Ok {
                value: result,
                state: current,
                error: residue,
                consumed: any_consumed,
            }
        })
    }

    /// 右結合チェーン。1 項も無ければ既定値で成功する。
    pub fn chainr<F>(self, op: Parser<S, U, F>, default: T) -> Parser<S, U, T>
    where
        F: Fn(T, T) -> T + Clone + Send + Sync + 'static,
    {
        self.chainr1(op).or(ok(default))
    }

}
