use crate::error::{ErrorText, Message, ParseError};
use crate::parser::Parser;
use crate::pos::SourcePos;
use crate::reply::Reply;
use crate::state::State;
use crate::stream::{Stream, Token};
use std::fmt;
use std::sync::Arc;

/// token の user-fn。位置・トークン・残り入力から新しい利用者状態を導く。
pub type UserUpdate<S, U> =
    Arc<dyn Fn(&SourcePos, &<S as Stream>::Item, &S, U) -> U + Send + Sync>;

/// 入力を消費せずに成功するパーサー。
pub fn ok<S, U, T>(value: T) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    Parser::new(move |state: State<S, U>| {
        let error = ParseError::empty(state.pos.clone());
        Reply::Ok {
            value: value.clone(),
            state,
            error,
            consumed: false,
        }
    })
}

/// 入力を消費せずに失敗するパーサー（自由形式メッセージ）。
pub fn fail<S, U, T>(message: impl Into<String>) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    let message = message.into();
    Parser::new(move |state: State<S, U>| Reply::Err {
        error: ParseError::plain(state.pos.clone(), message.clone()),
        consumed: false,
    })
}

/// 入力を消費せずに unexpected として失敗するパーサー。
pub fn unexpected<S, U, T>(message: impl Into<String>) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    let message = message.into();
    Parser::new(move |state: State<S, U>| Reply::Err {
        error: ParseError::unexpect(state.pos.clone(), message.clone()),
        consumed: false,
    })
}

/// 入力を消費する唯一の基本パーサー。述語を満たす先頭トークンを
/// 1 つ読み、`Token` 実装の既定の位置更新と表示を使う。
pub fn token<S, U, P>(pred: P) -> Parser<S, U, S::Item>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    P: Fn(&S::Item) -> bool + Send + Sync + 'static,
{
    token_prim(
        pred,
        |pos: &SourcePos, item: &S::Item, _rest: &S| item.advance_pos(pos),
        |item: &S::Item| item.render(),
    )
}

/// 位置更新と表示を指定する token。
pub fn token_prim<S, U, P, N, R>(pred: P, next_pos: N, show: R) -> Parser<S, U, S::Item>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    P: Fn(&S::Item) -> bool + Send + Sync + 'static,
    N: Fn(&SourcePos, &S::Item, &S) -> SourcePos + Send + Sync + 'static,
    R: Fn(&S::Item) -> String + Send + Sync + 'static,
{
    token_prim_user(pred, next_pos, show, None)
}

/// 利用者状態の更新まで指定する完全版の token。
///
/// 入力終端では空の SysUnexpect、不一致では遅延レンダリングされる
/// SysUnexpect を空失敗で返す。一致すれば新しい位置・状態とともに
/// consumed-ok を返し、成功側の残余エラーは新しい位置の空エラーになる。
pub fn token_prim_user<S, U, P, N, R>(
    pred: P,
    next_pos: N,
    show: R,
    user_update: Option<UserUpdate<S, U>>,
) -> Parser<S, U, S::Item>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    P: Fn(&S::Item) -> bool + Send + Sync + 'static,
    N: Fn(&SourcePos, &S::Item, &S) -> SourcePos + Send + Sync + 'static,
    R: Fn(&S::Item) -> String + Send + Sync + 'static,
{
    let show = Arc::new(show);
    Parser::new(move |state: State<S, U>| {
        let State { input, pos, user } = state;
        match input.uncons() {
            None => Reply::Err {
                error: ParseError::sys_unexpect(pos, ErrorText::ready("")),
                consumed: false,
            },
            Some((item, rest)) => {
                if pred(&item) {
                    let next = next_pos(&pos, &item, &rest);
                    let user = match user_update.as_ref() {
                        Some(update) => update(&pos, &item, &rest, user),
                        None => user,
                    };
                    let error = ParseError::empty(next.clone());
                    Reply::Ok {
                        value: item,
                        state: State::new(rest, next, user),
                        error,
                        consumed: true,
                    }
                } else {
                    let show = Arc::clone(&show);
                    Reply::Err {
                        error: ParseError::sys_unexpect(pos, ErrorText::lazy(move || show(&item))),
                        consumed: false,
                    }
                }
            }
        }
    })
}

/// 任意のトークンを 1 つ読む。
pub fn any_token<S, U>() -> Parser<S, U, S::Item>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
{
    token(|_: &S::Item| true)
}

/// 入力終端でのみ成功する。
pub fn eof<S, U>() -> Parser<S, U, ()>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
{
    Parser::new(|state: State<S, U>| match state.input.uncons() {
        Some((item, _)) => {
            let error =
                ParseError::unexpect(state.pos.clone(), ErrorText::lazy(move || item.render()))
                    .with_message(Message::Expect(ErrorText::ready("end of input")));
            Reply::Err {
                error,
                consumed: false,
            }
        }
        None => {
            let error = ParseError::empty(state.pos.clone());
            Reply::Ok {
                value: (),
                state,
                error,
                consumed: false,
            }
        }
    })
}

/// 選択肢の列を左から順に試す。空の列はプログラミングエラー。
pub fn choice<S, U, T>(parsers: Vec<Parser<S, U, T>>) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    parsers
        .into_iter()
        .reduce(|acc, parser| acc.or(parser))
        .expect("choice に選択肢がありません")
}

/// パーサーの列を順に適用し、値をまとめて返す。
pub fn sequence<S, U, T>(parsers: Vec<Parser<S, U, T>>) -> Parser<S, U, Vec<T>>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    Parser::new(move |state: State<S, U>| {
        let mut values = Vec::with_capacity(parsers.len());
        let mut current = state;
        let mut any_consumed = false;
        let mut residue = ParseError::empty(current.pos.clone());
        for parser in &parsers {
            match parser.parse(current) {
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

/// 失敗時の期待集合をラベルで差し替える。入力を消費した失敗には
/// 触れず、低レベルのエラーをそのまま残す。
pub fn label<S, U, T>(name: impl Into<String>, parser: Parser<S, U, T>) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    let name = name.into();
    Parser::new(move |state| match parser.parse(state) {
        Reply::Ok {
            value,
            state,
            error,
            consumed: false,
        } if !error.is_empty() => Reply::Ok {
            value,
            state,
            error: error.relabel(name.clone()),
            consumed: false,
        },
        Reply::Err {
            error,
            consumed: false,
        } => Reply::Err {
            error: error.relabel(name.clone()),
            consumed: false,
        },
        reply => reply,
    })
}

/// 先読み。
pub fn lookahead<S, U, T>(parser: Parser<S, U, T>) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    parser.lookahead()
}

/// 否定先読み。
pub fn not_followed_by<S, U, T>(parser: Parser<S, U, T>) -> Parser<S, U, ()>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    parser.not_followed_by()
}

/// 2 つのパーサーの間に挟まれた部分を返す。
pub fn between<S, U, A, B, C>(
    open: Parser<S, U, A>,
    parser: Parser<S, U, B>,
    close: Parser<S, U, C>,
) -> Parser<S, U, B>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    open.skip_l(parser).skip_r(close)
}

/// 前置パーサーを読み捨てる。
pub fn preceded<S, U, A, B>(pre: Parser<S, U, A>, parser: Parser<S, U, B>) -> Parser<S, U, B>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    pre.skip_l(parser)
}

/// 後置パーサーを読み捨てる。
pub fn terminated<S, U, A, B>(parser: Parser<S, U, A>, post: Parser<S, U, B>) -> Parser<S, U, A>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    parser.skip_r(post)
}

/// 左結合チェーン。
pub fn chainl1<S, U, T, F>(term: Parser<S, U, T>, op: Parser<S, U, F>) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(T, T) -> T + Clone + Send + Sync + 'static,
{
    term.chainl1(op)
}

/// 右結合チェーン。
pub fn chainr1<S, U, T, F>(term: Parser<S, U, T>, op: Parser<S, U, F>) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(T, T) -> T + Clone + Send + Sync + 'static,
{
    term.chainr1(op)
}

/// 現在位置を返す。
pub fn position<S, U>() -> Parser<S, U, SourcePos>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
{
    Parser::new(|state: State<S, U>| {
        let pos = state.pos.clone();
        let error = ParseError::empty(pos.clone());
        Reply::Ok {
            value: pos,
            state,
            error,
            consumed: false,
        }
    })
}

/// 利用者状態を読む。
pub fn user_state<S, U>() -> Parser<S, U, U>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
{
    Parser::new(|state: State<S, U>| {
        let error = ParseError::empty(state.pos.clone());
        let value = state.user.clone();
        Reply::Ok {
            value,
            state,
            error,
            consumed: false,
        }
    })
}

/// 利用者状態を置き換える。
pub fn set_user_state<S, U>(user: U) -> Parser<S, U, ()>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
{
    update_user_state(move |_| user.clone())
}

/// 利用者状態を関数で更新する。
pub fn update_user_state<S, U, F>(f: F) -> Parser<S, U, ()>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    F: Fn(U) -> U + Send + Sync + 'static,
{
    Parser::new(move |state: State<S, U>| {
        let State { input, pos, user } = state;
        let error = ParseError::empty(pos.clone());
        Reply::Ok {
            value: (),
            state: State::new(input, pos, f(user)),
            error,
            consumed: false,
        }
    })
}
