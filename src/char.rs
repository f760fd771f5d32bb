//! 文字入力向けのパーサー群。`Stream<Item = char>` であればどの入力でも
//! 使えるが、`regexp` だけは残り入力をスライスとして参照できる
//! `CharStream` 専用になっている。

use crate::combinator::{label, token};
use crate::error::{ErrorText, Message, ParseError};
use crate::parser::Parser;
use crate::reply::Reply;
use crate::state::State;
use crate::stream::{CharStream, Stream, Token};
use regex::Regex;

/// エラーメッセージ用の文字表示。制御文字はエスケープする。
fn show_char(ch: char) -> String {
    format!("\"{}\"", ch.escape_default())
}

/// 述語を満たす文字を 1 つ読む。
pub fn satisfy<S, U, P>(pred: P) -> Parser<S, U, char>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
    P: Fn(char) -> bool + Send + Sync + 'static,
{
    token(move |ch: &char| pred(*ch))
}

/// 指定した文字そのもの。
pub fn chr<S, U>(expected: char) -> Parser<S, U, char>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    label(show_char(expected), satisfy(move |ch| ch == expected))
}

/// 集合に含まれる文字のいずれか。
pub fn one_of<S, U>(set: &str) -> Parser<S, U, char>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    let owned = set.to_string();
    label(
        format!("(one-of \"{set}\")"),
        satisfy(move |ch| owned.contains(ch)),
    )
}

/// 集合に含まれない文字。
pub fn none_of<S, U>(set: &str) -> Parser<S, U, char>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    let owned = set.to_string();
    label(
        format!("(none-of \"{set}\")"),
        satisfy(move |ch| !owned.contains(ch)),
    )
}

/// 文字列をそのまま照合する。途中で不一致になった場合は、そこまでの
/// 消費を保持した失敗になる（予測型選択では代替に回らない）。
pub fn string<S, U>(expected: &str) -> Parser<S, U, String>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    let expected = expected.to_string();
    Parser::new(move |state: State<S, U>| {
        let State {
            mut input,
            mut pos,
            user,
        } = state;
        let mut consumed = false;
        let expect_text = |want: char| {
            format!("\"{}\" in (string \"{}\")", want.escape_default(), expected)
        };
        for want in expected.chars() {
            match input.uncons() {
                None => {
                    let error = ParseError::sys_unexpect(pos, ErrorText::ready(""))
                        .with_message(Message::Expect(ErrorText::ready(expect_text(want))));
                    return Reply::Err { error, consumed };
                }
                Some((got, rest)) => {
                    if got == want {
                        pos = got.advance_pos(&pos);
                        input = rest;
                        consumed = true;
                    } else {
                        let error = ParseError::sys_unexpect(
                            pos,
                            ErrorText::lazy(move || show_char(got)),
                        )
                        .with_message(Message::Expect(ErrorText::ready(expect_text(want))));
                        return Reply::Err { error, consumed };
                    }
                }
            }
        }
        let error = ParseError::empty(pos.clone());
        Reply::Ok {
            value: expected.clone(),
            state: State::new(input, pos, user),
            error,
            consumed,
        }
    })
}

/// アルファベット 1 文字。
pub fn letter<S, U>() -> Parser<S, U, char>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    label("letter", satisfy(|ch| ch.is_alphabetic()))
}

/// 十進数字 1 文字。
pub fn digit<S, U>() -> Parser<S, U, char>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    label("digit", satisfy(|ch| ch.is_ascii_digit()))
}

/// 英数字 1 文字。
pub fn alpha_num<S, U>() -> Parser<S, U, char>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    label("letter or digit", satisfy(|ch| ch.is_alphanumeric()))
}

/// 十六進数字 1 文字。
pub fn hex_digit<S, U>() -> Parser<S, U, char>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    label("hexadecimal digit", satisfy(|ch| ch.is_ascii_hexdigit()))
}

/// 八進数字 1 文字。
pub fn oct_digit<S, U>() -> Parser<S, U, char>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    label("octal digit", satisfy(|ch| ('0'..='7').contains(&ch)))
}

/// 大文字 1 文字。
pub fn upper<S, U>() -> Parser<S, U, char>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    label("uppercase letter", satisfy(|ch| ch.is_uppercase()))
}

/// 小文字 1 文字。
pub fn lower<S, U>() -> Parser<S, U, char>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    label("lowercase letter", satisfy(|ch| ch.is_lowercase()))
}

/// 空白 1 文字。
pub fn space<S, U>() -> Parser<S, U, char>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    label("whitespace", satisfy(|ch| ch.is_whitespace()))
}

/// 連続する空白を読み捨てる。
pub fn spaces<S, U>() -> Parser<S, U, ()>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    label("whitespace", space().skip_many())
}

/// タブ 1 文字。
pub fn tab<S, U>() -> Parser<S, U, char>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    label("tab", chr('\t'))
}

/// 行末。LF と CRLF を受理し、どちらも '\n' を返す。
pub fn newline<S, U>() -> Parser<S, U, char>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    chr('\n').or(chr('\r').skip_l(chr('\n')))
}

/// 任意の文字。
pub fn any_char<S, U>() -> Parser<S, U, char>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    satisfy(|_| true)
}

/// 現在位置に固定した正規表現照合。一致した部分文字列を返す。
/// パターン不正はパースエラーではなく構築時の panic。
pub fn regexp<U>(pattern: &str) -> Parser<CharStream, U, String>
where
    U: Clone + Send + Sync + 'static,
{
    let re = Regex::new(&format!("^(?:{pattern})"))
        .unwrap_or_else(|err| panic!("regexp のパターンが不正です: {err}"));
    let name = format!("(match \"{pattern}\")");
    Parser::new(move |state: State<CharStream, U>| {
        let State { input, pos, user } = state;
        match re.find(input.remaining()) {
            Some(found) => {
                let text = found.as_str().to_string();
                let mut next = pos;
                for ch in text.chars() {
                    next = ch.advance_pos(&next);
                }
                let rest = input.advance(text.len());
                let consumed = !text.is_empty();
                let error = ParseError::empty(next.clone());
                Reply::Ok {
                    value: text,
                    state: State::new(rest, next, user),
                    error,
                    consumed,
                }
            }
            None => {
                let error = match input.remaining().chars().next() {
                    Some(ch) => ParseError::sys_unexpect(
                        pos,
                        ErrorText::lazy(move || show_char(ch)),
                    ),
                    None => ParseError::sys_unexpect(pos, ErrorText::ready("")),
                }
                .with_message(Message::Expect(ErrorText::ready(name.clone())));
                Reply::Err {
                    error,
                    consumed: false,
                }
            }
        }
    })
}

/// 文字のリストを文字列へまとめる。
pub fn collect_str<S, U>(parser: Parser<S, U, Vec<char>>) -> Parser<S, U, String>
where
    S: Stream<Item = char>,
    U: Clone + Send + Sync + 'static,
{
    parser.map(|chars| chars.into_iter().collect())
}
