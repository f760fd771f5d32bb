use std::sync::Arc;
use tsumugi::{
    any_token, between, eof, run, run_with_user, token, token_prim_user, Reply, RunConfig,
    SliceStream, SourcePos, Token, UserUpdate,
};

/// 字句解析済みトークン列を入力にする例。
#[derive(Clone, Debug, PartialEq, Eq)]
enum Tok {
    Ident(&'static str),
    Num(i64),
    Comma,
    LParen,
    RParen,
}

impl Token for Tok {
    fn render(&self) -> String {
        match self {
            Tok::Ident(name) => format!("identifier {name}"),
            Tok::Num(value) => format!("number {value}"),
            Tok::Comma => "\",\"".to_string(),
            Tok::LParen => "\"(\"".to_string(),
            Tok::RParen => "\")\"".to_string(),
        }
    }
}

fn ident() -> tsumugi::Parser<SliceStream<Tok>, (), Tok> {
    token(|tok: &Tok| matches!(tok, Tok::Ident(_)))
}

fn punct(expected: Tok) -> tsumugi::Parser<SliceStream<Tok>, (), Tok> {
    token(move |tok: &Tok| *tok == expected)
}

#[test]
fn token_streams_parse_like_char_streams() {
    let args = between(
        punct(Tok::LParen),
        ident().sep_by(punct(Tok::Comma)),
        punct(Tok::RParen),
    )
    .skip_r(eof());
    let input = vec![
        Tok::LParen,
        Tok::Ident("x"),
        Tok::Comma,
        Tok::Ident("y"),
        Tok::RParen,
    ];
    let reply = run(&args, input, &RunConfig::default());
    assert_eq!(
        reply.into_value(),
        Some(vec![Tok::Ident("x"), Tok::Ident("y")])
    );
}

#[test]
fn mismatch_renders_with_the_token_renderer() {
    let reply = run(
        &punct(Tok::Comma),
        vec![Tok::Num(7)],
        &RunConfig::default(),
    );
    let rendered = reply.error().expect("不一致のはず").to_string();
    assert!(rendered.contains("unexpected number 7"), "{rendered}");
}

#[test]
fn non_char_tokens_leave_position_unchanged_by_default() {
    let parser = any_token::<SliceStream<Tok>, ()>().many1();
    let reply = run(
        &parser,
        vec![Tok::Ident("x"), Tok::Comma],
        &RunConfig::default(),
    );
    match reply {
        Reply::Ok { state, .. } => {
            assert_eq!((state.pos.line, state.pos.column), (1, 1));
        }
        Reply::Err { error, .. } => panic!("成功するはず: {error}"),
    }
}

#[test]
fn token_prim_user_updates_user_state() {
    // 読んだトークン数を利用者状態に数える。
    let update: UserUpdate<SliceStream<Tok>, usize> =
        Arc::new(|_pos: &SourcePos, _tok: &Tok, _rest: &SliceStream<Tok>, n: usize| n + 1);
    let counting = token_prim_user(
        |_: &Tok| true,
        |pos: &SourcePos, tok: &Tok, _rest: &SliceStream<Tok>| tok.advance_pos(pos),
        |tok: &Tok| tok.render(),
        Some(update),
    )
    .many1()
    .skip_l(tsumugi::user_state());
    let reply = run_with_user(
        &counting,
        vec![Tok::Ident("x"), Tok::Comma, Tok::Ident("y")],
        &RunConfig::default(),
        0usize,
    );
    assert_eq!(reply.into_value(), Some(3));
}
