use crate::error::{ErrorText, Message, ParseError};
use crate::parser::Parser;
use crate::reply::Reply;
use crate::run_config::RunConfig;
use crate::state::State;
use crate::stream::{Stream, Token};

/// パーサーを実行する。初期状態を設定から組み立て、最終的な Reply を
/// そのまま返す。終端文脈は恒等写像で、consumed ビットは呼び出し側に
/// 見える（部分消費後の失敗かどうかの判定に使える）。
pub fn run<S, U, T, I>(parser: &Parser<S, U, T>, input: I, cfg: &RunConfig) -> Reply<S, U, T>
where
    S: Stream,
    U: Clone + Default + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    I: Into<S>,
{
    run_with_user(parser, input, cfg, U::default())
}

/// 利用者状態の初期値を与えて実行する。
pub fn run_with_user<S, U, T, I>(
    parser: &Parser<S, U, T>,
    input: I,
    cfg: &RunConfig,
    user: U,
) -> Reply<S, U, T>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    I: Into<S>,
{
    let state = State::new(input.into(), cfg.initial_pos(), user);
    let reply = parser.parse(state);
    if cfg.require_eof {
        if let Reply::Ok {
            state, consumed, ..
        } = &reply
        {
            if let Some((item, _)) = state.input.uncons() {
                let error = ParseError::unexpect(
                    state.pos.clone(),
                    ErrorText::lazy(move || item.render()),
                )
                .with_message(Message::Expect(ErrorText::ready("end of input")));
                return Reply::Err {
                    error,
                    consumed: *consumed,
                };
            }
        }
    }
    reply
}
