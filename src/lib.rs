//! tsumugi — 予測型（LL(1)）パーサーコンビネーターライブラリ。
//!
//! パーサーは `State`（残り入力・位置・利用者状態）を受け取り、
//! consumed-ok / consumed-err / empty-ok / empty-err の四通りを
//! `Reply` のタグと consumed ビットで返す第一級の値。選択 `or` は
//! 左枝が入力を消費せずに失敗したときだけ右枝を試し、無制限の
//! 先読みは `attempt` で明示的に選ぶ。エラーは位置付きの構造化された
//! 値として運搬・統合され、決定的な形式でレンダリングされる。
//!
//! ```
//! use tsumugi::char::{digit, chr};
//! use tsumugi::{run, CharStream, RunConfig};
//!
//! let pair = digit::<CharStream, ()>().skip_r(chr(',')).then(digit());
//! let reply = run(&pair, "1,2", &RunConfig::default());
//! assert_eq!(reply.into_value(), Some(('1', '2')));
//! ```

pub mod char;
pub mod combinator;
pub mod error;
pub mod parser;
pub mod pos;
pub mod reply;
pub mod run_config;
pub mod runner;
pub mod state;
pub mod stream;

pub use combinator::{
    any_token, between, chainl1, chainr1, choice, eof, fail, label, lookahead, not_followed_by,
    ok, position, preceded, sequence, set_user_state, terminated, token, token_prim,
    token_prim_user, unexpected, update_user_state, user_state, UserUpdate,
};
pub use error::{ErrorText, Message, ParseError};
pub use parser::Parser;
pub use pos::{SourcePos, DEFAULT_TAB_WIDTH};
pub use reply::Reply;
pub use run_config::RunConfig;
pub use runner::{run, run_with_user};
pub use state::State;
pub use stream::{CharStream, SliceStream, Stream, Token};
