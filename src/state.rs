use crate::pos::SourcePos;

/// パーサーから見た世界。残りの入力・現在位置・利用者状態の不変な三つ組。
///
/// トークンを消費するたび、また利用者状態を更新するたびに新しい State が
/// 作られる。共有はクローンで行い、場所を書き換えることはない。
#[derive(Clone, Debug)]
pub struct State<S, U> {
    pub input: S,
    pub pos: SourcePos,
    pub user: U,
}

impl<S, U> State<S, U> {
    pub fn new(input: S, pos: SourcePos, user: U) -> Self {
        Self { input, pos, user }
    }
}
