use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tsumugi::{ErrorText, Message, ParseError, SourcePos};

fn at(line: usize, column: usize) -> SourcePos {
    SourcePos {
        line,
        column,
        ..SourcePos::default()
    }
}

#[test]
fn merge_keeps_the_error_that_progressed_further() {
    let near = ParseError::expect(at(1, 2), "near");
    let far = ParseError::expect(at(1, 5), "far");
    let merged = near.clone().merge(far.clone());
    assert_eq!(merged.pos, at(1, 5));
    assert_eq!(merged, near.merge(far));
}

#[test]
fn merge_unions_messages_at_equal_positions() {
    let left = ParseError::expect(at(2, 3), "alpha");
    let right = ParseError::expect(at(2, 3), "beta").with_message(Message::Expect("alpha".into()));
    let merged = left.merge(right);
    let expects: Vec<&str> = merged
        .messages()
        .iter()
        .filter_map(|message| match message {
            Message::Expect(text) => Some(text.resolve()),
            _ => None,
        })
        .collect();
    assert_eq!(expects, vec!["alpha", "beta"], "重複は一度だけ残る");
}

#[test]
fn merge_with_empty_returns_the_other_side() {
    let empty = ParseError::empty(at(9, 9));
    let real = ParseError::plain(at(1, 1), "boom");
    assert_eq!(empty.clone().merge(real.clone()), real.clone());
    assert_eq!(real.clone().merge(empty), real);
}

#[test]
fn relabel_replaces_only_the_expect_set() {
    let error = ParseError::sys_unexpect(at(1, 1), ErrorText::ready("\"x\""))
        .with_message(Message::Expect("old-a".into()))
        .with_message(Message::Expect("old-b".into()))
        .with_message(Message::Plain("note".into()));
    let relabeled = error.relabel("fresh");
    insta::assert_snapshot!(relabeled.to_string(), @r###"
    at line 1, column 1:
    unexpected "x"
    expecting fresh
    note
    "###);
}

#[test]
fn relabel_with_empty_text_just_drops_expects() {
    let error = ParseError::sys_unexpect(at(1, 1), ErrorText::ready("\"x\""))
        .with_message(Message::Expect("old".into()));
    let relabeled = error.relabel("");
    assert!(relabeled
        .messages()
        .iter()
        .all(|message| !matches!(message, Message::Expect(_))));
}

#[test]
fn rendering_sorts_and_dedupes_expects() {
    let error = ParseError::sys_unexpect(at(1, 1), ErrorText::ready("\"z\""))
        .with_message(Message::Expect("beta".into()))
        .with_message(Message::Expect("alpha".into()))
        .with_message(Message::Expect("beta".into()));
    insta::assert_snapshot!(error.to_string(), @r###"
    at line 1, column 1:
    unexpected "z"
    expecting alpha or beta
    "###);
}

#[test]
fn user_unexpect_wins_over_sys_unexpect() {
    let error = ParseError::sys_unexpect(at(1, 1), ErrorText::ready("\"x\""))
        .with_message(Message::Unexpect("the keyword".into()));
    assert!(error.to_string().contains("unexpected the keyword"));
}

#[test]
fn empty_error_renders_as_unknown() {
    insta::assert_snapshot!(ParseError::empty(at(3, 7)).to_string(), @r###"
    at line 3, column 7:
    unknown parse error
    "###);
}

#[test]
fn lazy_text_is_evaluated_at_most_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let text = ErrorText::lazy(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        "rendered".to_string()
    });
    assert_eq!(calls.load(Ordering::SeqCst), 0, "構築時点では未評価");
    assert_eq!(text.resolve(), "rendered");
    assert_eq!(text.resolve(), "rendered");
    assert_eq!(calls.load(Ordering::SeqCst), 1, "二度目以降は再評価しない");
}

#[test]
fn to_json_exposes_structured_fields() {
    let error = ParseError::sys_unexpect(at(1, 4), ErrorText::ready("\"x\""))
        .with_message(Message::Expect("digit".into()));
    let json = error.to_json();
    assert_eq!(
        json.pointer("/position/line").and_then(|v| v.as_u64()),
        Some(1)
    );
    assert_eq!(
        json.pointer("/position/column").and_then(|v| v.as_u64()),
        Some(4)
    );
    assert_eq!(
        json.pointer("/expected/0").and_then(|v| v.as_str()),
        Some("digit")
    );
    assert_eq!(
        json.pointer("/unexpected").and_then(|v| v.as_str()),
        Some("\"x\"")
    );
}
