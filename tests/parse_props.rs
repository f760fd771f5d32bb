use proptest::prelude::*;
use tsumugi::char::{any_char, digit, letter, string};
use tsumugi::{run, CharStream, Reply, RunConfig};

fn small_input() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![Just('a'), Just('b'), Just('c'), Just('1'), Just('2')],
        0..8,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    #[test]
    fn parsing_is_deterministic(input in small_input()) {
        let parser = letter::<CharStream, ()>().or(digit()).many();
        let first = run(&parser, input.as_str(), &RunConfig::default());
        let second = run(&parser, input.as_str(), &RunConfig::default());
        prop_assert_eq!(first.is_ok(), second.is_ok());
        prop_assert_eq!(first.consumed(), second.consumed());
        prop_assert_eq!(
            first.error().map(ToString::to_string),
            second.error().map(ToString::to_string)
        );
        prop_assert_eq!(first.into_value(), second.into_value());
    }

    #[test]
    fn choice_equals_second_branch_after_empty_failure(input in small_input()) {
        let left = string::<CharStream, ()>("ab");
        let right = string::<CharStream, ()>("ba");
        let left_reply = run(&left, input.as_str(), &RunConfig::default());
        prop_assume!(left_reply.is_err() && !left_reply.consumed());

        let choice_reply = run(&left.or(right.clone()), input.as_str(), &RunConfig::default());
        let right_reply = run(&right, input.as_str(), &RunConfig::default());
        prop_assert_eq!(choice_reply.is_ok(), right_reply.is_ok());
        prop_assert_eq!(choice_reply.consumed(), right_reply.consumed());
        prop_assert_eq!(choice_reply.into_value(), right_reply.into_value());
    }

    #[test]
    fn attempt_only_clears_the_consumed_bit_on_failure(input in small_input()) {
        let plain = run(
            &string::<CharStream, ()>("abc"),
            input.as_str(),
            &RunConfig::default(),
        );
        let wrapped = run(
            &string::<CharStream, ()>("abc").attempt(),
            input.as_str(),
            &RunConfig::default(),
        );
        if plain.is_err() {
            prop_assert!(wrapped.is_err());
            prop_assert!(!wrapped.consumed(), "attempt 後の失敗は常に空失敗");
            prop_assert_eq!(
                plain.error().map(ToString::to_string),
                wrapped.error().map(ToString::to_string),
                "エラー値そのものは変わらない"
            );
        } else {
            prop_assert_eq!(plain.consumed(), wrapped.consumed());
            prop_assert_eq!(plain.into_value(), wrapped.into_value());
        }
    }

    #[test]
    fn consumed_success_strictly_advances_position(input in small_input()) {
        prop_assume!(!input.is_empty());
        let reply = run(
            &any_char::<CharStream, ()>(),
            input.as_str(),
            &RunConfig::default(),
        );
        match reply {
            Reply::Ok { state, consumed, .. } => {
                prop_assert!(consumed, "空でない入力では必ず消費する");
                prop_assert!(state.pos > RunConfig::default().initial_pos());
            }
            Reply::Err { error, .. } => panic!("any_char は空でない入力で成功するはず: {error}"),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        max_global_rejects: 8192,
        ..ProptestConfig::default()
    })]

    #[test]
    fn choice_equals_first_branch_after_consumed_failure(input in small_input()) {
        let left = string::<CharStream, ()>("ab");
        let right = string::<CharStream, ()>("ba");
        let left_reply = run(&left, input.as_str(), &RunConfig::default());
        prop_assume!(left_reply.is_err() && left_reply.consumed());

        let choice_reply = run(&left.or(right), input.as_str(), &RunConfig::default());
        prop_assert!(choice_reply.is_err());
        prop_assert!(choice_reply.consumed());
        prop_assert_eq!(
            choice_reply.error().map(ToString::to_string),
            left_reply.error().map(ToString::to_string)
        );
    }
}
