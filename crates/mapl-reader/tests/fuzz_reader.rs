use proptest::prelude::*;
use mapl_reader::{read, read_many};

proptest! {
    #[test]
    fn reader_never_panics(input in "\\PC*") {
        // Any arbitrary string should produce Ok or Err, never panic
        let _ = read(&input);
    }

    #[test]
    fn reader_many_never_panics(input in "\\PC*") {
        let _ = read_many(&input);
    }
}

fn mapl_atom() -> impl Strategy<Value = String> {
    prop_oneof![
        // Naturals (kept small: the literal encoding is quadratic)
        (0u64..30).prop_map(|n| n.to_string()),
        // Symbols
        "[a-z][a-z0-9?!-]{0,8}",
    ]
}

fn mapl_expr(depth: u32) -> impl Strategy<Value = String> {
    if depth == 0 {
        mapl_atom().boxed()
    } else {
        prop_oneof![
            // Atom
            mapl_atom(),
            // Application: (expr ...)
            prop::collection::vec(mapl_expr(depth - 1), 0..4)
                .prop_map(|items| format!("({})", items.join(" "))),
            // Sequence: [expr ...]
            prop::collection::vec(mapl_expr(depth - 1), 0..4)
                .prop_map(|items| format!("[{}]", items.join(" "))),
            // Map literal: an even number of forms
            prop::collection::vec(mapl_expr(depth - 1), 0..3)
                .prop_map(|pairs| {
                    let body: Vec<String> = pairs
                        .iter()
                        .map(|e| format!("{e} {e}"))
                        .collect();
                    format!("{{{}}}", body.join(" "))
                }),
            // Function literal: {(params) -> body...}
            (
                prop::collection::vec("[a-z][a-z0-9]{0,4}", 0..3),
                prop::collection::vec(mapl_expr(depth - 1), 1..3),
            )
                .prop_map(|(params, body)| {
                    format!("{{({}) -> {}}}", params.join(" "), body.join(" "))
                }),
        ]
        .boxed()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn valid_mapl_parses_ok(expr in mapl_expr(3)) {
        // Generated well-formed mapl should parse without error
        read(&expr).unwrap_or_else(|e| {
            panic!("Failed to parse generated expr: {expr:?}\nError: {e}")
        });
    }

    #[test]
    fn multiple_exprs_parse(exprs in prop::collection::vec(mapl_expr(2), 1..5)) {
        let input = exprs.join(" ");
        let result = read_many(&input).unwrap_or_else(|e| {
            panic!("Failed to parse: {input:?}\nError: {e}")
        });
        assert!(!result.is_empty(), "should parse at least one expr from: {input:?}");
    }
}
