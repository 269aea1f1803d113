/// The bootstrap program replayed into every fresh root environment, right
/// after the primitives are installed and before any user code runs.
pub const PRELUDE: &str = r#"
; canonical booleans
(def true {{}: {}})
(def false {})

; boolean negation: only the empty map negates to true
(def (not b) (= b {}))

; successor of a canonical natural
(def (inc n) (add n {n: {}}))

; positional access into an indexed sequence
(def (first s) (s 0))
(def (second s) (s 1))

; two-way branch: c picks one of two deferred zero-argument bodies
; (pick (= x {}) {() -> when-empty} {() -> otherwise})
(def (pick c a b)
  (({true: a, false: b} c)))
"#;

#[cfg(test)]
mod tests {
    use crate::eval::Interpreter;
    use mapl_core::Value;

    #[test]
    fn prelude_parses() {
        let forms = mapl_reader::read_many(super::PRELUDE).unwrap();
        assert!(!forms.is_empty());
    }

    #[test]
    fn booleans_match_the_equality_primitive() {
        let interp = Interpreter::new();
        assert!(interp.eval_str("(= true (= 1 1))").unwrap().is_true());
        assert!(interp.eval_str("(= false (= 1 2))").unwrap().is_true());
    }

    #[test]
    fn not_inverts() {
        let interp = Interpreter::new();
        assert!(interp.eval_str("(not {})").unwrap().is_true());
        assert_eq!(interp.eval_str("(not 1)").unwrap(), Value::empty());
    }

    #[test]
    fn inc_is_the_natural_successor() {
        let interp = Interpreter::new();
        assert_eq!(interp.eval_str("(inc 0)").unwrap(), Value::natural(1));
        assert_eq!(interp.eval_str("(inc 2)").unwrap(), Value::natural(3));
        assert!(interp.eval_str("(= (inc 2) 3)").unwrap().is_true());
    }

    #[test]
    fn first_and_second_index_sequences() {
        let interp = Interpreter::new();
        assert_eq!(interp.eval_str("(first [7 8 9])").unwrap(), Value::natural(7));
        assert_eq!(interp.eval_str("(second [7 8 9])").unwrap(), Value::natural(8));
        assert_eq!(interp.eval_str("(first [])").unwrap(), Value::empty());
    }

    #[test]
    fn pick_runs_only_the_selected_branch() {
        let interp = Interpreter::new();
        assert_eq!(
            interp
                .eval_str("(pick (= 1 1) {() -> 5} {() -> (boom)})")
                .unwrap(),
            Value::natural(5)
        );
        assert_eq!(
            interp
                .eval_str("(pick (= 1 2) {() -> (boom)} {() -> 6})")
                .unwrap(),
            Value::natural(6)
        );
    }
}
