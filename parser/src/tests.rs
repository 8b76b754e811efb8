//! FILENAME: parser/src/tests.rs
//! PURPOSE: Integration-level tests exercising the full lex -> parse pipeline,
//! as opposed to the unit tests colocated with each module.

use crate::parser::parse;

fn block_text(src: &str) -> String {
    parse(src).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", src, e)).serialize()
}

#[test]
fn reparsing_is_stable() {
    let sources = [
        "1 + 2 * 3",
        "2 ** 3 ** 2",
        "float(10) / 4",
        "true && !(2 > 8)",
        "sum([0,0], [1,1])",
        "x = 5\nx * 2",
        "if true\n1\nelse\n2\nend",
        "for i in [0,0]..[1,1]\ni\nend",
    ];

    for src in sources {
        let first = parse(src).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", src, e));
        let second = parse(src).unwrap();
        assert_eq!(first.serialize(), second.serialize());
    }
}

#[test]
fn end_to_end_precedence_scenarios() {
    assert_eq!(block_text("1 + 2 * 3"), "Block: {(1 + (2 * 3))}");
    assert_eq!(block_text("true && !(2 > 8)"), "Block: {(true && (!((2 > 8))))}");
}

#[test]
fn parenthesized_group_reparses_with_grouping_preserved() {
    // `(5 + 2) * 3 % 4` must parse as `((5 + 2) * 3) % 4`, matching left
    // associativity of `*` and `%` at the same precedence level.
    let expr = parse("(5 + 2) * 3 % 4").unwrap();
    assert_eq!(expr.serialize(), "Block: {(((5 + 2) * 3) % 4)}");
}

#[test]
fn multi_statement_block_preserves_order() {
    let expr = parse("1\n2\n3").unwrap();
    assert_eq!(expr.serialize(), "Block: {1; 2; 3}");
}

#[test]
fn nested_if_inside_for_parses() {
    let src = "for i in [0,0]..[1,1]\nif i > 0\ni\nelse\n0\nend\nend";
    let expr = parse(src).unwrap();
    assert_eq!(
        expr.serialize(),
        "Block: {FOR i IN [0, 0]..[1, 1]: Block: {IF (Variable:i > 0): Block: {Variable:i} ELSE Block: {0}}}"
    );
}
