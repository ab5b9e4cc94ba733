use std::str::FromStr;

use bigdecimal::BigDecimal;
use mackerel::{
    session::{Mode, Outcome, Session},
    value::{Table, Value, ValueKind},
    Severity,
};
use num_bigint::BigInt;

fn run(source: &str) -> Outcome {
    Session::new().run(source, Mode::Batch)
}

fn eval(source: &str) -> Value {
    let mut session = Session::new();
    let mut values = session
        .eval(source)
        .expect("evaluation should succeed");
    assert_eq!(values.len(), 1, "expected exactly one emitted value");
    values.remove(0)
}

fn expect_int(value: &Value) -> BigInt {
    match value.kind() {
        ValueKind::Integer(n) => n.clone(),
        _ => panic!("expected Integer, found {}", value.type_name()),
    }
}

fn expect_decimal(value: &Value) -> BigDecimal {
    match value.kind() {
        ValueKind::Decimal(d) => d.clone(),
        _ => panic!("expected Decimal, found {}", value.type_name()),
    }
}

fn expect_bool(value: &Value) -> bool {
    match value.kind() {
        ValueKind::Bool(b) => *b,
        _ => panic!("expected Boolean, found {}", value.type_name()),
    }
}

fn expect_table(value: &Value) -> &Table {
    match value.kind() {
        ValueKind::Table(table) => table,
        _ => panic!("expected Table, found {}", value.type_name()),
    }
}

fn expect_list(value: &Value) -> &[Value] {
    match value.kind() {
        ValueKind::List(values) => values,
        _ => panic!("expected List, found {}", value.type_name()),
    }
}

fn first_error(outcome: &Outcome) -> String {
    outcome
        .errors()
        .next()
        .map(|diagnostic| diagnostic.message.clone())
        .unwrap_or_else(|| panic!("expected an error, emitted {:?}", outcome.values))
}

#[test]
fn integer_addition_stays_integer() {
    assert_eq!(expect_int(&eval("1 + 1")), BigInt::from(2));
}

#[test]
fn mixed_addition_promotes_to_decimal() {
    let value = eval("1 + 1.0");
    assert_eq!(expect_decimal(&value), BigDecimal::from_str("2.0").unwrap());
    assert_eq!(value.to_string(), "2.0");
}

#[test]
fn string_concatenation_stringifies_other_operand() {
    assert_eq!(eval("\"a\" + 1").to_string(), "a1");
    assert_eq!(eval("1.5 + \"a\"").to_string(), "1.5a");
    assert_eq!(eval("\"n: \" + [1, 2]").to_string(), "n: [1, 2]");
}

#[test]
fn string_with_other_operators_is_a_type_error() {
    let outcome = run("show \"a\" - 1");
    assert!(first_error(&outcome).contains("must be numbers"));
    assert!(outcome.values.is_empty());
}

#[test]
fn arithmetic_precedence_and_grouping() {
    assert_eq!(expect_int(&eval("2 + 3 * 4")), BigInt::from(14));
    assert_eq!(expect_int(&eval("(2 + 3) * 4")), BigInt::from(20));
    assert_eq!(expect_int(&eval("7 / 2")), BigInt::from(3));
    assert_eq!(expect_int(&eval("10 - 2 - 3")), BigInt::from(5));
}

#[test]
fn integers_are_arbitrary_precision() {
    let value = eval("123456789012345678901234567890 * 10");
    assert_eq!(
        expect_int(&value),
        BigInt::from_str("1234567890123456789012345678900").unwrap()
    );
}

#[test]
fn division_by_zero_is_fatal_in_both_domains() {
    let outcome = run("show 1 / 0\nshow 1.5 / 0\nshow 3");
    let errors: Vec<_> = outcome.errors().map(|d| d.message.clone()).collect();
    assert_eq!(errors, vec!["division by zero", "division by zero"]);
    assert_eq!(outcome.values.len(), 1);
    assert_eq!(expect_int(&outcome.values[0]), BigInt::from(3));
}

#[test]
fn relational_operators_share_promotion() {
    assert!(expect_bool(&eval("1 < 1.5")));
    assert!(expect_bool(&eval("2 >= 2")));
    assert!(!expect_bool(&eval("2.5 <= 2")));
    assert!(expect_bool(&eval("3 > 2.99")));
    let outcome = run("show 1 < true");
    assert!(first_error(&outcome).contains("must be numbers"));
}

#[test]
fn equality_is_structural() {
    assert!(expect_bool(&eval("1 == 1")));
    assert!(expect_bool(&eval("\"a\" != \"b\"")));
    assert!(expect_bool(&eval("[1, 2] == [1, 2]")));
    assert!(expect_bool(&eval("[a: 1, b: 2] == [b: 2, a: 1]")));
    assert!(!expect_bool(&eval("1 == 1.0")));
    assert!(!expect_bool(&eval("true == \"true\"")));
}

#[test]
fn unary_operators_keep_their_domain() {
    assert_eq!(expect_int(&eval("-5")), BigInt::from(-5));
    assert_eq!(
        expect_decimal(&eval("-2.5")),
        BigDecimal::from_str("-2.5").unwrap()
    );
    assert_eq!(expect_int(&eval("+7")), BigInt::from(7));
    assert!(!expect_bool(&eval("!true")));
    assert!(expect_bool(&eval("!!true")));
}

#[test]
fn unary_type_errors() {
    assert!(first_error(&run("show !1")).contains("must be a Boolean"));
    assert!(first_error(&run("show -\"a\"")).contains("must be a number"));
    assert!(first_error(&run("show +true")).contains("must be a number"));
}

#[test]
fn complement_is_an_unsupported_operation() {
    let outcome = run("show ~1");
    let fault = outcome.errors().next().expect("one fault");
    assert_eq!(fault.severity, Severity::Fault);
    assert!(fault.message.contains("unsupported"));
}

#[test]
fn logical_and_short_circuits() {
    let outcome = run("show false && missing");
    assert!(!outcome.has_errors());
    assert!(!expect_bool(&outcome.values[0]));
}

#[test]
fn logical_or_short_circuits() {
    let outcome = run("show true || 1 / 0");
    assert!(!outcome.has_errors());
    assert!(expect_bool(&outcome.values[0]));
}

#[test]
fn logical_operands_must_be_booleans() {
    assert!(expect_bool(&eval("true && true")));
    assert!(!expect_bool(&eval("false || false")));
    assert!(first_error(&run("show 1 && true")).contains("must be Booleans"));
    assert!(first_error(&run("show true && 1")).contains("must be Booleans"));
}

#[test]
fn list_literals() {
    let value = eval("[1, 2, 3]");
    let values = expect_list(&value);
    let ints: Vec<_> = values.iter().map(expect_int).collect();
    assert_eq!(ints, vec![BigInt::from(1), BigInt::from(2), BigInt::from(3)]);

    let empty = eval("[]");
    assert!(expect_list(&empty).is_empty());
}

#[test]
fn duplicate_table_key_overwrites_and_warns() {
    let outcome = Session::new().run("[a:1, a:2]", Mode::Interactive);
    assert!(!outcome.has_errors());
    let table = expect_table(&outcome.values[0]);
    assert_eq!(table.len(), 1);
    assert_eq!(
        expect_int(&table[&Value::string("a")]),
        BigInt::from(2)
    );
    let warnings: Vec<_> = outcome.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("duplicate key"));
    assert_eq!(warnings[0].token.lexeme, ":");
    assert_eq!(warnings[0].column(), 8);
}

#[test]
fn table_keeps_first_insertion_order() {
    let value = eval("[b: 1, a: 2, b: 3]");
    let table = expect_table(&value);
    let keys: Vec<_> = table.keys().map(|key| key.to_string()).collect();
    assert_eq!(keys, vec!["b", "a"]);
    assert_eq!(value.to_string(), "[b: 3, a: 2]");
}

#[test]
fn table_keys_are_symbolic_names_or_evaluated_expressions() {
    let value = eval("[undeclared: 1, (\"k\" + 1): 2, 3: 4]");
    let table = expect_table(&value);
    assert!(table.contains_key(&Value::string("undeclared")));
    assert!(table.contains_key(&Value::string("k1")));
    assert!(table.contains_key(&Value::integer(3)));
}

#[test]
fn nested_sequences_over_several_lines() {
    let value = eval(
        r#"[
            name: "demo"
            ports: [80, 443,]
            limits: [cpu: 1.5, memory: 512]
        ]"#,
    );
    assert_eq!(
        value.to_string(),
        "[name: demo, ports: [80, 443], limits: [cpu: 1.5, memory: 512]]"
    );
}

#[test]
fn declarations_allow_forward_references() {
    let mut session = Session::new();
    let outcome = session.run("decl x: y\ndecl y: 1\nshow x", Mode::Batch);
    assert!(!outcome.has_errors(), "{:?}", outcome.evaluation);
    assert_eq!(expect_int(&outcome.values[0]), BigInt::from(1));

    let environment = session.interpreter().environment();
    assert_eq!(environment.len(), 2);
    assert_eq!(environment.is_forced("x"), Some(true));
    assert_eq!(environment.is_forced("y"), Some(true));

    let again = session.run("show x\nshow y", Mode::Batch);
    let ints: Vec<_> = again.values.iter().map(expect_int).collect();
    assert_eq!(ints, vec![BigInt::from(1), BigInt::from(1)]);
}

#[test]
fn declarations_are_not_computed_until_referenced() {
    let mut session = Session::new();
    let outcome = session.run("decl broken: 1 / 0\ndecl fine: 2", Mode::Batch);
    assert!(!outcome.has_errors());
    let environment = session.interpreter().environment();
    assert_eq!(environment.is_forced("broken"), Some(false));
    assert_eq!(environment.is_forced("fine"), Some(false));
    assert_eq!(environment.is_forced("absent"), None);
}

#[test]
fn failed_declaration_is_retried_on_next_reference() {
    let mut session = Session::new();
    let outcome = session.run("decl a: 1 / 0\nshow a\nshow a", Mode::Batch);
    assert_eq!(outcome.errors().count(), 2);
    assert_eq!(session.interpreter().environment().is_forced("a"), Some(false));
}

#[test]
fn declarations_persist_across_runs() {
    let mut session = Session::new();
    session.run("decl base: 40", Mode::Interactive);
    let outcome = session.run("show base + 2", Mode::Interactive);
    assert_eq!(expect_int(&outcome.values[0]), BigInt::from(42));
}

#[test]
fn cyclic_declaration_is_reported() {
    let outcome = run("decl a: b\ndecl b: a + 1\nshow a");
    assert!(first_error(&outcome).contains("cyclic declaration"));
}

#[test]
fn missing_variable_aborts_only_its_unit() {
    let outcome = run("show nope\nshow 2");
    assert_eq!(first_error(&outcome), "cannot find variable `nope`");
    assert_eq!(outcome.values.len(), 1);
    assert_eq!(expect_int(&outcome.values[0]), BigInt::from(2));
}

#[test]
fn declaration_requires_named_binding() {
    assert_eq!(first_error(&run("decl 5")), "expect named binding");
    assert_eq!(first_error(&run("decl (a): 5")), "expect named binding");
}

#[test]
fn redeclaration_replaces_and_warns() {
    let outcome = run("decl a: 1\ndecl a: 2\nshow a");
    assert_eq!(expect_int(&outcome.values[0]), BigInt::from(2));
    let warnings: Vec<_> = outcome.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("redeclared"));
}

#[test]
fn builder_yields_placeholder() {
    let value = eval("show Server { port 8080 }");
    assert!(matches!(value.kind(), ValueKind::Builder(kind) if kind == "Server"));
}

#[test]
fn standalone_binding_produces_pair() {
    let value = eval("show a: 1 + 1");
    match value.kind() {
        ValueKind::Pair(key, value) => {
            assert!(matches!(key.kind(), ValueKind::Reference(name) if name == "a"));
            assert_eq!(expect_int(value), BigInt::from(2));
        }
        _ => panic!("expected Pair, found {}", value.type_name()),
    }
    assert_eq!(value.to_string(), "a: 2");
}

#[test]
fn parse_error_does_not_block_following_statement() {
    let outcome = run("decl a: )\ndecl b: 2\nshow b");
    assert_eq!(outcome.syntactic.errors.len(), 1);
    assert!(!outcome.evaluation.has_errors());
    assert_eq!(expect_int(&outcome.values[0]), BigInt::from(2));
}

#[test]
fn diagnostics_render_with_phase_and_position() {
    let outcome = run("show 1\nshow  nope");
    let diagnostic = outcome.errors().next().expect("one error");
    assert_eq!(
        diagnostic.to_string(),
        "runtime: cannot find variable `nope` [line 2, col 7]"
    );
}

#[test]
fn interactive_statement_with_signed_operand() {
    let outcome = Session::new().run("show -1\nemit +2", Mode::Interactive);
    assert!(!outcome.has_errors(), "{:?}", outcome.evaluation.errors);
    let ints: Vec<_> = outcome.values.iter().map(expect_int).collect();
    assert_eq!(ints, vec![BigInt::from(-1), BigInt::from(2)]);
}

#[test]
fn interactive_bare_name_is_an_expression() {
    let mut session = Session::new();
    session.run("decl answer: 42", Mode::Interactive);
    let outcome = session.run("answer", Mode::Interactive);
    assert_eq!(expect_int(&outcome.values[0]), BigInt::from(42));
}

#[test]
fn fresh_session_has_no_declarations() {
    let session = Session::new();
    assert!(session.interpreter().environment().is_empty());
}

#[test]
fn warnings_render_with_severity() {
    let outcome = run("decl a: 1\ndecl a: 2");
    let warning = outcome.warnings().next().expect("one warning");
    assert_eq!(
        warning.to_string(),
        "warning: runtime: redeclared `a` [line 2, col 6]"
    );
}
