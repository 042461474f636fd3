//! Engine integration tests.
//!
//! End-to-end tests for the pipeline: parse -> bind -> lower, and for
//! named-formula documents: declare -> order -> bind.

use fxl_binder::{RowScope, Variable};
use fxl_core::Span;
use fxl_engine::*;
use fxl_options::{parse_host_config, EngineOptions};
use fxl_types::DType;
use pretty_assertions::assert_eq;

fn engine() -> Engine {
    let mut engine = Engine::default();
    engine.declare(Variable::new("price", DType::Number)).unwrap();
    engine.declare(Variable::new("qty", DType::Decimal)).unwrap();
    engine
        .declare(Variable::new("cr_items", "*[cr_qty:n]".parse().unwrap()).with_display_name("Items"))
        .unwrap();
    engine
}

fn codes(diagnostics: &[fxl_diagnostics::Diagnostic]) -> Vec<u32> {
    diagnostics.iter().map(|d| d.code).collect()
}

fn names(list: &[fxl_core::Name]) -> Vec<&str> {
    list.iter().map(|n| n.as_str()).collect()
}

// ============================================================================
// Single formulas
// ============================================================================

#[test]
fn test_check_lowers_valid_formula() {
    let result = engine().check("1 + 2").unwrap();
    assert!(result.is_success());
    assert_eq!(result.return_type, DType::Decimal);
    assert_eq!(result.ir.unwrap().to_string(), "AddDecimals:w(1:w, 2:w)");
    assert_eq!(result.scope.unwrap().row, DType::empty_record());
}

#[test]
fn test_check_reports_dependencies() {
    let result = engine().check("price * qty + CountRows(Items)").unwrap();
    assert!(result.is_success(), "{:?}", result.diagnostics);
    assert_eq!(names(&result.dependencies), vec!["price", "qty", "cr_items"]);
}

#[test]
fn test_binding_errors_skip_lowering() {
    let result = engine().check("price + Missing").unwrap();
    assert!(!result.is_success());
    assert_eq!(codes(&result.diagnostics), vec![2001]);
    assert!(result.ir.is_none());
    assert_eq!(result.return_type, DType::Error);
}

#[test]
fn test_conflicting_table_rows_are_reported() {
    let result = engine().check(r#"Table({a: 1}, {a: "x"})"#).unwrap();
    assert!(!result.is_success());
    assert_eq!(codes(&result.diagnostics), vec![2011]);
    assert!(result.ir.is_none());
}

#[test]
fn test_parse_errors_stop_before_binding() {
    let result = engine().check("1 +").unwrap();
    assert!(!result.is_success());
    assert!(result.ir.is_none());
    assert!(result.dependencies.is_empty());
}

#[test]
fn test_numbers_are_floats() {
    let engine = Engine::new(EngineOptions {
        numbers_are_floats: true,
        ..EngineOptions::default()
    });
    let result = engine.check("1 + 2").unwrap();
    assert_eq!(result.return_type, DType::Number);
    assert_eq!(result.ir.unwrap().to_string(), "AddNumbers:n(1:n, 2:n)");
}

#[test]
fn test_expression_length_limit() {
    let engine = Engine::new(EngineOptions {
        max_expression_length: 5,
        ..EngineOptions::default()
    });
    assert!(engine.check("1 + 2").unwrap().is_success());
    assert!(!engine.check("1 + 2 + 3").unwrap().is_success());
}

#[test]
fn test_check_in_row() {
    let row = RowScope::new("![cr_qty:n]".parse::<DType>().unwrap().as_record().unwrap().clone());
    let result = engine().check_in_row("cr_qty * price", Some(&row)).unwrap();
    assert!(result.is_success());
    assert_eq!(result.ir.unwrap().to_string(), "MulNumbers:n(Scope0.cr_qty:n, price:n)");
}

#[test]
fn test_check_many_keeps_order() {
    let engine = engine();
    let results = engine.check_many(&["price", "qty", "Missing", "true"]);
    let types: Vec<DType> = results.into_iter().map(|r| r.unwrap().return_type).collect();
    assert_eq!(types, vec![DType::Number, DType::Decimal, DType::Error, DType::Boolean]);
}

// ============================================================================
// Host configuration
// ============================================================================

#[test]
fn test_engine_from_config() {
    let config = parse_host_config(
        r#"{
            "options": { "numbersAreFloats": true },
            "variables": [
                { "name": "cr_orders", "displayName": "Orders", "type": "*[qty:n]", "mutable": true }
            ],
            "enums": { "Size": "%n[Small:1, Large:2]" }
        }"#,
    )
    .unwrap();
    let engine = Engine::from_config(&config).unwrap();
    assert!(engine.options().numbers_are_floats);

    let result = engine.check("CountRows(Orders) + Size.Large").unwrap();
    assert!(result.is_success(), "{:?}", result.diagnostics);
    assert_eq!(names(&result.dependencies), vec!["cr_orders"]);
}

#[test]
fn test_config_rejects_duplicate_enum() {
    let config = parse_host_config(r#"{ "enums": { "SortOrder": "%s[Up:\"up\"]" } }"#).unwrap();
    assert!(matches!(Engine::from_config(&config), Err(EngineError::DuplicateEnum(_))));
}

#[test]
fn test_config_rejects_bad_type() {
    let config = parse_host_config(r#"{ "variables": [ { "name": "v", "type": "Nope" } ] }"#).unwrap();
    assert!(matches!(Engine::from_config(&config), Err(EngineError::Options(_))));
}

// ============================================================================
// Named-formula documents
// ============================================================================

#[test]
fn test_definitions_are_ordered_by_dependency() {
    let result = engine().definitions("total = subtotal * 2; subtotal = price + 1;").unwrap();
    assert!(result.is_success(), "{:?}", result.diagnostics);
    assert_eq!(names(&result.order), vec!["subtotal", "total"]);
    assert_eq!(result.formula("subtotal").unwrap().ty, DType::Number);
    assert_eq!(result.formula("total").unwrap().ty, DType::Number);
    assert_eq!(names(&result.formula("total").unwrap().dependencies), vec!["subtotal"]);
    assert_eq!(
        result.formula("total").unwrap().ir.as_ref().unwrap().to_string(),
        "MulNumbers:n(subtotal:n, DecimalToNumber:n(2:w))"
    );
}

#[test]
fn test_formulas_keep_declaration_order() {
    let result = engine().definitions("b = a; a = 1; c = 2;").unwrap();
    let declared: Vec<&str> = result.formulas.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(declared, vec!["b", "a", "c"]);
    assert_eq!(names(&result.order), vec!["a", "b", "c"]);
}

#[test]
fn test_circular_definitions() {
    let source = "a = b + 1; b = a * 2; c = 3; d = a;";
    let result = engine().definitions(source).unwrap();
    assert_eq!(codes(&result.diagnostics), vec![3005, 3005]);
    assert_eq!(
        result.diagnostics[0].message_text,
        "Circular reference between named formulas: a, b."
    );
    assert_eq!(names(&result.order), vec!["c", "d"]);
    assert_eq!(result.formula("a").unwrap().ty, DType::Error);
    assert_eq!(result.formula("d").unwrap().ty, DType::Error);
}

#[test]
fn test_duplicate_and_host_names() {
    let result = engine().definitions("x = 1; x = 2; price = 3;").unwrap();
    assert_eq!(codes(&result.diagnostics), vec![3004, 3007]);
    assert_eq!(result.formulas.len(), 1);

    let duplicate = &result.diagnostics[0];
    assert_eq!(duplicate.span, Span::new(7, 8));
    assert_eq!(duplicate.related_information.len(), 1);
    assert_eq!(duplicate.related_information[0].span, Span::new(0, 1));
    assert_eq!(duplicate.related_information[0].code, 3010);
}

#[test]
fn test_user_defined_functions() {
    let result = engine()
        .definitions("Double(x: Number): Number = x * 2; y = Double(price);")
        .unwrap();
    assert!(result.is_success(), "{:?}", result.diagnostics);
    assert_eq!(result.udfs.len(), 1);
    assert!(result.udfs[0].user_defined);
    assert_eq!(result.formula("y").unwrap().ty, DType::Number);
}

#[test]
fn test_bad_function_signatures() {
    let source = "F(a: Nope): Number = 1; \
                  G(a: Number, a: Number): Number = 1; \
                  H(): Record = {}; \
                  K(t: Table): Number = 1;";
    let result = engine().definitions(source).unwrap();
    assert_eq!(codes(&result.diagnostics), vec![3001, 3002, 3003, 3008]);
    assert!(result.udfs.is_empty());
}

#[test]
fn test_return_type_mismatch() {
    let result = engine().definitions("F(): Date = true;").unwrap();
    assert_eq!(codes(&result.diagnostics), vec![3006]);
    assert_eq!(
        result.diagnostics[0].message_text,
        "'F' is declared to return Date, but its body has type Boolean."
    );
}

#[test]
fn test_block_bodies() {
    let result = engine()
        .definitions("Log(x: Number): Void { x + 1; x * 2 };")
        .unwrap();
    assert!(result.is_success(), "{:?}", result.diagnostics);
    assert_eq!(result.udfs.len(), 1);
}

#[test]
fn test_document_parse_errors() {
    let result = engine().definitions("= 1; a = 2;").unwrap();
    assert!(codes(&result.diagnostics).contains(&3009));
    assert_eq!(names(&result.order), vec!["a"]);
}
