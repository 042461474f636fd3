//! IR lowering tests.
//!
//! Formulas are parsed, bound against a small host and lowered; most
//! checks compare the stable textual rendering.

use bumpalo::Bump;
use fxl_binder::{Binder, BoundTree, RowScope, ScopeGraph, ScopeId, Variable};
use fxl_core::Span;
use fxl_ir::*;
use fxl_parser::{parse_formula, ParseOptions};
use fxl_types::{DType, EnumStore};
use pretty_assertions::assert_eq;

fn ty(text: &str) -> DType {
    text.parse().unwrap()
}

struct Host {
    graph: ScopeGraph,
    global: ScopeId,
    enums: EnumStore,
}

fn host() -> Host {
    let mut graph = ScopeGraph::new();
    let global = graph.create("global", None).unwrap();
    for variable in [
        Variable::new("numtable", ty("*[val:n]")),
        Variable::new("rec", ty("![a:n]")),
        Variable::new("n", DType::Number),
        Variable::new("b", DType::Boolean),
        Variable::new("day", DType::Date),
        Variable::new("tint", DType::Color),
    ] {
        graph.add_variable(global, variable).unwrap();
    }
    Host {
        graph,
        global,
        enums: EnumStore::with_builtins(),
    }
}

impl Host {
    fn bind<'a>(&self, arena: &'a Bump, source: &str, row: Option<&RowScope>) -> BoundTree<'a> {
        let parsed = parse_formula(arena, source, ParseOptions::default());
        assert!(!parsed.has_errors(), "parse errors in {source}: {:?}", parsed.diagnostics);
        Binder::new(&self.graph, Some(self.global), &self.enums)
            .bind(parsed.root, parsed.node_count, row)
            .unwrap()
    }

    fn lower(&self, source: &str) -> IrNode {
        let arena = Bump::new();
        let tree = self.bind(&arena, source, None);
        lower(&tree).0
    }

    fn render(&self, source: &str) -> String {
        self.lower(source).to_string()
    }
}

/// Row scopes opened by calls, in tree order.
fn call_scopes(node: &IrNode) -> Vec<ScopeSymbolId> {
    let mut scopes = Vec::new();
    node.walk(&mut |n| {
        if let IrKind::Call { scope: Some(scope), .. } = &n.kind {
            scopes.push(*scope);
        }
    });
    scopes
}

// ============================================================================
// Interpolation
// ============================================================================

#[test]
fn test_interpolation_lowers_to_concatenate() {
    assert_eq!(
        host().render(r#"$"She is {100} years old""#),
        r#"Concatenate:s("She is ":s, DecimalToText:s(100:w), " years old":s)"#
    );
}

#[test]
fn test_empty_interpolation_is_a_literal() {
    let node = host().lower(r#"$"""#);
    assert_eq!(node.kind, IrKind::String(String::new()));
    assert_eq!(node.to_string(), r#""":s"#);
}

#[test]
fn test_text_only_interpolation_is_a_literal() {
    assert_eq!(host().render(r#"$"plain text""#), r#""plain text":s"#);
}

#[test]
fn test_interpolation_segment_spans() {
    let source = r#"$"{n} and {b}""#;
    let node = host().lower(source);
    let IrKind::Call { args, .. } = &node.kind else {
        panic!("expected a call, got {node}");
    };
    assert_eq!(args.len(), 3);
    let and = source.find(" and ").unwrap() as u32;
    assert_eq!(args[1].span, Span::new(and, and + 5));
    assert_eq!(node.to_string(), r#"Concatenate:s(NumberToText:s(n:n), " and ":s, BooleanToText:s(b:b))"#);
}

#[test]
fn test_colors_convert_to_text() {
    let host = host();
    assert_eq!(
        host.render(r#"$"tint {tint}""#),
        r#"Concatenate:s("tint ":s, ColorToText:s(tint:c))"#
    );
    assert_eq!(
        host.render(r#"tint & "!""#),
        r#"Concatenate:s(ColorToText:s(tint:c), "!":s)"#
    );
}

// ============================================================================
// Lazy arguments
// ============================================================================

#[test]
fn test_lazy_span_matches_argument() {
    let source = "CountIf(numtable, val > 5)";
    let node = host().lower(source);
    let mut lazy = Vec::new();
    node.walk(&mut |n| {
        if matches!(n.kind, IrKind::Lazy(_)) {
            lazy.push(n.span);
        }
    });
    let start = source.find("val > 5").unwrap() as u32;
    assert_eq!(lazy, vec![Span::new(start, start + 7)]);
    assert_eq!(
        node.to_string(),
        "CountIf:n(numtable:*[val:n], Lazy(GtNumbers:b(Scope1.val:n, DecimalToNumber:n(5:w))))"
    );
}

#[test]
fn test_aliased_row_access() {
    assert_eq!(
        host().render("Filter(numtable As t, t.val > 1)"),
        "Filter:*[val:n](numtable:*[val:n], Lazy(GtNumbers:b(Scope1.val:n, DecimalToNumber:n(1:w))))"
    );
}

#[test]
fn test_scope_ids_are_reused() {
    let host = host();
    let siblings = host.lower("CountIf(numtable, val > 1) + CountIf(numtable, val > 2)");
    assert_eq!(call_scopes(&siblings), vec![ScopeSymbolId(1), ScopeSymbolId(1)]);

    let nested = host.lower("CountIf(numtable, CountIf(numtable, val > 1) > 0)");
    assert_eq!(call_scopes(&nested), vec![ScopeSymbolId(1), ScopeSymbolId(2)]);
}

// ============================================================================
// Operators and values
// ============================================================================

#[test]
fn test_typed_operators() {
    let host = host();
    assert_eq!(host.render("1 + 2"), "AddDecimals:w(1:w, 2:w)");
    assert_eq!(host.render("n + 1.5"), "AddNumbers:n(n:n, DecimalToNumber:n(1.5:w))");
    assert_eq!(host.render(r#""a" = "b""#), r#"EqText:b("a":s, "b":s)"#);
    assert_eq!(host.render("day + 1"), "AddDateAndNumber:D(day:D, 1:w)");
    assert_eq!(host.render("-n"), "NegateNumber:n(n:n)");
    assert_eq!(host.render("Not b"), "Not:b(b:b)");
    assert_eq!(host.render("b Or b"), "Or:b(b:b, b:b)");
    assert_eq!(host.render(r#""a" & 1"#), r#"Concatenate:s("a":s, DecimalToText:s(1:w))"#);
}

#[test]
fn test_member_access() {
    let host = host();
    assert_eq!(host.render("rec.a"), "FieldAccess:n(rec:![a:n], a)");
    assert_eq!(
        host.render("numtable.val"),
        r#"ShowColumns:*[val:n](numtable:*[val:n], "val":s)"#
    );
}

#[test]
fn test_constructors() {
    let host = host();
    assert_eq!(host.render(r#"{a: 1, b: "x"}"#), r#"{a:1:w, b:"x":s}:![a:w, b:s]"#);
    assert_eq!(host.render("[1, 2]"), "[1:w, 2:w]:*[Value:w]");
}

#[test]
fn test_enum_option() {
    let node = host().lower("SortOrder.Ascending");
    assert!(matches!(
        &node.kind,
        IrKind::EnumOption { enum_name, option }
            if enum_name.as_str() == "SortOrder" && option.as_str() == "Ascending"
    ));
}

#[test]
fn test_error_nodes() {
    assert_eq!(host().render("Foo + 1"), "Error:e");
}

#[test]
fn test_spans_are_preserved() {
    let source = "n * 2";
    let node = host().lower(source);
    assert_eq!(node.span, Span::new(0, 5));
    let children = node.children();
    assert_eq!(children[0].span, Span::new(0, 1));
    assert_eq!(children[1].span, Span::new(4, 5));
}

// ============================================================================
// Row scope of the formula
// ============================================================================

#[test]
fn test_rule_scope() {
    let host = host();
    let arena = Bump::new();
    let row = RowScope::new(ty("![qty:n]").as_record().unwrap().clone());
    let tree = host.bind(&arena, "qty * 2 + ThisRecord.qty", Some(&row));
    let (node, scope) = lower(&tree);
    assert_eq!(scope.id, ScopeSymbolId(0));
    assert_eq!(scope.row, ty("![qty:n]"));
    assert_eq!(
        node.to_string(),
        "AddNumbers:n(MulNumbers:n(Scope0.qty:n, DecimalToNumber:n(2:w)), Scope0.qty:n)"
    );
}

#[test]
fn test_rule_scope_without_row() {
    let arena = Bump::new();
    let tree = host().bind(&arena, "1", None);
    let (_, scope) = lower(&tree);
    assert_eq!(scope.row, DType::empty_record());
}
