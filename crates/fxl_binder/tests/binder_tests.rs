//! Binder integration tests.
//!
//! Parses formulas, binds them against a small host configuration and
//! checks types, mutability, resolution and diagnostics.

use bumpalo::Bump;
use fxl_ast::Expr;
use fxl_binder::*;
use fxl_core::{CoreError, Name, Path, Span};
use fxl_parser::{parse_formula, ParseOptions};
use fxl_types::{Coercion, DType, DisplayNameMap, EnumStore, RecordType};
use pretty_assertions::assert_eq;

fn ty(text: &str) -> DType {
    text.parse().unwrap()
}

struct Host {
    graph: ScopeGraph,
    global: ScopeId,
    enums: EnumStore,
    options: BindOptions,
}

impl Host {
    fn new() -> Self {
        let mut graph = ScopeGraph::new();
        let global = graph.create("global", None).unwrap();
        Self {
            graph,
            global,
            enums: EnumStore::with_builtins(),
            options: BindOptions::default(),
        }
    }

    fn with(mut self, variable: Variable) -> Self {
        self.graph.add_variable(self.global, variable).unwrap();
        self
    }

    fn binder(&self) -> Binder<'_> {
        Binder::new(&self.graph, Some(self.global), &self.enums).with_options(self.options)
    }

    fn bind<'a>(&self, arena: &'a Bump, source: &str, row: Option<&RowScope>) -> BoundTree<'a> {
        let parsed = parse_formula(arena, source, ParseOptions::default());
        assert!(!parsed.has_errors(), "parse errors in {source}: {:?}", parsed.diagnostics);
        self.binder().bind(parsed.root, parsed.node_count, row).unwrap()
    }
}

/// The standard host: a mutable record `x`, a constant copy `k`, numbers
/// and booleans, and an `Orders` table with display names.
fn host() -> Host {
    let record = ty("![Value:n,Tbl:*[Value2:n],Rec:![Value3:n]]");
    let mut names = DisplayNameMap::new();
    names.insert(Name::new("cr_qty"), Name::new("Quantity"));
    names.insert(Name::new("cr_price"), Name::new("Price"));
    let orders = RecordType::from_fields([
        (Name::new("cr_qty"), DType::Number),
        (Name::new("cr_price"), DType::Decimal),
    ])
    .with_display_names(names);

    Host::new()
        .with(Variable::new("x", record.clone()).mutable())
        .with(Variable::constant("k", record))
        .with(Variable::new("n", DType::Number))
        .with(Variable::new("y", DType::Number))
        .with(Variable::new("z", DType::Number))
        .with(Variable::new("b", DType::Boolean))
        .with(Variable::new("day", DType::Date))
        .with(Variable::new("cr_orders", DType::Table(orders)).with_display_name("Orders"))
}

fn codes(tree: &BoundTree<'_>) -> Vec<u32> {
    tree.diagnostics.iter().map(|d| d.code).collect()
}

/// The bound node at the first occurrence of `snippet` that is a whole
/// node, skipping occurrences inside longer tokens (`n` in `Len`).
fn node_at<'t>(tree: &'t BoundTree<'_>, source: &str, snippet: &str) -> &'t BoundNode {
    source
        .match_indices(snippet)
        .map(|(start, _)| Span::new(start as u32, (start + snippet.len()) as u32))
        .find_map(|span| tree.nodes().find(|node| node.span == span))
        .unwrap_or_else(|| panic!("no node spans {snippet:?} in {source:?}"))
}

fn args<'a>(tree: &BoundTree<'a>) -> Vec<Expr<'a>> {
    tree.root.as_call().unwrap().args.to_vec()
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_unknown_name() {
    let arena = Bump::new();
    let tree = host().bind(&arena, "Foo + 1", None);
    assert_eq!(codes(&tree), vec![2001]);
    assert_eq!(
        tree.diagnostics.diagnostics()[0].message_text,
        "Name isn't valid. 'Foo' isn't recognized."
    );
    assert_eq!(tree.diagnostics.diagnostics()[0].span, Span::new(0, 3));
    assert_eq!(tree.result_type(), DType::Error);
}

#[test]
fn test_errors_do_not_cascade() {
    let arena = Bump::new();
    let tree = host().bind(&arena, "Len(Foo) + Left(Bar, 2)", None);
    assert_eq!(codes(&tree), vec![2001, 2001]);
}

#[test]
fn test_function_used_as_value() {
    let arena = Bump::new();
    let tree = host().bind(&arena, "Sum", None);
    assert_eq!(codes(&tree), vec![2014]);
}

#[test]
fn test_unknown_function() {
    let arena = Bump::new();
    let tree = host().bind(&arena, "Frobnicate(n, Foo)", None);
    assert_eq!(codes(&tree), vec![2001, 2002]);
}

#[test]
fn test_display_name_resolves_to_logical_variable() {
    let arena = Bump::new();
    let tree = host().bind(&arena, "CountRows(Orders)", None);
    assert!(codes(&tree).is_empty());
    let source = node_at(&tree, "CountRows(Orders)", "Orders");
    assert_eq!(
        source.binding,
        Binding::Variable {
            name: Name::new("cr_orders"),
            kind: VariableKind::Variable,
        }
    );
}

#[test]
fn test_enum_options() {
    let arena = Bump::new();
    let host = host();
    let tree = host.bind(&arena, "SortOrder.Ascending", None);
    assert!(codes(&tree).is_empty());
    assert!(matches!(tree.result_type(), DType::Enum(_)));
    assert_eq!(
        tree.root_node().unwrap().binding,
        Binding::EnumOption {
            enum_name: Name::new("SortOrder"),
            option: Name::new("Ascending"),
        }
    );

    let tree = host.bind(&arena, "SortOrder.Sideways", None);
    assert_eq!(codes(&tree), vec![2007]);
}

#[test]
fn test_members_of_scalars() {
    let arena = Bump::new();
    let tree = host().bind(&arena, "n.Value", None);
    assert_eq!(codes(&tree), vec![2008]);
}

#[test]
fn test_scope_cycle_is_fatal() {
    let mut host = host();
    let child = host.graph.create("child", Some(host.global)).unwrap();
    host.graph.set_parent(host.global, Some(child)).unwrap();

    let arena = Bump::new();
    let parsed = parse_formula(&arena, "n + 1", ParseOptions::default());
    let result = host.binder().bind(parsed.root, parsed.node_count, None);
    assert!(matches!(result, Err(CoreError::ScopeCycle(_))));
}

// ============================================================================
// Row scopes
// ============================================================================

fn row() -> RowScope {
    RowScope::new(RecordType::from_fields([
        (Name::new("Price"), DType::Number),
        (Name::new("n"), DType::String),
    ]))
}

#[test]
fn test_row_fields_resolve_first() {
    let arena = Bump::new();
    let tree = host().bind(&arena, "Price * 2", Some(&row()));
    assert!(codes(&tree).is_empty());
    let price = node_at(&tree, "Price * 2", "Price");
    assert_eq!(
        price.binding,
        Binding::RowField {
            frame: FrameId(0),
            name: Name::new("Price"),
        }
    );
    assert_eq!(tree.result_type(), DType::Number);
    assert_eq!(tree.frame_row(FrameId(0)), Some(&DType::Record(row().row)));
}

#[test]
fn test_row_field_shadowing_a_global_warns() {
    let arena = Bump::new();
    let tree = host().bind(&arena, "Len(n)", Some(&row()));
    assert_eq!(codes(&tree), vec![2017]);
    assert!(!tree.has_errors());
    let arg = node_at(&tree, "Len(n)", "n");
    assert_eq!(arg.span, Span::new(4, 5));
    assert_eq!(arg.ty, DType::String);
}

#[test]
fn test_this_record() {
    let arena = Bump::new();
    let host = host();
    let tree = host.bind(&arena, "ThisRecord.Price", Some(&row()));
    assert!(codes(&tree).is_empty());
    assert_eq!(tree.result_type(), DType::Number);

    let tree = host.bind(&arena, "ThisRecord.Price", None);
    assert_eq!(codes(&tree), vec![2016]);

    let tree = host.bind(&arena, "ThisRecord.Price", Some(&row().hide_this_record()));
    assert_eq!(codes(&tree), vec![2016]);
}

#[test]
fn test_lambda_arguments_see_the_row() {
    let arena = Bump::new();
    let host = host();
    let source = "Filter(Orders, Quantity > 2 && Price < 10)";
    let tree = host.bind(&arena, source, None);
    assert!(codes(&tree).is_empty(), "{:?}", tree.diagnostics);
    assert_eq!(tree.result_type(), host.graph.resolve_variable(Some(host.global), "Orders").unwrap().unwrap().ty);
    assert_eq!(
        node_at(&tree, source, "Quantity").binding,
        Binding::RowField {
            frame: FrameId(0),
            name: Name::new("cr_qty"),
        }
    );
}

#[test]
fn test_row_scope_ends_with_the_call() {
    let arena = Bump::new();
    let tree = host().bind(&arena, "CountIf(Orders, Quantity > 2) + Quantity", None);
    assert_eq!(codes(&tree), vec![2001]);
}

#[test]
fn test_alias_replaces_unqualified_access() {
    let arena = Bump::new();
    let host = host();
    let tree = host.bind(&arena, "Sum(Orders As o, o.Quantity * o.Price)", None);
    assert!(codes(&tree).is_empty(), "{:?}", tree.diagnostics);
    assert_eq!(tree.result_type(), DType::Number);

    let tree = host.bind(&arena, "Sum(Orders As o, Quantity)", None);
    assert_eq!(codes(&tree), vec![2001]);
}

#[test]
fn test_as_is_only_allowed_on_a_scoped_first_argument() {
    let arena = Bump::new();
    let host = host();
    assert_eq!(codes(&host.bind(&arena, "Len(\"a\" As t)", None)), vec![2010]);
    assert_eq!(codes(&host.bind(&arena, "Filter(Orders, true As t)", None)), vec![2010]);
}

#[test]
fn test_table_argument_expected() {
    let arena = Bump::new();
    let tree = host().bind(&arena, "Filter(n, true)", None);
    assert_eq!(codes(&tree), vec![2015]);
}

// ============================================================================
// Types and coercions
// ============================================================================

#[test]
fn test_number_literals() {
    let arena = Bump::new();
    let mut host = host();
    assert_eq!(host.bind(&arena, "1 + 2", None).result_type(), DType::Decimal);

    let tree = host.bind(&arena, "1 + n", None);
    assert_eq!(tree.result_type(), DType::Number);
    assert_eq!(node_at(&tree, "1 + n", "1").coercion, Coercion::DecimalToNumber);

    host.options.numbers_are_floats = true;
    let tree = host.bind(&arena, "1 + 2", None);
    assert_eq!(tree.result_type(), DType::Number);
    assert_eq!(node_at(&tree, "1 + 2", "1").coercion, Coercion::None);
}

#[test]
fn test_date_arithmetic() {
    let arena = Bump::new();
    let host = host();
    assert_eq!(host.bind(&arena, "day + 1", None).result_type(), DType::Date);
    assert_eq!(host.bind(&arena, "day - day", None).result_type(), DType::Number);
}

#[test]
fn test_operator_type_errors() {
    let arena = Bump::new();
    let host = host();
    assert_eq!(codes(&host.bind(&arena, "x + 1", None)), vec![2005]);
    assert_eq!(codes(&host.bind(&arena, "\"a\" < 1", None)), vec![2006]);
    assert_eq!(codes(&host.bind(&arena, "x = k", None)), vec![2006]);
    assert!(codes(&host.bind(&arena, "\"a\" = Blank()", None)).is_empty());
}

#[test]
fn test_concatenation_converts_operands() {
    let arena = Bump::new();
    let tree = host().bind(&arena, "n & b", None);
    assert_eq!(tree.result_type(), DType::String);
    assert_eq!(node_at(&tree, "n & b", "n").coercion, Coercion::NumberToText);
    assert_eq!(node_at(&tree, "n & b", "b").coercion, Coercion::BooleanToText);
}

#[test]
fn test_interpolation() {
    let arena = Bump::new();
    let host = host();
    let source = "$\"She is {n} years old\"";
    let tree = host.bind(&arena, source, None);
    assert!(codes(&tree).is_empty());
    assert_eq!(tree.result_type(), DType::String);
    assert_eq!(node_at(&tree, source, "n").coercion, Coercion::NumberToText);

    assert_eq!(codes(&host.bind(&arena, "$\"{x}\"", None)), vec![2012]);
}

#[test]
fn test_records_and_tables() {
    let arena = Bump::new();
    let host = host();
    let tree = host.bind(&arena, "{a: 1, b: \"s\"}", None);
    assert_eq!(tree.result_type(), ty("![a:w,b:s]"));

    assert_eq!(codes(&host.bind(&arena, "{a: 1, a: 2}", None)), vec![2009]);

    let tree = host.bind(&arena, "[1, n]", None);
    assert_eq!(tree.result_type(), ty("*[Value:n]"));
    assert_eq!(node_at(&tree, "[1, n]", "1").coercion, Coercion::DecimalToNumber);

    let tree = host.bind(&arena, "[{a: 1}, {b: true}]", None);
    assert_eq!(tree.result_type(), ty("*[a:w,b:b]"));

    assert_eq!(codes(&host.bind(&arena, "[{a: 1}, {a: \"s\"}]", None)), vec![2011]);
}

#[test]
fn test_mixed_record_and_value_items() {
    let arena = Bump::new();
    let host = host();
    let source = "[{a: 1}, 2]";
    let tree = host.bind(&arena, source, None);
    assert_eq!(codes(&tree), vec![2018]);
    assert_eq!(tree.diagnostics.diagnostics()[0].span, Span::new(9, 10));
    assert_eq!(tree.result_type(), ty("*[a:w]"));

    let tree = host.bind(&arena, "[n, {a: 1}]", None);
    assert_eq!(codes(&tree), vec![2018]);
    assert_eq!(tree.result_type(), ty("*[Value:n]"));
}

#[test]
fn test_table_function_with_conflicting_rows() {
    let arena = Bump::new();
    let host = host();
    let source = "Table({a: 1}, {a: \"x\"})";
    let tree = host.bind(&arena, source, None);
    assert_eq!(codes(&tree), vec![2011]);
    assert!(tree.has_errors());
    assert_eq!(tree.diagnostics.diagnostics()[0].span, Span::new(14, 22));

    let tree = host.bind(&arena, "Table({a: 1}, {b: true})", None);
    assert!(codes(&tree).is_empty());
    assert_eq!(tree.result_type(), ty("*[a:w,b:b]"));
}

#[test]
fn test_call_checks() {
    let arena = Bump::new();
    let host = host();
    let tree = host.bind(&arena, "Left(\"a\")", None);
    assert_eq!(codes(&tree), vec![2003]);
    assert_eq!(
        tree.diagnostics.diagnostics()[0].message_text,
        "Invalid number of arguments: received 1, expected 2."
    );

    assert_eq!(codes(&host.bind(&arena, "Len(x)", None)), vec![2004]);

    let tree = host.bind(&arena, "Left(n, \"2\")", None);
    assert!(codes(&tree).is_empty());
    assert_eq!(node_at(&tree, "Left(n, \"2\")", "n").coercion, Coercion::NumberToText);
    assert_eq!(node_at(&tree, "Left(n, \"2\")", "\"2\"").coercion, Coercion::TextToNumber);
}

#[test]
fn test_overloads_follow_the_first_argument() {
    let arena = Bump::new();
    let host = host();
    let tree = host.bind(&arena, "Sum(Orders, Price)", None);
    assert!(codes(&tree).is_empty());
    assert_eq!(tree.result_type(), DType::Decimal);

    let tree = host.bind(&arena, "Sum(1, 2, 3)", None);
    assert!(codes(&tree).is_empty());
    assert_eq!(tree.result_type(), DType::Decimal);
}

#[test]
fn test_conditional_branches() {
    let arena = Bump::new();
    let host = host();
    let tree = host.bind(&arena, "If(b, 1, n)", None);
    assert_eq!(tree.result_type(), DType::Number);
    assert_eq!(node_at(&tree, "If(b, 1, n)", "1").coercion, Coercion::DecimalToNumber);

    assert_eq!(codes(&host.bind(&arena, "If(b, 1, \"a\")", None)), vec![2013]);
    assert_eq!(codes(&host.bind(&arena, "If(b, {a: 1}, [1])", None)), vec![2013]);
    assert!(codes(&host.bind(&arena, "If(b, 1, b, 2, 3)", None)).is_empty());
}

// ============================================================================
// Mutability
// ============================================================================

#[test]
fn test_mutability_threads_through_fields_and_row_selectors() {
    let arena = Bump::new();
    let host = host();
    for source in ["x", "x.Value", "x.Tbl", "First(x.Tbl).Value2", "x.Rec", "x.Rec.Value3", "Index(x.Tbl, 1)"] {
        let tree = host.bind(&arena, source, None);
        assert!(codes(&tree).is_empty(), "{source}: {:?}", tree.diagnostics);
        assert!(tree.root_node().unwrap().mutable, "{source} should be mutable");
    }
}

#[test]
fn test_mutability_is_lost_through_transforms() {
    let arena = Bump::new();
    let host = host();
    for source in [
        "k",
        "k.Rec.Value3",
        "n",
        "Filter(x.Tbl, Value2 > 1)",
        "First(Filter(x.Tbl, Value2 > 1))",
        "x.Tbl.Value2",
        "{a: x.Rec}",
    ] {
        let tree = host.bind(&arena, source, None);
        assert!(codes(&tree).is_empty(), "{source}: {:?}", tree.diagnostics);
        assert!(!tree.root_node().unwrap().mutable, "{source} should not be mutable");
    }
}

#[test]
fn test_mutable_row_scope() {
    let arena = Bump::new();
    let host = host();
    let tree = host.bind(&arena, "ThisRecord", Some(&row().mutable()));
    assert!(tree.root_node().unwrap().mutable);
    let tree = host.bind(&arena, "ThisRecord", Some(&row()));
    assert!(!tree.root_node().unwrap().mutable);
}

// ============================================================================
// Invocation validation
// ============================================================================

#[test]
fn test_revalidating_conditional_arguments() {
    let arena = Bump::new();
    let host = host();
    let binder = host.binder();
    let tree = host.bind(&arena, "If(x.Value > 1, y > 2, z < 3)", None);
    assert!(codes(&tree).is_empty());

    let nodes: Vec<&BoundNode> = args(&tree).into_iter().map(|e| tree.of(e).unwrap()).collect();
    let path = |name: &str| Path::root().append(Name::new(name));
    let check = |name: &str, args: &[&BoundNode]| binder.validate_invocation(&path(name), args).unwrap();

    let original = check("If", &nodes);
    assert!(original.ok);
    assert_eq!(original.return_type, DType::Boolean);

    assert!(check("If", &[nodes[1], nodes[0], nodes[2]]).ok);
    assert!(check("If", &[nodes[0], nodes[1]]).ok);
    assert!(!check("If", &[nodes[0]]).ok);
    assert!(!check("If", &[]).ok);

    // `x.Value` lifted out of the first condition.
    let Expr::Binary(condition) = args(&tree)[0] else {
        panic!("expected a comparison");
    };
    let lifted = tree.of(condition.left).unwrap();
    assert_eq!(lifted.ty, DType::Number);
    assert!(check("If", &[lifted, nodes[1], nodes[2]]).ok);

    assert!(!check("Now", &nodes).ok);
    assert!(!check("Left", &nodes).ok);

    let and = check("And", &nodes);
    assert!(and.ok);
    assert_eq!(and.return_type, DType::Boolean);
    assert_eq!(and.function.unwrap().name.as_str(), "And");
}

#[test]
fn test_revalidation_accepts_nodes_from_other_trees() {
    let arena = Bump::new();
    let host = host();
    let first = host.bind(&arena, "b", None);
    let second = host.bind(&arena, "\"yes\"", None);
    let third = host.bind(&arena, "\"no\"", None);
    let args = [
        first.root_node().unwrap(),
        second.root_node().unwrap(),
        third.root_node().unwrap(),
    ];
    let check = host
        .binder()
        .validate_invocation(&Path::root().append(Name::new("If")), &args)
        .unwrap();
    assert!(check.ok);
    assert_eq!(check.return_type, DType::String);
}

#[test]
fn test_revalidation_rejects_conflicting_branches() {
    let arena = Bump::new();
    let host = host();
    let tree = host.bind(&arena, "If(b, 1, \"a\")", None);
    let nodes: Vec<&BoundNode> = args(&tree).into_iter().map(|e| tree.of(e).unwrap()).collect();
    let check = host
        .binder()
        .validate_invocation(&Path::root().append(Name::new("If")), &nodes)
        .unwrap();
    assert!(!check.ok);
    assert_eq!(check.return_type, DType::Error);
}

#[test]
fn test_revalidation_rejects_conflicting_table_rows() {
    let arena = Bump::new();
    let host = host();
    let first = host.bind(&arena, "{a: 1}", None);
    let second = host.bind(&arena, "{a: \"x\"}", None);
    let third = host.bind(&arena, "{b: true}", None);
    let table = Path::root().append(Name::new("Table"));
    let binder = host.binder();

    let conflicting = [first.root_node().unwrap(), second.root_node().unwrap()];
    let check = binder.validate_invocation(&table, &conflicting).unwrap();
    assert!(!check.ok);

    let compatible = [first.root_node().unwrap(), third.root_node().unwrap()];
    let check = binder.validate_invocation(&table, &compatible).unwrap();
    assert!(check.ok);
    assert_eq!(check.return_type, ty("*[a:w,b:b]"));
}

// ============================================================================
// Backing paths
// ============================================================================

fn segments(path: Option<Path>) -> Option<Vec<String>> {
    path.map(|p| p.segments().iter().map(|s| s.to_string()).collect())
}

#[test]
fn test_backing_path_from_row_selector() {
    let arena = Bump::new();
    let tree = host().bind(&arena, "First(Orders).Quantity", None);
    assert_eq!(
        segments(backing_path(&tree, tree.root.id())),
        Some(vec!["cr_orders".to_string(), "cr_qty".to_string()])
    );
}

#[test]
fn test_backing_path_from_the_row() {
    let arena = Bump::new();
    let host = host();
    let row = RowScope::new(
        RecordType::from_fields([(Name::new("cr_qty"), DType::Number)]).with_display_names({
            let mut names = DisplayNameMap::new();
            names.insert(Name::new("cr_qty"), Name::new("Quantity"));
            names
        }),
    );
    for source in ["ThisRecord.Quantity", "Quantity"] {
        let tree = host.bind(&arena, source, Some(&row));
        assert_eq!(
            segments(backing_path(&tree, tree.root.id())),
            Some(vec!["cr_qty".to_string()]),
            "{source}"
        );
    }
    let tree = host.bind(&arena, "ThisRecord", Some(&row));
    assert_eq!(backing_path(&tree, tree.root.id()), Some(Path::root()));
}

#[test]
fn test_backing_path_of_user_function() {
    let arena = Bump::new();
    let mut host = host();
    let global = host.global;
    host.graph
        .add_function(
            global,
            FunctionSignature::user_defined(Name::new("Double"), vec![DType::Number], DType::Number),
        )
        .unwrap();
    let tree = host.bind(&arena, "Double(2)", None);
    assert!(codes(&tree).is_empty());
    assert_eq!(tree.result_type(), DType::Number);
    assert_eq!(segments(backing_path(&tree, tree.root.id())), Some(vec!["Double".to_string()]));
}

#[test]
fn test_backing_path_fails_for_other_roots() {
    let arena = Bump::new();
    let host = host();
    for source in ["x.Value", "Filter(Orders, true)", "First(Orders).Missing", "Len(\"a\")"] {
        let tree = host.bind(&arena, source, None);
        assert_eq!(backing_path(&tree, tree.root.id()), None, "{source}");
    }
}
