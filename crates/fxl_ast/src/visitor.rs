//! Syntax tree visitor for traversing formula expressions.
//!
//! Provides an `AstVisitor` trait for customizable traversal and a
//! `for_each_child` function for generic iteration over direct children.

use crate::node::*;

/// A visitor over expressions. Default implementations walk into children.
pub trait AstVisitor<'a> {
    fn visit_expr(&mut self, expr: Expr<'a>) {
        walk_expr(self, expr);
    }

    fn visit_identifier(&mut self, _node: &'a Identifier<'a>) {}

    fn visit_call(&mut self, node: &'a CallExpr<'a>) {
        for arg in node.args.iter() {
            self.visit_expr(*arg);
        }
    }

    fn visit_dotted(&mut self, node: &'a DottedExpr<'a>) {
        self.visit_expr(node.object);
    }

    fn visit_document(&mut self, doc: &Document<'a>) {
        for item in doc.items.iter() {
            match item {
                DocItem::Formula(f) => self.visit_expr(f.body),
                DocItem::Udf(u) => match u.body {
                    UdfBody::Expr(e) => self.visit_expr(e),
                    UdfBody::Block(b) => {
                        for stmt in b.statements.iter() {
                            self.visit_expr(*stmt);
                        }
                    }
                },
            }
        }
    }
}

/// Dispatch one expression to the matching visitor hook, then walk the
/// remaining children.
pub fn walk_expr<'a, V: AstVisitor<'a> + ?Sized>(visitor: &mut V, expr: Expr<'a>) {
    match expr {
        Expr::Ident(n) => visitor.visit_identifier(n),
        Expr::Call(n) => visitor.visit_call(n),
        Expr::Dotted(n) => visitor.visit_dotted(n),
        _ => for_each_child(expr, |child| visitor.visit_expr(child)),
    }
}

/// Call `f` on every direct child expression, in source order.
pub fn for_each_child<'a>(expr: Expr<'a>, mut f: impl FnMut(Expr<'a>)) {
    match expr {
        Expr::Number(_)
        | Expr::String(_)
        | Expr::Boolean(_)
        | Expr::Ident(_)
        | Expr::Error(_) => {}
        Expr::Unary(n) => f(n.operand),
        Expr::Binary(n) => {
            f(n.left);
            f(n.right);
        }
        Expr::Chain(n) => n.items.iter().for_each(|e| f(*e)),
        Expr::Dotted(n) => f(n.object),
        Expr::Call(n) => n.args.iter().for_each(|e| f(*e)),
        Expr::Record(n) => n.fields.iter().for_each(|field| f(field.value)),
        Expr::Table(n) => n.items.iter().for_each(|e| f(*e)),
        Expr::Interpolation(n) => {
            for part in n.parts.iter() {
                if let InterpolationPart::Expr(e) = part {
                    f(*e);
                }
            }
        }
        Expr::As(n) => f(n.operand),
    }
}

/// Count every expression node in a tree, `expr` included.
pub fn count_nodes(expr: Expr<'_>) -> usize {
    struct Counter(usize);
    impl<'a> AstVisitor<'a> for Counter {
        fn visit_expr(&mut self, expr: Expr<'a>) {
            self.0 += 1;
            for_each_child(expr, |child| self.visit_expr(child));
        }
    }
    let mut counter = Counter(0);
    counter.visit_expr(expr);
    counter.0
}
