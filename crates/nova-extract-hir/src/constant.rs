use crate::decl::{DeclData, Modifiers};
use crate::hir::{DeclId, LiteralKind, Node, NodeId};
use crate::SourceFile;

impl SourceFile {
    /// Whether `node` is a compile-time constant expression.
    ///
    /// Follows JLS 15.29 for the shapes the model knows about: literals other
    /// than `null`, unary/binary/parenthesized combinations of constants, and
    /// names of `final` fields that are themselves initialized with a
    /// constant. Everything else (calls, `new`, casts, conditionals, unresolved
    /// names) is treated as non-constant.
    #[must_use]
    pub fn is_constant_expression(&self, node: NodeId) -> bool {
        let mut visiting = Vec::new();
        self.is_constant_inner(node, &mut visiting)
    }

    fn is_constant_inner(&self, node: NodeId, visiting: &mut Vec<DeclId>) -> bool {
        match self.node(node) {
            Node::Literal { kind, .. } => *kind != LiteralKind::Null,
            Node::Paren { inner, .. } => self.is_constant_inner(*inner, visiting),
            Node::Unary { operand, .. } => self.is_constant_inner(*operand, visiting),
            Node::Binary { lhs, rhs, .. } => {
                self.is_constant_inner(*lhs, visiting) && self.is_constant_inner(*rhs, visiting)
            }
            Node::Name {
                resolved: Some(decl),
                ..
            }
            | Node::FieldAccess {
                resolved: Some(decl),
                ..
            } => self.is_constant_variable(*decl, visiting),
            _ => false,
        }
    }

    fn is_constant_variable(&self, decl: DeclId, visiting: &mut Vec<DeclId>) -> bool {
        if visiting.contains(&decl) {
            return false;
        }
        let target = self.decl(decl);
        if !target.modifiers.contains(Modifiers::FINAL) {
            return false;
        }
        let DeclData::Field(field) = &target.data else {
            return false;
        };
        let Some(init) = field.initializer else {
            return false;
        };
        visiting.push(decl);
        let constant = self.is_constant_inner(init, visiting);
        visiting.pop();
        constant
    }
}
