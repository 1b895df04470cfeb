use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open `[start, end)` UTF-8 byte range into the file text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(u32);

impl DeclId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        DeclId(raw)
    }

    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeclId({})", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arena<T> {
    data: Vec<T>,
}

impl<T> Arena<T> {
    pub fn alloc(&mut self, value: T) -> u32 {
        let idx = self.data.len() as u32;
        self.data.push(value);
        idx
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.data.iter().enumerate().map(|(i, v)| (i as u32, v))
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.data.get_mut(idx)
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena { data: Vec::new() }
    }
}

impl<T> std::ops::Index<NodeId> for Arena<T> {
    type Output = T;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.data[index.idx()]
    }
}

impl<T> std::ops::Index<DeclId> for Arena<T> {
    type Output = T;

    fn index(&self, index: DeclId) -> &Self::Output {
        &self.data[index.idx()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    TextBlock,
    Bool,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            ">>>" => BinaryOp::UShr,
            "&" => BinaryOp::BitAnd,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            _ => return None,
        })
    }

    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

/// `=` or one of the eleven compound assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Plain,
    Compound(BinaryOp),
}

impl AssignOp {
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        if token == "=" {
            return Some(AssignOp::Plain);
        }
        let op = BinaryOp::from_token(token.strip_suffix('=')?)?;
        match op {
            BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Rem
            | BinaryOp::Add
            | BinaryOp::Sub
            | BinaryOp::Shl
            | BinaryOp::Shr
            | BinaryOp::UShr
            | BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::BitXor => Some(AssignOp::Compound(op)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOp {
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UpdateOp {
    #[must_use]
    pub fn is_increment(self) -> bool {
        matches!(self, UpdateOp::PreIncrement | UpdateOp::PostIncrement)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
}

impl UnaryOp {
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "+" => UnaryOp::Plus,
            "-" => UnaryOp::Minus,
            "!" => UnaryOp::Not,
            "~" => UnaryOp::BitNot,
            _ => return None,
        })
    }
}

/// One syntax node. Every node covers `span` in the file text; anything between
/// two children (operators, punctuation, whitespace, comments) is kept as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Token {
        span: Span,
    },
    Literal {
        kind: LiteralKind,
        span: Span,
    },
    Name {
        name: String,
        resolved: Option<DeclId>,
        span: Span,
    },
    TypeName {
        name: String,
        resolved: Option<DeclId>,
        span: Span,
    },
    This {
        qualifier: Option<String>,
        resolved: Option<DeclId>,
        span: Span,
    },
    FieldAccess {
        receiver: NodeId,
        name: String,
        name_span: Span,
        resolved: Option<DeclId>,
        shadowed: bool,
        span: Span,
    },
    Call {
        receiver: Option<NodeId>,
        name: String,
        name_span: Span,
        args: NodeId,
        resolved: Option<DeclId>,
        span: Span,
    },
    Assign {
        op: AssignOp,
        lhs: NodeId,
        rhs: NodeId,
        span: Span,
    },
    Update {
        op: UpdateOp,
        operand: NodeId,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
        span: Span,
    },
    Paren {
        inner: NodeId,
        span: Span,
    },
    ExprStatement {
        expr: NodeId,
        span: Span,
    },
    Tree {
        children: Vec<NodeId>,
        span: Span,
    },
}

impl Node {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Node::Token { span }
            | Node::Literal { span, .. }
            | Node::Name { span, .. }
            | Node::TypeName { span, .. }
            | Node::This { span, .. }
            | Node::FieldAccess { span, .. }
            | Node::Call { span, .. }
            | Node::Assign { span, .. }
            | Node::Update { span, .. }
            | Node::Unary { span, .. }
            | Node::Binary { span, .. }
            | Node::Paren { span, .. }
            | Node::ExprStatement { span, .. }
            | Node::Tree { span, .. } => *span,
        }
    }

    /// Child nodes in source order.
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Node::Token { .. }
            | Node::Literal { .. }
            | Node::Name { .. }
            | Node::TypeName { .. }
            | Node::This { .. } => Vec::new(),
            Node::FieldAccess { receiver, .. } => vec![*receiver],
            Node::Call { receiver, args, .. } => receiver.iter().copied().chain([*args]).collect(),
            Node::Assign { lhs, rhs, .. } | Node::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            Node::Update { operand, .. } | Node::Unary { operand, .. } => vec![*operand],
            Node::Paren { inner, .. } => vec![*inner],
            Node::ExprStatement { expr, .. } => vec![*expr],
            Node::Tree { children, .. } => children.clone(),
        }
    }

    /// The declaration this node refers to, if it is a reference at all.
    #[must_use]
    pub fn resolved(&self) -> Option<DeclId> {
        match self {
            Node::Name { resolved, .. }
            | Node::TypeName { resolved, .. }
            | Node::This { resolved, .. }
            | Node::FieldAccess { resolved, .. }
            | Node::Call { resolved, .. } => *resolved,
            _ => None,
        }
    }

    /// Whether this node is a reference that a resolver is expected to resolve.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Node::Name { .. }
                | Node::TypeName { .. }
                | Node::This { .. }
                | Node::FieldAccess { .. }
                | Node::Call { .. }
        )
    }

    /// Primary expressions never need parentheses when spliced into a larger
    /// expression.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        matches!(
            self,
            Node::Literal { .. }
                | Node::Name { .. }
                | Node::This { .. }
                | Node::FieldAccess { .. }
                | Node::Call { .. }
                | Node::Paren { .. }
        )
    }
}
