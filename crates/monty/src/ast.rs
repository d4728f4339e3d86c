//! Expression and statement node families produced by the parser.
//!
//! Every node carries the source line/column it started at so the
//! evaluator can attach positions to the diagnostics it raises. The
//! evaluator dispatches over these with an ordinary `match`; see
//! `DESIGN.md` for why this crate uses a sum type here rather than a
//! classic visitor-with-dynamic-dispatch.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number { value: NumberLit, line: u32 },
    Str { value: String, line: u32 },
    Bool { value: bool, line: u32 },
    Variable { name: String, line: u32 },
    Unary { op: char, operand: Box<Expr>, line: u32 },
    Binary { op: String, left: Box<Expr>, right: Box<Expr>, line: u32 },
    Call { callee: Box<Expr>, args: Vec<Expr>, line: u32 },
    ArrayLiteral { elements: Vec<Expr>, line: u32 },
    DictLiteral { entries: Vec<(Expr, Expr)>, line: u32 },
    StructLiteral { fields: Vec<String>, line: u32 },
    Index { container: Box<Expr>, index: Box<Expr>, line: u32 },
    Member { object: Box<Expr>, field: String, line: u32 },
}

/// A numeric literal as the lexer/parser saw it: integer lexemes (no `.`)
/// stay `Int`, everything else becomes `Float`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberLit {
    Int(i64),
    Float(f64),
}

impl Expr {
    pub fn line(&self) -> u32 {
        match self {
            Self::Number { line, .. }
            | Self::Str { line, .. }
            | Self::Bool { line, .. }
            | Self::Variable { line, .. }
            | Self::Unary { line, .. }
            | Self::Binary { line, .. }
            | Self::Call { line, .. }
            | Self::ArrayLiteral { line, .. }
            | Self::DictLiteral { line, .. }
            | Self::StructLiteral { line, .. }
            | Self::Index { line, .. }
            | Self::Member { line, .. } => *line,
        }
    }
}

/// A chain of index/member accessors used on the left-hand side of an
/// index-assignment statement, e.g. `a[i][j].field = expr;`.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignPathSegment {
    Index(Expr),
    Field(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub visibility: Visibility,
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub pattern: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assignment { is_let: bool, name: String, value: Expr, line: u32 },
    Expression { expr: Expr, line: u32 },
    If { cond: Expr, then_branch: Box<Stmt>, else_branch: Option<Box<Stmt>>, line: u32 },
    While { cond: Expr, body: Box<Stmt>, line: u32 },
    Repeat { count: Expr, body: Box<Stmt>, line: u32 },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Box<Stmt>>,
        body: Box<Stmt>,
        line: u32,
    },
    Foreach { var_name: String, iterable: Expr, body: Box<Stmt>, line: u32 },
    Block { statements: Vec<Stmt>, line: u32 },
    Function(FunctionDef),
    Return { value: Option<Expr>, line: u32 },
    IndexAssignment { base: String, path: Vec<AssignPathSegment>, value: Expr, line: u32 },
    Enum { name: String, members: Vec<(String, i64)>, line: u32 },
    Macros { name: String, value: Expr, line: u32 },
    Break { line: u32 },
    Continue { line: u32 },
    Switch { scrutinee: Expr, cases: Vec<SwitchCase>, default: Option<Vec<Stmt>>, line: u32 },
}

impl Stmt {
    pub fn line(&self) -> u32 {
        match self {
            Self::Assignment { line, .. }
            | Self::Expression { line, .. }
            | Self::If { line, .. }
            | Self::While { line, .. }
            | Self::Repeat { line, .. }
            | Self::For { line, .. }
            | Self::Foreach { line, .. }
            | Self::Block { line, .. }
            | Self::Return { line, .. }
            | Self::IndexAssignment { line, .. }
            | Self::Enum { line, .. }
            | Self::Macros { line, .. }
            | Self::Break { line }
            | Self::Continue { line }
            | Self::Switch { line, .. } => *line,
            Self::Function(f) => f.line,
        }
    }
}
