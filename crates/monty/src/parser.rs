//! Recursive-descent statement parser with a precedence-climbing expression
//! parser underneath, sharing one token cursor and the diagnostics sink.
//!
//! Parse errors never abort the whole parse: after reporting an
//! error the offending statement resolves to `None` and the top-level loop
//! keeps going, having synchronized to the next statement boundary.

use crate::ast::{AssignPathSegment, Expr, FunctionDef, NumberLit, Stmt, SwitchCase, Visibility};
use crate::diagnostics::Diagnostics;
use crate::token::{Token, TokenKind};

pub fn parse(tokens: Vec<Token>, file: &str, diag: &mut Diagnostics) -> Vec<Stmt> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        file,
        diag,
    };
    let mut statements = Vec::new();
    while !parser.is_at_end() {
        if let Some(stmt) = parser.statement() {
            statements.push(stmt);
        }
    }
    statements
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    file: &'a str,
    diag: &'a mut Diagnostics,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_at(&self, ahead: usize) -> &Token {
        let idx = (self.pos + ahead).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::EndOfFile
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if !self.is_at_end() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            let line = self.peek().line;
            self.diag.error(format!("expected {what}, found '{}'", self.peek().lexeme), self.file, line);
            false
        }
    }

    /// Skips tokens until past the next `;` or up to (but not past) the
    /// next `}` / end of file, so later statements can still be parsed.
    fn synchronize(&mut self) {
        while !self.is_at_end() && !self.check(TokenKind::RightBrace) {
            if self.match_kind(TokenKind::Semicolon) {
                return;
            }
            self.advance();
        }
    }

    fn required_stmt(&mut self) -> Box<Stmt> {
        let line = self.peek().line;
        match self.statement() {
            Some(s) => Box::new(s),
            None => Box::new(Stmt::Block { statements: vec![], line }),
        }
    }

    fn statement(&mut self) -> Option<Stmt> {
        let result = match self.peek_kind() {
            TokenKind::Let => self.let_stmt(),
            TokenKind::If => self.if_stmt(),
            TokenKind::While => self.while_stmt(),
            TokenKind::Repeat => self.repeat_stmt(),
            TokenKind::For => self.for_stmt(),
            TokenKind::Foreach => self.foreach_stmt(),
            TokenKind::LeftBrace => self.block_stmt(),
            TokenKind::Public | TokenKind::Private | TokenKind::Function => self.function_stmt(),
            TokenKind::Return => self.return_stmt(),
            TokenKind::Enum => self.enum_stmt(),
            TokenKind::Macros => self.macros_stmt(),
            TokenKind::Break => {
                let line = self.advance().line;
                self.expect(TokenKind::Semicolon, "';'");
                Some(Stmt::Break { line })
            }
            TokenKind::Continue => {
                let line = self.advance().line;
                self.expect(TokenKind::Semicolon, "';'");
                Some(Stmt::Continue { line })
            }
            TokenKind::Switch => self.switch_stmt(),
            _ => self.expression_or_assignment_stmt(),
        };
        if result.is_none() {
            self.synchronize();
        }
        result
    }

    fn let_stmt(&mut self) -> Option<Stmt> {
        let line = self.advance().line;
        if !self.check(TokenKind::Identifier) {
            self.expect(TokenKind::Identifier, "a variable name");
            return None;
        }
        let name = self.advance().lexeme;
        if !self.expect(TokenKind::Equals, "'='") {
            return None;
        }
        let value = self.expression();
        self.expect(TokenKind::Semicolon, "';'");
        Some(Stmt::Assignment { is_let: true, name, value, line })
    }

    fn if_stmt(&mut self) -> Option<Stmt> {
        let line = self.advance().line;
        self.expect(TokenKind::LeftParen, "'('");
        let cond = self.expression();
        self.expect(TokenKind::RightParen, "')'");
        let then_branch = self.required_stmt();
        let else_branch = if self.match_kind(TokenKind::Else) {
            Some(self.required_stmt())
        } else {
            None
        };
        Some(Stmt::If { cond, then_branch, else_branch, line })
    }

    fn while_stmt(&mut self) -> Option<Stmt> {
        let line = self.advance().line;
        self.expect(TokenKind::LeftParen, "'('");
        let cond = self.expression();
        self.expect(TokenKind::RightParen, "')'");
        let body = self.required_stmt();
        Some(Stmt::While { cond, body, line })
    }

    fn repeat_stmt(&mut self) -> Option<Stmt> {
        let line = self.advance().line;
        self.expect(TokenKind::LeftParen, "'('");
        let count = self.expression();
        self.expect(TokenKind::RightParen, "')'");
        let body = self.required_stmt();
        Some(Stmt::Repeat { count, body, line })
    }

    fn for_stmt(&mut self) -> Option<Stmt> {
        let line = self.advance().line;
        self.expect(TokenKind::LeftParen, "'('");
        let init = if self.check(TokenKind::Semicolon) {
            self.advance();
            None
        } else {
            let s = self.expression_or_assignment_stmt();
            self.expect(TokenKind::Semicolon, "';'");
            s.map(Box::new)
        };
        let cond = if self.check(TokenKind::Semicolon) { None } else { Some(self.expression()) };
        self.expect(TokenKind::Semicolon, "';'");
        let step = if self.check(TokenKind::RightParen) {
            None
        } else {
            self.expression_or_assignment_stmt_no_semicolon().map(Box::new)
        };
        self.expect(TokenKind::RightParen, "')'");
        let body = self.required_stmt();
        Some(Stmt::For { init, cond, step, body, line })
    }

    fn foreach_stmt(&mut self) -> Option<Stmt> {
        let line = self.advance().line;
        self.expect(TokenKind::LeftParen, "'('");
        if !self.check(TokenKind::Identifier) {
            self.expect(TokenKind::Identifier, "a loop variable name");
            return None;
        }
        let var_name = self.advance().lexeme;
        self.expect(TokenKind::In, "'in'");
        let iterable = self.expression();
        self.expect(TokenKind::RightParen, "')'");
        let body = self.required_stmt();
        Some(Stmt::Foreach { var_name, iterable, body, line })
    }

    fn block_stmt(&mut self) -> Option<Stmt> {
        let line = self.advance().line;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.statement() {
                statements.push(stmt);
            }
        }
        self.expect(TokenKind::RightBrace, "'}'");
        Some(Stmt::Block { statements, line })
    }

    fn function_stmt(&mut self) -> Option<Stmt> {
        let line = self.peek().line;
        let visibility = match self.peek_kind() {
            TokenKind::Public => {
                self.advance();
                Visibility::Public
            }
            TokenKind::Private => {
                self.advance();
                Visibility::Private
            }
            _ => Visibility::Private,
        };
        self.expect(TokenKind::Function, "'function'");
        if !self.check(TokenKind::Identifier) {
            self.expect(TokenKind::Identifier, "a function name");
            return None;
        }
        let name = self.advance().lexeme;
        self.expect(TokenKind::LeftParen, "'('");
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if !self.check(TokenKind::Identifier) {
                    self.expect(TokenKind::Identifier, "a parameter name");
                    break;
                }
                params.push(self.advance().lexeme);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "')'");
        self.expect(TokenKind::LeftBrace, "'{'");
        let mut body = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.statement() {
                body.push(stmt);
            }
        }
        self.expect(TokenKind::RightBrace, "'}'");
        Some(Stmt::Function(FunctionDef { visibility, name, params, body, line }))
    }

    fn return_stmt(&mut self) -> Option<Stmt> {
        let line = self.advance().line;
        let value = if self.check(TokenKind::Semicolon) { None } else { Some(self.expression()) };
        self.expect(TokenKind::Semicolon, "';'");
        Some(Stmt::Return { value, line })
    }

    fn enum_stmt(&mut self) -> Option<Stmt> {
        let line = self.advance().line;
        if !self.check(TokenKind::Identifier) {
            self.expect(TokenKind::Identifier, "an enum name");
            return None;
        }
        let name = self.advance().lexeme;
        self.expect(TokenKind::LeftBrace, "'{'");
        let mut members = Vec::new();
        let mut next_value: i64 = 0;
        if !self.check(TokenKind::RightBrace) {
            loop {
                if !self.check(TokenKind::Identifier) {
                    self.expect(TokenKind::Identifier, "an enum member name");
                    break;
                }
                let member_name = self.advance().lexeme;
                if self.match_kind(TokenKind::Equals) {
                    let value_line = self.peek().line;
                    if self.check(TokenKind::Number) {
                        let lexeme = self.advance().lexeme;
                        next_value = lexeme.parse().unwrap_or_else(|_| {
                            self.diag.error(format!("invalid enum value '{lexeme}'"), self.file, value_line);
                            0
                        });
                    } else {
                        self.expect(TokenKind::Number, "an integer literal");
                    }
                }
                members.push((member_name, next_value));
                next_value += 1;
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightBrace, "'}'");
        Some(Stmt::Enum { name, members, line })
    }

    fn macros_stmt(&mut self) -> Option<Stmt> {
        let line = self.advance().line;
        if !self.check(TokenKind::Identifier) {
            self.expect(TokenKind::Identifier, "a name");
            return None;
        }
        let name = self.advance().lexeme;
        self.expect(TokenKind::Equals, "'='");
        let value = self.expression();
        self.expect(TokenKind::Semicolon, "';'");
        Some(Stmt::Macros { name, value, line })
    }

    fn switch_stmt(&mut self) -> Option<Stmt> {
        let line = self.advance().line;
        self.expect(TokenKind::LeftParen, "'('");
        let scrutinee = self.expression();
        self.expect(TokenKind::RightParen, "')'");
        self.expect(TokenKind::LeftBrace, "'{'");
        let mut cases = Vec::new();
        let mut default = None;
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if self.match_kind(TokenKind::Case) {
                let pattern = self.expression();
                self.expect(TokenKind::Colon, "':'");
                let mut body = Vec::new();
                while !matches!(self.peek_kind(), TokenKind::Case | TokenKind::Default | TokenKind::RightBrace) {
                    if let Some(stmt) = self.statement() {
                        body.push(stmt);
                    }
                }
                cases.push(SwitchCase { pattern, body });
            } else if self.match_kind(TokenKind::Default) {
                self.expect(TokenKind::Colon, "':'");
                let mut body = Vec::new();
                while !matches!(self.peek_kind(), TokenKind::Case | TokenKind::Default | TokenKind::RightBrace) {
                    if let Some(stmt) = self.statement() {
                        body.push(stmt);
                    }
                }
                default = Some(body);
            } else {
                let line = self.peek().line;
                self.diag.error(format!("expected 'case' or 'default', found '{}'", self.peek().lexeme), self.file, line);
                self.advance();
            }
        }
        self.expect(TokenKind::RightBrace, "'}'");
        Some(Stmt::Switch { scrutinee, cases, default, line })
    }

    fn expression_or_assignment_stmt(&mut self) -> Option<Stmt> {
        let stmt = self.expression_or_assignment_stmt_no_semicolon()?;
        self.expect(TokenKind::Semicolon, "';'");
        Some(stmt)
    }

    /// Shared by ordinary expression statements and `for (...)` clauses,
    /// which supply their own `;`/`)` terminator.
    fn expression_or_assignment_stmt_no_semicolon(&mut self) -> Option<Stmt> {
        let line = self.peek().line;
        let expr = self.expression();
        if self.match_kind(TokenKind::Equals) {
            let value = self.expression();
            match expr_to_assign_target(expr) {
                Some(AssignTarget::Name(name)) => Some(Stmt::Assignment { is_let: false, name, value, line }),
                Some(AssignTarget::Path(base, path)) => Some(Stmt::IndexAssignment { base, path, value, line }),
                None => {
                    self.diag.error("invalid assignment target", self.file, line);
                    None
                }
            }
        } else {
            Some(Stmt::Expression { expr, line })
        }
    }

    // ---- expressions, precedence lowest to highest ----

    fn expression(&mut self) -> Expr {
        self.logical()
    }

    fn logical(&mut self) -> Expr {
        let mut left = self.equality();
        while matches!(self.peek_kind(), TokenKind::And | TokenKind::Or) {
            let line = self.peek().line;
            let op = self.advance().lexeme;
            let right = self.equality();
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), line };
        }
        left
    }

    fn equality(&mut self) -> Expr {
        let mut left = self.additive();
        while matches!(
            self.peek_kind(),
            TokenKind::EqualEqual | TokenKind::BangEqual | TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual
        ) {
            let line = self.peek().line;
            let op = self.advance().lexeme;
            let right = self.additive();
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), line };
        }
        left
    }

    fn additive(&mut self) -> Expr {
        let mut left = self.multiplicative();
        while matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
            let line = self.peek().line;
            let op = self.advance().lexeme;
            let right = self.multiplicative();
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), line };
        }
        left
    }

    fn multiplicative(&mut self) -> Expr {
        let mut left = self.unary();
        while matches!(self.peek_kind(), TokenKind::Star | TokenKind::Slash) {
            let line = self.peek().line;
            let op = self.advance().lexeme;
            let right = self.unary();
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), line };
        }
        left
    }

    fn unary(&mut self) -> Expr {
        match self.peek_kind() {
            TokenKind::Bang => {
                let line = self.advance().line;
                Expr::Unary { op: '!', operand: Box::new(self.unary()), line }
            }
            TokenKind::Minus => {
                let line = self.advance().line;
                Expr::Unary { op: '-', operand: Box::new(self.unary()), line }
            }
            TokenKind::Plus => {
                let line = self.advance().line;
                Expr::Unary { op: '+', operand: Box::new(self.unary()), line }
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Expr {
        let mut expr = self.primary();
        loop {
            match self.peek_kind() {
                TokenKind::LeftParen => {
                    let line = self.advance().line;
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RightParen) {
                        loop {
                            args.push(self.expression());
                            if !self.match_kind(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RightParen, "')'");
                    expr = Expr::Call { callee: Box::new(expr), args, line };
                }
                TokenKind::LeftBracket => {
                    let line = self.advance().line;
                    let index = self.expression();
                    self.expect(TokenKind::RightBracket, "']'");
                    expr = Expr::Index { container: Box::new(expr), index: Box::new(index), line };
                }
                TokenKind::Dot => {
                    let line = self.advance().line;
                    if !self.check(TokenKind::Identifier) {
                        self.expect(TokenKind::Identifier, "a field name");
                        break;
                    }
                    let field = self.advance().lexeme;
                    expr = Expr::Member { object: Box::new(expr), field, line };
                }
                _ => break,
            }
        }
        expr
    }

    fn primary(&mut self) -> Expr {
        let line = self.peek().line;
        match self.peek_kind() {
            TokenKind::Number => {
                let lexeme = self.advance().lexeme;
                let value = parse_number_lexeme(&lexeme);
                Expr::Number { value, line }
            }
            TokenKind::String => {
                let value = self.advance().lexeme;
                Expr::Str { value, line }
            }
            TokenKind::True => {
                self.advance();
                Expr::Bool { value: true, line }
            }
            TokenKind::False => {
                self.advance();
                Expr::Bool { value: false, line }
            }
            TokenKind::Identifier => {
                let name = self.advance().lexeme;
                Expr::Variable { name, line }
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression();
                self.expect(TokenKind::RightParen, "')'");
                expr
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RightBracket) {
                    loop {
                        elements.push(self.expression());
                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RightBracket, "']'");
                Expr::ArrayLiteral { elements, line }
            }
            TokenKind::LeftBrace => self.brace_literal(),
            _ => {
                let lexeme = self.peek().lexeme.clone();
                self.diag.error(format!("expected an expression, found '{lexeme}'"), self.file, line);
                if !self.is_at_end() {
                    self.advance();
                }
                Expr::Bool { value: false, line }
            }
        }
    }

    /// `{}` with bare identifiers (no `:`) is a struct template; `{}` with
    /// `key: value` pairs is a dictionary literal. See `DESIGN.md` for why
    /// this lookahead rule was chosen over a dedicated sigil.
    fn brace_literal(&mut self) -> Expr {
        let line = self.advance().line;
        if self.match_kind(TokenKind::RightBrace) {
            return Expr::StructLiteral { fields: vec![], line };
        }
        let is_struct = self.check(TokenKind::Identifier)
            && matches!(self.peek_at(1).kind, TokenKind::Comma | TokenKind::RightBrace);
        if is_struct {
            let mut fields = Vec::new();
            loop {
                if !self.check(TokenKind::Identifier) {
                    self.expect(TokenKind::Identifier, "a field name");
                    break;
                }
                fields.push(self.advance().lexeme);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RightBrace, "'}'");
            Expr::StructLiteral { fields, line }
        } else {
            let mut entries = Vec::new();
            loop {
                let key = self.expression();
                self.expect(TokenKind::Colon, "':'");
                let value = self.expression();
                entries.push((key, value));
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RightBrace, "'}'");
            Expr::DictLiteral { entries, line }
        }
    }
}

enum AssignTarget {
    Name(String),
    Path(String, Vec<AssignPathSegment>),
}

/// Converts a parsed expression into an assignment target, if it is a bare
/// name or an index/member chain rooted at one. Segments come back ordered
/// from the base outward, the same order the evaluator walks them in.
fn expr_to_assign_target(expr: Expr) -> Option<AssignTarget> {
    match expr {
        Expr::Variable { name, .. } => Some(AssignTarget::Name(name)),
        Expr::Index { .. } | Expr::Member { .. } => {
            let mut segments = Vec::new();
            let mut current = expr;
            loop {
                match current {
                    Expr::Index { container, index, .. } => {
                        segments.push(AssignPathSegment::Index(*index));
                        current = *container;
                    }
                    Expr::Member { object, field, .. } => {
                        segments.push(AssignPathSegment::Field(field));
                        current = *object;
                    }
                    Expr::Variable { name, .. } => {
                        segments.reverse();
                        return Some(AssignTarget::Path(name, segments));
                    }
                    _ => return None,
                }
            }
        }
        _ => None,
    }
}

fn parse_number_lexeme(lexeme: &str) -> NumberLit {
    if lexeme.contains('.') {
        NumberLit::Float(lexeme.parse().unwrap_or(0.0))
    } else {
        NumberLit::Int(lexeme.parse().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse_src(src: &str) -> (Vec<Stmt>, Diagnostics) {
        let mut diag = Diagnostics::new();
        let tokens = Lexer::new(src, "test.mt").tokenize(&mut diag);
        let stmts = parse(tokens, "test.mt", &mut diag);
        (stmts, diag)
    }

    #[test]
    fn parses_let_and_arithmetic_precedence() {
        let (stmts, diag) = parse_src("let x = 2 + 3 * 4;");
        assert!(!diag.has_error());
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Stmt::Assignment { is_let, name, value, .. } => {
                assert!(is_let);
                assert_eq!(name, "x");
                match value {
                    Expr::Binary { op, left, right, .. } => {
                        assert_eq!(op, "+");
                        assert!(matches!(**left, Expr::Number { value: NumberLit::Int(2), .. }));
                        assert!(matches!(**right, Expr::Binary { .. }));
                    }
                    _ => panic!("expected binary expr"),
                }
            }
            _ => panic!("expected assignment"),
        }
    }

    #[test]
    fn parses_index_assignment_chain() {
        let (stmts, diag) = parse_src("a[0][1] = 9;");
        assert!(!diag.has_error());
        match &stmts[0] {
            Stmt::IndexAssignment { base, path, .. } => {
                assert_eq!(base, "a");
                assert_eq!(path.len(), 2);
            }
            other => panic!("expected index assignment, got {other:?}"),
        }
    }

    #[test]
    fn parses_function_with_visibility() {
        let (stmts, diag) = parse_src("public function add(a, b) { return a + b; }");
        assert!(!diag.has_error());
        match &stmts[0] {
            Stmt::Function(def) => {
                assert_eq!(def.visibility, Visibility::Public);
                assert_eq!(def.name, "add");
                assert_eq!(def.params, vec!["a".to_string(), "b".to_string()]);
            }
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn missing_semicolon_reports_error_and_recovers() {
        let (stmts, diag) = parse_src("let x = 1\nlet y = 2;");
        assert!(diag.has_error());
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Stmt::Assignment { name, .. } => assert_eq!(name, "y"),
            _ => panic!("expected recovery to reach second statement"),
        }
    }

    #[test]
    fn struct_literal_vs_dict_literal_lookahead() {
        let (stmts, diag) = parse_src("let p = {x, y}; let d = {\"a\": 1};");
        assert!(!diag.has_error());
        assert!(matches!(&stmts[0], Stmt::Assignment { value: Expr::StructLiteral { .. }, .. }));
        assert!(matches!(&stmts[1], Stmt::Assignment { value: Expr::DictLiteral { .. }, .. }));
    }

    #[test]
    fn enum_statement_auto_numbers_and_resets() {
        let (stmts, diag) = parse_src("enum Dir { Up, Down = 10, Left, Right }");
        assert!(!diag.has_error());
        match &stmts[0] {
            Stmt::Enum { members, .. } => {
                assert_eq!(
                    members,
                    &vec![
                        ("Up".to_string(), 0),
                        ("Down".to_string(), 10),
                        ("Left".to_string(), 11),
                        ("Right".to_string(), 12),
                    ]
                );
            }
            _ => panic!("expected enum"),
        }
    }
}
