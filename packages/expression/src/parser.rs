use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{tokenize, Token};
use filament_common::{parse_number, Value};

/// Parser for template expressions
pub struct Parser<'src> {
    tokens: Vec<(Token<'src>, std::ops::Range<usize>)>,
    pos: usize,
    source_len: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> ParseResult<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            source_len: source.len(),
        })
    }

    /// Parse `stmt (';' stmt)* ';'?`
    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut statements = Vec::new();

        while self.match_token(Token::Semicolon) {}

        if self.is_at_end() {
            return Err(ParseError::unexpected_eof(self.source_len, "expression"));
        }

        while !self.is_at_end() {
            statements.push(self.parse_expression()?);

            if self.is_at_end() {
                break;
            }
            self.expect(Token::Semicolon)?;
            while self.match_token(Token::Semicolon) {}
        }

        Ok(Program { statements })
    }

    /// Parse a single expression and require that nothing follows it
    pub fn parse_single(&mut self) -> ParseResult<Expr> {
        if self.is_at_end() {
            return Err(ParseError::unexpected_eof(self.source_len, "expression"));
        }
        let expr = self.parse_expression()?;
        if !self.is_at_end() {
            return Err(ParseError::unexpected_token(
                self.peek_span(),
                "end of expression",
                Self::format_token(self.peek()),
            ));
        }
        Ok(expr)
    }

    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_assignment()
    }

    /// Parse assignment (lowest precedence, right associative)
    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        let target = self.parse_conditional()?;

        let operator = match self.peek() {
            Some((Token::Equals, _)) => AssignOp::Assign,
            Some((Token::PlusEquals, _)) => AssignOp::AddAssign,
            Some((Token::MinusEquals, _)) => AssignOp::SubtractAssign,
            Some((Token::StarEquals, _)) => AssignOp::MultiplyAssign,
            Some((Token::SlashEquals, _)) => AssignOp::DivideAssign,
            _ => return Ok(target),
        };

        if !target.is_assignable() {
            return Err(ParseError::invalid_syntax(
                self.peek_span(),
                "Invalid assignment target",
            ));
        }
        self.advance();

        let value = self.parse_assignment()?;
        let span = target.span().to(value.span());
        Ok(Expr::Assign {
            target: Box::new(target),
            operator,
            value: Box::new(value),
            span,
        })
    }

    /// Parse `test ? a : b`
    fn parse_conditional(&mut self) -> ParseResult<Expr> {
        let test = self.parse_nullish()?;

        if !self.match_token(Token::Question) {
            return Ok(test);
        }

        let consequent = self.parse_assignment()?;
        self.expect(Token::Colon)?;
        let alternate = self.parse_assignment()?;
        let span = test.span().to(alternate.span());

        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span,
        })
    }

    fn parse_nullish(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_or()?;

        while self.match_token(Token::QuestionQuestion) {
            let right = self.parse_or()?;
            left = Self::logical(left, LogicalOp::Nullish, right);
        }

        Ok(left)
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;

        while self.match_token(Token::Or) {
            let right = self.parse_and()?;
            left = Self::logical(left, LogicalOp::Or, right);
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_equality()?;

        while self.match_token(Token::And) {
            let right = self.parse_equality()?;
            left = Self::logical(left, LogicalOp::And, right);
        }

        Ok(left)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_comparison()?;

        while let Some(operator) = self.match_equality_op() {
            let right = self.parse_comparison()?;
            left = Self::binary(left, operator, right);
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;

        while let Some(operator) = self.match_comparison_op() {
            let right = self.parse_additive()?;
            left = Self::binary(left, operator, right);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        while let Some(operator) = self.match_additive_op() {
            let right = self.parse_multiplicative()?;
            left = Self::binary(left, operator, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;

        while let Some(operator) = self.match_multiplicative_op() {
            let right = self.parse_unary()?;
            left = Self::binary(left, operator, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let operator = match self.peek() {
            Some((Token::Bang, _)) => UnaryOp::Not,
            Some((Token::Minus, _)) => UnaryOp::Negate,
            Some((Token::Plus, _)) => UnaryOp::Plus,
            Some((Token::Typeof, _)) => UnaryOp::Typeof,
            _ => return self.parse_postfix(),
        };
        let start = self.peek_span();
        self.advance();

        let operand = self.parse_unary()?;
        let span = start.to(operand.span());
        Ok(Expr::Unary {
            operator,
            operand: Box::new(operand),
            span,
        })
    }

    /// Parse member access, indexing and calls: `a.b[c](d)`
    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.match_token(Token::Dot) {
                let property = self.expect_property_name()?;
                let span = expr.span().to(self.current_span());
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                    span,
                };
            } else if self.match_token(Token::LBracket) {
                let index = self.parse_expression()?;
                self.expect(Token::RBracket)?;
                let span = expr.span().to(self.current_span());
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    span,
                };
            } else if self.match_token(Token::LParen) {
                let arguments = self.parse_list(Token::RParen)?;
                let span = expr.span().to(self.current_span());
                expr = Expr::Call {
                    callee: Box::new(expr),
                    arguments,
                    span,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let span = self.peek_span();

        match self.peek() {
            Some((Token::Number(n), _)) => {
                let value = parse_number(n);
                self.advance();
                Ok(Expr::Literal {
                    value: Value::Number(value),
                    span,
                })
            }
            Some((Token::String(s), _)) => {
                let value = unescape(&s[1..s.len() - 1]);
                self.advance();
                Ok(Expr::Literal {
                    value: Value::String(value),
                    span,
                })
            }
            Some((Token::Template(t), _)) => {
                let template: &'src str = *t;
                let body = &template[1..template.len() - 1];
                self.advance();
                self.parse_template_string(body, span)
            }
            Some((Token::True, _)) => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::Boolean(true),
                    span,
                })
            }
            Some((Token::False, _)) => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::Boolean(false),
                    span,
                })
            }
            Some((Token::Null, _)) | Some((Token::Undefined, _)) => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::Null,
                    span,
                })
            }
            Some((Token::Ident(name), _)) => {
                let name = name.to_string();
                self.advance();
                Ok(Expr::Identifier { name, span })
            }
            Some((Token::LParen, _)) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some((Token::LBracket, _)) => {
                self.advance();
                let items = self.parse_list(Token::RBracket)?;
                Ok(Expr::Array {
                    items,
                    span: span.to(self.current_span()),
                })
            }
            Some((Token::LBrace, _)) => {
                self.advance();
                self.parse_object_literal(span)
            }
            Some(_) => Err(ParseError::unexpected_token(
                span,
                "expression",
                Self::format_token(self.peek()),
            )),
            None => Err(ParseError::unexpected_eof(self.source_len, "expression")),
        }
    }

    /// Parse comma separated expressions up to `close`; a trailing comma is allowed.
    fn parse_list(&mut self, close: Token) -> ParseResult<Vec<Expr>> {
        let mut items = Vec::new();

        while !self.check(close.clone()) && !self.is_at_end() {
            items.push(self.parse_expression()?);

            if !self.match_token(Token::Comma) {
                break;
            }
        }

        self.expect(close)?;
        Ok(items)
    }

    /// Parse `{ key: value, 'quoted-key': value, shorthand }` after the opening brace
    fn parse_object_literal(&mut self, start: Span) -> ParseResult<Expr> {
        let mut entries = Vec::new();

        while !self.check(Token::RBrace) && !self.is_at_end() {
            let key_span = self.peek_span();
            let (key, shorthand) = match self.peek() {
                Some((Token::Ident(name), _)) => (name.to_string(), true),
                Some((Token::String(s), _)) => (unescape(&s[1..s.len() - 1]), false),
                Some((Token::Number(n), _)) => {
                    (filament_common::format_number(parse_number(n)), false)
                }
                Some((Token::True, _)) => ("true".to_string(), false),
                Some((Token::False, _)) => ("false".to_string(), false),
                Some((Token::Null, _)) => ("null".to_string(), false),
                _ => {
                    return Err(ParseError::unexpected_token(
                        key_span,
                        "property name",
                        Self::format_token(self.peek()),
                    ))
                }
            };
            self.advance();

            let value = if self.match_token(Token::Colon) {
                self.parse_expression()?
            } else if shorthand {
                Expr::Identifier {
                    name: key.clone(),
                    span: key_span,
                }
            } else {
                return Err(ParseError::unexpected_token(
                    self.peek_span(),
                    "':'",
                    Self::format_token(self.peek()),
                ));
            };
            entries.push((key, value));

            if !self.match_token(Token::Comma) {
                break;
            }
        }

        self.expect(Token::RBrace)?;
        Ok(Expr::Object {
            entries,
            span: start.to(self.current_span()),
        })
    }

    /// Parse template string with ${...} interpolation
    fn parse_template_string(&mut self, body: &str, span: Span) -> ParseResult<Expr> {
        let mut parts = Vec::new();
        let mut current = String::new();
        // body starts one byte after the opening backtick
        let base = span.start + 1;
        let mut chars = body.char_indices().peekable();

        while let Some((_, ch)) = chars.next() {
            if ch == '$' && matches!(chars.peek(), Some((_, '{'))) {
                chars.next();

                if !current.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut current)));
                }

                let hole_start = chars.peek().map(|(i, _)| *i).unwrap_or(body.len());
                let mut hole_end = body.len();
                let mut depth = 1;
                let mut closed = false;
                for (i, c) in chars.by_ref() {
                    match c {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                hole_end = i;
                                closed = true;
                                break;
                            }
                        }
                        _ => {}
                    }
                }

                if !closed {
                    return Err(ParseError::invalid_syntax(
                        span,
                        "Unterminated ${ in template literal",
                    ));
                }

                let hole = &body[hole_start..hole_end];
                let expr = Parser::new(hole)
                    .and_then(|mut sub_parser| sub_parser.parse_single())
                    .map_err(|err| err.offset(base + hole_start))?;
                parts.push(TemplatePart::Expression(shift_expr(expr, base + hole_start)));
            } else if ch == '\\' {
                if let Some((_, next)) = chars.next() {
                    push_escape(&mut current, next);
                }
            } else {
                current.push(ch);
            }
        }

        if !current.is_empty() {
            parts.push(TemplatePart::Literal(current));
        }

        Ok(Expr::Template { parts, span })
    }

    fn logical(left: Expr, operator: LogicalOp, right: Expr) -> Expr {
        let span = left.span().to(right.span());
        Expr::Logical {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span,
        }
    }

    fn binary(left: Expr, operator: BinaryOp, right: Expr) -> Expr {
        let span = left.span().to(right.span());
        Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span,
        }
    }

    // Helper methods for matching operators

    fn match_equality_op(&mut self) -> Option<BinaryOp> {
        let op = match self.peek() {
            Some((Token::EqualsEquals, _)) => BinaryOp::Equals,
            Some((Token::NotEquals, _)) => BinaryOp::NotEquals,
            Some((Token::EqualsEqualsEquals, _)) => BinaryOp::StrictEquals,
            Some((Token::NotEqualsEquals, _)) => BinaryOp::StrictNotEquals,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn match_comparison_op(&mut self) -> Option<BinaryOp> {
        let op = match self.peek() {
            Some((Token::LAngle, _)) => BinaryOp::LessThan,
            Some((Token::LessThanEquals, _)) => BinaryOp::LessThanOrEqual,
            Some((Token::RAngle, _)) => BinaryOp::GreaterThan,
            Some((Token::GreaterThanEquals, _)) => BinaryOp::GreaterThanOrEqual,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn match_additive_op(&mut self) -> Option<BinaryOp> {
        if self.match_token(Token::Plus) {
            Some(BinaryOp::Add)
        } else if self.match_token(Token::Minus) {
            Some(BinaryOp::Subtract)
        } else {
            None
        }
    }

    fn match_multiplicative_op(&mut self) -> Option<BinaryOp> {
        if self.match_token(Token::Star) {
            Some(BinaryOp::Multiply)
        } else if self.match_token(Token::Slash) {
            Some(BinaryOp::Divide)
        } else if self.match_token(Token::Percent) {
            Some(BinaryOp::Modulo)
        } else {
            None
        }
    }

    fn peek(&self) -> Option<&(Token<'src>, std::ops::Range<usize>)> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&(Token<'src>, std::ops::Range<usize>)> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token: Token) -> bool {
        if let Some((t, _)) = self.peek() {
            std::mem::discriminant(t) == std::mem::discriminant(&token)
        } else {
            false
        }
    }

    fn match_token(&mut self, token: Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> ParseResult<()> {
        if self.check(token.clone()) {
            self.advance();
            Ok(())
        } else if self.is_at_end() {
            Err(ParseError::unexpected_eof(
                self.source_len,
                format!("'{}'", token),
            ))
        } else {
            Err(ParseError::unexpected_token(
                self.peek_span(),
                format!("'{}'", token),
                Self::format_token(self.peek()),
            ))
        }
    }

    /// Member names may be keywords (`item.null` is odd but legal)
    fn expect_property_name(&mut self) -> ParseResult<String> {
        let name = match self.peek() {
            Some((Token::Ident(s), _)) => s.to_string(),
            Some((Token::True, _)) => "true".to_string(),
            Some((Token::False, _)) => "false".to_string(),
            Some((Token::Null, _)) => "null".to_string(),
            Some((Token::Undefined, _)) => "undefined".to_string(),
            Some((Token::Typeof, _)) => "typeof".to_string(),
            None => return Err(ParseError::unexpected_eof(self.source_len, "property name")),
            _ => {
                return Err(ParseError::unexpected_token(
                    self.peek_span(),
                    "property name",
                    Self::format_token(self.peek()),
                ))
            }
        };
        self.advance();
        Ok(name)
    }

    /// Span of the token we just consumed
    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|(_, span)| Span::new(span.start, span.end))
            .unwrap_or_default()
    }

    /// Span of the token we're about to consume, or an empty span at the end
    fn peek_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| Span::new(span.start, span.end))
            .unwrap_or(Span::new(self.source_len, self.source_len))
    }

    /// Format a token for display in error messages
    fn format_token(token: Option<&(Token, std::ops::Range<usize>)>) -> String {
        match token {
            None => "end of expression".to_string(),
            Some((token @ (Token::Ident(_) | Token::Number(_) | Token::String(_) | Token::Template(_)), _)) => {
                token.to_string()
            }
            Some((token, _)) => format!("'{}'", token),
        }
    }
}

fn push_escape(out: &mut String, escaped: char) {
    match escaped {
        'n' => out.push('\n'),
        't' => out.push('\t'),
        'r' => out.push('\r'),
        '0' => out.push('\0'),
        other => out.push(other),
    }
}

/// Resolve backslash escapes inside a quoted literal
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                push_escape(&mut out, next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Move spans of a sub-parsed template hole into the outer source's coordinates
fn shift_expr(expr: Expr, offset: usize) -> Expr {
    let shift = |e: Box<Expr>| Box::new(shift_expr(*e, offset));
    match expr {
        Expr::Literal { value, span } => Expr::Literal {
            value,
            span: span.shift(offset),
        },
        Expr::Identifier { name, span } => Expr::Identifier {
            name,
            span: span.shift(offset),
        },
        Expr::Template { parts, span } => Expr::Template {
            parts: parts
                .into_iter()
                .map(|part| match part {
                    TemplatePart::Expression(e) => TemplatePart::Expression(shift_expr(e, offset)),
                    literal => literal,
                })
                .collect(),
            span: span.shift(offset),
        },
        Expr::Array { items, span } => Expr::Array {
            items: items.into_iter().map(|e| shift_expr(e, offset)).collect(),
            span: span.shift(offset),
        },
        Expr::Object { entries, span } => Expr::Object {
            entries: entries
                .into_iter()
                .map(|(k, e)| (k, shift_expr(e, offset)))
                .collect(),
            span: span.shift(offset),
        },
        Expr::Member {
            object,
            property,
            span,
        } => Expr::Member {
            object: shift(object),
            property,
            span: span.shift(offset),
        },
        Expr::Index {
            object,
            index,
            span,
        } => Expr::Index {
            object: shift(object),
            index: shift(index),
            span: span.shift(offset),
        },
        Expr::Call {
            callee,
            arguments,
            span,
        } => Expr::Call {
            callee: shift(callee),
            arguments: arguments
                .into_iter()
                .map(|e| shift_expr(e, offset))
                .collect(),
            span: span.shift(offset),
        },
        Expr::Unary {
            operator,
            operand,
            span,
        } => Expr::Unary {
            operator,
            operand: shift(operand),
            span: span.shift(offset),
        },
        Expr::Binary {
            left,
            operator,
            right,
            span,
        } => Expr::Binary {
            left: shift(left),
            operator,
            right: shift(right),
            span: span.shift(offset),
        },
        Expr::Logical {
            left,
            operator,
            right,
            span,
        } => Expr::Logical {
            left: shift(left),
            operator,
            right: shift(right),
            span: span.shift(offset),
        },
        Expr::Conditional {
            test,
            consequent,
            alternate,
            span,
        } => Expr::Conditional {
            test: shift(test),
            consequent: shift(consequent),
            alternate: shift(alternate),
            span: span.shift(offset),
        },
        Expr::Assign {
            target,
            operator,
            value,
            span,
        } => Expr::Assign {
            target: shift(target),
            operator,
            value: shift(value),
            span: span.shift(offset),
        },
    }
}

/// Parse an expression program
pub fn parse(source: &str) -> ParseResult<Program> {
    let mut parser = Parser::new(source)?;
    parser.parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(source: &str) -> Expr {
        let program = parse(source).expect("parse failed");
        assert_eq!(program.statements.len(), 1);
        program.statements.into_iter().next().unwrap()
    }

    #[test]
    fn test_precedence() {
        match single("a + b * c") {
            Expr::Binary {
                operator: BinaryOp::Add,
                right,
                ..
            } => assert!(matches!(
                *right,
                Expr::Binary {
                    operator: BinaryOp::Multiply,
                    ..
                }
            )),
            other => panic!("Expected addition, got {:?}", other),
        }
    }

    #[test]
    fn test_nullish_binds_looser_than_or() {
        match single("a || b ?? c") {
            Expr::Logical {
                operator: LogicalOp::Nullish,
                left,
                ..
            } => assert!(matches!(
                *left,
                Expr::Logical {
                    operator: LogicalOp::Or,
                    ..
                }
            )),
            other => panic!("Expected nullish, got {:?}", other),
        }
    }

    #[test]
    fn test_ternary_and_assignment_are_right_associative() {
        assert!(matches!(
            single("a ? b : c ? d : e"),
            Expr::Conditional { alternate, .. } if matches!(*alternate, Expr::Conditional { .. })
        ));
        assert!(matches!(
            single("a = b = 1"),
            Expr::Assign { value, .. } if matches!(*value, Expr::Assign { .. })
        ));
    }

    #[test]
    fn test_postfix_chain() {
        let expr = single("items[0].name.toUpperCase()");
        match expr {
            Expr::Call { callee, arguments, .. } => {
                assert!(arguments.is_empty());
                assert!(matches!(*callee, Expr::Member { ref property, .. } if property == "toUpperCase"));
                assert_eq!(callee.root_identifier(), Some("items"));
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_object_literal_keys() {
        match single("{ active: isActive, 'font-size': size, shorthand, }") {
            Expr::Object { entries, .. } => {
                let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["active", "font-size", "shorthand"]);
                assert!(matches!(&entries[2].1, Expr::Identifier { name, .. } if name == "shorthand"));
            }
            other => panic!("Expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_template_literal_parts_and_spans() {
        let source = "`Hi ${name}!`";
        match single(source) {
            Expr::Template { parts, .. } => {
                assert_eq!(parts.len(), 3);
                match &parts[1] {
                    TemplatePart::Expression(Expr::Identifier { name, span }) => {
                        assert_eq!(name, "name");
                        assert_eq!(&source[span.start..span.end], "name");
                    }
                    other => panic!("Expected identifier hole, got {:?}", other),
                }
            }
            other => panic!("Expected template, got {:?}", other),
        }
    }

    #[test]
    fn test_string_escapes() {
        assert!(matches!(
            single(r"'it\'s\n'"),
            Expr::Literal { value: Value::String(ref s), .. } if s == "it's\n"
        ));
    }

    #[test]
    fn test_statements() {
        let program = parse("a = 1; b = 2;").unwrap();
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse("a + b = 1").unwrap_err();
        assert!(matches!(err, ParseError::InvalidSyntax { .. }));
    }

    #[test]
    fn test_errors_report_positions() {
        match parse("a +").unwrap_err() {
            ParseError::UnexpectedEof { pos, .. } => assert_eq!(pos, 3),
            other => panic!("Expected EOF error, got {:?}", other),
        }
        match parse("a b").unwrap_err() {
            ParseError::UnexpectedToken { span, .. } => assert_eq!(span, Span::new(2, 3)),
            other => panic!("Expected unexpected token, got {:?}", other),
        }
        assert!(parse("").is_err());
        assert!(parse("(a").is_err());
    }
}
