use thiserror::Error;

use crate::ast::{
    BinaryOperator, Block, ComparisonOperator, Condition, Expression, FunctionCall, FunctionDef,
    Parameter, Program, Statement, VarType,
};
use crate::lexer::{LexError, Lexer};
use crate::source::Source;
use crate::token::{Position, Token, TokenKind};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("Expected {expected}, got {found:?} at {position}")]
    UnexpectedToken {
        expected: &'static str,
        found: TokenKind,
        position: Position,
    },
}

/// Recursive-descent parser, one method per grammar production. Every
/// method consumes exactly the tokens of its production and leaves the
/// lookahead at the first unconsumed token, so productions can be driven
/// individually (the unit tests below do exactly that).
pub struct Parser<S: Source> {
    lexer: Lexer<S>,
    current: Token,
}

impl<S: Source> Parser<S> {
    pub fn new(mut lexer: Lexer<S>) -> Result<Self, ParseError> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// `program := function_def*`
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut functions = Vec::new();
        while self.current.kind != TokenKind::Eof {
            functions.push(self.parse_function_def()?);
        }
        Ok(Program { functions })
    }

    /// `function_def := type identifier '(' parameters ')' '{' block '}'`
    pub fn parse_function_def(&mut self) -> Result<FunctionDef, ParseError> {
        let return_type = self.parse_type()?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut parameters = Vec::new();
        if self.current.kind != TokenKind::RParen {
            loop {
                let var_type = self.parse_type()?;
                let name = self.expect_identifier()?;
                parameters.push(Parameter { var_type, name });
                if self.current.kind != TokenKind::Comma {
                    break;
                }
                self.advance()?;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::LBrace, "'{'")?;
        let body = self.parse_block()?;
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(FunctionDef {
            name,
            return_type,
            parameters,
            body,
        })
    }

    /// `block := statement*`; the enclosing braces belong to the caller.
    pub fn parse_block(&mut self) -> Result<Block, ParseError> {
        let mut statements = Vec::new();
        while !matches!(self.current.kind, TokenKind::RBrace | TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(Block { statements })
    }

    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.current.kind {
            TokenKind::Dec | TokenKind::Cur | TokenKind::Void => self.parse_init_statement(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Print => self.parse_print_statement(),
            TokenKind::Identifier(_) => self.parse_assign_or_call(),
            _ => Err(self.error("statement")),
        }
    }

    /// `init_statement := type identifier ['=' expression [currencyCode]] ';'`
    ///
    /// `void` is accepted here so the interpreter can reject it as an
    /// invalid variable type rather than a syntax error.
    pub fn parse_init_statement(&mut self) -> Result<Statement, ParseError> {
        let var_type = self.parse_type()?;
        let name = self.expect_identifier()?;
        let (value, currency) = if self.current.kind == TokenKind::Assign {
            self.advance()?;
            let value = self.parse_expression()?;
            (Some(value), self.take_currency()?)
        } else {
            (None, None)
        };
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Statement::Init {
            var_type,
            name,
            value,
            currency,
        })
    }

    /// `assign_or_call := identifier ('=' expression [currencyCode] | '(' args ')') ';'`
    pub fn parse_assign_or_call(&mut self) -> Result<Statement, ParseError> {
        let name = self.expect_identifier()?;
        let statement = match self.current.kind {
            TokenKind::Assign => {
                self.advance()?;
                let value = self.parse_expression()?;
                let currency = self.take_currency()?;
                Statement::Assign {
                    name,
                    value,
                    currency,
                }
            }
            TokenKind::LParen => Statement::Call(FunctionCall {
                name,
                args: self.parse_call_args()?,
            }),
            _ => return Err(self.error("'=' or '('")),
        };
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(statement)
    }

    /// `if_statement := 'if' '(' condition ')' '{' block '}'`
    pub fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::If, "'if'")?;
        self.expect(TokenKind::LParen, "'('")?;
        let condition = self.parse_condition()?;
        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::LBrace, "'{'")?;
        let body = self.parse_block()?;
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Statement::If { condition, body })
    }

    /// `while_statement := 'while' '(' condition ')' '{' block '}'`
    pub fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::While, "'while'")?;
        self.expect(TokenKind::LParen, "'('")?;
        let condition = self.parse_condition()?;
        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::LBrace, "'{'")?;
        let body = self.parse_block()?;
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Statement::While { condition, body })
    }

    /// `return_statement := 'return' expression ';'`
    pub fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::Return, "'return'")?;
        let value = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Statement::Return(value))
    }

    /// `print_statement := 'print' '(' expression (',' expression)* ')' ';'`
    pub fn parse_print_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::Print, "'print'")?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = vec![self.parse_expression()?];
        while self.current.kind == TokenKind::Comma {
            self.advance()?;
            args.push(self.parse_expression()?);
        }
        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Statement::Print(args))
    }

    /// `condition := and_cond ('|' and_cond)*`
    pub fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        let mut condition = self.parse_and_cond()?;
        while self.current.kind == TokenKind::Or {
            self.advance()?;
            let right = self.parse_and_cond()?;
            condition = Condition::Or {
                left: Box::new(condition),
                right: Box::new(right),
            };
        }
        Ok(condition)
    }

    /// `and_cond := cond_factor ('&' cond_factor)*`
    pub fn parse_and_cond(&mut self) -> Result<Condition, ParseError> {
        let mut condition = self.parse_cond_factor()?;
        while self.current.kind == TokenKind::And {
            self.advance()?;
            let right = self.parse_cond_factor()?;
            condition = Condition::And {
                left: Box::new(condition),
                right: Box::new(right),
            };
        }
        Ok(condition)
    }

    /// `cond_factor := ['!'] ('(' condition ')' | comparison)`
    ///
    /// A leading '(' always opens a sub-condition; this is how grouping
    /// overrides the '&'-before-'|' precedence.
    pub fn parse_cond_factor(&mut self) -> Result<Condition, ParseError> {
        let negated = if self.current.kind == TokenKind::Not {
            self.advance()?;
            true
        } else {
            false
        };
        let inner = if self.current.kind == TokenKind::LParen {
            self.advance()?;
            let condition = self.parse_condition()?;
            self.expect(TokenKind::RParen, "')'")?;
            condition
        } else {
            self.parse_comparison()?
        };
        Ok(if negated {
            Condition::Not(Box::new(inner))
        } else {
            inner
        })
    }

    /// `comparison := expression (< | > | <= | >= | == | !=) expression`
    pub fn parse_comparison(&mut self) -> Result<Condition, ParseError> {
        let left = self.parse_expression()?;
        let op = match self.current.kind {
            TokenKind::Less => ComparisonOperator::Less,
            TokenKind::Greater => ComparisonOperator::Greater,
            TokenKind::LessEqual => ComparisonOperator::LessEqual,
            TokenKind::GreaterEqual => ComparisonOperator::GreaterEqual,
            TokenKind::Equal => ComparisonOperator::Equal,
            TokenKind::NotEqual => ComparisonOperator::NotEqual,
            _ => return Err(self.error("comparison operator")),
        };
        self.advance()?;
        let right = self.parse_expression()?;
        Ok(Condition::Comparison { left, op, right })
    }

    /// `expression := multipl_expr (('+'|'-') multipl_expr)*`
    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_multipl_expr()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multipl_expr()?;
            expr = Expression::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    /// `multipl_expr := unary (('*'|'/') unary)*`
    pub fn parse_multipl_expr(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOperator::Mul,
                TokenKind::Slash => BinaryOperator::Div,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary()?;
            expr = Expression::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    /// `unary := ['-'] primary`
    pub fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        if self.current.kind == TokenKind::Minus {
            self.advance()?;
            let inner = self.parse_primary()?;
            return Ok(Expression::Negate(Box::new(inner)));
        }
        self.parse_primary()
    }

    /// `primary := number [currencyCode] | string
    ///           | identifier ['(' args ')' | '.get_currency()']
    ///           | '(' expression ')'`
    pub fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        match &self.current.kind {
            TokenKind::Number(value) => {
                let value = *value;
                self.advance()?;
                let currency = self.take_currency()?;
                Ok(Expression::Number { value, currency })
            }
            TokenKind::String(text) => {
                let text = text.clone();
                self.advance()?;
                Ok(Expression::String(text))
            }
            TokenKind::Identifier(_) => {
                let name = self.expect_identifier()?;
                match self.current.kind {
                    TokenKind::LParen => Ok(Expression::Call(FunctionCall {
                        name,
                        args: self.parse_call_args()?,
                    })),
                    TokenKind::Dot => {
                        self.advance()?;
                        self.expect_get_currency()?;
                        self.expect(TokenKind::LParen, "'('")?;
                        self.expect(TokenKind::RParen, "')'")?;
                        Ok(Expression::GetCurrency(name))
                    }
                    _ => Ok(Expression::Variable(name)),
                }
            }
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            _ => Err(self.error("expression")),
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expression>, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if self.current.kind != TokenKind::RParen {
            args.push(self.parse_expression()?);
            while self.current.kind == TokenKind::Comma {
                self.advance()?;
                args.push(self.parse_expression()?);
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(args)
    }

    fn parse_type(&mut self) -> Result<VarType, ParseError> {
        let var_type = match self.current.kind {
            TokenKind::Dec => VarType::Decimal,
            TokenKind::Cur => VarType::Currency,
            TokenKind::Void => VarType::Void,
            _ => return Err(self.error("type ('dec', 'cur' or 'void')")),
        };
        self.advance()?;
        Ok(var_type)
    }

    fn take_currency(&mut self) -> Result<Option<String>, ParseError> {
        if let TokenKind::Currency(code) = &self.current.kind {
            let code = code.clone();
            self.advance()?;
            Ok(Some(code))
        } else {
            Ok(None)
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), ParseError> {
        if self.current.kind == kind {
            self.advance()?;
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let name = name.clone();
            self.advance()?;
            Ok(name)
        } else {
            Err(self.error("identifier"))
        }
    }

    fn expect_get_currency(&mut self) -> Result<(), ParseError> {
        match &self.current.kind {
            TokenKind::Identifier(name) if name == "get_currency" => {
                self.advance()?;
                Ok(())
            }
            _ => Err(self.error("'get_currency'")),
        }
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn error(&self, expected: &'static str) -> ParseError {
        ParseError::UnexpectedToken {
            expected,
            found: self.current.kind.clone(),
            position: self.current.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currencies::CurrencyCatalog;
    use crate::source::StringSource;
    use indoc::indoc;

    fn parser(input: &str) -> Parser<StringSource> {
        let catalog = CurrencyCatalog::from_codes(["eur", "pln", "usd"]);
        let lexer = Lexer::new(StringSource::new(input), &catalog);
        Parser::new(lexer).expect("first token should lex")
    }

    fn number(value: f64) -> Expression {
        Expression::Number {
            value,
            currency: None,
        }
    }

    fn variable(name: &str) -> Expression {
        Expression::Variable(name.to_string())
    }

    #[test]
    fn parses_function_definition_with_typed_parameters() {
        let input = indoc! {"
            dec add(dec a, cur b) {
                return a + b;
            }
        "};
        let program = parser(input).parse_program().expect("parse failed");

        let expected = Program {
            functions: vec![FunctionDef {
                name: "add".to_string(),
                return_type: VarType::Decimal,
                parameters: vec![
                    Parameter {
                        var_type: VarType::Decimal,
                        name: "a".to_string(),
                    },
                    Parameter {
                        var_type: VarType::Currency,
                        name: "b".to_string(),
                    },
                ],
                body: Block {
                    statements: vec![Statement::Return(Expression::Binary {
                        left: Box::new(variable("a")),
                        op: BinaryOperator::Add,
                        right: Box::new(variable("b")),
                    })],
                },
            }],
        };
        assert_eq!(program, expected);
    }

    #[test]
    fn parses_currency_literal_in_primary() {
        let statement = parser("cur a = 5 eur;")
            .parse_init_statement()
            .expect("parse failed");
        assert_eq!(
            statement,
            Statement::Init {
                var_type: VarType::Currency,
                name: "a".to_string(),
                value: Some(Expression::Number {
                    value: 5.0,
                    currency: Some("eur".to_string()),
                }),
                currency: None,
            }
        );
    }

    #[test]
    fn parses_uninitialized_declaration() {
        let statement = parser("dec a;")
            .parse_init_statement()
            .expect("parse failed");
        assert_eq!(
            statement,
            Statement::Init {
                var_type: VarType::Decimal,
                name: "a".to_string(),
                value: None,
                currency: None,
            }
        );
    }

    #[test]
    fn parses_statement_level_currency_on_assignment() {
        let statement = parser("a = (2 + 3) pln;")
            .parse_assign_or_call()
            .expect("parse failed");
        assert_eq!(
            statement,
            Statement::Assign {
                name: "a".to_string(),
                value: Expression::Binary {
                    left: Box::new(number(2.0)),
                    op: BinaryOperator::Add,
                    right: Box::new(number(3.0)),
                },
                currency: Some("pln".to_string()),
            }
        );
    }

    #[test]
    fn bare_call_parses_as_statement() {
        let statement = parser("update(1, x);")
            .parse_assign_or_call()
            .expect("parse failed");
        assert_eq!(
            statement,
            Statement::Call(FunctionCall {
                name: "update".to_string(),
                args: vec![number(1.0), variable("x")],
            })
        );
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parser("a + b * c").parse_expression().expect("parse failed");
        assert_eq!(
            expr,
            Expression::Binary {
                left: Box::new(variable("a")),
                op: BinaryOperator::Add,
                right: Box::new(Expression::Binary {
                    left: Box::new(variable("b")),
                    op: BinaryOperator::Mul,
                    right: Box::new(variable("c")),
                }),
            }
        );
    }

    #[test]
    fn addition_is_left_associative() {
        let expr = parser("a - b + c").parse_expression().expect("parse failed");
        assert_eq!(
            expr,
            Expression::Binary {
                left: Box::new(Expression::Binary {
                    left: Box::new(variable("a")),
                    op: BinaryOperator::Sub,
                    right: Box::new(variable("b")),
                }),
                op: BinaryOperator::Add,
                right: Box::new(variable("c")),
            }
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let condition = parser("a > b & a > c | d == 5")
            .parse_condition()
            .expect("parse failed");
        assert!(matches!(condition, Condition::Or { .. }));
        if let Condition::Or { left, .. } = condition {
            assert!(matches!(*left, Condition::And { .. }));
        }
    }

    #[test]
    fn parentheses_group_conditions() {
        let condition = parser("a > b & (a > c | d == 5)")
            .parse_condition()
            .expect("parse failed");
        assert!(matches!(condition, Condition::And { .. }));
        if let Condition::And { right, .. } = condition {
            assert!(matches!(*right, Condition::Or { .. }));
        }
    }

    #[test]
    fn negation_applies_to_single_comparison() {
        let condition = parser("! a > b & c == 5")
            .parse_condition()
            .expect("parse failed");
        if let Condition::And { left, right } = condition {
            assert!(matches!(*left, Condition::Not(_)));
            assert!(matches!(*right, Condition::Comparison { .. }));
        } else {
            panic!("expected and-condition, got {condition:?}");
        }
    }

    #[test]
    fn negation_applies_to_parenthesized_group() {
        let condition = parser("! (a > b | c == 5)")
            .parse_condition()
            .expect("parse failed");
        if let Condition::Not(inner) = condition {
            assert!(matches!(*inner, Condition::Or { .. }));
        } else {
            panic!("expected negated condition, got {condition:?}");
        }
    }

    #[test]
    fn parses_get_currency_accessor() {
        let expr = parser("a.get_currency()")
            .parse_expression()
            .expect("parse failed");
        assert_eq!(expr, Expression::GetCurrency("a".to_string()));
    }

    #[test]
    fn parses_print_with_mixed_arguments() {
        let statement = parser("print(\"result: \", 2 + 2);")
            .parse_print_statement()
            .expect("parse failed");
        assert_eq!(
            statement,
            Statement::Print(vec![
                Expression::String("result: ".to_string()),
                Expression::Binary {
                    left: Box::new(number(2.0)),
                    op: BinaryOperator::Add,
                    right: Box::new(number(2.0)),
                },
            ])
        );
    }

    #[test]
    fn errors_on_missing_semicolon_with_position() {
        let err = parser("dec a = 5")
            .parse_init_statement()
            .expect_err("expected syntax error");
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                expected: "';'",
                found: TokenKind::Eof,
                position: Position { line: 1, column: 9 },
            }
        );
    }

    #[test]
    fn errors_on_unknown_method_after_dot() {
        let err = parser("a.get_value()")
            .parse_expression()
            .expect_err("expected syntax error");
        assert!(matches!(
            err,
            ParseError::UnexpectedToken {
                expected: "'get_currency'",
                ..
            }
        ));
    }

    #[test]
    fn unknown_currency_code_is_a_syntax_error() {
        let err = parser("cur a = 5 doubloon;")
            .parse_init_statement()
            .expect_err("expected syntax error");
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }
}
