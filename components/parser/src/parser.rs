//! Recursive descent parser for test modules

use crate::ast::*;
use crate::error::*;
use crate::lexer::{Keyword, Lexer, Punctuator, SpannedToken, Token};
use core_types::{ensure_sufficient_stack, JsError, SourcePosition};
use std::rc::Rc;

/// Deepest statement or expression nesting accepted before a `SyntaxError`
pub const MAX_NESTING_DEPTH: usize = 1000;

/// Parse a complete module source into a [`Program`].
///
/// Convenience wrapper around [`Parser::parse`].
pub fn parse_program(source: &str) -> Result<Program, JsError> {
    Parser::new(source).parse()
}

/// Test module parser
pub struct Parser {
    lexer: Lexer,
    /// Track loop depth for break/continue validation
    loop_depth: usize,
    /// Track function depth for return validation
    function_depth: usize,
    /// Current statement/expression nesting
    nesting_depth: usize,
}

impl Parser {
    /// Create a new parser for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            lexer: Lexer::new(source),
            loop_depth: 0,
            function_depth: 0,
            nesting_depth: 0,
        }
    }

    /// Parse the source into an AST.
    ///
    /// Stops at the first syntax error; the returned error always has
    /// kind `SyntaxError` and, where known, the position of the offending
    /// token.
    pub fn parse(&mut self) -> Result<Program, JsError> {
        let mut body = Vec::new();
        while !self.is_at_end()? {
            body.push(self.parse_statement()?);
        }
        Ok(Program { body })
    }

    fn is_at_end(&mut self) -> Result<bool, JsError> {
        Ok(matches!(self.lexer.peek_token()?.token, Token::EOF))
    }

    fn peek(&mut self) -> Result<SpannedToken, JsError> {
        Ok(self.lexer.peek_token()?.clone())
    }

    /// Run a recursive production one nesting level deeper
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, JsError>,
    ) -> Result<T, JsError> {
        if self.nesting_depth >= MAX_NESTING_DEPTH {
            return Err(self.nesting_error());
        }
        self.nesting_depth += 1;
        let result = ensure_sufficient_stack(|| parse(self));
        self.nesting_depth -= 1;
        result
    }

    /// Left-associative chains build trees as deep as they are long
    fn extend_chain(&mut self, links: &mut usize) -> Result<(), JsError> {
        *links += 1;
        if self.nesting_depth + *links > MAX_NESTING_DEPTH {
            return Err(self.nesting_error());
        }
        Ok(())
    }

    fn nesting_error(&mut self) -> JsError {
        match self.peek() {
            Ok(next) => syntax_error("Maximum nesting depth exceeded", Some(next.position)),
            Err(err) => err,
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, JsError> {
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> Result<Statement, JsError> {
        let next = self.peek()?;

        match next.token {
            Token::Keyword(Keyword::Var)
            | Token::Keyword(Keyword::Let)
            | Token::Keyword(Keyword::Const) => {
                let declaration = self.parse_variable_declaration()?;
                self.consume_semicolon()?;
                Ok(declaration)
            }
            Token::Keyword(Keyword::Function) => Ok(Statement::FunctionDeclaration(
                self.parse_function(true)?,
            )),
            Token::Keyword(Keyword::Return) => self.parse_return_statement(),
            Token::Keyword(Keyword::If) => self.parse_if_statement(),
            Token::Keyword(Keyword::While) => self.parse_while_statement(),
            Token::Keyword(Keyword::Do) => self.parse_do_while_statement(),
            Token::Keyword(Keyword::For) => self.parse_for_statement(),
            Token::Keyword(Keyword::Break) => self.parse_break_statement(),
            Token::Keyword(Keyword::Continue) => self.parse_continue_statement(),
            Token::Keyword(Keyword::Throw) => self.parse_throw_statement(),
            Token::Keyword(Keyword::Try) => self.parse_try_statement(),
            Token::Punctuator(Punctuator::LBrace) => {
                let body = self.parse_block_body()?;
                Ok(Statement::BlockStatement {
                    body,
                    position: next.position,
                })
            }
            Token::Punctuator(Punctuator::Semicolon) => {
                self.lexer.next_token()?;
                Ok(Statement::EmptyStatement {
                    position: next.position,
                })
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// Parse `var|let|const a = 1, b` without the trailing semicolon
    fn parse_variable_declaration(&mut self) -> Result<Statement, JsError> {
        let start = self.lexer.next_token()?;
        let kind = match start.token {
            Token::Keyword(Keyword::Let) => VariableKind::Let,
            Token::Keyword(Keyword::Const) => VariableKind::Const,
            Token::Keyword(Keyword::Var) => VariableKind::Var,
            _ => return Err(self.unexpected(&start)),
        };

        let mut declarations = Vec::new();
        loop {
            let (name, _) = self.expect_identifier()?;
            let init = if self.eat_punctuator(Punctuator::Assign)? {
                Some(self.parse_assignment_expression()?)
            } else {
                None
            };

            if kind == VariableKind::Const && init.is_none() {
                let next = self.peek()?;
                return Err(syntax_error(
                    "Missing initializer in const declaration",
                    Some(next.position),
                ));
            }

            declarations.push(VariableDeclarator { name, init });

            if !self.eat_punctuator(Punctuator::Comma)? {
                break;
            }
        }

        Ok(Statement::VariableDeclaration {
            kind,
            declarations,
            position: start.position,
        })
    }

    fn parse_function(&mut self, require_name: bool) -> Result<Rc<FunctionDef>, JsError> {
        let start = self.expect_keyword(Keyword::Function)?;

        let next = self.peek()?;
        let name = match next.token {
            Token::Identifier(_) => Some(self.expect_identifier()?.0),
            _ if require_name => return Err(self.unexpected(&next)),
            _ => None,
        };

        self.expect_punctuator(Punctuator::LParen)?;
        let mut params = Vec::new();
        if !self.eat_punctuator(Punctuator::RParen)? {
            loop {
                params.push(self.expect_identifier()?.0);
                if self.eat_punctuator(Punctuator::Comma)? {
                    continue;
                }
                self.expect_punctuator(Punctuator::RParen)?;
                break;
            }
        }

        // A function body resets loop context: `break` inside a nested
        // function never targets an enclosing loop.
        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        self.function_depth += 1;
        let body = self.parse_block_body();
        self.function_depth -= 1;
        self.loop_depth = saved_loop_depth;

        Ok(Rc::new(FunctionDef {
            name,
            params,
            body: body?,
            position: start.position,
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.expect_keyword(Keyword::Return)?;
        if self.function_depth == 0 {
            return Err(syntax_error("Illegal return statement", Some(start.position)));
        }

        // ASI Restricted Production: a line terminator after 'return'
        // ends the statement
        let next = self.peek()?;
        let argument = if next.newline_before
            || matches!(
                next.token,
                Token::EOF
                    | Token::Punctuator(Punctuator::Semicolon)
                    | Token::Punctuator(Punctuator::RBrace)
            ) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.consume_semicolon()?;

        Ok(Statement::ReturnStatement {
            argument,
            position: start.position,
        })
    }

    fn parse_if_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.expect_keyword(Keyword::If)?;
        self.expect_punctuator(Punctuator::LParen)?;
        let test = self.parse_expression()?;
        self.expect_punctuator(Punctuator::RParen)?;

        let consequent = Box::new(self.parse_statement()?);

        let alternate = if self.eat_keyword(Keyword::Else)? {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Statement::IfStatement {
            test,
            consequent,
            alternate,
            position: start.position,
        })
    }

    fn parse_while_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.expect_keyword(Keyword::While)?;
        self.expect_punctuator(Punctuator::LParen)?;
        let test = self.parse_expression()?;
        self.expect_punctuator(Punctuator::RParen)?;

        let body = Box::new(self.parse_loop_body()?);

        Ok(Statement::WhileStatement {
            test,
            body,
            position: start.position,
        })
    }

    fn parse_do_while_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.expect_keyword(Keyword::Do)?;
        let body = Box::new(self.parse_loop_body()?);
        self.expect_keyword(Keyword::While)?;
        self.expect_punctuator(Punctuator::LParen)?;
        let test = self.parse_expression()?;
        self.expect_punctuator(Punctuator::RParen)?;
        // ASI always applies after the closing `)` of a do-while
        self.eat_punctuator(Punctuator::Semicolon)?;

        Ok(Statement::DoWhileStatement {
            body,
            test,
            position: start.position,
        })
    }

    fn parse_for_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.expect_keyword(Keyword::For)?;
        self.expect_punctuator(Punctuator::LParen)?;

        let next = self.peek()?;
        let init = match next.token {
            Token::Punctuator(Punctuator::Semicolon) => None,
            Token::Keyword(Keyword::Var)
            | Token::Keyword(Keyword::Let)
            | Token::Keyword(Keyword::Const) => {
                Some(Box::new(self.parse_variable_declaration()?))
            }
            _ => {
                let expression = self.parse_expression()?;
                Some(Box::new(Statement::ExpressionStatement {
                    expression,
                    position: next.position,
                }))
            }
        };
        self.expect_punctuator(Punctuator::Semicolon)?;

        let test = if self.check_punctuator(Punctuator::Semicolon)? {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punctuator(Punctuator::Semicolon)?;

        let update = if self.check_punctuator(Punctuator::RParen)? {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punctuator(Punctuator::RParen)?;

        let body = Box::new(self.parse_loop_body()?);

        Ok(Statement::ForStatement {
            init,
            test,
            update,
            body,
            position: start.position,
        })
    }

    fn parse_loop_body(&mut self) -> Result<Statement, JsError> {
        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        body
    }

    fn parse_break_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.expect_keyword(Keyword::Break)?;
        if self.loop_depth == 0 {
            return Err(syntax_error("Illegal break statement", Some(start.position)));
        }
        self.consume_semicolon()?;
        Ok(Statement::BreakStatement {
            position: start.position,
        })
    }

    fn parse_continue_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.expect_keyword(Keyword::Continue)?;
        if self.loop_depth == 0 {
            return Err(syntax_error(
                "Illegal continue statement",
                Some(start.position),
            ));
        }
        self.consume_semicolon()?;
        Ok(Statement::ContinueStatement {
            position: start.position,
        })
    }

    fn parse_throw_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.expect_keyword(Keyword::Throw)?;

        let next = self.peek()?;
        if next.newline_before {
            return Err(syntax_error("Illegal newline after throw", Some(next.position)));
        }

        let argument = self.parse_expression()?;
        self.consume_semicolon()?;

        Ok(Statement::ThrowStatement {
            argument,
            position: start.position,
        })
    }

    fn parse_try_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.expect_keyword(Keyword::Try)?;
        let block = self.parse_block_body()?;

        let handler = if self.eat_keyword(Keyword::Catch)? {
            let param = if self.eat_punctuator(Punctuator::LParen)? {
                let (name, _) = self.expect_identifier()?;
                self.expect_punctuator(Punctuator::RParen)?;
                Some(name)
            } else {
                None
            };
            let body = self.parse_block_body()?;
            Some(CatchClause { param, body })
        } else {
            None
        };

        let finalizer = if self.eat_keyword(Keyword::Finally)? {
            Some(self.parse_block_body()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            let next = self.peek()?;
            return Err(syntax_error(
                "Missing catch or finally after try",
                Some(next.position),
            ));
        }

        Ok(Statement::TryStatement {
            block,
            handler,
            finalizer,
            position: start.position,
        })
    }

    fn parse_block_body(&mut self) -> Result<Vec<Statement>, JsError> {
        self.expect_punctuator(Punctuator::LBrace)?;
        let mut statements = Vec::new();
        loop {
            let next = self.peek()?;
            match next.token {
                Token::Punctuator(Punctuator::RBrace) => {
                    self.lexer.next_token()?;
                    return Ok(statements);
                }
                Token::EOF => return Err(unexpected_eof(next.position)),
                _ => statements.push(self.parse_statement()?),
            }
        }
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, JsError> {
        let position = self.peek()?.position;
        let expression = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Statement::ExpressionStatement {
            expression,
            position,
        })
    }

    fn parse_expression(&mut self) -> Result<Expression, JsError> {
        self.parse_assignment_expression()
    }

    fn parse_assignment_expression(&mut self) -> Result<Expression, JsError> {
        self.nested(Self::parse_assignment_expression_inner)
    }

    fn parse_assignment_expression_inner(&mut self) -> Result<Expression, JsError> {
        let left = self.parse_conditional_expression()?;

        let next = self.peek()?;
        let operator = match next.token {
            Token::Punctuator(Punctuator::Assign) => AssignmentOperator::Assign,
            Token::Punctuator(Punctuator::PlusEq) => AssignmentOperator::AddAssign,
            Token::Punctuator(Punctuator::MinusEq) => AssignmentOperator::SubAssign,
            Token::Punctuator(Punctuator::StarEq) => AssignmentOperator::MulAssign,
            Token::Punctuator(Punctuator::SlashEq) => AssignmentOperator::DivAssign,
            _ => return Ok(left),
        };
        self.lexer.next_token()?;

        let position = left.position();
        let target = Self::expression_to_assignment_target(
            left,
            "Invalid left-hand side in assignment",
        )?;
        // Assignment is right-associative: a = b = c
        let value = Box::new(self.parse_assignment_expression()?);

        Ok(Expression::AssignmentExpression {
            target,
            operator,
            value,
            position,
        })
    }

    fn expression_to_assignment_target(
        expr: Expression,
        message: &str,
    ) -> Result<AssignmentTarget, JsError> {
        match expr {
            Expression::Identifier { name, .. } => Ok(AssignmentTarget::Identifier(name)),
            Expression::MemberExpression {
                object, property, ..
            } => Ok(AssignmentTarget::Member { object, property }),
            other => Err(syntax_error(message, Some(other.position()))),
        }
    }

    fn parse_conditional_expression(&mut self) -> Result<Expression, JsError> {
        let test = self.parse_logical_or_expression()?;

        if !self.eat_punctuator(Punctuator::Question)? {
            return Ok(test);
        }

        let consequent = self.parse_assignment_expression()?;
        self.expect_punctuator(Punctuator::Colon)?;
        let alternate = self.parse_assignment_expression()?;

        let position = test.position();
        Ok(Expression::ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            position,
        })
    }

    fn parse_logical_or_expression(&mut self) -> Result<Expression, JsError> {
        let mut left = self.parse_logical_and_expression()?;

        let mut links = 0;
        while self.eat_punctuator(Punctuator::OrOr)? {
            self.extend_chain(&mut links)?;
            let right = self.parse_logical_and_expression()?;
            let position = left.position();
            left = Expression::LogicalExpression {
                left: Box::new(left),
                operator: LogicalOperator::Or,
                right: Box::new(right),
                position,
            };
        }

        Ok(left)
    }

    fn parse_logical_and_expression(&mut self) -> Result<Expression, JsError> {
        let mut left = self.parse_equality_expression()?;

        let mut links = 0;
        while self.eat_punctuator(Punctuator::AndAnd)? {
            self.extend_chain(&mut links)?;
            let right = self.parse_equality_expression()?;
            let position = left.position();
            left = Expression::LogicalExpression {
                left: Box::new(left),
                operator: LogicalOperator::And,
                right: Box::new(right),
                position,
            };
        }

        Ok(left)
    }

    fn parse_equality_expression(&mut self) -> Result<Expression, JsError> {
        let mut left = self.parse_relational_expression()?;

        let mut links = 0;
        loop {
            let op = match self.lexer.peek_token()?.token {
                Token::Punctuator(Punctuator::EqEq) => BinaryOperator::Eq,
                Token::Punctuator(Punctuator::NotEq) => BinaryOperator::NotEq,
                Token::Punctuator(Punctuator::EqEqEq) => BinaryOperator::StrictEq,
                Token::Punctuator(Punctuator::NotEqEq) => BinaryOperator::StrictNotEq,
                _ => break,
            };
            self.lexer.next_token()?;
            self.extend_chain(&mut links)?;
            let right = self.parse_relational_expression()?;
            left = Self::binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_relational_expression(&mut self) -> Result<Expression, JsError> {
        let mut left = self.parse_additive_expression()?;

        let mut links = 0;
        loop {
            let op = match self.lexer.peek_token()?.token {
                Token::Punctuator(Punctuator::Lt) => BinaryOperator::Lt,
                Token::Punctuator(Punctuator::LtEq) => BinaryOperator::LtEq,
                Token::Punctuator(Punctuator::Gt) => BinaryOperator::Gt,
                Token::Punctuator(Punctuator::GtEq) => BinaryOperator::GtEq,
                Token::Keyword(Keyword::Instanceof) => BinaryOperator::Instanceof,
                Token::Keyword(Keyword::In) => BinaryOperator::In,
                _ => break,
            };
            self.lexer.next_token()?;
            self.extend_chain(&mut links)?;
            let right = self.parse_additive_expression()?;
            left = Self::binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_additive_expression(&mut self) -> Result<Expression, JsError> {
        let mut left = self.parse_multiplicative_expression()?;

        let mut links = 0;
        loop {
            let op = match self.lexer.peek_token()?.token {
                Token::Punctuator(Punctuator::Plus) => BinaryOperator::Add,
                Token::Punctuator(Punctuator::Minus) => BinaryOperator::Sub,
                _ => break,
            };
            self.lexer.next_token()?;
            self.extend_chain(&mut links)?;
            let right = self.parse_multiplicative_expression()?;
            left = Self::binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> Result<Expression, JsError> {
        let mut left = self.parse_unary_expression()?;

        let mut links = 0;
        loop {
            let op = match self.lexer.peek_token()?.token {
                Token::Punctuator(Punctuator::Star) => BinaryOperator::Mul,
                Token::Punctuator(Punctuator::Slash) => BinaryOperator::Div,
                Token::Punctuator(Punctuator::Percent) => BinaryOperator::Mod,
                _ => break,
            };
            self.lexer.next_token()?;
            self.extend_chain(&mut links)?;
            let right = self.parse_unary_expression()?;
            left = Self::binary(left, op, right);
        }

        Ok(left)
    }

    fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
        let position = left.position();
        Expression::BinaryExpression {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            position,
        }
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, JsError> {
        let next = self.peek()?;
        let op = match next.token {
            Token::Punctuator(Punctuator::Not) => Some(UnaryOperator::Not),
            Token::Punctuator(Punctuator::Minus) => Some(UnaryOperator::Minus),
            Token::Punctuator(Punctuator::Plus) => Some(UnaryOperator::Plus),
            Token::Keyword(Keyword::Typeof) => Some(UnaryOperator::Typeof),
            _ => None,
        };

        if let Some(operator) = op {
            self.lexer.next_token()?;
            let argument = Box::new(self.nested(Self::parse_unary_expression)?);
            return Ok(Expression::UnaryExpression {
                operator,
                argument,
                position: next.position,
            });
        }

        let update = match next.token {
            Token::Punctuator(Punctuator::PlusPlus) => Some(UpdateOperator::Increment),
            Token::Punctuator(Punctuator::MinusMinus) => Some(UpdateOperator::Decrement),
            _ => None,
        };

        if let Some(operator) = update {
            self.lexer.next_token()?;
            let argument = self.parse_left_hand_side_expression()?;
            let target = Self::expression_to_assignment_target(
                argument,
                "Invalid left-hand side expression in prefix operation",
            )?;
            return Ok(Expression::UpdateExpression {
                operator,
                prefix: true,
                target,
                position: next.position,
            });
        }

        self.parse_postfix_expression()
    }

    fn parse_postfix_expression(&mut self) -> Result<Expression, JsError> {
        let expr = self.parse_left_hand_side_expression()?;

        let next = self.peek()?;
        // A line terminator before ++/-- starts a new statement
        if next.newline_before {
            return Ok(expr);
        }
        let operator = match next.token {
            Token::Punctuator(Punctuator::PlusPlus) => UpdateOperator::Increment,
            Token::Punctuator(Punctuator::MinusMinus) => UpdateOperator::Decrement,
            _ => return Ok(expr),
        };
        self.lexer.next_token()?;

        let position = expr.position();
        let target = Self::expression_to_assignment_target(
            expr,
            "Invalid left-hand side expression in postfix operation",
        )?;
        Ok(Expression::UpdateExpression {
            operator,
            prefix: false,
            target,
            position,
        })
    }

    fn parse_left_hand_side_expression(&mut self) -> Result<Expression, JsError> {
        let mut expr = if self.check_keyword(Keyword::New)? {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };

        let mut links = 0;
        loop {
            let next = self.peek()?;
            expr = match next.token {
                Token::Punctuator(Punctuator::Dot) | Token::Punctuator(Punctuator::LBracket) => {
                    self.extend_chain(&mut links)?;
                    self.parse_member_access(expr)?
                }
                Token::Punctuator(Punctuator::LParen) => {
                    self.extend_chain(&mut links)?;
                    let arguments = self.parse_arguments()?;
                    let position = expr.position();
                    Expression::CallExpression {
                        callee: Box::new(expr),
                        arguments,
                        position,
                    }
                }
                _ => break,
            };
        }

        Ok(expr)
    }

    fn parse_new_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.expect_keyword(Keyword::New)?;

        let mut callee = if self.check_keyword(Keyword::New)? {
            self.nested(Self::parse_new_expression)?
        } else {
            self.parse_primary_expression()?
        };

        // Member accesses bind tighter than `new`; the first argument list
        // belongs to the constructor call.
        let mut links = 0;
        while self.check_punctuator(Punctuator::Dot)?
            || self.check_punctuator(Punctuator::LBracket)?
        {
            self.extend_chain(&mut links)?;
            callee = self.parse_member_access(callee)?;
        }

        let arguments = if self.check_punctuator(Punctuator::LParen)? {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        Ok(Expression::NewExpression {
            callee: Box::new(callee),
            arguments,
            position: start.position,
        })
    }

    fn parse_member_access(&mut self, object: Expression) -> Result<Expression, JsError> {
        let position = object.position();
        let token = self.lexer.next_token()?;
        let property = match token.token {
            Token::Punctuator(Punctuator::Dot) => MemberProperty::Named(self.expect_property_name()?),
            Token::Punctuator(Punctuator::LBracket) => {
                let property = self.parse_expression()?;
                self.expect_punctuator(Punctuator::RBracket)?;
                MemberProperty::Computed(Box::new(property))
            }
            _ => return Err(self.unexpected(&token)),
        };

        Ok(Expression::MemberExpression {
            object: Box::new(object),
            property,
            position,
        })
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, JsError> {
        self.expect_punctuator(Punctuator::LParen)?;
        let mut arguments = Vec::new();
        loop {
            if self.eat_punctuator(Punctuator::RParen)? {
                return Ok(arguments);
            }
            arguments.push(self.parse_assignment_expression()?);
            if !self.eat_punctuator(Punctuator::Comma)? {
                self.expect_punctuator(Punctuator::RParen)?;
                return Ok(arguments);
            }
        }
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, JsError> {
        let next = self.peek()?;
        let position = next.position;

        let literal = match &next.token {
            Token::Number(n) => Some(Literal::Number(*n)),
            Token::String(s) => Some(Literal::String(s.clone())),
            Token::Keyword(Keyword::True) => Some(Literal::Boolean(true)),
            Token::Keyword(Keyword::False) => Some(Literal::Boolean(false)),
            Token::Keyword(Keyword::Null) => Some(Literal::Null),
            _ => None,
        };
        if let Some(value) = literal {
            self.lexer.next_token()?;
            return Ok(Expression::Literal { value, position });
        }

        match next.token {
            Token::Identifier(name) => {
                self.lexer.next_token()?;
                Ok(Expression::Identifier { name, position })
            }
            Token::Keyword(Keyword::This) => {
                self.lexer.next_token()?;
                Ok(Expression::ThisExpression { position })
            }
            Token::Keyword(Keyword::Function) => {
                Ok(Expression::FunctionExpression(self.parse_function(false)?))
            }
            Token::Punctuator(Punctuator::LParen) => {
                self.lexer.next_token()?;
                let expr = self.parse_expression()?;
                self.expect_punctuator(Punctuator::RParen)?;
                Ok(expr)
            }
            Token::Punctuator(Punctuator::LBracket) => self.parse_array_literal(),
            Token::Punctuator(Punctuator::LBrace) => self.parse_object_literal(),
            _ => Err(self.unexpected(&next)),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expression, JsError> {
        let start = self.expect_punctuator(Punctuator::LBracket)?;
        let mut elements = Vec::new();
        loop {
            if self.eat_punctuator(Punctuator::RBracket)? {
                break;
            }
            elements.push(self.parse_assignment_expression()?);
            if !self.eat_punctuator(Punctuator::Comma)? {
                self.expect_punctuator(Punctuator::RBracket)?;
                break;
            }
        }
        Ok(Expression::ArrayExpression {
            elements,
            position: start.position,
        })
    }

    fn parse_object_literal(&mut self) -> Result<Expression, JsError> {
        let start = self.expect_punctuator(Punctuator::LBrace)?;
        let mut properties = Vec::new();
        loop {
            if self.eat_punctuator(Punctuator::RBrace)? {
                break;
            }

            let key_token = self.peek()?;
            let key = self.expect_property_name()?;
            let value = if self.eat_punctuator(Punctuator::Colon)? {
                self.parse_assignment_expression()?
            } else if matches!(key_token.token, Token::Identifier(_)) {
                // Shorthand `{ name }`
                Expression::Identifier {
                    name: key.clone(),
                    position: key_token.position,
                }
            } else {
                let next = self.peek()?;
                return Err(self.unexpected(&next));
            };
            properties.push((key, value));

            if !self.eat_punctuator(Punctuator::Comma)? {
                self.expect_punctuator(Punctuator::RBrace)?;
                break;
            }
        }
        Ok(Expression::ObjectExpression {
            properties,
            position: start.position,
        })
    }

    fn check_punctuator(&mut self, p: Punctuator) -> Result<bool, JsError> {
        Ok(matches!(self.lexer.peek_token()?.token, Token::Punctuator(x) if x == p))
    }

    fn check_keyword(&mut self, k: Keyword) -> Result<bool, JsError> {
        Ok(matches!(self.lexer.peek_token()?.token, Token::Keyword(x) if x == k))
    }

    fn eat_punctuator(&mut self, p: Punctuator) -> Result<bool, JsError> {
        if self.check_punctuator(p)? {
            self.lexer.next_token()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn eat_keyword(&mut self, k: Keyword) -> Result<bool, JsError> {
        if self.check_keyword(k)? {
            self.lexer.next_token()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn expect_punctuator(&mut self, p: Punctuator) -> Result<SpannedToken, JsError> {
        let token = self.lexer.next_token()?;
        if token.token == Token::Punctuator(p) {
            return Ok(token);
        }
        Err(self.unexpected(&token))
    }

    fn expect_keyword(&mut self, k: Keyword) -> Result<SpannedToken, JsError> {
        let token = self.lexer.next_token()?;
        if token.token == Token::Keyword(k) {
            return Ok(token);
        }
        Err(self.unexpected(&token))
    }

    fn expect_identifier(&mut self) -> Result<(String, SourcePosition), JsError> {
        let token = self.lexer.next_token()?;
        match token.token {
            Token::Identifier(name) => Ok((name, token.position)),
            _ => Err(self.unexpected(&token)),
        }
    }

    /// Expect a property name. Keywords are valid property names
    /// (`assert.throws`, `obj.new`), as are string and number keys.
    fn expect_property_name(&mut self) -> Result<String, JsError> {
        let token = self.lexer.next_token()?;
        match token.token {
            Token::Identifier(name) => Ok(name),
            Token::Keyword(k) => Ok(k.as_str().to_string()),
            Token::String(s) => Ok(s),
            Token::Number(n) => Ok(n.to_string()),
            _ => Err(self.unexpected(&token)),
        }
    }

    fn consume_semicolon(&mut self) -> Result<(), JsError> {
        let next = self.peek()?;
        match next.token {
            // If there's an explicit semicolon, consume it
            Token::Punctuator(Punctuator::Semicolon) => {
                self.lexer.next_token()?;
                Ok(())
            }
            // ASI before a closing brace and at end of input
            Token::Punctuator(Punctuator::RBrace) | Token::EOF => Ok(()),
            // ASI after a line terminator
            _ if next.newline_before => Ok(()),
            _ => Err(self.unexpected(&next)),
        }
    }

    fn unexpected(&self, token: &SpannedToken) -> JsError {
        match token.token {
            Token::EOF => unexpected_eof(token.position),
            ref other => unexpected_token(&other.describe(), token.position),
        }
    }
}
