//! Abstract Syntax Tree node definitions

use core_types::SourcePosition;
use std::rc::Rc;

/// A parsed test module
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Top-level statements in source order
    pub body: Vec<Statement>,
}

impl Program {
    /// Top-level function declarations in declaration order.
    ///
    /// This is a purely syntactic walk; no code is evaluated.
    pub fn function_declarations(&self) -> impl Iterator<Item = &Rc<FunctionDef>> {
        self.body.iter().filter_map(|stmt| match stmt {
            Statement::FunctionDeclaration(def) => Some(def),
            _ => None,
        })
    }
}

/// Function declaration or expression shared between the AST and closures
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// Function name (None for anonymous function expressions)
    pub name: Option<String>,
    /// Parameter names
    pub params: Vec<String>,
    /// Function body
    pub body: Vec<Statement>,
    /// Position of the `function` keyword
    pub position: SourcePosition,
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Variable declaration (let, const, var)
    VariableDeclaration {
        /// Declaration kind (let, const, var)
        kind: VariableKind,
        /// List of declarators
        declarations: Vec<VariableDeclarator>,
        /// Source location
        position: SourcePosition,
    },

    /// Function declaration
    FunctionDeclaration(Rc<FunctionDef>),

    /// Expression statement
    ExpressionStatement {
        /// The expression
        expression: Expression,
        /// Source location
        position: SourcePosition,
    },

    /// Return statement
    ReturnStatement {
        /// Return value
        argument: Option<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// If statement
    IfStatement {
        /// Condition
        test: Expression,
        /// Consequent block
        consequent: Box<Statement>,
        /// Alternate block
        alternate: Option<Box<Statement>>,
        /// Source location
        position: SourcePosition,
    },

    /// While loop
    WhileStatement {
        /// Loop condition
        test: Expression,
        /// Loop body
        body: Box<Statement>,
        /// Source location
        position: SourcePosition,
    },

    /// Do-while loop
    DoWhileStatement {
        /// Loop body
        body: Box<Statement>,
        /// Loop condition
        test: Expression,
        /// Source location
        position: SourcePosition,
    },

    /// For loop
    ForStatement {
        /// Initialization
        init: Option<Box<Statement>>,
        /// Condition
        test: Option<Expression>,
        /// Update expression
        update: Option<Expression>,
        /// Loop body
        body: Box<Statement>,
        /// Source location
        position: SourcePosition,
    },

    /// Break statement
    BreakStatement {
        /// Source location
        position: SourcePosition,
    },

    /// Continue statement
    ContinueStatement {
        /// Source location
        position: SourcePosition,
    },

    /// Throw statement
    ThrowStatement {
        /// Thrown value
        argument: Expression,
        /// Source location
        position: SourcePosition,
    },

    /// Try statement
    TryStatement {
        /// Protected block
        block: Vec<Statement>,
        /// Catch clause
        handler: Option<CatchClause>,
        /// Finally block
        finalizer: Option<Vec<Statement>>,
        /// Source location
        position: SourcePosition,
    },

    /// Block statement
    BlockStatement {
        /// Block body
        body: Vec<Statement>,
        /// Source location
        position: SourcePosition,
    },

    /// Empty statement (`;`)
    EmptyStatement {
        /// Source location
        position: SourcePosition,
    },
}

impl Statement {
    /// Source location of the statement
    pub fn position(&self) -> SourcePosition {
        match self {
            Statement::FunctionDeclaration(def) => def.position,
            Statement::VariableDeclaration { position, .. }
            | Statement::ExpressionStatement { position, .. }
            | Statement::ReturnStatement { position, .. }
            | Statement::IfStatement { position, .. }
            | Statement::WhileStatement { position, .. }
            | Statement::DoWhileStatement { position, .. }
            | Statement::ForStatement { position, .. }
            | Statement::BreakStatement { position }
            | Statement::ContinueStatement { position }
            | Statement::ThrowStatement { position, .. }
            | Statement::TryStatement { position, .. }
            | Statement::BlockStatement { position, .. }
            | Statement::EmptyStatement { position } => *position,
        }
    }
}

/// Variable declaration kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// var declaration (function scoped)
    Var,
    /// let declaration (block scoped)
    Let,
    /// const declaration (block scoped, immutable binding)
    Const,
}

/// Variable declarator
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    /// Variable name
    pub name: String,
    /// Initializer
    pub init: Option<Expression>,
}

/// Catch clause
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// Catch parameter (optional catch binding allowed)
    pub param: Option<String>,
    /// Catch body
    pub body: Vec<Statement>,
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Number literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),
    /// null
    Null,
}

/// Property access after `.` or inside `[]`
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// `object.name`
    Named(String),
    /// `object[expr]`
    Computed(Box<Expression>),
}

/// Left-hand side of an assignment or update
#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentTarget {
    /// Plain binding
    Identifier(String),
    /// Property of an object
    Member {
        /// Object being written to
        object: Box<Expression>,
        /// Property being written
        property: MemberProperty,
    },
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Identifier reference
    Identifier {
        /// Name
        name: String,
        /// Source location
        position: SourcePosition,
    },

    /// Literal value
    Literal {
        /// Value
        value: Literal,
        /// Source location
        position: SourcePosition,
    },

    /// Array literal
    ArrayExpression {
        /// Elements
        elements: Vec<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// Object literal
    ObjectExpression {
        /// Properties in source order
        properties: Vec<(String, Expression)>,
        /// Source location
        position: SourcePosition,
    },

    /// Function expression
    FunctionExpression(Rc<FunctionDef>),

    /// `this`
    ThisExpression {
        /// Source location
        position: SourcePosition,
    },

    /// Unary operation
    UnaryExpression {
        /// Operator
        operator: UnaryOperator,
        /// Operand
        argument: Box<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// `++`/`--`
    UpdateExpression {
        /// Operator
        operator: UpdateOperator,
        /// Prefix (`++x`) or postfix (`x++`)
        prefix: bool,
        /// Operand
        target: AssignmentTarget,
        /// Source location
        position: SourcePosition,
    },

    /// Binary operation
    BinaryExpression {
        /// Left operand
        left: Box<Expression>,
        /// Operator
        operator: BinaryOperator,
        /// Right operand
        right: Box<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// Short-circuiting `&&` / `||`
    LogicalExpression {
        /// Left operand
        left: Box<Expression>,
        /// Operator
        operator: LogicalOperator,
        /// Right operand
        right: Box<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// Assignment
    AssignmentExpression {
        /// Target
        target: AssignmentTarget,
        /// Operator
        operator: AssignmentOperator,
        /// Assigned value
        value: Box<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// `test ? a : b`
    ConditionalExpression {
        /// Condition
        test: Box<Expression>,
        /// Value when truthy
        consequent: Box<Expression>,
        /// Value when falsy
        alternate: Box<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// Function call
    CallExpression {
        /// Called expression
        callee: Box<Expression>,
        /// Arguments
        arguments: Vec<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// `new` expression
    NewExpression {
        /// Constructor
        callee: Box<Expression>,
        /// Arguments
        arguments: Vec<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// Property access
    MemberExpression {
        /// Object
        object: Box<Expression>,
        /// Property
        property: MemberProperty,
        /// Source location
        position: SourcePosition,
    },
}

impl Expression {
    /// Source location of the expression
    pub fn position(&self) -> SourcePosition {
        match self {
            Expression::FunctionExpression(def) => def.position,
            Expression::Identifier { position, .. }
            | Expression::Literal { position, .. }
            | Expression::ArrayExpression { position, .. }
            | Expression::ObjectExpression { position, .. }
            | Expression::ThisExpression { position }
            | Expression::UnaryExpression { position, .. }
            | Expression::UpdateExpression { position, .. }
            | Expression::BinaryExpression { position, .. }
            | Expression::LogicalExpression { position, .. }
            | Expression::AssignmentExpression { position, .. }
            | Expression::ConditionalExpression { position, .. }
            | Expression::CallExpression { position, .. }
            | Expression::NewExpression { position, .. }
            | Expression::MemberExpression { position, .. } => *position,
        }
    }

    /// Short source-like rendering used in error messages
    /// (`controller.open`, `test`, `a[...]`)
    pub fn describe(&self) -> String {
        match self {
            Expression::Identifier { name, .. } => name.clone(),
            Expression::ThisExpression { .. } => "this".to_string(),
            Expression::MemberExpression {
                object, property, ..
            } => match property {
                MemberProperty::Named(name) => format!("{}.{}", object.describe(), name),
                MemberProperty::Computed(_) => format!("{}[...]", object.describe()),
            },
            Expression::CallExpression { callee, .. } => format!("{}(...)", callee.describe()),
            Expression::Literal { value, .. } => match value {
                Literal::Number(n) => n.to_string(),
                Literal::String(s) => format!("\"{}\"", s),
                Literal::Boolean(b) => b.to_string(),
                Literal::Null => "null".to_string(),
            },
            _ => "expression".to_string(),
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `!`
    Not,
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `typeof`
    Typeof,
}

/// Update operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `instanceof`
    Instanceof,
    /// `in`
    In,
}

/// Logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    /// `&&`
    And,
    /// `||`
    Or,
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
}

impl AssignmentOperator {
    /// The binary operator a compound assignment applies
    pub fn binary_operator(&self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::Assign => None,
            AssignmentOperator::AddAssign => Some(BinaryOperator::Add),
            AssignmentOperator::SubAssign => Some(BinaryOperator::Sub),
            AssignmentOperator::MulAssign => Some(BinaryOperator::Mul),
            AssignmentOperator::DivAssign => Some(BinaryOperator::Div),
        }
    }
}
