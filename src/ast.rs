//! Grammar productions as closed sum types. Nodes are immutable after
//! parsing and exclusively owned by their parent.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Decimal,
    Currency,
    Void,
}

impl VarType {
    pub fn name(&self) -> &'static str {
        match self {
            VarType::Decimal => "dec",
            VarType::Currency => "cur",
            VarType::Void => "void",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub functions: Vec<FunctionDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub return_type: VarType,
    pub parameters: Vec<Parameter>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub var_type: VarType,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `dec a;` / `cur a = 5 eur;`. The trailing currency code is the
    /// statement-level `expression [currencyCode]` form.
    Init {
        var_type: VarType,
        name: String,
        value: Option<Expression>,
        currency: Option<String>,
    },
    Assign {
        name: String,
        value: Expression,
        currency: Option<String>,
    },
    Call(FunctionCall),
    If {
        condition: Condition,
        body: Block,
    },
    While {
        condition: Condition,
        body: Block,
    },
    Return(Expression),
    Print(Vec<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number {
        value: f64,
        currency: Option<String>,
    },
    String(String),
    Variable(String),
    Call(FunctionCall),
    /// `a.get_currency()`
    GetCurrency(String),
    /// Unary minus.
    Negate(Box<Expression>),
    Binary {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Or {
        left: Box<Condition>,
        right: Box<Condition>,
    },
    And {
        left: Box<Condition>,
        right: Box<Condition>,
    },
    Not(Box<Condition>),
    Comparison {
        left: Expression,
        op: ComparisonOperator,
        right: Expression,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
}

impl ComparisonOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Less => "<",
            ComparisonOperator::Greater => ">",
            ComparisonOperator::LessEqual => "<=",
            ComparisonOperator::GreaterEqual => ">=",
            ComparisonOperator::Equal => "==",
            ComparisonOperator::NotEqual => "!=",
        }
    }
}
