use thiserror::Error;

/// Semantic and type errors raised during evaluation. Raised at the point
/// of detection and propagated to the interpretation entry point; nothing
/// is retried or recovered internally.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Variable '{name}' is already declared in this scope")]
    Overwrite { name: String },
    #[error("Variable '{name}' was not declared")]
    VariableNotDeclared { name: String },
    #[error("Invalid variable type for '{name}'")]
    InvalidVariableType { name: String },
    #[error("No currency given for currency variable '{name}'")]
    CurrencyNotDefined { name: String },
    #[error("Currency code given for decimal variable '{name}'")]
    CurrencyUsedForDecimalVariable { name: String },
    #[error("Cannot change the type of variable '{name}'")]
    ChangeVariableType { name: String },
    #[error("Currency variable '{name}' has no fixed currency and the assigned value carries none")]
    CurrencyNotDefinedOrChangeVariableType { name: String },
    #[error("Division by zero")]
    DivisionZero,
    #[error("get_currency() called on decimal variable '{name}'")]
    GetCurrency { name: String },
    #[error("Currency mismatch: '{left}' vs '{right}'")]
    CurrencyMismatch { left: String, right: String },
    #[error("Operands of '{operation}' must both be decimal or both currency, got {left} and {right}")]
    OperandTypeMismatch {
        operation: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("Expected a numeric value, got {type_name}")]
    ExpectedNumericValue { type_name: &'static str },
    #[error("Cannot negate a {type_name} value")]
    InvalidNegation { type_name: &'static str },
    #[error("Variable '{name}' is used before it has a value")]
    UninitializedVariable { name: String },
    #[error("Function '{name}' is not defined")]
    FunctionNotDefined { name: String },
    #[error("Function '{name}' expected {expected} arguments, got {found}")]
    FunctionArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Argument '{parameter}' of '{function}' expected a {expected} value")]
    ArgumentTypeMismatch {
        function: String,
        parameter: String,
        expected: &'static str,
    },
    #[error("Program has no 'main' function")]
    MissingMain,
}
