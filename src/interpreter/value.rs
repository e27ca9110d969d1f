use super::RuntimeError;

/// A declared binding. The variant is fixed at declaration and never
/// changes for the lifetime of the binding; `None` values model a
/// declaration that has not been assigned yet (`dec a;`).
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    Decimal {
        value: Option<f64>,
    },
    Currency {
        value: Option<f64>,
        code: Option<String>,
    },
}

impl Variable {
    pub fn value(&self) -> Option<f64> {
        match self {
            Variable::Decimal { value } => *value,
            Variable::Currency { value, .. } => *value,
        }
    }

    pub fn currency(&self) -> Option<&str> {
        match self {
            Variable::Decimal { .. } => None,
            Variable::Currency { code, .. } => code.as_deref(),
        }
    }
}

/// A computed result flowing through the last-result slot: expression
/// values, condition outcomes, print output and function return values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Decimal(f64),
    Currency { amount: f64, code: String },
    Bool(bool),
    Str(String),
    Void,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Decimal(_) => "decimal",
            Value::Currency { .. } => "currency",
            Value::Bool(_) => "boolean",
            Value::Str(_) => "string",
            Value::Void => "void",
        }
    }

    /// Numeric payload for comparisons; currency amounts compare by value.
    pub fn as_number(&self) -> Result<f64, RuntimeError> {
        match self {
            Value::Decimal(value) => Ok(*value),
            Value::Currency { amount, .. } => Ok(*amount),
            other => Err(RuntimeError::ExpectedNumericValue {
                type_name: other.type_name(),
            }),
        }
    }

    pub fn render(&self) -> String {
        match self {
            Value::Decimal(value) => format_number(*value),
            Value::Currency { amount, code } => format!("{} {}", format_number(*amount), code),
            Value::Bool(value) => value.to_string(),
            Value::Str(value) => value.clone(),
            Value::Void => "void".to_string(),
        }
    }
}

/// One textual form for all numeric values: integral amounts render
/// without a fractional suffix, everything else uses the shortest `f64`
/// display form.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
