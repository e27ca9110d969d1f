use crate::ast::{
    BinaryOperator, Block, ComparisonOperator, Condition, Expression, FunctionCall, Program,
    Statement, VarType,
};

mod error;
mod scope;
mod value;

pub use error::RuntimeError;
pub use scope::{Scope, ScopeManager};
pub use value::{Value, Variable, format_number};

/// Control-flow marker for statement execution: `Return` unwinds through
/// blocks, loops and ifs up to the enclosing function call.
#[derive(Debug, PartialEq)]
pub enum ExecResult {
    Continue,
    Return(Value),
}

/// Tree-walking evaluator enforcing the currency/decimal type discipline.
/// `print` output accumulates in an internal sink, one entry per statement,
/// for the driver to render.
#[derive(Debug)]
pub struct Interpreter {
    scope_manager: ScopeManager,
    output: Vec<String>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            scope_manager: ScopeManager::new(),
            output: Vec::new(),
        }
    }

    /// Registers every function definition in the global scope, then runs
    /// `main` in the base scope so its locals stay observable after the run.
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        for def in &program.functions {
            self.scope_manager.add_function(def)?;
        }
        let main = self
            .scope_manager
            .lookup_function("main")
            .map_err(|_| RuntimeError::MissingMain)?
            .clone();
        if !main.parameters.is_empty() {
            return Err(RuntimeError::FunctionArityMismatch {
                name: main.name,
                expected: main.parameters.len(),
                found: 0,
            });
        }
        self.exec_block(&main.body)?;
        Ok(())
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn scope_manager(&self) -> &ScopeManager {
        &self.scope_manager
    }

    pub fn scope_manager_mut(&mut self) -> &mut ScopeManager {
        &mut self.scope_manager
    }

    pub fn exec_block(&mut self, block: &Block) -> Result<ExecResult, RuntimeError> {
        // Execute statements in order until one returns, then bubble that up.
        for statement in &block.statements {
            match self.exec_statement(statement)? {
                ExecResult::Continue => {}
                ExecResult::Return(value) => return Ok(ExecResult::Return(value)),
            }
        }
        Ok(ExecResult::Continue)
    }

    pub fn exec_statement(&mut self, statement: &Statement) -> Result<ExecResult, RuntimeError> {
        match statement {
            Statement::Init {
                var_type,
                name,
                value,
                currency,
            } => {
                self.exec_init(*var_type, name, value.as_ref(), currency.as_deref())?;
                Ok(ExecResult::Continue)
            }
            Statement::Assign {
                name,
                value,
                currency,
            } => {
                self.exec_assign(name, value, currency.as_deref())?;
                Ok(ExecResult::Continue)
            }
            Statement::Call(call) => {
                self.eval_call(call)?;
                Ok(ExecResult::Continue)
            }
            Statement::If { condition, body } => {
                if self.eval_condition(condition)? {
                    return self.exec_block(body);
                }
                Ok(ExecResult::Continue)
            }
            Statement::While { condition, body } => {
                while self.eval_condition(condition)? {
                    if let ExecResult::Return(value) = self.exec_block(body)? {
                        return Ok(ExecResult::Return(value));
                    }
                }
                Ok(ExecResult::Continue)
            }
            Statement::Return(expr) => {
                let value = self.eval_expression(expr)?;
                Ok(ExecResult::Return(value))
            }
            Statement::Print(args) => {
                let mut rendered = String::new();
                for arg in args {
                    rendered.push_str(&self.eval_expression(arg)?.render());
                }
                self.output.push(rendered.clone());
                self.scope_manager.set_last_result(Value::Str(rendered));
                Ok(ExecResult::Continue)
            }
        }
    }

    fn exec_init(
        &mut self,
        var_type: VarType,
        name: &str,
        value: Option<&Expression>,
        currency: Option<&str>,
    ) -> Result<(), RuntimeError> {
        let variable = match var_type {
            VarType::Void => {
                return Err(RuntimeError::InvalidVariableType {
                    name: name.to_string(),
                });
            }
            VarType::Decimal => match value {
                None => Variable::Decimal { value: None },
                Some(expr) => match self.eval_with_currency(expr, currency)? {
                    Value::Decimal(value) => Variable::Decimal { value: Some(value) },
                    Value::Currency { .. } => {
                        return Err(RuntimeError::CurrencyUsedForDecimalVariable {
                            name: name.to_string(),
                        });
                    }
                    other => {
                        return Err(RuntimeError::ExpectedNumericValue {
                            type_name: other.type_name(),
                        });
                    }
                },
            },
            VarType::Currency => match value {
                None => Variable::Currency {
                    value: None,
                    code: None,
                },
                Some(expr) => match self.eval_with_currency(expr, currency)? {
                    // Currency is inherited from the literal's code or from a
                    // currency-typed source expression.
                    Value::Currency { amount, code } => Variable::Currency {
                        value: Some(amount),
                        code: Some(code),
                    },
                    Value::Decimal(_) => {
                        return Err(RuntimeError::CurrencyNotDefined {
                            name: name.to_string(),
                        });
                    }
                    other => {
                        return Err(RuntimeError::ExpectedNumericValue {
                            type_name: other.type_name(),
                        });
                    }
                },
            },
        };
        self.scope_manager.add_symbol(name, variable)
    }

    fn exec_assign(
        &mut self,
        name: &str,
        value: &Expression,
        currency: Option<&str>,
    ) -> Result<(), RuntimeError> {
        let new_value = self.eval_with_currency(value, currency)?;
        let variable = self.scope_manager.lookup_mut(name)?;
        match (variable, new_value) {
            (Variable::Decimal { value }, Value::Decimal(amount)) => {
                *value = Some(amount);
            }
            (Variable::Decimal { .. }, Value::Currency { .. }) => {
                return Err(RuntimeError::ChangeVariableType {
                    name: name.to_string(),
                });
            }
            (
                Variable::Currency { value, code },
                Value::Currency {
                    amount,
                    code: new_code,
                },
            ) => {
                *value = Some(amount);
                *code = Some(new_code);
            }
            (Variable::Currency { value, code }, Value::Decimal(amount)) => {
                // A currency-less value is only acceptable once the target's
                // currency is fixed; the fixed currency is kept.
                if code.is_none() {
                    return Err(RuntimeError::CurrencyNotDefinedOrChangeVariableType {
                        name: name.to_string(),
                    });
                }
                *value = Some(amount);
            }
            (_, other) => {
                return Err(RuntimeError::ExpectedNumericValue {
                    type_name: other.type_name(),
                });
            }
        }
        Ok(())
    }

    /// Applies a statement-level trailing currency code
    /// (`a = (2 + 3) pln;`) to the evaluated expression.
    fn eval_with_currency(
        &mut self,
        expr: &Expression,
        currency: Option<&str>,
    ) -> Result<Value, RuntimeError> {
        let value = self.eval_expression(expr)?;
        let Some(code) = currency else {
            return Ok(value);
        };
        match value {
            Value::Decimal(amount) => Ok(Value::Currency {
                amount,
                code: code.to_string(),
            }),
            Value::Currency {
                amount,
                code: existing,
            } => {
                if existing == code {
                    Ok(Value::Currency {
                        amount,
                        code: existing,
                    })
                } else {
                    Err(RuntimeError::CurrencyMismatch {
                        left: existing,
                        right: code.to_string(),
                    })
                }
            }
            other => Err(RuntimeError::ExpectedNumericValue {
                type_name: other.type_name(),
            }),
        }
    }

    pub fn eval_expression(&mut self, expr: &Expression) -> Result<Value, RuntimeError> {
        let value = match expr {
            Expression::Number { value, currency } => match currency {
                None => Value::Decimal(*value),
                Some(code) => Value::Currency {
                    amount: *value,
                    code: code.clone(),
                },
            },
            Expression::String(text) => Value::Str(text.clone()),
            Expression::Variable(name) => self.variable_value(name)?,
            Expression::Call(call) => self.eval_call(call)?,
            Expression::GetCurrency(name) => self.eval_get_currency(name)?,
            Expression::Negate(inner) => match self.eval_expression(inner)? {
                Value::Decimal(value) => Value::Decimal(-value),
                Value::Currency { amount, code } => Value::Currency {
                    amount: -amount,
                    code,
                },
                other => {
                    return Err(RuntimeError::InvalidNegation {
                        type_name: other.type_name(),
                    });
                }
            },
            Expression::Binary { left, op, right } => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                apply_binary(*op, left, right)?
            }
        };
        self.scope_manager.set_last_result(value.clone());
        Ok(value)
    }

    pub fn eval_condition(&mut self, condition: &Condition) -> Result<bool, RuntimeError> {
        let result = match condition {
            // Both sides always evaluate; no short-circuiting.
            Condition::Or { left, right } => {
                let left = self.eval_condition(left)?;
                let right = self.eval_condition(right)?;
                left || right
            }
            Condition::And { left, right } => {
                let left = self.eval_condition(left)?;
                let right = self.eval_condition(right)?;
                left && right
            }
            Condition::Not(inner) => !self.eval_condition(inner)?,
            Condition::Comparison { left, op, right } => {
                let left = self.eval_expression(left)?.as_number()?;
                let right = self.eval_expression(right)?.as_number()?;
                match op {
                    ComparisonOperator::Less => left < right,
                    ComparisonOperator::Greater => left > right,
                    ComparisonOperator::LessEqual => left <= right,
                    ComparisonOperator::GreaterEqual => left >= right,
                    ComparisonOperator::Equal => left == right,
                    ComparisonOperator::NotEqual => left != right,
                }
            }
        };
        self.scope_manager.set_last_result(Value::Bool(result));
        Ok(result)
    }

    fn variable_value(&self, name: &str) -> Result<Value, RuntimeError> {
        match self.scope_manager.lookup(name)? {
            Variable::Decimal { value: Some(value) } => Ok(Value::Decimal(*value)),
            Variable::Currency {
                value: Some(value),
                code: Some(code),
            } => Ok(Value::Currency {
                amount: *value,
                code: code.clone(),
            }),
            Variable::Currency {
                value: Some(_),
                code: None,
            } => Err(RuntimeError::CurrencyNotDefined {
                name: name.to_string(),
            }),
            _ => Err(RuntimeError::UninitializedVariable {
                name: name.to_string(),
            }),
        }
    }

    fn eval_get_currency(&mut self, name: &str) -> Result<Value, RuntimeError> {
        match self.scope_manager.lookup(name)? {
            Variable::Currency {
                code: Some(code), ..
            } => Ok(Value::Str(code.clone())),
            Variable::Currency { code: None, .. } => Err(RuntimeError::CurrencyNotDefined {
                name: name.to_string(),
            }),
            Variable::Decimal { .. } => Err(RuntimeError::GetCurrency {
                name: name.to_string(),
            }),
        }
    }

    /// Calls resolve against the global scope only; arguments evaluate
    /// left-to-right in the caller's scope before the frame is pushed.
    fn eval_call(&mut self, call: &FunctionCall) -> Result<Value, RuntimeError> {
        let def = self.scope_manager.lookup_function(&call.name)?.clone();
        if call.args.len() != def.parameters.len() {
            return Err(RuntimeError::FunctionArityMismatch {
                name: call.name.clone(),
                expected: def.parameters.len(),
                found: call.args.len(),
            });
        }
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.eval_expression(arg)?);
        }

        let mut frame = Scope::new();
        for (parameter, value) in def.parameters.iter().zip(args) {
            let variable = match (parameter.var_type, value) {
                (VarType::Decimal, Value::Decimal(value)) => Variable::Decimal { value: Some(value) },
                (VarType::Currency, Value::Currency { amount, code }) => Variable::Currency {
                    value: Some(amount),
                    code: Some(code),
                },
                (VarType::Void, _) => {
                    return Err(RuntimeError::InvalidVariableType {
                        name: parameter.name.clone(),
                    });
                }
                _ => {
                    return Err(RuntimeError::ArgumentTypeMismatch {
                        function: call.name.clone(),
                        parameter: parameter.name.clone(),
                        expected: parameter.var_type.name(),
                    });
                }
            };
            frame.add_symbol(&parameter.name, variable)?;
        }

        self.scope_manager.push_scope(frame);
        let result = self.exec_block(&def.body);
        self.scope_manager.pop_scope();
        match result? {
            ExecResult::Return(value) => Ok(value),
            ExecResult::Continue => Ok(Value::Void),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_binary(op: BinaryOperator, left: Value, right: Value) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Decimal(left), Value::Decimal(right)) => {
            Ok(Value::Decimal(arith(op, left, right)?))
        }
        (
            Value::Currency {
                amount: left,
                code: left_code,
            },
            Value::Currency {
                amount: right,
                code: right_code,
            },
        ) => {
            if left_code != right_code {
                return Err(RuntimeError::CurrencyMismatch {
                    left: left_code,
                    right: right_code,
                });
            }
            Ok(Value::Currency {
                amount: arith(op, left, right)?,
                code: left_code,
            })
        }
        (left, right) => Err(RuntimeError::OperandTypeMismatch {
            operation: op.symbol(),
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}

fn arith(op: BinaryOperator, left: f64, right: f64) -> Result<f64, RuntimeError> {
    match op {
        BinaryOperator::Add => Ok(left + right),
        BinaryOperator::Sub => Ok(left - right),
        BinaryOperator::Mul => Ok(left * right),
        BinaryOperator::Div => {
            if right == 0.0 {
                return Err(RuntimeError::DivisionZero);
            }
            Ok(left / right)
        }
    }
}
