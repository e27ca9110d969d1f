use rustc_hash::FxHashMap;

use crate::ast::FunctionDef;

use super::{RuntimeError, Value, Variable};

/// Name-to-variable bindings for one call frame, preserving insertion
/// order for introspection.
#[derive(Debug, Default)]
pub struct Scope {
    symbols: FxHashMap<String, Variable>,
    order: Vec<String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_symbol(&mut self, name: &str, variable: Variable) -> Result<(), RuntimeError> {
        if self.symbols.contains_key(name) {
            return Err(RuntimeError::Overwrite {
                name: name.to_string(),
            });
        }
        self.order.push(name.to_string());
        self.symbols.insert(name.to_string(), variable);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.symbols.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.symbols.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// The global scope (function definitions, process lifetime), the stack
/// of local scopes (call frames, top = current) and the last-result slot.
#[derive(Debug)]
pub struct ScopeManager {
    functions: FxHashMap<String, FunctionDef>,
    scopes: Vec<Scope>,
    last_result: Option<Value>,
}

impl ScopeManager {
    pub fn new() -> Self {
        Self {
            functions: FxHashMap::default(),
            scopes: vec![Scope::new()],
            last_result: None,
        }
    }

    pub fn add_symbol(&mut self, name: &str, variable: Variable) -> Result<(), RuntimeError> {
        self.current_scope_mut().add_symbol(name, variable)
    }

    pub fn lookup(&self, name: &str) -> Result<&Variable, RuntimeError> {
        self.scopes
            .last()
            .and_then(|scope| scope.get(name))
            .ok_or_else(|| RuntimeError::VariableNotDeclared {
                name: name.to_string(),
            })
    }

    pub fn lookup_mut(&mut self, name: &str) -> Result<&mut Variable, RuntimeError> {
        self.scopes
            .last_mut()
            .and_then(|scope| scope.get_mut(name))
            .ok_or_else(|| RuntimeError::VariableNotDeclared {
                name: name.to_string(),
            })
    }

    pub fn add_function(&mut self, def: &FunctionDef) -> Result<(), RuntimeError> {
        if self.functions.contains_key(&def.name) {
            return Err(RuntimeError::Overwrite {
                name: def.name.clone(),
            });
        }
        self.functions.insert(def.name.clone(), def.clone());
        Ok(())
    }

    pub fn lookup_function(&self, name: &str) -> Result<&FunctionDef, RuntimeError> {
        self.functions
            .get(name)
            .ok_or_else(|| RuntimeError::FunctionNotDefined {
                name: name.to_string(),
            })
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn push_scope(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    /// The base scope never pops; calls are strictly stack-disciplined
    /// above it.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn current_scope(&self) -> &Scope {
        self.scopes.last().unwrap_or_else(|| unreachable!("scope stack is never empty"))
    }

    pub fn current_scope_mut(&mut self) -> &mut Scope {
        self.scopes
            .last_mut()
            .unwrap_or_else(|| unreachable!("scope stack is never empty"))
    }

    pub fn set_last_result(&mut self, value: Value) {
        self.last_result = Some(value);
    }

    pub fn last_result(&self) -> Option<&Value> {
        self.last_result.as_ref()
    }
}

impl Default for ScopeManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeclaration_in_same_scope_fails_with_overwrite() {
        let mut manager = ScopeManager::new();
        manager
            .add_symbol("a", Variable::Decimal { value: Some(1.0) })
            .expect("first declaration");
        let err = manager
            .add_symbol("a", Variable::Currency { value: None, code: None })
            .expect_err("expected overwrite");
        assert_eq!(
            err,
            RuntimeError::Overwrite {
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn lookup_misses_report_variable_not_declared() {
        let manager = ScopeManager::new();
        let err = manager.lookup("missing").expect_err("expected miss");
        assert_eq!(
            err,
            RuntimeError::VariableNotDeclared {
                name: "missing".to_string()
            }
        );
    }

    #[test]
    fn popped_scope_discards_its_bindings() {
        let mut manager = ScopeManager::new();
        let mut frame = Scope::new();
        frame
            .add_symbol("local", Variable::Decimal { value: Some(7.0) })
            .expect("bind parameter");
        manager.push_scope(frame);
        assert!(manager.lookup("local").is_ok());
        manager.pop_scope();
        assert!(manager.lookup("local").is_err());
    }

    #[test]
    fn scope_preserves_declaration_order() {
        let mut scope = Scope::new();
        scope
            .add_symbol("b", Variable::Decimal { value: None })
            .expect("declare b");
        scope
            .add_symbol("a", Variable::Decimal { value: None })
            .expect("declare a");
        let names: Vec<&str> = scope.names().collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
