use crate::expr::Val;
use rustc_hash::FxHashMap;
use std::{f64::consts, rc::Rc};

/// Every binding of a program. There is exactly one per interpreter and no nesting.
#[derive(Debug, PartialEq)]
pub struct VariableStore {
    vars: FxHashMap<Rc<str>, Val>,
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableStore {
    pub fn new() -> Self {
        let mut vars = FxHashMap::default();
        vars.insert("PI".into(), Val::Num(consts::PI));
        vars.insert("EXP".into(), Val::Num(consts::E));
        VariableStore { vars }
    }

    pub fn is_defined(&self, id: &str) -> bool {
        self.vars.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<Val> {
        self.vars.get(id).cloned()
    }

    /// Missing names read as `0`. Callers that must reject unknown names check
    /// `is_defined` first.
    pub fn get_or_zero(&self, id: &str) -> Val {
        self.get(id).unwrap_or(Val::Num(0.0))
    }

    pub fn set(&mut self, id: Rc<str>, val: Val) {
        self.vars.insert(id, val);
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_constants() {
        let vars = VariableStore::new();
        assert_eq!(vars.get("PI"), Some(Val::Num(consts::PI)));
        assert_eq!(vars.get("EXP"), Some(Val::Num(consts::E)));
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn set_overwrites() {
        let mut vars = VariableStore::new();
        vars.set("x".into(), Val::Num(1.0));
        vars.set("x".into(), Val::String("one".into()));
        assert_eq!(vars.get("x"), Some(Val::String("one".into())));
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn builtins_can_be_reassigned() {
        let mut vars = VariableStore::new();
        vars.set("PI".into(), Val::Num(3.0));
        assert_eq!(vars.get_or_zero("PI"), Val::Num(3.0));
    }

    #[test]
    fn zero_default() {
        let vars = VariableStore::new();
        assert!(!vars.is_defined("nope"));
        assert_eq!(vars.get_or_zero("nope"), Val::Num(0.0));
    }
}
