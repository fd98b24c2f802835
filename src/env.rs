use std::{cell::RefCell, rc::Rc};

use rpds::RedBlackTreeMap;

use crate::{error::EvalError, value::Value};

pub type EnvRef = Rc<RefCell<Env>>;

/// A lexical scope.
///
/// Cloning an environment copies its bindings and shares its parent link.
/// Bindings live in a persistent map, so the copy shares structure with the
/// original while behaving as an independent deep copy.
#[derive(Debug, Clone, Default)]
pub struct Env {
    parent: Option<EnvRef>,
    bindings: RedBlackTreeMap<String, Value>,
}

impl Env {
    pub fn new() -> Self {
        Env::default()
    }
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }
    pub fn set_parent(&mut self, parent: Option<EnvRef>) {
        self.parent = parent;
    }
    /// Number of bindings in this scope alone
    pub(crate) fn len(&self) -> usize {
        self.bindings.size()
    }
    /// Look up `name` here, then in each ancestor
    pub fn get(&self, name: &str) -> Value {
        if let Some(value) = self.bindings.get(name) {
            return value.clone();
        }
        match &self.parent {
            Some(parent) => parent.borrow().get(name),
            None => EvalError::UnboundSymbol(name.into()).into(),
        }
    }
    /// Bind `name` in this scope only, replacing any existing binding
    pub fn put<N>(&mut self, name: N, value: Value)
    where
        N: Into<String>,
    {
        let name = name.into();
        tracing::trace!(%name, %value, "put");
        self.bindings = self.bindings.insert(name, value);
    }
    /// Bind `name` in the root of the chain `env` belongs to
    pub fn def<N>(env: &EnvRef, name: N, value: Value)
    where
        N: Into<String>,
    {
        Env::root(env).borrow_mut().put(name, value);
    }
    pub fn root(env: &EnvRef) -> EnvRef {
        let mut current = env.clone();
        loop {
            let parent = current.borrow().parent.clone();
            match parent {
                Some(parent) => current = parent,
                None => break current,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound() {
        let env = Env::new();
        assert_eq!(
            env.get("nope"),
            Value::Error("Unbound Symbol 'nope'".into())
        );
    }

    #[test]
    fn lookup_walks_parents() {
        let global = Env::new().into_ref();
        global.borrow_mut().put("x", Value::Integer(1));
        let mut local = Env::new();
        local.set_parent(Some(global.clone()));
        assert_eq!(local.get("x"), Value::Integer(1));
        local.put("x", Value::Integer(2));
        assert_eq!(local.get("x"), Value::Integer(2));
        assert_eq!(global.borrow().get("x"), Value::Integer(1));
    }

    #[test]
    fn put_replaces() {
        let mut env = Env::new();
        env.put("x", Value::Integer(1));
        env.put("x", Value::Integer(2));
        assert_eq!(env.len(), 1);
        assert_eq!(env.get("x"), Value::Integer(2));
    }

    #[test]
    fn def_installs_globally() {
        let global = Env::new().into_ref();
        let mut middle = Env::new();
        middle.set_parent(Some(global.clone()));
        let middle = middle.into_ref();
        let mut inner = Env::new();
        inner.set_parent(Some(middle.clone()));
        let inner = inner.into_ref();

        Env::def(&inner, "y", Value::Integer(10));
        assert_eq!(global.borrow().get("y"), Value::Integer(10));
        assert_eq!(middle.borrow().len(), 0);
        assert_eq!(inner.borrow().get("y"), Value::Integer(10));
    }

    #[test]
    fn copy_is_independent() {
        let global = Env::new().into_ref();
        let mut env = Env::new();
        env.set_parent(Some(global.clone()));
        env.put("a", Value::Integer(1));
        let mut copy = env.clone();
        copy.put("a", Value::Integer(2));
        copy.put("b", Value::Integer(3));
        assert_eq!(env.get("a"), Value::Integer(1));
        assert!(env.get("b").is_error());
        // The copy still resolves through the same parent
        global.borrow_mut().put("g", Value::Integer(4));
        assert_eq!(copy.get("g"), Value::Integer(4));
        assert_eq!(env.get("g"), Value::Integer(4));
    }
}
