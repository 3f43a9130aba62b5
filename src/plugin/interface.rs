//! Behavior interface and method dispatch.
//!
//! A declared type carries named behaviors. Dispatch walks a linearization
//! and runs the first type that defines the method. A running behavior can
//! hand control to the next implementation further down the chain with
//! [`Call::next`].

use crate::core::{Error, Result};
use crate::plugin::descriptor::TypeHandle;
use serde_json::Value;
use std::sync::Arc;

/// A named method implementation attached to a declared type.
pub trait Behavior: Send + Sync {
    /// Run the method.
    fn call(&self, call: &Call, args: Value) -> Result<Value>;
}

impl<F> Behavior for F
where
    F: Fn(&Call, Value) -> Result<Value> + Send + Sync,
{
    fn call(&self, call: &Call, args: Value) -> Result<Value> {
        self(call, args)
    }
}

/// Context of a running behavior.
#[derive(Clone, Debug)]
pub struct Call {
    method: String,
    owner: TypeHandle,
    chain: Arc<[TypeHandle]>,
    position: usize,
}

impl Call {
    /// Method being dispatched.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Type whose behavior is running.
    pub fn owner(&self) -> &TypeHandle {
        &self.owner
    }

    /// The linearization being walked.
    pub fn chain(&self) -> &[TypeHandle] {
        &self.chain
    }

    /// Whether a later type in the chain also defines this method.
    pub fn has_next(&self) -> bool {
        self.chain[self.position + 1..]
            .iter()
            .any(|ty| ty.defines(&self.method))
    }

    /// Run the next implementation of this method after the owner.
    pub fn next(&self, args: Value) -> Result<Value> {
        resume(&self.chain, &self.method, self.position + 1, args)
    }
}

/// Run the first implementation of `method` found in `chain`.
pub(crate) fn dispatch(chain: &Arc<[TypeHandle]>, method: &str, args: Value) -> Result<Value> {
    resume(chain, method, 0, args)
}

/// Run every implementation of `method` in chain order.
pub(crate) fn collect(chain: &Arc<[TypeHandle]>, method: &str, args: &Value) -> Result<Vec<Value>> {
    let mut results = Vec::new();
    for (position, ty) in chain.iter().enumerate() {
        if let Some(behavior) = ty.method(method) {
            let call = Call {
                method: method.to_string(),
                owner: ty.clone(),
                chain: Arc::clone(chain),
                position,
            };
            results.push(behavior.call(&call, args.clone())?);
        }
    }
    Ok(results)
}

fn resume(chain: &Arc<[TypeHandle]>, method: &str, from: usize, args: Value) -> Result<Value> {
    for (position, ty) in chain.iter().enumerate().skip(from) {
        if let Some(behavior) = ty.method(method) {
            let call = Call {
                method: method.to_string(),
                owner: ty.clone(),
                chain: Arc::clone(chain),
                position,
            };
            return behavior.call(&call, args);
        }
    }
    Err(Error::MethodNotFound(method.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::core::Error;
    use crate::plugin::descriptor::TypeSpec;
    use crate::plugin::registry::Registry;
    use serde_json::{json, Value};

    #[test]
    fn test_first_match_dispatch() {
        let registry = Registry::new();
        let root = registry
            .declare(TypeSpec::root("Root").with_method("greet", |_, _| Ok(json!("root"))))
            .unwrap();
        let child = registry
            .declare(
                TypeSpec::new("Child")
                    .with_base(&root)
                    .with_method("greet", |_, _| Ok(json!("child"))),
            )
            .unwrap();

        assert_eq!(child.invoke("greet", Value::Null).unwrap(), json!("child"));
        assert_eq!(root.invoke("greet", Value::Null).unwrap(), json!("root"));
    }

    #[test]
    fn test_chain_next() {
        let registry = Registry::new();
        let root = registry
            .declare(TypeSpec::root("Root").with_method("tags", |_, _| Ok(json!(["root"]))))
            .unwrap();
        let child = registry
            .declare(TypeSpec::new("Child").with_base(&root).with_method(
                "tags",
                |call, args| {
                    assert!(call.has_next());
                    let mut tags = call.next(args)?;
                    if let Some(list) = tags.as_array_mut() {
                        list.insert(0, json!(call.owner().name()));
                    }
                    Ok(tags)
                },
            ))
            .unwrap();

        assert_eq!(child.invoke("tags", Value::Null).unwrap(), json!(["Child", "root"]));
    }

    #[test]
    fn test_next_without_further_implementation() {
        let registry = Registry::new();
        let root = registry
            .declare(TypeSpec::root("Root").with_method("only", |call, args| call.next(args)))
            .unwrap();

        let result = root.invoke("only", Value::Null);
        assert!(matches!(result, Err(Error::MethodNotFound(m)) if m == "only"));
    }

    #[test]
    fn test_missing_method() {
        let registry = Registry::new();
        let root = registry.declare(TypeSpec::root("Root")).unwrap();
        assert!(matches!(
            root.invoke("nothing", Value::Null),
            Err(Error::MethodNotFound(_))
        ));
    }
}
