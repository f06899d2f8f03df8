//! Typed service methods resolved from the injector.

use crate::aspect::ServiceInvocation;
use crate::di::{Bindings, Injector, Resource, Value};
use crate::error::Result;
use crate::types::Type;
use std::fmt;
use std::sync::Arc;

type Function = dyn Fn(&Value) -> anyhow::Result<Value> + Send + Sync;

/// A function from one `parameter` type to one `returns` type, addressable in
/// the injector as `ServiceMethod<parameter, returns>`.
#[derive(Clone)]
pub struct ServiceMethod {
    parameter: Type,
    returns: Type,
    function: Arc<Function>,
    invocation: Option<Arc<dyn ServiceInvocation>>,
}

impl ServiceMethod {
    pub fn new<F>(parameter: Type, returns: Type, function: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            parameter,
            returns,
            function: Arc::new(function),
            invocation: None,
        }
    }

    /// The type a method from `parameter` to `returns` is bound as.
    pub fn type_of(parameter: Type, returns: Type) -> Type {
        Type::of::<ServiceMethod>().parameterized([parameter, returns])
    }

    pub fn ty(&self) -> Type {
        Self::type_of(self.parameter.clone(), self.returns.clone())
    }

    pub fn parameter(&self) -> &Type {
        &self.parameter
    }

    pub fn returns(&self) -> &Type {
        &self.returns
    }

    /// The same method, invoked within `invocation`.
    pub fn framed(self, invocation: Option<Arc<dyn ServiceInvocation>>) -> Self {
        Self { invocation, ..self }
    }

    pub fn invoke(&self, parameter: &Value) -> anyhow::Result<Value> {
        let Some(invocation) = &self.invocation else {
            return (self.function)(parameter);
        };
        let ty = self.ty();
        let state = invocation.before(&ty, parameter);
        match (self.function)(parameter) {
            Ok(result) => {
                invocation.after(&ty, parameter, &result, state);
                Ok(result)
            }
            Err(error) => {
                invocation.after_error(&ty, parameter, &error, state);
                Err(error)
            }
        }
    }

    /// Binds this method as a constant under [`ServiceMethod::ty`].
    pub fn bind_into(self, bindings: &mut Bindings) -> &mut Bindings {
        bindings.bind_constant(Resource::of(self.ty()), self)
    }
}

impl fmt::Debug for ServiceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceMethod")
            .field("type", &self.ty().to_string())
            .field("framed", &self.invocation.is_some())
            .finish()
    }
}

/// Looks up service methods and frames them with the bound
/// [`ServiceInvocation`], if there is one.
pub struct ServiceProvider<'a> {
    injector: &'a Injector,
}

impl<'a> ServiceProvider<'a> {
    pub fn new(injector: &'a Injector) -> Self {
        Self { injector }
    }

    pub fn provide(&self, parameter: Type, returns: Type) -> Result<ServiceMethod> {
        let method = self
            .injector
            .resolve_type_as::<ServiceMethod>(ServiceMethod::type_of(parameter, returns))?;
        let invocation = match self
            .injector
            .resolve_type_as::<Arc<dyn ServiceInvocation>>(Type::of::<dyn ServiceInvocation>())
        {
            Ok(invocation) => Some(invocation.as_ref().clone()),
            Err(error) if error.is_no_candidate() => None,
            Err(error) => return Err(error),
        };
        Ok(method.as_ref().clone().framed(invocation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::InvocationState;
    use crate::di::{Scope, value};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Journal {
        entries: Mutex<Vec<String>>,
    }

    impl ServiceInvocation for Journal {
        fn before(&self, method: &Type, _parameter: &Value) -> InvocationState {
            Box::new(method.to_string())
        }

        fn after(
            &self,
            _method: &Type,
            _parameter: &Value,
            result: &Value,
            state: InvocationState,
        ) {
            let started = state.downcast::<String>().map(|s| *s).unwrap_or_default();
            let result = result.downcast_ref::<i64>().copied().unwrap_or_default();
            self.entries.lock().unwrap().push(format!("{started} = {result}"));
        }

        fn after_error(
            &self,
            _method: &Type,
            _parameter: &Value,
            error: &anyhow::Error,
            _state: InvocationState,
        ) {
            self.entries.lock().unwrap().push(format!("failed: {error}"));
        }
    }

    fn double() -> ServiceMethod {
        ServiceMethod::new(Type::of::<i32>(), Type::of::<i64>(), |parameter| {
            match parameter.downcast_ref::<i32>() {
                Some(&n) if n >= 0 => Ok(value(i64::from(n) * 2)),
                Some(_) => anyhow::bail!("negative input"),
                None => anyhow::bail!("not an i32"),
            }
        })
    }

    #[test]
    fn test_unframed_method_without_hook() {
        let mut bindings = Bindings::new("services");
        double().bind_into(&mut bindings);
        let injector = bindings.build().unwrap();

        let method = ServiceProvider::new(&injector)
            .provide(Type::of::<i32>(), Type::of::<i64>())
            .unwrap();
        let result = method.invoke(&value(21i32)).unwrap();
        assert_eq!(result.downcast_ref::<i64>(), Some(&42));
        assert!(
            ServiceProvider::new(&injector)
                .provide(Type::of::<i64>(), Type::of::<i32>())
                .is_err()
        );
    }

    #[test]
    fn test_bound_hook_frames_invocations() {
        let journal = Arc::new(Journal::default());
        let hook: Arc<dyn ServiceInvocation> = journal.clone();
        let mut bindings = Bindings::new("services");
        double().bind_into(&mut bindings).bind_constant(
            Resource::of(Type::of::<dyn ServiceInvocation>()),
            hook,
        );
        let injector = bindings.build().unwrap();

        let method = ServiceProvider::new(&injector)
            .provide(Type::of::<i32>(), Type::of::<i64>())
            .unwrap();
        method.invoke(&value(5i32)).unwrap();
        assert!(method.invoke(&value(-1i32)).is_err());

        let entries = journal.entries.lock().unwrap().clone();
        assert_eq!(
            entries,
            vec![
                "ServiceMethod<i32,i64> = 10".to_string(),
                "failed: negative input".to_string(),
            ]
        );
    }

    #[test]
    fn test_generic_binding_serves_any_signature() {
        let mut bindings = Bindings::new("services");
        bindings.bind_fn(
            Resource::of(Type::of::<ServiceMethod>()),
            Scope::DependencyType,
            |dependency, _| {
                let ty = dependency.ty();
                let (Some(parameter), Some(returns)) = (ty.parameter(0), ty.parameter(1)) else {
                    anyhow::bail!("{ty} is not parameterized");
                };
                let method = ServiceMethod::new(parameter.clone(), returns.clone(), |p| {
                    Ok(Arc::clone(p))
                });
                Ok(value(method))
            },
        );
        let injector = bindings.build().unwrap();

        let echo = ServiceProvider::new(&injector)
            .provide(Type::of::<String>(), Type::of::<String>())
            .unwrap();
        assert_eq!(echo.parameter(), &Type::of::<String>());
        let result = echo.invoke(&value("hi".to_string())).unwrap();
        assert_eq!(result.downcast_ref::<String>().map(String::as_str), Some("hi"));
    }
}
