use crate::di::Value;
use crate::types::Type;
use std::any::Any;

/// Whatever a hook wants to carry from `before` to the matching `after`.
pub type InvocationState = Box<dyn Any + Send>;

/// # ServiceInvocation
///
/// A single hook around every [`ServiceMethod`](crate::service::ServiceMethod)
/// invocation. Bind one as `Arc<dyn ServiceInvocation>` under
/// `Type::of::<dyn ServiceInvocation>()` and the
/// [`ServiceProvider`](crate::service::ServiceProvider) frames the methods it
/// provides with it.
///
/// Hooks observe; they cannot change arguments, results or errors.
///
/// ### Example
///
/// ```rust
/// use bindery::aspect::{InvocationState, ServiceInvocation};
/// use bindery::di::Value;
/// use bindery::types::Type;
/// use std::time::Instant;
///
/// pub struct Timing;
///
/// impl ServiceInvocation for Timing {
///     fn before(&self, _method: &Type, _parameter: &Value) -> InvocationState {
///         Box::new(Instant::now())
///     }
///
///     fn after(&self, method: &Type, _: &Value, _: &Value, state: InvocationState) {
///         if let Ok(started) = state.downcast::<Instant>() {
///             println!("{method} took {:?}", started.elapsed());
///         }
///     }
/// }
/// ```
pub trait ServiceInvocation: Send + Sync + 'static {
    /// Called before the method runs.
    fn before(&self, _method: &Type, _parameter: &Value) -> InvocationState {
        Box::new(())
    }

    /// Called after the method returned a result.
    fn after(&self, _method: &Type, _parameter: &Value, _result: &Value, _state: InvocationState) {}

    /// Called after the method failed.
    fn after_error(
        &self,
        _method: &Type,
        _parameter: &Value,
        _error: &anyhow::Error,
        _state: InvocationState,
    ) {
    }
}
