use std::future::Future;
use std::pin::Pin;

/// A pinned, boxed future that is required to be Send and 'static.
///
/// Used for work handed to the runtime, such as grammar loads and diagram
/// renders, which must not borrow from the editor.
pub type BoxFutureStatic<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
