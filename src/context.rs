//! Connection-scoped attribute table.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Attribute name under which the service handler keeps its per-connection
/// state record.
pub const CONN_STATE: &str = "connection.state";

/// Attribute name of the connection handle, as a
/// [`ConnectionHandle`](crate::reactor::ConnectionHandle).
pub const HTTP_CONNECTION: &str = "http.connection";

/// Attribute name of the request head currently being processed, as a
/// [`RequestHead`](crate::protocol::RequestHead).
pub const HTTP_REQUEST: &str = "http.request";

/// Attribute name of the most recently committed response head, as a
/// [`ResponseHead`](crate::protocol::ResponseHead).
pub const HTTP_RESPONSE: &str = "http.response";

/// A string-keyed table of arbitrary shared attributes, scoped to one
/// connection.
///
/// Interceptors, handlers and the service handler itself use it to pass
/// state across pipeline stages. Values are type-erased; retrieval
/// downcasts back to the stored type.
#[derive(Default)]
pub struct HttpContext {
    attrs: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl HttpContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an attribute, replacing any previous value under the name.
    pub fn set_attribute<T: Any + Send + Sync>(&self, name: &str, value: Arc<T>) {
        self.attrs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value);
    }

    /// Retrieves an attribute if one of the requested type is stored.
    pub fn attribute<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let attrs = self.attrs.lock().unwrap_or_else(PoisonError::into_inner);
        attrs.get(name).cloned().and_then(|value| value.downcast::<T>().ok())
    }

    /// Removes an attribute, returning whether one was present.
    pub fn remove_attribute(&self, name: &str) -> bool {
        self.attrs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }
}
