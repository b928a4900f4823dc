//! Host-supplied exchange and context types
//!
//! The binding engine never introspects these structurally; they exist so a
//! handler parameter can receive the call site's exchange (session-bound
//! transports) or client context (stateless transports) verbatim. Host data
//! rides along in an [`Extensions`] map.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Type-erased extensions map for passing host data to handlers.
///
/// Insert values once while setting up the exchange/context; handlers read
/// them through [`Exchange::extension`] or [`ClientContext::extension`].
#[derive(Clone, Default)]
pub struct Extensions {
    map: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Extensions {
    /// Create an empty extensions map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any existing value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, val: T) {
        self.map.insert(TypeId::of::<T>(), Arc::new(val));
    }

    /// Get a reference to a value of the given type, if present.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|val| val.downcast_ref::<T>())
    }

    /// Check whether a value of the given type is present.
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish()
    }
}

/// A session-bound exchange handle.
///
/// Identity is the session id; two clones of the same exchange compare equal.
#[derive(Clone, Debug)]
pub struct Exchange {
    session_id: u64,
    extensions: Arc<Extensions>,
}

impl Exchange {
    /// Create an exchange for the given session id.
    pub fn new(session_id: u64) -> Self {
        Self {
            session_id,
            extensions: Arc::new(Extensions::new()),
        }
    }

    /// Attach host extensions.
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = Arc::new(extensions);
        self
    }

    /// The session id this exchange is bound to.
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Read a host extension by type.
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }
}

impl PartialEq for Exchange {
    fn eq(&self, other: &Self) -> bool {
        self.session_id == other.session_id
    }
}

impl Eq for Exchange {}

/// A context handle for stateless transports.
///
/// Carries no session identity beyond a per-request id.
#[derive(Clone, Debug)]
pub struct ClientContext {
    request_id: u64,
    extensions: Arc<Extensions>,
}

impl ClientContext {
    /// Create a context for the given request id.
    pub fn new(request_id: u64) -> Self {
        Self {
            request_id,
            extensions: Arc::new(Extensions::new()),
        }
    }

    /// Attach host extensions.
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = Arc::new(extensions);
        self
    }

    /// The request id this context was created for.
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Read a host extension by type.
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }
}

impl PartialEq for ClientContext {
    fn eq(&self, other: &Self) -> bool {
        self.request_id == other.request_id
    }
}

impl Eq for ClientContext {}

/// What the call site supplied for the exchange-or-context role.
///
/// Notification handlers are context-free and run with [`CallScope::None`].
#[derive(Clone, Debug, PartialEq)]
pub enum CallScope {
    /// A session-bound exchange.
    Exchange(Exchange),
    /// A stateless client context.
    Context(ClientContext),
    /// No scope supplied.
    None,
}

impl CallScope {
    /// The exchange, if this scope holds one.
    pub fn exchange(&self) -> Option<&Exchange> {
        match self {
            CallScope::Exchange(ex) => Some(ex),
            _ => None,
        }
    }

    /// The client context, if this scope holds one.
    pub fn context(&self) -> Option<&ClientContext> {
        match self {
            CallScope::Context(ctx) => Some(ctx),
            _ => None,
        }
    }
}

impl From<Exchange> for CallScope {
    fn from(ex: Exchange) -> Self {
        CallScope::Exchange(ex)
    }
}

impl From<ClientContext> for CallScope {
    fn from(ctx: ClientContext) -> Self {
        CallScope::Context(ctx)
    }
}
