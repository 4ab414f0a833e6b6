//! Dependency injection registry.
//!
//! Services are described in a [`ServiceCollection`] while a fixture is set
//! up, frozen into a [`ServiceProvider`], and resolved either from the root
//! provider (singletons) or from a per-request [`ServiceScope`].
//!
//! Three lifetimes are supported:
//!
//! | Lifetime | Created | Shared by |
//! |----------|---------|-----------|
//! | [`Lifetime::Singleton`] | on first resolution | every scope of the provider |
//! | [`Lifetime::Scoped`] | on first resolution inside a scope | that scope only |
//! | [`Lifetime::Transient`] | on every resolution | nobody |
//!
//! Registrations made later replace earlier ones for the same type, which is
//! how test doubles are layered over a site's own services. The `try_add_*`
//! variants only register when nothing is present yet.
//!
//! # Example
//!
//! ```rust
//! use testhost_core::di::{ServiceCollection, InjectionError};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UnitOfWork {
//!     db: Arc<Database>,
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_instance(Arc::new(Database {
//!     connection_string: "memory://".to_string(),
//! }));
//! services.add_scoped(|r| Ok(UnitOfWork { db: r.resolve::<Database>()? }));
//!
//! let provider = services.build();
//! let scope = provider.create_scope();
//! let uow: Arc<UnitOfWork> = scope.resolve_required().unwrap();
//! assert_eq!(uow.db.connection_string, "memory://");
//! ```

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use thiserror::Error;

type AnyService = Arc<dyn Any + Send + Sync>;

type Factory = Arc<dyn Fn(&Resolver<'_>) -> Result<AnyService, InjectionError> + Send + Sync>;

type DisposeFn = Arc<dyn Fn(&AnyService) + Send + Sync>;

/// Error when a dependency cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectionError {
    /// No descriptor exists for the requested type.
    #[error("Failed to inject {type_name}: service not registered")]
    NotRegistered {
        /// The type name that could not be resolved.
        type_name: &'static str,
    },

    /// A scoped service was requested outside of a scope.
    #[error("Failed to inject {type_name}: scoped service cannot be resolved from the root provider")]
    ScopedFromRoot {
        /// The scoped type.
        type_name: &'static str,
    },

    /// A factory (directly or indirectly) requested its own type.
    #[error("Failed to inject {type_name}: circular dependency {chain}")]
    Circular {
        /// The type that closed the cycle.
        type_name: &'static str,
        /// The resolution chain, outermost first.
        chain: String,
    },

    /// A factory returned an error.
    #[error("Failed to inject {type_name}: {reason}")]
    Factory {
        /// The type being constructed.
        type_name: &'static str,
        /// Why construction failed.
        reason: String,
    },

    /// The provider was disposed before the resolution.
    #[error("Failed to inject {type_name}: service provider has been disposed")]
    Disposed {
        /// The requested type.
        type_name: &'static str,
    },
}

impl InjectionError {
    /// Creates a new injection error for a missing service.
    pub fn not_registered<T>() -> Self {
        Self::NotRegistered {
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Creates a new injection error with a custom reason.
    pub fn custom<T>(reason: impl Into<String>) -> Self {
        Self::Factory {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }

    /// Returns the name of the type the error is about.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::NotRegistered { type_name }
            | Self::ScopedFromRoot { type_name }
            | Self::Circular { type_name, .. }
            | Self::Factory { type_name, .. }
            | Self::Disposed { type_name } => type_name,
        }
    }
}

/// How long a resolved service instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance per provider.
    Singleton,
    /// One instance per scope (per request).
    Scoped,
    /// A new instance per resolution.
    Transient,
}

/// Release hook for services that hold resources.
///
/// Singletons are disposed when their provider is disposed, scoped services
/// when their scope ends. Disposal runs in reverse creation order.
pub trait Dispose: Send + Sync + 'static {
    /// Releases the resources held by the service.
    fn dispose(&self);
}

#[derive(Clone)]
enum ServiceSource {
    Instance(AnyService),
    Factory(Factory),
}

#[derive(Clone)]
struct ServiceDescriptor {
    type_name: &'static str,
    lifetime: Lifetime,
    source: ServiceSource,
    dispose: Option<DisposeFn>,
}

impl ServiceDescriptor {
    fn construct(&self, resolver: &Resolver<'_>) -> Result<AnyService, InjectionError> {
        match &self.source {
            ServiceSource::Instance(instance) => Ok(Arc::clone(instance)),
            ServiceSource::Factory(factory) => factory(resolver),
        }
    }
}

struct Disposal {
    type_name: &'static str,
    service: AnyService,
    dispose: DisposeFn,
}

impl Disposal {
    fn run(self) {
        tracing::debug!(service = self.type_name, "disposing service");
        (self.dispose)(&self.service);
    }
}

fn erase<T, F>(factory: F) -> Factory
where
    T: Send + Sync + 'static,
    F: Fn(&Resolver<'_>) -> Result<T, InjectionError> + Send + Sync + 'static,
{
    Arc::new(move |resolver| factory(resolver).map(|service| Arc::new(service) as AnyService))
}

fn dispose_fn<T: Dispose>() -> DisposeFn {
    Arc::new(|service: &AnyService| {
        if let Some(service) = (**service).downcast_ref::<T>() {
            service.dispose();
        }
    })
}

fn downcast<T: Send + Sync + 'static>(service: AnyService) -> Result<Arc<T>, InjectionError> {
    service
        .downcast::<T>()
        .map_err(|_| InjectionError::custom::<T>("registered service has a different concrete type"))
}

thread_local! {
    static RESOLVING: RefCell<Vec<(TypeId, &'static str)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a type as "under construction" on the current thread.
struct ResolutionGuard;

impl ResolutionGuard {
    fn enter(id: TypeId, type_name: &'static str) -> Result<Self, InjectionError> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|(t, _)| *t == id) {
                let chain = stack
                    .iter()
                    .map(|(_, name)| *name)
                    .chain(std::iter::once(type_name))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(InjectionError::Circular { type_name, chain });
            }
            stack.push((id, type_name));
            Ok(Self)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Which thread is building each singleton, and which singleton each
/// blocked thread waits for.
///
/// The thread-local stack only sees cycles within one thread. Two threads
/// that each start one side of a cycle would otherwise block on each
/// other's cell forever.
#[derive(Default)]
struct InitTracker {
    owners: HashMap<TypeId, ThreadId>,
    waiting: HashMap<ThreadId, TypeId>,
}

/// Releases a thread's entries in the [`InitTracker`] on drop.
struct InitClaim<'a> {
    tracker: &'a Mutex<InitTracker>,
    id: TypeId,
    thread: ThreadId,
}

impl<'a> InitClaim<'a> {
    /// Records that the current thread is about to build or wait for `id`.
    ///
    /// Fails when the thread building `id` is itself waiting, directly or
    /// through other threads, for a singleton the current thread builds.
    fn enter(
        tracker: &'a Mutex<InitTracker>,
        descriptors: &HashMap<TypeId, ServiceDescriptor>,
        id: TypeId,
        type_name: &'static str,
    ) -> Result<Self, InjectionError> {
        let thread = thread::current().id();
        let mut state = tracker.lock();
        match state.owners.get(&id).copied() {
            Some(owner) if owner != thread => {
                let mut chain = vec![type_name];
                let mut current = owner;
                // Each hop follows a distinct thread, so the walk is bounded.
                for _ in 0..=state.waiting.len() {
                    let Some(wanted) = state.waiting.get(&current).copied() else {
                        break;
                    };
                    chain.push(descriptors.get(&wanted).map_or("?", |d| d.type_name));
                    match state.owners.get(&wanted).copied() {
                        Some(next) if next == thread => {
                            chain.push(type_name);
                            return Err(InjectionError::Circular {
                                type_name,
                                chain: chain.join(" -> "),
                            });
                        }
                        Some(next) => current = next,
                        None => break,
                    }
                }
                state.waiting.insert(thread, id);
            }
            Some(_) => {}
            None => {
                state.owners.insert(id, thread);
            }
        }
        Ok(Self {
            tracker,
            id,
            thread,
        })
    }

    /// Marks the current thread as the builder of `id` once its cell runs
    /// the factory here.
    fn take_ownership(&self) {
        let mut state = self.tracker.lock();
        state.waiting.remove(&self.thread);
        state.owners.insert(self.id, self.thread);
    }
}

impl Drop for InitClaim<'_> {
    fn drop(&mut self) {
        let mut state = self.tracker.lock();
        if state.owners.get(&self.id) == Some(&self.thread) {
            state.owners.remove(&self.id);
        }
        if state.waiting.get(&self.thread) == Some(&self.id) {
            state.waiting.remove(&self.thread);
        }
    }
}

/// A mutable set of service descriptors.
///
/// # Example
///
/// ```rust
/// use testhost_core::di::{Lifetime, ServiceCollection};
///
/// struct Clock;
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(|_| Ok(Clock));
/// assert_eq!(services.lifetime_of::<Clock>(), Some(Lifetime::Singleton));
/// ```
#[derive(Clone, Default)]
pub struct ServiceCollection {
    descriptors: HashMap<TypeId, ServiceDescriptor>,
}

impl ServiceCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert<T: 'static>(
        &mut self,
        lifetime: Lifetime,
        source: ServiceSource,
        dispose: Option<DisposeFn>,
    ) -> &mut Self {
        let type_name = std::any::type_name::<T>();
        if self.descriptors.contains_key(&TypeId::of::<T>()) {
            tracing::trace!(service = type_name, "replacing service registration");
        }
        self.descriptors.insert(
            TypeId::of::<T>(),
            ServiceDescriptor {
                type_name,
                lifetime,
                source,
                dispose,
            },
        );
        self
    }

    /// Registers an existing instance as a singleton.
    ///
    /// Instances are owned by the caller and are never disposed by the provider.
    pub fn add_instance<T: Send + Sync + 'static>(&mut self, service: Arc<T>) -> &mut Self {
        self.insert::<T>(Lifetime::Singleton, ServiceSource::Instance(service), None)
    }

    /// Registers a lazily-constructed singleton.
    pub fn add_singleton<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<T, InjectionError> + Send + Sync + 'static,
    {
        self.insert::<T>(Lifetime::Singleton, ServiceSource::Factory(erase(factory)), None)
    }

    /// Registers a singleton that is disposed with the provider.
    pub fn add_singleton_disposable<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Dispose,
        F: Fn(&Resolver<'_>) -> Result<T, InjectionError> + Send + Sync + 'static,
    {
        self.insert::<T>(
            Lifetime::Singleton,
            ServiceSource::Factory(erase(factory)),
            Some(dispose_fn::<T>()),
        )
    }

    /// Registers a service created once per scope.
    pub fn add_scoped<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<T, InjectionError> + Send + Sync + 'static,
    {
        self.insert::<T>(Lifetime::Scoped, ServiceSource::Factory(erase(factory)), None)
    }

    /// Registers a scoped service that is disposed when its scope ends.
    pub fn add_scoped_disposable<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Dispose,
        F: Fn(&Resolver<'_>) -> Result<T, InjectionError> + Send + Sync + 'static,
    {
        self.insert::<T>(
            Lifetime::Scoped,
            ServiceSource::Factory(erase(factory)),
            Some(dispose_fn::<T>()),
        )
    }

    /// Registers a service created on every resolution.
    pub fn add_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<T, InjectionError> + Send + Sync + 'static,
    {
        self.insert::<T>(Lifetime::Transient, ServiceSource::Factory(erase(factory)), None)
    }

    /// Registers an instance unless the type is already registered.
    pub fn try_add_instance<T: Send + Sync + 'static>(&mut self, service: Arc<T>) -> &mut Self {
        if !self.contains::<T>() {
            self.add_instance(service);
        }
        self
    }

    /// Registers a singleton unless the type is already registered.
    pub fn try_add_singleton<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<T, InjectionError> + Send + Sync + 'static,
    {
        if !self.contains::<T>() {
            self.add_singleton(factory);
        }
        self
    }

    /// Layers `overrides` on top of this collection; its registrations win.
    pub fn extend(&mut self, overrides: ServiceCollection) -> &mut Self {
        self.descriptors.extend(overrides.descriptors);
        self
    }

    /// Checks if a service is registered.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.descriptors.contains_key(&TypeId::of::<T>())
    }

    /// Returns the lifetime a type is registered with.
    #[must_use]
    pub fn lifetime_of<T: 'static>(&self) -> Option<Lifetime> {
        self.descriptors.get(&TypeId::of::<T>()).map(|d| d.lifetime)
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Freezes the collection into a provider.
    #[must_use]
    pub fn build(self) -> ServiceProvider {
        let singletons = self
            .descriptors
            .iter()
            .filter(|(_, d)| d.lifetime == Lifetime::Singleton)
            .map(|(id, d)| {
                let cell = match &d.source {
                    ServiceSource::Instance(instance) => OnceCell::with_value(Arc::clone(instance)),
                    ServiceSource::Factory(_) => OnceCell::new(),
                };
                (*id, cell)
            })
            .collect();

        ServiceProvider {
            inner: Arc::new(ProviderInner {
                descriptors: self.descriptors,
                singletons,
                disposables: Mutex::new(Vec::new()),
                initializing: Mutex::new(InitTracker::default()),
                next_scope_id: AtomicU64::new(1),
                disposed: AtomicBool::new(false),
            }),
        }
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("service_count", &self.descriptors.len())
            .finish()
    }
}

struct ProviderInner {
    descriptors: HashMap<TypeId, ServiceDescriptor>,
    singletons: HashMap<TypeId, OnceCell<AnyService>>,
    disposables: Mutex<Vec<Disposal>>,
    initializing: Mutex<InitTracker>,
    next_scope_id: AtomicU64,
    disposed: AtomicBool,
}

impl Drop for ProviderInner {
    fn drop(&mut self) {
        if !*self.disposed.get_mut() {
            for disposal in std::mem::take(self.disposables.get_mut()).into_iter().rev() {
                disposal.run();
            }
        }
    }
}

/// The root, read-only service registry.
///
/// Cloning is cheap and yields a handle to the same registry.
///
/// # Thread Safety
///
/// The provider is `Send + Sync`. Each singleton has its own initialization
/// cell, so singleton factories may resolve other singletons freely. A
/// dependency cycle is reported as [`InjectionError::Circular`] whether it
/// closes on one thread or across threads that each started one side of it.
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

impl ServiceProvider {
    fn resolve_any(
        &self,
        scope: Option<&ServiceScope>,
        id: TypeId,
        type_name: &'static str,
    ) -> Result<AnyService, InjectionError> {
        if self.inner.disposed.load(Ordering::Acquire) {
            return Err(InjectionError::Disposed { type_name });
        }
        let descriptor = self
            .inner
            .descriptors
            .get(&id)
            .ok_or(InjectionError::NotRegistered { type_name })?;

        match descriptor.lifetime {
            Lifetime::Singleton => self.resolve_singleton(id, descriptor),
            Lifetime::Scoped => scope
                .ok_or(InjectionError::ScopedFromRoot {
                    type_name: descriptor.type_name,
                })?
                .resolve_scoped(id, descriptor),
            Lifetime::Transient => {
                let _guard = ResolutionGuard::enter(id, descriptor.type_name)?;
                match scope {
                    Some(scope) => descriptor.construct(&Resolver::Scope(scope)),
                    None => descriptor.construct(&Resolver::Root(self)),
                }
            }
        }
    }

    fn resolve_singleton(
        &self,
        id: TypeId,
        descriptor: &ServiceDescriptor,
    ) -> Result<AnyService, InjectionError> {
        let cell = self
            .inner
            .singletons
            .get(&id)
            .ok_or(InjectionError::NotRegistered {
                type_name: descriptor.type_name,
            })?;
        if let Some(existing) = cell.get() {
            return Ok(Arc::clone(existing));
        }

        // Entered before the cell so a re-entrant resolution errors instead of blocking.
        let _guard = ResolutionGuard::enter(id, descriptor.type_name)?;
        let claim = InitClaim::enter(
            &self.inner.initializing,
            &self.inner.descriptors,
            id,
            descriptor.type_name,
        )?;
        cell.get_or_try_init(|| {
            claim.take_ownership();
            let service = descriptor.construct(&Resolver::Root(self))?;
            tracing::debug!(service = descriptor.type_name, "singleton created");
            if let Some(dispose) = &descriptor.dispose {
                self.inner.disposables.lock().push(Disposal {
                    type_name: descriptor.type_name,
                    service: Arc::clone(&service),
                    dispose: Arc::clone(dispose),
                });
            }
            Ok(service)
        })
        .map(Arc::clone)
    }

    /// Resolves a service from the root provider.
    ///
    /// Returns `None` if the service is not registered or cannot be built.
    #[must_use]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.resolve_required().ok()
    }

    /// Resolves a service from the root provider or returns an error.
    ///
    /// Scoped services are rejected with [`InjectionError::ScopedFromRoot`].
    pub fn resolve_required<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectionError> {
        self.resolve_any(None, TypeId::of::<T>(), std::any::type_name::<T>())
            .and_then(downcast::<T>)
    }

    /// Checks if a service is registered.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.inner.descriptors.contains_key(&TypeId::of::<T>())
    }

    /// Returns `true` once a singleton has been constructed.
    ///
    /// Registered instances count as created from the start.
    #[must_use]
    pub fn is_created<T: 'static>(&self) -> bool {
        self.inner
            .singletons
            .get(&TypeId::of::<T>())
            .is_some_and(|cell| cell.get().is_some())
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.descriptors.len()
    }

    /// Returns `true` if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.descriptors.is_empty()
    }

    /// Opens a new scope for request-lifetime services.
    #[must_use]
    pub fn create_scope(&self) -> ServiceScope {
        let id = self.inner.next_scope_id.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(scope_id = id, "service scope created");
        ServiceScope {
            id,
            provider: self.clone(),
            scoped: Mutex::new(HashMap::new()),
            disposables: Mutex::new(Vec::new()),
        }
    }

    /// Disposes constructed singletons in reverse creation order.
    ///
    /// Later resolutions fail with [`InjectionError::Disposed`]. Calling this
    /// more than once has no further effect.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let disposables = std::mem::take(&mut *self.inner.disposables.lock());
        for disposal in disposables.into_iter().rev() {
            disposal.run();
        }
    }

    /// Returns `true` once [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("service_count", &self.inner.descriptors.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A per-request view of the provider.
///
/// Scoped services resolved through the same scope are the same instance;
/// two scopes never share scoped instances.
pub struct ServiceScope {
    id: u64,
    provider: ServiceProvider,
    scoped: Mutex<HashMap<TypeId, AnyService>>,
    disposables: Mutex<Vec<Disposal>>,
}

impl ServiceScope {
    /// Returns the scope's identifier, unique within its provider.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the root provider this scope was created from.
    #[must_use]
    pub fn provider(&self) -> &ServiceProvider {
        &self.provider
    }

    fn resolve_scoped(
        &self,
        id: TypeId,
        descriptor: &ServiceDescriptor,
    ) -> Result<AnyService, InjectionError> {
        if let Some(existing) = self.scoped.lock().get(&id) {
            return Ok(Arc::clone(existing));
        }

        let _guard = ResolutionGuard::enter(id, descriptor.type_name)?;
        let service = descriptor.construct(&Resolver::Scope(self))?;

        let mut scoped = self.scoped.lock();
        let stored = scoped.entry(id).or_insert_with(|| {
            if let Some(dispose) = &descriptor.dispose {
                self.disposables.lock().push(Disposal {
                    type_name: descriptor.type_name,
                    service: Arc::clone(&service),
                    dispose: Arc::clone(dispose),
                });
            }
            service
        });
        Ok(Arc::clone(stored))
    }

    /// Resolves a service within this scope.
    #[must_use]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.resolve_required().ok()
    }

    /// Resolves a service within this scope or returns an error.
    pub fn resolve_required<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectionError> {
        self.provider
            .resolve_any(Some(self), TypeId::of::<T>(), std::any::type_name::<T>())
            .and_then(downcast::<T>)
    }

    /// Returns the number of scoped instances created so far.
    #[must_use]
    pub fn scoped_count(&self) -> usize {
        self.scoped.lock().len()
    }
}

impl Drop for ServiceScope {
    fn drop(&mut self) {
        for disposal in std::mem::take(self.disposables.get_mut()).into_iter().rev() {
            disposal.run();
        }
        tracing::trace!(scope_id = self.id, "service scope disposed");
    }
}

impl fmt::Debug for ServiceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceScope")
            .field("id", &self.id)
            .field("scoped_count", &self.scoped_count())
            .finish()
    }
}

/// Resolution entry point handed to service factories.
///
/// Singleton factories receive [`Resolver::Root`] and therefore cannot
/// capture scoped services.
#[derive(Clone, Copy)]
pub enum Resolver<'a> {
    /// Resolving on behalf of a singleton.
    Root(&'a ServiceProvider),
    /// Resolving inside a request scope.
    Scope(&'a ServiceScope),
}

impl Resolver<'_> {
    /// Resolves a dependency.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectionError> {
        match self {
            Self::Root(provider) => provider.resolve_required(),
            Self::Scope(scope) => scope.resolve_required(),
        }
    }

    /// Returns the root provider.
    #[must_use]
    pub fn provider(&self) -> &ServiceProvider {
        match self {
            Self::Root(provider) => provider,
            Self::Scope(scope) => scope.provider(),
        }
    }
}

impl fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root(_) => f.write_str("Resolver::Root"),
            Self::Scope(scope) => write!(f, "Resolver::Scope({})", scope.id()),
        }
    }
}

/// A wrapper for injected dependencies.
///
/// # Example
///
/// ```rust
/// use testhost_core::di::{Inject, ServiceCollection};
///
/// struct Greeter(&'static str);
///
/// let mut services = ServiceCollection::new();
/// services.add_scoped(|_| Ok(Greeter("hello")));
/// let provider = services.build();
/// let scope = provider.create_scope();
///
/// let greeter: Inject<Greeter> = Inject::from_scope(&scope).unwrap();
/// assert_eq!(greeter.0, "hello");
/// ```
#[derive(Clone)]
pub struct Inject<T>(pub Arc<T>);

impl<T> Inject<T> {
    /// Creates a new `Inject` wrapper.
    pub fn new(inner: Arc<T>) -> Self {
        Self(inner)
    }

    /// Converts into the inner `Arc`.
    pub fn into_inner(self) -> Arc<T> {
        self.0
    }
}

impl<T> std::ops::Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Inject").field(&self.0).finish()
    }
}

impl<T: Send + Sync + 'static> Inject<T> {
    /// Extracts the service from a request scope.
    pub fn from_scope(scope: &ServiceScope) -> Result<Self, InjectionError> {
        scope.resolve_required::<T>().map(Inject)
    }
}
