//! Service registration types.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::internal::Disposer;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::traits::ResolverCore;

// ResolverContext is defined in provider module
pub(crate) use crate::provider::ResolverContext;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Builds the concrete implementation, resolving dependencies through the context.
pub(crate) type Constructor =
    Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// Turns an erased `Arc<I>` into an erased `Arc<Arc<C>>` for one contract `C`.
pub(crate) type Upcast = Arc<dyn Fn(&AnyArc) -> DiResult<AnyArc> + Send + Sync>;

/// Produces the cleanup hook for a freshly created concrete instance, if any.
pub(crate) type DisposeHook = Arc<dyn Fn(&AnyArc) -> Option<Disposer> + Send + Sync>;

/// A materialized service: the contract view and the concrete object behind it.
///
/// Both halves share the same allocation. `service` holds an `Arc<C>` for the
/// contract it was resolved under; `concrete` holds the implementation's own
/// `Arc<I>` so callers can ask for a specific implementation type.
#[derive(Clone)]
pub struct Instance {
    pub(crate) service: AnyArc,
    pub(crate) concrete: AnyArc,
}

impl Instance {
    /// The instance viewed through contract `C`.
    pub fn service<C: ?Sized + 'static>(&self) -> DiResult<Arc<C>> {
        self.service
            .downcast_ref::<Arc<C>>()
            .cloned()
            .ok_or(DiError::TypeMismatch(std::any::type_name::<C>()))
    }

    /// The concrete object, if its type is `I`.
    pub fn concrete<I: Send + Sync + 'static>(&self) -> Option<Arc<I>> {
        self.concrete.clone().downcast::<I>().ok()
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance").finish_non_exhaustive()
    }
}

/// One frozen descriptor together with everything needed to materialize it.
pub(crate) struct Registration {
    pub(crate) descriptor: ServiceDescriptor,
    pub(crate) ctor: Constructor,
    pub(crate) upcast: Upcast,
    pub(crate) dispose: Option<DisposeHook>,
    /// Write-once cache, only used for singletons
    pub(crate) singleton: OnceCell<Instance>,
    /// Index into a scope's cache, only set for scoped descriptors
    pub(crate) scoped_slot: Option<usize>,
}

impl Registration {
    pub(crate) fn new(
        descriptor: ServiceDescriptor,
        ctor: Constructor,
        upcast: Upcast,
        dispose: Option<DisposeHook>,
    ) -> Self {
        Self {
            descriptor,
            ctor,
            upcast,
            dispose,
            singleton: OnceCell::new(),
            scoped_slot: None,
        }
    }

    /// Runs the constructor and hands any cleanup hook to the context's owner.
    ///
    /// Nothing is cached here; the caller decides where the instance lives.
    pub(crate) fn instantiate(&self, ctx: &ResolverContext<'_>) -> DiResult<Instance> {
        let concrete = (self.ctor)(ctx)?;
        let service = (self.upcast)(&concrete)?;

        if let Some(hook) = &self.dispose {
            match hook(&concrete) {
                Some(Disposer::Sync(f)) => ctx.push_sync_disposer(f),
                Some(Disposer::Async(f)) => ctx.push_async_disposer(f),
                None => {}
            }
        }

        Ok(Instance { service, concrete })
    }

    pub(crate) fn lifetime(&self) -> Lifetime {
        self.descriptor.lifetime
    }
}

/// Insertion-ordered multi-map from contract to registrations.
#[derive(Default)]
pub(crate) struct Registry {
    by_contract: HashMap<Key, Vec<Registration>>,
    /// (contract, index) in global registration order, for diagnostics
    order: Vec<(Key, usize)>,
    pub(crate) scoped_count: usize,
}

impl Registry {
    pub(crate) fn insert(&mut self, registration: Registration) {
        let contract = registration.descriptor.contract;
        let regs = self.by_contract.entry(contract).or_default();
        self.order.push((contract, regs.len()));
        regs.push(registration);
    }

    pub(crate) fn contains_contract(&self, contract: &Key) -> bool {
        self.by_contract
            .get(contract)
            .is_some_and(|regs| !regs.is_empty())
    }

    pub(crate) fn contains_pair(&self, contract: &Key, implementation: &Key) -> bool {
        self.all(contract)
            .iter()
            .any(|reg| reg.descriptor.implementation == *implementation)
    }

    /// First-registered descriptor for `contract`.
    #[inline]
    pub(crate) fn first(&self, contract: &Key) -> Option<&Registration> {
        self.by_contract.get(contract).and_then(|regs| regs.first())
    }

    #[inline]
    pub(crate) fn all(&self, contract: &Key) -> &[Registration] {
        self.by_contract
            .get(contract)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.order
            .iter()
            .filter_map(|(contract, index)| self.by_contract.get(contract)?.get(*index))
            .map(|reg| reg.descriptor.clone())
            .collect()
    }

    /// Assigns scope cache slots to scoped registrations.
    pub(crate) fn finalize(&mut self) {
        let mut next_scoped_slot = 0;
        for (contract, index) in &self.order {
            let Some(reg) = self
                .by_contract
                .get_mut(contract)
                .and_then(|regs| regs.get_mut(*index))
            else {
                continue;
            };
            if reg.lifetime() == Lifetime::Scoped {
                reg.scoped_slot = Some(next_scoped_slot);
                next_scoped_slot += 1;
            }
        }
        self.scoped_count = next_scoped_slot;
    }
}
