//! Ordered, synchronous listener lists.
//!
//! Each signal type `E` owns a [`Signals<E>`] resource holding its listeners
//! in subscription order. A listener is a Bevy one-shot system taking
//! `In<E>`. [`emit`] runs every listener, one after the other, before it
//! returns; commands queued by a listener are applied before the next one
//! runs, so later listeners always observe earlier mutations.
//!
//! Systems that only hold `Commands` can emit through [`EmitExt`], which
//! defers the whole dispatch to the next command flush.

use bevy::ecs::system::SystemId;
use bevy::prelude::*;

/// Handle returned by [`subscribe`], used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

struct Listener<E: Send + Sync + 'static> {
    id: ListenerId,
    system: SystemId<In<E>>,
}

impl<E: Send + Sync + 'static> Clone for Listener<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            system: self.system,
        }
    }
}

/// Listener list for one signal type.
#[derive(Resource)]
pub struct Signals<E: Send + Sync + 'static> {
    listeners: Vec<Listener<E>>,
    next_id: u32,
}

impl<E: Send + Sync + 'static> Default for Signals<E> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }
}

impl<E: Send + Sync + 'static> Signals<E> {
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.listeners.iter().any(|l| l.id == id)
    }

    fn push(&mut self, system: SystemId<In<E>>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener { id, system });
        id
    }

    fn remove(&mut self, id: ListenerId) -> Option<SystemId<In<E>>> {
        let index = self.listeners.iter().position(|l| l.id == id)?;
        Some(self.listeners.remove(index).system)
    }

    fn snapshot(&self) -> Vec<Listener<E>> {
        self.listeners.clone()
    }
}

/// Register `listener` at the end of `E`'s listener list.
pub fn subscribe<E, M>(
    world: &mut World,
    listener: impl IntoSystem<In<E>, (), M> + 'static,
) -> ListenerId
where
    E: Send + Sync + 'static,
{
    let system = world.register_system(listener);
    world.get_resource_or_init::<Signals<E>>().push(system)
}

/// Remove a listener. Unknown ids are ignored.
pub fn unsubscribe<E>(world: &mut World, id: ListenerId)
where
    E: Send + Sync + 'static,
{
    let removed = world
        .get_resource_mut::<Signals<E>>()
        .and_then(|mut signals| signals.remove(id));
    if let Some(system) = removed {
        // A listener unsubscribing itself is still running here; its system
        // entity cannot be reclaimed until it returns, which is harmless.
        let _ = world.unregister_system(system);
    }
}

/// Dispatch `event` to every listener of `E`, in subscription order.
pub fn emit<E>(world: &mut World, event: E)
where
    E: Clone + Send + Sync + 'static,
{
    let Some(signals) = world.get_resource::<Signals<E>>() else {
        return;
    };

    for listener in signals.snapshot() {
        // Listeners removed by an earlier listener in this dispatch are skipped.
        let subscribed = world
            .get_resource::<Signals<E>>()
            .is_some_and(|signals| signals.contains(listener.id));
        if !subscribed {
            continue;
        }

        if world
            .run_system_with_input(listener.system, event.clone())
            .is_err()
        {
            warn!(
                "[Signal] Listener {:?} for {} could not run",
                listener.id,
                std::any::type_name::<E>()
            );
        }
    }
}

/// Emit signals from systems that only have `Commands`.
pub trait EmitExt {
    fn emit<E>(&mut self, event: E)
    where
        E: Clone + Send + Sync + 'static;
}

impl EmitExt for Commands<'_, '_> {
    fn emit<E>(&mut self, event: E)
    where
        E: Clone + Send + Sync + 'static,
    {
        self.queue(move |world: &mut World| emit(world, event));
    }
}

/// Declaring signals and listeners while building plugins.
pub trait SignalAppExt {
    fn add_signal<E>(&mut self) -> &mut Self
    where
        E: Send + Sync + 'static;

    fn subscribe<E, M>(&mut self, listener: impl IntoSystem<In<E>, (), M> + 'static) -> &mut Self
    where
        E: Send + Sync + 'static;
}

impl SignalAppExt for App {
    fn add_signal<E>(&mut self) -> &mut Self
    where
        E: Send + Sync + 'static,
    {
        self.world_mut().get_resource_or_init::<Signals<E>>();
        self
    }

    fn subscribe<E, M>(&mut self, listener: impl IntoSystem<In<E>, (), M> + 'static) -> &mut Self
    where
        E: Send + Sync + 'static,
    {
        subscribe::<E, M>(self.world_mut(), listener);
        self
    }
}
