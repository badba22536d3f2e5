//! Signal bus resource for publish/subscribe between collaborators.
//!
//! The [`EventBus`] replaces a process-wide static registry with an explicit
//! resource owned by the [`World`]. Anything that wants to react to a
//! [`SignalKind`] subscribes a handler; anything that wants to notify
//! publishes a [`Signal`].
//!
//! # Dispatch rules
//!
//! - Handlers for one kind run in registration order, synchronously, on the
//!   caller's tick.
//! - `publish` snapshots the subscriber list before invoking anything. A
//!   handler may subscribe, unsubscribe or publish again while it runs; the
//!   in-flight publish keeps iterating its snapshot, so no remaining handler
//!   is skipped or invoked twice. A handler removed mid-dispatch still sees
//!   the signal that was being dispatched when it was removed.
//! - Nothing is queued: publishing a kind with no subscribers does nothing.
//! - There is no fault isolation. A panicking handler unwinds out of
//!   `publish`; the registry lock is not held at that point, so the bus stays
//!   usable afterwards.
//!
//! # Context
//!
//! The bus is generic over the context `C` passed mutably to every handler.
//! Inside the engine `C` is [`World`], and [`publish_signal`] scopes the bus
//! out of the world so handlers can mutate any resource or component. Tests
//! and standalone users can pick any `'static` type.

use crate::events::signal::{Signal, SignalKind};
use bevy_ecs::prelude::*;
use log::warn;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::{Arc, Mutex, MutexGuard};

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Boxed signal handler.
pub type Handler<C> = Arc<dyn Fn(&EventBus<C>, &mut C, &Signal) + Send + Sync>;

struct Subscriber<C: 'static> {
    id: SubscriptionId,
    handler: Handler<C>,
}

struct Registry<C: 'static> {
    next_id: u64,
    by_kind: FxHashMap<SignalKind, Vec<Subscriber<C>>>,
}

/// Multicast signal registry.
#[derive(Resource)]
pub struct EventBus<C: 'static = World> {
    registry: Mutex<Registry<C>>,
}

impl<C: 'static> Default for EventBus<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> EventBus<C> {
    pub fn new() -> Self {
        EventBus {
            registry: Mutex::new(Registry {
                next_id: 0,
                by_kind: FxHashMap::default(),
            }),
        }
    }

    // Handlers never run under the lock, so a poisoned mutex still holds a
    // consistent registry.
    fn registry(&self) -> MutexGuard<'_, Registry<C>> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register `handler` for `kind`. Handlers run in registration order.
    pub fn subscribe<F>(&self, kind: SignalKind, handler: F) -> SubscriptionId
    where
        F: Fn(&EventBus<C>, &mut C, &Signal) + Send + Sync + 'static,
    {
        let mut registry = self.registry();
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.by_kind.entry(kind).or_default().push(Subscriber {
            id,
            handler: Arc::new(handler),
        });
        id
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, kind: &SignalKind, id: SubscriptionId) -> bool {
        let mut registry = self.registry();
        let Some(subscribers) = registry.by_kind.get_mut(kind) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;
        if subscribers.is_empty() {
            registry.by_kind.remove(kind);
        }
        removed
    }

    /// Invoke every handler subscribed to `signal.kind`.
    ///
    /// Returns how many handlers were invoked.
    pub fn publish(&self, ctx: &mut C, signal: &Signal) -> usize {
        let snapshot: SmallVec<[Handler<C>; 8]> = {
            let registry = self.registry();
            match registry.by_kind.get(&signal.kind) {
                Some(subscribers) => subscribers.iter().map(|s| s.handler.clone()).collect(),
                None => return 0,
            }
        };
        for handler in snapshot.iter() {
            handler(self, ctx, signal);
        }
        snapshot.len()
    }

    /// Number of handlers currently subscribed to `kind`.
    pub fn subscriber_count(&self, kind: &SignalKind) -> usize {
        self.registry().by_kind.get(kind).map_or(0, Vec::len)
    }

    /// Drop every subscription.
    pub fn clear(&self) {
        self.registry().by_kind.clear();
    }
}

/// Publish `signal` on the world's [`EventBus`] with the world as context.
///
/// The bus is scoped out of the world while handlers run, so handlers must
/// use the `&EventBus` they receive to publish or (un)subscribe. Returns the
/// number of handlers invoked, or 0 if the world has no bus.
pub fn publish_signal(world: &mut World, signal: &Signal) -> usize {
    if !world.contains_resource::<EventBus>() {
        warn!("publish_signal: no EventBus resource, dropping {:?}", signal.kind);
        return 0;
    }
    world.resource_scope(|world, bus: Mut<EventBus>| bus.publish(world, signal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::signal::Payload;
    use std::sync::Mutex as StdMutex;

    type Log = Vec<String>;

    fn push(tag: &'static str) -> impl Fn(&EventBus<Log>, &mut Log, &Signal) + Send + Sync {
        move |_, log, _| log.push(tag.to_string())
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let bus = EventBus::<Log>::new();
        let mut log = Log::new();
        assert_eq!(bus.publish(&mut log, &Signal::game_over()), 0);
        assert!(log.is_empty());
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let bus = EventBus::<Log>::new();
        bus.subscribe(SignalKind::GameStart, push("h1"));
        bus.subscribe(SignalKind::GameStart, push("h2"));
        bus.subscribe(SignalKind::GameStart, push("h3"));
        let mut log = Log::new();
        assert_eq!(bus.publish(&mut log, &Signal::game_start()), 3);
        assert_eq!(log, vec!["h1", "h2", "h3"]);
    }

    #[test]
    fn only_matching_kind_is_invoked() {
        let bus = EventBus::<Log>::new();
        bus.subscribe(SignalKind::GameStart, push("start"));
        bus.subscribe(SignalKind::GameOver, push("over"));
        let mut log = Log::new();
        bus.publish(&mut log, &Signal::game_over());
        assert_eq!(log, vec!["over"]);
    }

    #[test]
    fn unsubscribing_during_dispatch_does_not_skip_later_handlers() {
        let bus = EventBus::<Log>::new();
        let h2_id: Arc<StdMutex<Option<SubscriptionId>>> = Arc::new(StdMutex::new(None));
        let target = h2_id.clone();
        bus.subscribe(SignalKind::GameStart, move |bus, log, _| {
            log.push("h1".into());
            if let Some(id) = target.lock().unwrap().take() {
                assert!(bus.unsubscribe(&SignalKind::GameStart, id));
            }
        });
        let id = bus.subscribe(SignalKind::GameStart, push("h2"));
        *h2_id.lock().unwrap() = Some(id);
        bus.subscribe(SignalKind::GameStart, push("h3"));

        let mut log = Log::new();
        bus.publish(&mut log, &Signal::game_start());
        assert_eq!(log, vec!["h1", "h2", "h3"]);

        log.clear();
        bus.publish(&mut log, &Signal::game_start());
        assert_eq!(log, vec!["h1", "h3"]);
    }

    #[test]
    fn reentrant_publish_of_same_kind() {
        let bus = EventBus::<Log>::new();
        bus.subscribe(SignalKind::Custom("tick".into()), |bus, log, signal| {
            log.push(format!("tick {:?}", signal.payload));
            if let Payload::Scalar(n) = signal.payload {
                if n > 0.0 {
                    bus.publish(log, &Signal::custom("tick", Payload::Scalar(n - 1.0)));
                }
            }
        });
        let mut log = Log::new();
        bus.publish(&mut log, &Signal::custom("tick", Payload::Scalar(2.0)));
        assert_eq!(log.len(), 3);
        assert_eq!(bus.subscriber_count(&SignalKind::Custom("tick".into())), 1);
    }

    #[test]
    fn subscribing_during_dispatch_takes_effect_next_publish() {
        let bus = EventBus::<Log>::new();
        bus.subscribe(SignalKind::GameStart, |bus, log, _| {
            log.push("outer".into());
            bus.subscribe(SignalKind::GameStart, |_, log: &mut Log, _| {
                log.push("late".into())
            });
        });
        let mut log = Log::new();
        bus.publish(&mut log, &Signal::game_start());
        assert_eq!(log, vec!["outer"]);
        assert_eq!(bus.subscriber_count(&SignalKind::GameStart), 2);
    }

    #[test]
    fn unsubscribe_unknown_is_noop() {
        let bus = EventBus::<Log>::new();
        let id = bus.subscribe(SignalKind::GameOver, push("x"));
        assert!(!bus.unsubscribe(&SignalKind::GameStart, id));
        assert!(bus.unsubscribe(&SignalKind::GameOver, id));
        assert!(!bus.unsubscribe(&SignalKind::GameOver, id));
        assert_eq!(bus.subscriber_count(&SignalKind::GameOver), 0);
    }

    #[test]
    fn clear_removes_everything() {
        let bus = EventBus::<Log>::new();
        bus.subscribe(SignalKind::GameOver, push("x"));
        bus.subscribe(SignalKind::GameStart, push("y"));
        bus.clear();
        let mut log = Log::new();
        assert_eq!(bus.publish(&mut log, &Signal::game_over()), 0);
    }
}
