//! Subscribable boolean predicates that gate whether a task is allowed to
//! run. A [`RunSpecification`] is checked before scheduling and re-checked
//! whenever one of its dependencies changes; combinators build larger
//! predicates out of smaller ones the way iterator adapters compose.

use crate::context::Context;
use crate::subscription::Subscription;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Observes whether the host application currently has network
/// connectivity. Implemented by the embedder; the engine only consumes it.
pub trait NetworkConnectionObserver: Send + Sync {
    fn is_connected(&self) -> bool;
    fn subscribe(&self, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription;
}

/// Observes whether the host application is currently in the foreground.
pub trait ApplicationActivityObserver: Send + Sync {
    fn is_active(&self) -> bool;
    fn subscribe(&self, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription;
}

/// A boolean predicate over a [`Context`] that can notify interested
/// parties when its value might have changed.
///
/// `subscribe` is allowed to over-notify (call `on_change` when the value
/// didn't actually change); callers re-evaluate `is_satisfied` themselves
/// rather than trusting the notification's payload.
pub trait RunSpecification: Send + Sync {
    fn is_satisfied(&self, context: &Context) -> bool;

    fn subscribe(&self, context: Context, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription;
}

pub struct Always;

impl RunSpecification for Always {
    fn is_satisfied(&self, _context: &Context) -> bool {
        true
    }

    fn subscribe(&self, _context: Context, _on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription {
        Subscription::noop()
    }
}

pub struct Not<S>(pub S);

impl<S: RunSpecification> RunSpecification for Not<S> {
    fn is_satisfied(&self, context: &Context) -> bool {
        !self.0.is_satisfied(context)
    }

    fn subscribe(&self, context: Context, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription {
        self.0.subscribe(context, on_change)
    }
}

pub struct And<A, B>(pub A, pub B);

impl<A: RunSpecification, B: RunSpecification> RunSpecification for And<A, B> {
    fn is_satisfied(&self, context: &Context) -> bool {
        self.0.is_satisfied(context) && self.1.is_satisfied(context)
    }

    fn subscribe(&self, context: Context, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription {
        let first = self.0.subscribe(context.clone(), on_change.clone());
        let second = self.1.subscribe(context, on_change);
        Subscription::new(move || {
            drop(first);
            drop(second);
        })
    }
}

pub struct Or<A, B>(pub A, pub B);

impl<A: RunSpecification, B: RunSpecification> RunSpecification for Or<A, B> {
    fn is_satisfied(&self, context: &Context) -> bool {
        self.0.is_satisfied(context) || self.1.is_satisfied(context)
    }

    fn subscribe(&self, context: Context, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription {
        let first = self.0.subscribe(context.clone(), on_change.clone());
        let second = self.1.subscribe(context, on_change);
        Subscription::new(move || {
            drop(first);
            drop(second);
        })
    }
}

/// Satisfied once `first` is satisfied and remains satisfied afterward even
/// if `first` later becomes false again; used for "has happened once" gates
/// such as "has completed onboarding".
pub struct AsyncSequence<A, B> {
    pub first: A,
    pub then: B,
    first_satisfied: AtomicBool,
}

impl<A, B> AsyncSequence<A, B> {
    pub fn new(first: A, then: B) -> Self {
        Self {
            first,
            then,
            first_satisfied: AtomicBool::new(false),
        }
    }
}

impl<A: RunSpecification, B: RunSpecification> RunSpecification for AsyncSequence<A, B> {
    fn is_satisfied(&self, context: &Context) -> bool {
        if !self.first_satisfied.load(Ordering::SeqCst) {
            if self.first.is_satisfied(context) {
                self.first_satisfied.store(true, Ordering::SeqCst);
            } else {
                return false;
            }
        }
        self.then.is_satisfied(context)
    }

    fn subscribe(&self, context: Context, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription {
        let first = self.first.subscribe(context.clone(), on_change.clone());
        let then = self.then.subscribe(context, on_change);
        Subscription::new(move || {
            drop(first);
            drop(then);
        })
    }
}

pub struct ApplicationIsActive {
    observer: Arc<dyn ApplicationActivityObserver>,
}

impl ApplicationIsActive {
    pub fn new(observer: Arc<dyn ApplicationActivityObserver>) -> Self {
        Self { observer }
    }
}

impl RunSpecification for ApplicationIsActive {
    fn is_satisfied(&self, _context: &Context) -> bool {
        self.observer.is_active()
    }

    fn subscribe(&self, _context: Context, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription {
        self.observer.subscribe(on_change)
    }
}

pub struct NetworkConnection {
    observer: Arc<dyn NetworkConnectionObserver>,
}

impl NetworkConnection {
    pub fn new(observer: Arc<dyn NetworkConnectionObserver>) -> Self {
        Self { observer }
    }
}

impl RunSpecification for NetworkConnection {
    fn is_satisfied(&self, _context: &Context) -> bool {
        self.observer.is_connected()
    }

    fn subscribe(&self, _context: Context, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription {
        self.observer.subscribe(on_change)
    }
}
