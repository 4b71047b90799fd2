//! Status and phase state machines
//!
//! Transitions are pure functions: they evaluate a guard rule over the acting
//! identity and the current document, then return the next version of the
//! document. Persistence and side effects live in the services.

pub mod admin;
pub mod application;
pub mod competition;
pub mod content;
pub mod registration;

use portal_rules::prelude::*;

use crate::models::{Actor, Competition, Creator};

/// Rule context: who is acting on what
#[derive(Debug)]
pub struct Subject<'a, T> {
    pub actor: &'a Actor,
    pub target: &'a T,
}

impl<'a, T> Subject<'a, T> {
    pub fn new(actor: &'a Actor, target: &'a T) -> Self {
        Self { actor, target }
    }
}

/// Documents that remember who created them
pub trait Owned {
    fn creator(&self) -> &Creator;
}

impl Owned for Competition {
    fn creator(&self) -> &Creator {
        &self.creator
    }
}

/// The actor holds an admin grant
pub struct IsAdmin;

impl<T> Rule<Subject<'_, T>> for IsAdmin {
    fn evaluate(&self, ctx: &Subject<'_, T>) -> Verdict {
        if ctx.actor.is_admin {
            Verdict::Allow
        } else {
            Verdict::Deny(Denial::new(DenialKind::Forbidden, "admin role required"))
        }
    }
}

/// The actor created the target
pub struct IsCreator;

impl<T: Owned> Rule<Subject<'_, T>> for IsCreator {
    fn evaluate(&self, ctx: &Subject<'_, T>) -> Verdict {
        if ctx.actor.is_creator_of(ctx.target.creator()) {
            Verdict::Allow
        } else {
            Verdict::Deny(Denial::new(
                DenialKind::Forbidden,
                "only the creator may do this",
            ))
        }
    }
}

/// Creator or admin
pub fn creator_or_admin() -> Labeled<Spec<Any<IsCreator, IsAdmin>>> {
    // `or_deny` is generic over the context; pin it to competitions
    <Spec<Any<IsCreator, IsAdmin>> as Rule<Subject<'_, Competition>>>::or_deny(
        Spec(IsCreator) | Spec(IsAdmin),
        DenialKind::Forbidden,
        "only the creator or an admin may do this",
    )
}
