//! Admin registry guards

use portal_rules::prelude::*;
use uuid::Uuid;

use super::{IsAdmin, Subject};
use crate::models::Actor;

/// The grant being changed is not the actor's own
pub struct NotSelf;

impl Rule<Subject<'_, Uuid>> for NotSelf {
    fn evaluate(&self, ctx: &Subject<'_, Uuid>) -> Verdict {
        if ctx.actor.uid != *ctx.target {
            Verdict::Allow
        } else {
            Verdict::Deny(Denial::new(
                DenialKind::Forbidden,
                "admins cannot revoke their own grant",
            ))
        }
    }
}

pub fn can_grant(actor: &Actor, uid: &Uuid) -> Result<(), Denial> {
    IsAdmin.evaluate(&Subject::new(actor, uid)).into_result()
}

pub fn can_revoke(actor: &Actor, uid: &Uuid) -> Result<(), Denial> {
    (Spec(IsAdmin) & Spec(NotSelf))
        .evaluate(&Subject::new(actor, uid))
        .into_result()
}
