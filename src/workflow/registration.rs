//! Registration request transitions: pending -> approved | rejected

use chrono::{DateTime, Utc};
use portal_rules::prelude::*;

use super::{IsAdmin, Subject};
use crate::models::{Actor, RegistrationRequest, RegistrationStatus};

/// The request is still awaiting a decision
pub struct IsPending;

impl Rule<Subject<'_, RegistrationRequest>> for IsPending {
    fn evaluate(&self, ctx: &Subject<'_, RegistrationRequest>) -> Verdict {
        if ctx.target.status == RegistrationStatus::Pending {
            Verdict::Allow
        } else {
            Verdict::Deny(Denial::new(
                DenialKind::InvalidState,
                format!("request is already {}", ctx.target.status),
            ))
        }
    }
}

/// Only admins decide, and only while the request is pending
pub fn can_decide(actor: &Actor, request: &RegistrationRequest) -> Result<(), Denial> {
    (Spec(IsAdmin) & Spec(IsPending))
        .evaluate(&Subject::new(actor, request))
        .into_result()
}

/// Approved version of a pending request
pub fn approve(
    actor: &Actor,
    request: &RegistrationRequest,
    admin_note: Option<String>,
    temporary_password_issued: bool,
    at: DateTime<Utc>,
) -> Result<RegistrationRequest, Denial> {
    can_decide(actor, request)?;

    let mut next = request.clone();
    next.status = RegistrationStatus::Approved;
    next.admin_note = admin_note.or(next.admin_note);
    next.processed = Some(actor.stamp(at));
    next.temporary_password_issued = temporary_password_issued;
    next.updated_at = at;
    Ok(next)
}

/// Rejected version of a pending request
pub fn reject(
    actor: &Actor,
    request: &RegistrationRequest,
    reason: Option<String>,
    admin_note: Option<String>,
    at: DateTime<Utc>,
) -> Result<RegistrationRequest, Denial> {
    can_decide(actor, request)?;

    let mut next = request.clone();
    next.status = RegistrationStatus::Rejected;
    next.rejection_reason = reason;
    next.admin_note = admin_note.or(next.admin_note);
    next.processed = Some(actor.stamp(at));
    next.updated_at = at;
    Ok(next)
}

/// Admins may delete a request in any status
pub fn can_delete(actor: &Actor, request: &RegistrationRequest) -> Result<(), Denial> {
    IsAdmin
        .evaluate(&Subject::new(actor, request))
        .into_result()
}
