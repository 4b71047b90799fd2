//! Competition transitions
//!
//! Publication: draft -> pending -> published | rejected.
//! Phase (only while published): prijave -> aktivan -> zavrsio.

use chrono::{DateTime, Utc};
use portal_rules::prelude::*;

use super::{creator_or_admin, IsAdmin, IsCreator, Subject};
use crate::models::{Actor, Competition, Phase, PublicationStatus};

/// Publication status is one of the listed ones
pub struct StatusIn(pub &'static [PublicationStatus]);

impl Rule<Subject<'_, Competition>> for StatusIn {
    fn evaluate(&self, ctx: &Subject<'_, Competition>) -> Verdict {
        if self.0.contains(&ctx.target.status) {
            Verdict::Allow
        } else {
            Verdict::Deny(Denial::new(
                DenialKind::InvalidState,
                format!("competition is {}", ctx.target.status),
            ))
        }
    }
}

/// Lifecycle phase equals the given one
pub struct InPhase(pub Phase);

impl Rule<Subject<'_, Competition>> for InPhase {
    fn evaluate(&self, ctx: &Subject<'_, Competition>) -> Verdict {
        if ctx.target.phase == self.0 {
            Verdict::Allow
        } else {
            Verdict::Deny(Denial::new(
                DenialKind::InvalidState,
                format!(
                    "competition is in phase {}, expected {}",
                    ctx.target.phase, self.0
                ),
            ))
        }
    }
}

const DRAFT: &[PublicationStatus] = &[PublicationStatus::Draft];
const PENDING: &[PublicationStatus] = &[PublicationStatus::Pending];
const PUBLISHED: &[PublicationStatus] = &[PublicationStatus::Published];
const UNPUBLISHED: &[PublicationStatus] = &[PublicationStatus::Draft, PublicationStatus::Pending];

fn guard<R>(rule: R, actor: &Actor, competition: &Competition) -> Result<(), Denial>
where
    R: for<'a> Rule<Subject<'a, Competition>>,
{
    rule.evaluate(&Subject::new(actor, competition)).into_result()
}

/// Only the creator or an admin edits fields, content and visibility
pub fn can_edit(actor: &Actor, competition: &Competition) -> Result<(), Denial> {
    guard(creator_or_admin(), actor, competition)
}

pub fn submit_for_review(
    actor: &Actor,
    competition: &Competition,
    at: DateTime<Utc>,
) -> Result<Competition, Denial> {
    guard(Spec(IsCreator) & Spec(StatusIn(DRAFT)), actor, competition)?;

    let mut next = competition.clone();
    next.status = PublicationStatus::Pending;
    next.sent = Some(actor.stamp(at));
    next.updated_at = at;
    Ok(next)
}

/// Admin and pending
pub fn can_review(actor: &Actor, competition: &Competition) -> Result<(), Denial> {
    guard(Spec(IsAdmin) & Spec(StatusIn(PENDING)), actor, competition)
}

pub fn approve_publication(
    actor: &Actor,
    competition: &Competition,
    at: DateTime<Utc>,
) -> Result<Competition, Denial> {
    can_review(actor, competition)?;

    let mut next = competition.clone();
    next.status = PublicationStatus::Published;
    next.approved = Some(actor.stamp(at));
    next.updated_at = at;
    Ok(next)
}

pub fn reject_publication(
    actor: &Actor,
    competition: &Competition,
    reason: Option<String>,
    at: DateTime<Utc>,
) -> Result<Competition, Denial> {
    can_review(actor, competition)?;

    let mut next = competition.clone();
    next.status = PublicationStatus::Rejected;
    next.rejected = Some(actor.stamp(at));
    next.rejection_reason = reason;
    next.updated_at = at;
    Ok(next)
}

/// Admins delete anything; creators only what has not been published or rejected
pub fn can_delete(actor: &Actor, competition: &Competition) -> Result<(), Denial> {
    let rule = (Spec(IsAdmin) | (Spec(IsCreator) & Spec(StatusIn(UNPUBLISHED)))).or_deny(
        DenialKind::Forbidden,
        "only an admin, or the creator before publication, may delete a competition",
    );
    guard(rule, actor, competition)
}

fn advance(
    actor: &Actor,
    competition: &Competition,
    from: Phase,
    at: DateTime<Utc>,
) -> Result<Competition, Denial> {
    guard(
        Spec(creator_or_admin()) & Spec(StatusIn(PUBLISHED)) & Spec(InPhase(from)),
        actor,
        competition,
    )?;

    let mut next = competition.clone();
    let stamp = actor.stamp(at);
    match from {
        Phase::Prijave => {
            next.phase = Phase::Aktivan;
            next.started = Some(stamp);
        }
        Phase::Aktivan => {
            next.phase = Phase::Zavrsio;
            next.ended = Some(stamp);
        }
        Phase::Zavrsio => {
            return Err(Denial::new(
                DenialKind::InvalidState,
                "competition has already finished",
            ));
        }
    }
    next.updated_at = at;
    Ok(next)
}

/// prijave -> aktivan
pub fn start(actor: &Actor, competition: &Competition, at: DateTime<Utc>) -> Result<Competition, Denial> {
    advance(actor, competition, Phase::Prijave, at)
}

/// aktivan -> zavrsio
pub fn end(actor: &Actor, competition: &Competition, at: DateTime<Utc>) -> Result<Competition, Denial> {
    advance(actor, competition, Phase::Aktivan, at)
}
