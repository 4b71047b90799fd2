//! Application submission and review
//!
//! Submission is only accepted while the competition is published, open for
//! applications (phase prijave) and registers through the portal. Review
//! (approve, reject, delete) belongs to the competition's creator and admins.

use chrono::{DateTime, Utc};
use portal_rules::prelude::*;

use super::competition::{InPhase, StatusIn};
use super::{creator_or_admin, Subject};
use crate::constants::{MAX_GROUP_MEMBERS, MAX_NAME_LENGTH, MAX_NOTE_LENGTH};
use crate::models::{
    Actor, Applicant, ApplicantKind, Application, ApplicationStatus, Competition,
    ParticipationMode, Phase, PublicationStatus,
};
use crate::utils::validation::is_valid_email;

/// The competition takes applications through the portal
pub struct RegistersInPortal;

impl Rule<Subject<'_, Competition>> for RegistersInPortal {
    fn evaluate(&self, ctx: &Subject<'_, Competition>) -> Verdict {
        match ctx.target.registration.external_link() {
            None => Verdict::Allow,
            Some(link) => Verdict::Deny(Denial::new(
                DenialKind::InvalidState,
                format!("applications are collected at {link}"),
            )),
        }
    }
}

const PUBLISHED: &[PublicationStatus] = &[PublicationStatus::Published];

/// Whether the competition accepts a new application right now
pub fn can_submit(actor: &Actor, competition: &Competition) -> Result<(), Denial> {
    (Spec(StatusIn(PUBLISHED)) & Spec(InPhase(Phase::Prijave)) & Spec(RegistersInPortal))
        .evaluate(&Subject::new(actor, competition))
        .into_result()
}

/// Approve, reject and delete belong to the competition's creator and admins
pub fn can_review(actor: &Actor, competition: &Competition) -> Result<(), Denial> {
    creator_or_admin()
        .evaluate(&Subject::new(actor, competition))
        .into_result()
}

/// The application still awaits a decision
pub struct Undecided;

impl Rule<Subject<'_, Application>> for Undecided {
    fn evaluate(&self, ctx: &Subject<'_, Application>) -> Verdict {
        if ctx.target.status == ApplicationStatus::Pending {
            Verdict::Allow
        } else {
            Verdict::Deny(Denial::new(
                DenialKind::InvalidState,
                format!("application is already {}", ctx.target.status),
            ))
        }
    }
}

/// pending -> approved | rejected; decided applications stay decided
fn decide(
    actor: &Actor,
    application: &Application,
    competition: &Competition,
    status: ApplicationStatus,
    at: DateTime<Utc>,
) -> Result<Application, Denial> {
    can_review(actor, competition)?;
    Undecided
        .evaluate(&Subject::new(actor, application))
        .into_result()?;

    let mut next = application.clone();
    next.status = status;
    next.reviewed = Some(actor.stamp(at));
    Ok(next)
}

/// Approve a pending application
pub fn approve(
    actor: &Actor,
    application: &Application,
    competition: &Competition,
    at: DateTime<Utc>,
) -> Result<Application, Denial> {
    decide(actor, application, competition, ApplicationStatus::Approved, at)
}

/// Reject a pending application
pub fn reject(
    actor: &Actor,
    application: &Application,
    competition: &Competition,
    reason: Option<String>,
    at: DateTime<Utc>,
) -> Result<Application, Denial> {
    let mut next = decide(actor, application, competition, ApplicationStatus::Rejected, at)?;
    next.rejection_reason = reason;
    Ok(next)
}

/// Field level problems with a submitted applicant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplicantError {
    #[error("This competition expects {expected} applications")]
    WrongKind { expected: &'static str },

    #[error("{0} is required")]
    Missing(String),

    #[error("{0} is too long")]
    TooLong(String),

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Team must have between {min} and {max} members, got {count}")]
    TeamSize {
        min: String,
        max: String,
        count: usize,
    },
}

fn required(value: &str, field: &str) -> Result<(), ApplicantError> {
    if value.trim().is_empty() {
        return Err(ApplicantError::Missing(field.to_string()));
    }
    if value.chars().count() as u64 > MAX_NAME_LENGTH {
        return Err(ApplicantError::TooLong(field.to_string()));
    }
    Ok(())
}

fn optional_note(value: Option<&str>, field: &str) -> Result<(), ApplicantError> {
    match value {
        Some(v) if v.chars().count() as u64 > MAX_NOTE_LENGTH => {
            Err(ApplicantError::TooLong(field.to_string()))
        }
        _ => Ok(()),
    }
}

/// Check the applicant against the competition's participation mode
pub fn validate_applicant(
    participation: &ParticipationMode,
    applicant: &Applicant,
) -> Result<(), ApplicantError> {
    match (participation, applicant) {
        (ParticipationMode::Individual, Applicant::Individual(person)) => {
            required(&person.name, "name")?;
            required(&person.surname, "surname")?;
            required(&person.email, "email")?;
            if !is_valid_email(person.email.trim()) {
                return Err(ApplicantError::InvalidEmail);
            }
            optional_note(person.contact.as_deref(), "contact")?;
            optional_note(person.notes.as_deref(), "notes")?;
            Ok(())
        }
        (ParticipationMode::Team(bounds), Applicant::Group(group)) => {
            required(&group.group_name, "group name")?;
            for (i, member) in group.members.iter().enumerate() {
                let n = i + 1;
                required(&member.name, &format!("member {n} name"))?;
                required(&member.surname, &format!("member {n} surname"))?;
                required(&member.class_name, &format!("member {n} class"))?;
            }
            let count = group.members.len();
            if !bounds.contains(count) || count > MAX_GROUP_MEMBERS {
                return Err(ApplicantError::TeamSize {
                    min: bounds
                        .min_members
                        .map_or_else(|| "0".to_string(), |v| v.to_string()),
                    max: bounds
                        .max_members
                        .map_or_else(|| MAX_GROUP_MEMBERS.to_string(), |v| v.to_string()),
                    count,
                });
            }
            Ok(())
        }
        (ParticipationMode::Individual, Applicant::Group(_)) => Err(ApplicantError::WrongKind {
            expected: ApplicantKind::Individual.as_str(),
        }),
        (ParticipationMode::Team(_), Applicant::Individual(_)) => Err(ApplicantError::WrongKind {
            expected: ApplicantKind::Group.as_str(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupApplicant, GroupMember, RegistrationMode, TeamBounds};
    use crate::test_utils::{
        admin, application_for, competition_by, draft_competition_by, individual, user,
    };

    fn member(name: &str) -> GroupMember {
        GroupMember {
            name: name.into(),
            surname: "Horvat".into(),
            class_name: "2.c".into(),
        }
    }

    fn team(min: Option<u32>, max: Option<u32>) -> ParticipationMode {
        ParticipationMode::Team(TeamBounds {
            min_members: min,
            max_members: max,
        })
    }

    #[test]
    fn test_submission_requires_prijave() {
        let creator = user("x@y.com");
        let visitor = user("student@skola.hr");
        let mut competition = competition_by(&creator);
        assert!(can_submit(&visitor, &competition).is_ok());

        competition.phase = Phase::Aktivan;
        let err = can_submit(&visitor, &competition).unwrap_err();
        assert_eq!(err.kind, DenialKind::InvalidState);
    }

    #[test]
    fn test_submission_requires_publication_and_portal_mode() {
        let creator = user("x@y.com");
        let visitor = user("student@skola.hr");
        assert!(can_submit(&visitor, &draft_competition_by(&creator)).is_err());

        let mut external = competition_by(&creator);
        external.registration = RegistrationMode::External {
            link: "https://example.org".into(),
        };
        let err = can_submit(&visitor, &external).unwrap_err();
        assert!(err.reason.contains("https://example.org"));
    }

    #[test]
    fn test_team_below_minimum_is_rejected() {
        let applicant = Applicant::Group(GroupApplicant {
            group_name: "Solo".into(),
            members: vec![member("Ana")],
        });
        let err = validate_applicant(&team(Some(2), None), &applicant).unwrap_err();
        assert!(matches!(err, ApplicantError::TeamSize { count: 1, .. }));

        let pair = Applicant::Group(GroupApplicant {
            group_name: "Par".into(),
            members: vec![member("Ana"), member("Ivo")],
        });
        assert!(validate_applicant(&team(Some(2), Some(2)), &pair).is_ok());
        assert!(validate_applicant(&team(None, Some(1)), &pair).is_err());
    }

    #[test]
    fn test_group_members_need_all_fields() {
        let mut incomplete = member("Ana");
        incomplete.class_name = " ".into();
        let applicant = Applicant::Group(GroupApplicant {
            group_name: "Tim".into(),
            members: vec![member("Ivo"), incomplete],
        });
        assert_eq!(
            validate_applicant(&team(None, None), &applicant),
            Err(ApplicantError::Missing("member 2 class".into()))
        );
    }

    #[test]
    fn test_individual_fields() {
        let mode = ParticipationMode::Individual;
        assert!(validate_applicant(&mode, &individual("Ana", "ana@skola.hr")).is_ok());
        assert_eq!(
            validate_applicant(&mode, &individual("Ana", "not-an-email")),
            Err(ApplicantError::InvalidEmail)
        );
        assert_eq!(
            validate_applicant(&mode, &individual("", "ana@skola.hr")),
            Err(ApplicantError::Missing("name".into()))
        );
    }

    #[test]
    fn test_kind_must_match_mode() {
        let err = validate_applicant(&team(None, None), &individual("Ana", "ana@skola.hr"))
            .unwrap_err();
        assert!(matches!(err, ApplicantError::WrongKind { expected: "group" }));
    }

    #[test]
    fn test_review_by_creator_or_admin() {
        let creator = user("x@y.com");
        let competition = competition_by(&creator);
        let application = application_for(&competition, individual("Ana", "ana@skola.hr"));
        let now = Utc::now();

        let approved = approve(&creator, &application, &competition, now).unwrap();
        assert_eq!(approved.status, ApplicationStatus::Approved);
        assert!(approved.reviewed.is_some());

        let rejected = reject(
            &admin("admin@skola.hr"),
            &application,
            &competition,
            Some("kasno".into()),
            now,
        )
        .unwrap();
        assert_eq!(rejected.status, ApplicationStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("kasno"));

        let err = approve(&user("z@y.com"), &application, &competition, now).unwrap_err();
        assert_eq!(err.kind, DenialKind::Forbidden);
    }

    #[test]
    fn test_decided_applications_are_terminal() {
        let creator = user("x@y.com");
        let root = admin("admin@skola.hr");
        let competition = competition_by(&creator);
        let application = application_for(&competition, individual("Ana", "ana@skola.hr"));
        let now = Utc::now();

        let approved = approve(&creator, &application, &competition, now).unwrap();
        for decided in [
            approved.clone(),
            reject(&creator, &application, &competition, None, now).unwrap(),
        ] {
            let err = approve(&root, &decided, &competition, now).unwrap_err();
            assert_eq!(err.kind, DenialKind::InvalidState);
            let err = reject(&root, &decided, &competition, None, now).unwrap_err();
            assert_eq!(err.kind, DenialKind::InvalidState);
        }
        assert_eq!(approved.status, ApplicationStatus::Approved);
    }
}
