//! Core rule trait, verdicts and combinators.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Why a rule refused its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    /// The actor lacks the role or ownership the rule requires.
    Forbidden,
    /// The subject is in a state the rule does not accept.
    InvalidState,
}

/// A refused evaluation with a human readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub kind: DenialKind,
    pub reason: Cow<'static, str>,
}

impl Denial {
    pub fn new(kind: DenialKind, reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Outcome of evaluating a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(Denial),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow)
    }

    pub fn is_denied(&self) -> bool {
        !self.is_allowed()
    }

    /// Convert into a `Result`, handing the denial to the caller.
    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Verdict::Allow => Ok(()),
            Verdict::Deny(denial) => Err(denial),
        }
    }
}

/// A guard over a context of type `Ctx`.
pub trait Rule<Ctx>: Send + Sync {
    fn evaluate(&self, ctx: &Ctx) -> Verdict;

    fn is_satisfied_by(&self, ctx: &Ctx) -> bool {
        self.evaluate(ctx).is_allowed()
    }

    /// Replace whatever denial this rule produces with a fixed one.
    fn or_deny(self, kind: DenialKind, reason: impl Into<Cow<'static, str>>) -> Labeled<Self>
    where
        Self: Sized,
    {
        Labeled {
            inner: self,
            denial: Denial::new(kind, reason),
        }
    }
}

/// Rule built from a predicate and the denial to report when it fails.
pub struct Check<F> {
    predicate: F,
    denial: Denial,
}

/// Shorthand constructor for [`Check`].
pub fn check<Ctx, F>(kind: DenialKind, reason: impl Into<Cow<'static, str>>, predicate: F) -> Check<F>
where
    F: Fn(&Ctx) -> bool + Send + Sync,
{
    Check {
        predicate,
        denial: Denial::new(kind, reason),
    }
}

impl<Ctx, F> Rule<Ctx> for Check<F>
where
    F: Fn(&Ctx) -> bool + Send + Sync,
{
    fn evaluate(&self, ctx: &Ctx) -> Verdict {
        if (self.predicate)(ctx) {
            Verdict::Allow
        } else {
            Verdict::Deny(self.denial.clone())
        }
    }
}

/// Both rules must allow. The first denial wins.
#[derive(Clone)]
pub struct All<A, B>(pub A, pub B);

impl<Ctx, A, B> Rule<Ctx> for All<A, B>
where
    A: Rule<Ctx>,
    B: Rule<Ctx>,
{
    fn evaluate(&self, ctx: &Ctx) -> Verdict {
        match self.0.evaluate(ctx) {
            Verdict::Allow => self.1.evaluate(ctx),
            denied => denied,
        }
    }
}

/// Either rule may allow. When both deny, the right-hand denial is reported.
#[derive(Clone)]
pub struct Any<A, B>(pub A, pub B);

impl<Ctx, A, B> Rule<Ctx> for Any<A, B>
where
    A: Rule<Ctx>,
    B: Rule<Ctx>,
{
    fn evaluate(&self, ctx: &Ctx) -> Verdict {
        match self.0.evaluate(ctx) {
            Verdict::Allow => Verdict::Allow,
            Verdict::Deny(_) => self.1.evaluate(ctx),
        }
    }
}

/// Inverts a rule. Label it with [`Rule::or_deny`] to get a useful reason.
#[derive(Clone)]
pub struct Not<A>(pub A);

impl<Ctx, A> Rule<Ctx> for Not<A>
where
    A: Rule<Ctx>,
{
    fn evaluate(&self, ctx: &Ctx) -> Verdict {
        match self.0.evaluate(ctx) {
            Verdict::Allow => Verdict::Deny(Denial::new(
                DenialKind::InvalidState,
                "negated rule was satisfied",
            )),
            Verdict::Deny(_) => Verdict::Allow,
        }
    }
}

/// A rule whose denial is replaced by a fixed one.
pub struct Labeled<R> {
    inner: R,
    denial: Denial,
}

impl<Ctx, R> Rule<Ctx> for Labeled<R>
where
    R: Rule<Ctx>,
{
    fn evaluate(&self, ctx: &Ctx) -> Verdict {
        match self.inner.evaluate(ctx) {
            Verdict::Allow => Verdict::Allow,
            Verdict::Deny(_) => Verdict::Deny(self.denial.clone()),
        }
    }
}

/// Type-erased rule.
pub type BoxedRule<Ctx> = Arc<dyn Rule<Ctx>>;

impl<Ctx> Rule<Ctx> for BoxedRule<Ctx> {
    fn evaluate(&self, ctx: &Ctx) -> Verdict {
        self.as_ref().evaluate(ctx)
    }
}

/// Every rule in the list must allow; evaluation stops at the first denial.
pub struct AllOf<Ctx> {
    rules: Vec<BoxedRule<Ctx>>,
}

impl<Ctx> AllOf<Ctx> {
    pub fn new(rules: Vec<BoxedRule<Ctx>>) -> Self {
        Self { rules }
    }
}

impl<Ctx> Rule<Ctx> for AllOf<Ctx> {
    fn evaluate(&self, ctx: &Ctx) -> Verdict {
        for rule in &self.rules {
            if let Verdict::Deny(denial) = rule.evaluate(ctx) {
                return Verdict::Deny(denial);
            }
        }
        Verdict::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yes() -> impl Rule<i32> {
        check(DenialKind::Forbidden, "yes", |_: &i32| true)
    }

    fn positive() -> impl Rule<i32> {
        check(DenialKind::InvalidState, "must be positive", |n: &i32| *n > 0)
    }

    #[test]
    fn test_check_reports_its_denial() {
        let verdict = positive().evaluate(&-1);
        assert_eq!(
            verdict,
            Verdict::Deny(Denial::new(DenialKind::InvalidState, "must be positive"))
        );
        assert!(positive().is_satisfied_by(&3));
    }

    #[test]
    fn test_all_stops_at_first_denial() {
        let first = check(DenialKind::Forbidden, "first", |_: &i32| false);
        let rule = All(first, positive());
        let denial = rule.evaluate(&-5).into_result().unwrap_err();
        assert_eq!(denial.reason, "first");
    }

    #[test]
    fn test_any_allows_when_one_side_allows() {
        let never = check(DenialKind::Forbidden, "never", |_: &i32| false);
        assert!(Any(never, yes()).is_satisfied_by(&0));
    }

    #[test]
    fn test_labeled_overrides_reason() {
        let rule = positive().or_deny(DenialKind::Forbidden, "nope");
        let denial = rule.evaluate(&0).into_result().unwrap_err();
        assert_eq!(denial.kind, DenialKind::Forbidden);
        assert_eq!(denial.reason, "nope");
    }

    #[test]
    fn test_all_of_empty_allows() {
        let rule: AllOf<i32> = AllOf::new(vec![]);
        assert!(rule.is_satisfied_by(&0));

        let rule: AllOf<i32> = AllOf::new(vec![Arc::new(yes()), Arc::new(positive())]);
        assert!(rule.evaluate(&0).is_denied());
    }
}
