//! Operator syntax for rule combinators.
//!
//! Wrap rules in [`Spec`] to combine them with `&`, `|` and `!`:
//!
//! ```ignore
//! let can_start = Spec(IsPublished) & (Spec(IsAdmin) | Spec(IsCreator));
//! ```

use std::ops::{BitAnd, BitOr, Not as StdNot};

use crate::rule::{All, Any, Not, Rule, Verdict};

/// Wrapper enabling operator overloading on rules.
#[derive(Clone)]
pub struct Spec<R>(pub R);

impl<A, B> BitAnd<Spec<B>> for Spec<A> {
    type Output = Spec<All<A, B>>;

    fn bitand(self, rhs: Spec<B>) -> Self::Output {
        Spec(All(self.0, rhs.0))
    }
}

impl<A, B> BitOr<Spec<B>> for Spec<A> {
    type Output = Spec<Any<A, B>>;

    fn bitor(self, rhs: Spec<B>) -> Self::Output {
        Spec(Any(self.0, rhs.0))
    }
}

impl<A> StdNot for Spec<A> {
    type Output = Spec<Not<A>>;

    fn not(self) -> Self::Output {
        Spec(Not(self.0))
    }
}

impl<Ctx, R> Rule<Ctx> for Spec<R>
where
    R: Rule<Ctx>,
{
    fn evaluate(&self, ctx: &Ctx) -> Verdict {
        self.0.evaluate(ctx)
    }
}
