//! Composable guard rules for workflow transitions.
//!
//! A [`Rule`] inspects a context and either allows it or produces a
//! [`Denial`] explaining why not. Rules compose with `&`, `|` and `!` through
//! the [`Spec`] wrapper, so a transition guard reads like its definition:
//!
//! ```
//! use portal_rules::prelude::*;
//!
//! struct Ctx { admin: bool, owner: bool }
//!
//! let is_admin = check(DenialKind::Forbidden, "admin required", |c: &Ctx| c.admin);
//! let is_owner = check(DenialKind::Forbidden, "owner required", |c: &Ctx| c.owner);
//!
//! let can_edit = (Spec(is_admin) | Spec(is_owner)).or_deny(DenialKind::Forbidden, "admin or owner required");
//!
//! assert!(can_edit.evaluate(&Ctx { admin: false, owner: true }).is_allowed());
//! assert!(can_edit.evaluate(&Ctx { admin: false, owner: false }).is_denied());
//! ```

pub mod operators;
pub mod rule;

/// Everything needed to declare and combine rules.
pub mod prelude {
    pub use crate::operators::Spec;
    pub use crate::rule::{
        check, All, AllOf, Any, BoxedRule, Check, Denial, DenialKind, Labeled, Not, Rule, Verdict,
    };
}
