//! Rules deciding whether a transition may take place.
//!
//! Rules are evaluated in order and the first denial wins, so that callers
//! get the most specific reason a transition was refused.

use chrono::NaiveDateTime;

use crate::{
    audit::Actor,
    db::types::WorkflowState::{self, *},
    models::{Category, ContentItem},
    permissions::Capabilities,
};
use super::{Denial, graph};

/// Everything rules can look at.
#[derive(Clone, Copy, Debug)]
pub struct Context<'a> {
    pub item: &'a ContentItem,
    pub category: &'a Category,
    pub actor: Actor,
    pub capabilities: Capabilities,
    /// State the item is in, as read under its lock.
    pub from: WorkflowState,
    pub to: WorkflowState,
    pub now: NaiveDateTime,
}

impl<'a> Context<'a> {
    fn is_author(&self) -> bool {
        self.actor.user().map_or(false, |user| self.item.is_author(user))
    }

    /// Is the actor acting only on an author's authority?
    fn is_author_level(&self, elevated: Capabilities) -> bool {
        self.capabilities.contains(Capabilities::CREATE_CONTENT)
            && !self.capabilities.intersects(elevated)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verdict {
    Allowed,
    Denied(Denial),
}

pub type Rule = fn(&Context) -> Verdict;

/// All rules, in order of evaluation.
pub const RULES: &[Rule] = &[
    structure,
    expiry,
    capability,
    moderation,
    draft_authorship,
    withdrawal_authorship,
];

/// Evaluate all rules against a transition.
///
/// This must not be called for transitions which don't change state.
pub fn evaluate(ctx: &Context) -> Result<(), Denial> {
    debug_assert_ne!(ctx.from, ctx.to);

    RULES.iter()
        .map(|rule| rule(ctx))
        .find_map(|verdict| match verdict {
            Verdict::Allowed => None,
            Verdict::Denied(denial) => Some(denial),
        })
        .map_or(Ok(()), Err)
}

/// Transition must follow an edge of the graph.
fn structure(ctx: &Context) -> Verdict {
    match graph::requirement(ctx.from, ctx.to) {
        Some(_) => Verdict::Allowed,
        None => Verdict::Denied(Denial::InvalidTransition(ctx.from, ctx.to)),
    }
}

/// Expired content can't be published again, no matter who asks.
fn expiry(ctx: &Context) -> Verdict {
    if ctx.from == Inactive && ctx.to == Published && ctx.item.is_expired(ctx.now) {
        Verdict::Denied(Denial::ContentExpired)
    } else {
        Verdict::Allowed
    }
}

/// Actor must hold at least one of the capabilities the edge requires.
fn capability(ctx: &Context) -> Verdict {
    match graph::requirement(ctx.from, ctx.to) {
        Some(required) if ctx.capabilities.intersects(required) => Verdict::Allowed,
        _ => Verdict::Denied(Denial::Forbidden),
    }
}

/// Content in moderated categories must be reviewed before publication.
fn moderation(ctx: &Context) -> Verdict {
    if ctx.from == Draft && ctx.to == Published && ctx.category.is_moderated {
        Verdict::Denied(Denial::ModeratedCategoryBlocked)
    } else {
        Verdict::Allowed
    }
}

/// Only authors can submit or publish their drafts, unless the actor is
/// a publisher.
fn draft_authorship(ctx: &Context) -> Verdict {
    let applies = ctx.from == Draft && (ctx.to == Published || ctx.to == InReview);

    if applies
    && ctx.is_author_level(Capabilities::PUBLISH_CONTENT)
    && !ctx.is_author() {
        Verdict::Denied(Denial::NotAuthor)
    } else {
        Verdict::Allowed
    }
}

/// Only authors can withdraw their own content, unless the actor manages
/// content visibility.
fn withdrawal_authorship(ctx: &Context) -> Verdict {
    let elevated = Capabilities::EDIT_IS_ACTIVE | Capabilities::SYSTEM;

    if ctx.from == Published && ctx.to == Inactive
    && ctx.is_author_level(elevated)
    && !ctx.is_author() {
        Verdict::Denied(Denial::NotAuthor)
    } else {
        Verdict::Allowed
    }
}
