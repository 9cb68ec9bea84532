use std::collections::HashSet;

use crate::models::{Role, Tag, TagSubmission};

/// Message returned when a free-tier author already has an article on file.
pub const QUOTA_MESSAGE: &str =
    "Quota Exceeded: Premium Subscription Required for Additional Articles!";

/// PublishDecision
///
/// Outcome of the submission quota check. A Deny carries the user-facing
/// reason and is delivered as a soft 200 notice, not an error status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishDecision {
    Allow,
    Deny(&'static str),
}

/// can_publish
///
/// Free-tier authors are limited to a single article. Premium users and
/// admins are unlimited. The count is the author's total submissions in any
/// status, so a rejected article still occupies the free slot.
pub fn can_publish(role: Role, is_premium: bool, existing_count: i64) -> PublishDecision {
    if role == Role::Admin {
        return PublishDecision::Allow;
    }
    if !is_premium && existing_count >= 1 {
        return PublishDecision::Deny(QUOTA_MESSAGE);
    }
    PublishDecision::Allow
}

/// dedupe_new_tags
///
/// Selects which submitted tags actually enter the catalog. Only entries the
/// client flagged as newly created are candidates; values already in the
/// catalog are dropped, as are repeats within the same batch. Order of first
/// appearance is preserved.
pub fn dedupe_new_tags(submitted: &[TagSubmission], catalog: &HashSet<String>) -> Vec<Tag> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut fresh = Vec::new();

    for tag in submitted {
        if !tag.is_new {
            continue;
        }
        if catalog.contains(&tag.value) || seen.contains(&tag.value) {
            continue;
        }
        seen.insert(tag.value.clone());
        fresh.push(Tag {
            value: tag.value.clone(),
            label: tag.label.clone(),
        });
    }

    fresh
}
