use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::model::{RuleSet, RuleSetStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("rule set {0} not found in this fiscal year")]
    NotFound(Uuid),
}

/// Decides the status transitions that publish `target_id` as the active
/// rule set for its fiscal year, deprecating whatever rule set previously
/// held that spot.
///
/// This is a pure function over an in-memory slice so it can be unit tested
/// without a database; a repository implementation is expected to load the
/// full set of rule sets for one fiscal year, call this under a lock or a
/// transaction, and persist the result — see `tax-repo`'s in-memory
/// reference implementation for the wrapping pattern.
pub fn decide_publish(
    rule_sets: &mut [RuleSet],
    target_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    if !rule_sets.iter().any(|rs| rs.id == target_id) {
        return Err(LifecycleError::NotFound(target_id));
    }

    for rule_set in rule_sets.iter_mut() {
        if rule_set.id == target_id {
            continue;
        }
        if rule_set.status == RuleSetStatus::Active {
            rule_set.status = RuleSetStatus::Deprecated;
        }
    }

    let target = rule_sets.iter_mut().find(|rs| rs.id == target_id).unwrap();
    target.status = RuleSetStatus::Active;
    target.published_at = Some(now);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn rule_set(status: RuleSetStatus) -> RuleSet {
        RuleSet {
            id: Uuid::new_v4(),
            fiscal_year_id: Uuid::new_v4(),
            version: 1,
            status,
            published_at: None,
            changelog: None,
            rules: vec![],
        }
    }

    #[test]
    fn publishing_deprecates_the_previously_active_rule_set() {
        let mut old = rule_set(RuleSetStatus::Active);
        let mut new = rule_set(RuleSetStatus::Draft);
        new.fiscal_year_id = old.fiscal_year_id;
        let new_id = new.id;
        let mut rule_sets = vec![old.clone(), new];

        decide_publish(&mut rule_sets, new_id, Utc::now()).unwrap();

        old.status = RuleSetStatus::Deprecated;
        assert_eq!(rule_sets[0].status, RuleSetStatus::Deprecated);
        assert_eq!(rule_sets[1].status, RuleSetStatus::Active);
        assert!(rule_sets[1].published_at.is_some());
    }

    #[test]
    fn publishing_an_already_active_rule_set_is_idempotent() {
        let rs = rule_set(RuleSetStatus::Active);
        let id = rs.id;
        let mut rule_sets = vec![rs];
        decide_publish(&mut rule_sets, id, Utc::now()).unwrap();
        assert_eq!(rule_sets[0].status, RuleSetStatus::Active);
    }

    #[test]
    fn publishing_unknown_id_fails() {
        let mut rule_sets = vec![rule_set(RuleSetStatus::Draft)];
        let err = decide_publish(&mut rule_sets, Uuid::new_v4(), Utc::now()).unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(_)));
    }
}
