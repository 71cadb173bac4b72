use std::ops::Deref;

use super::movement::Movement;
use super::standard::Standard;
use crate::client::{Client, Direction, MovePosition};
use crate::codec::{require, Rule};
use crate::error::PangoError;
use crate::ops::audit::{self, AuditComment};
use crate::ops::hitcount::{self, HitCount};
use crate::version::{V8_1, V9_0};
use crate::xpath::{join, RulebaseScope};

/// [`Standard`] plus rule ordering, hit counts and audit comments.
pub struct Policy<'a, E> {
    standard: Standard<'a, E>,
}

impl<'a, E: Rule> Policy<'a, E> {
    pub fn new(client: &'a dyn Client) -> Self {
        Self {
            standard: Standard::new(client),
        }
    }

    /// Place the contiguous `group` of rules at `movement` relative to
    /// `anchor`.
    ///
    /// The first rule is moved only when it is not already in place; every
    /// later rule is moved directly after its predecessor.
    pub fn move_group<S: AsRef<str>>(
        &self,
        loc: &RulebaseScope,
        movement: Movement,
        anchor: &str,
        group: &[S],
    ) -> Result<(), PangoError> {
        if movement == Movement::Skip {
            return Ok(());
        }
        let Some(first): Option<&str> = group.first().map(|s| s.as_ref()) else {
            return Err(PangoError::validation("at least one rule must be given to move"));
        };
        if movement.is_relative() {
            if anchor.is_empty() {
                return Err(PangoError::validation(format!(
                    "movement {movement} requires an anchor rule"
                )));
            }
            if anchor == first {
                return Err(PangoError::validation(format!(
                    "rule {first:?} cannot be moved relative to itself"
                )));
            }
        }

        let current = self.standard.get_list(loc)?;
        let index = |name: &str| {
            current
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| PangoError::NotFound {
                    kind: E::KIND,
                    name: name.to_string(),
                })
        };
        for name in group {
            index(name.as_ref())?;
        }
        let f_idx = index(first)?;

        let position = match movement {
            Movement::Skip => None,
            Movement::Top => (f_idx != 0).then_some(MovePosition::Top),
            Movement::Bottom => (f_idx + 1 != current.len()).then_some(MovePosition::Bottom),
            relative => {
                let r_idx = index(anchor)?;
                let misplaced = match relative {
                    Movement::Before => f_idx > r_idx,
                    Movement::DirectlyBefore => f_idx + 1 != r_idx,
                    Movement::After => f_idx < r_idx,
                    _ => f_idx != r_idx + 1,
                };
                let before = matches!(relative, Movement::Before | Movement::DirectlyBefore);
                misplaced.then(|| {
                    if before {
                        MovePosition::Before(anchor.to_string())
                    } else {
                        MovePosition::After(anchor.to_string())
                    }
                })
            }
        };

        if let Some(position) = position {
            let path = E::xpath(loc, &[first.to_string()])?;
            match self.standard.common.move_entry(&path, &position) {
                Ok(()) => {}
                Err(err) if movement.is_absolute() && err.is_already_positioned() => {}
                Err(err) => return Err(err.during("move", format!("{} {first:?}", E::KIND))),
            }
        }

        for pair in group.windows(2) {
            let (prev, name) = (pair[0].as_ref(), pair[1].as_ref());
            let path = E::xpath(loc, &[name.to_string()])?;
            self.standard
                .common
                .move_entry(&path, &MovePosition::After(prev.to_string()))
                .map_err(|e| e.during("move", format!("{} {name:?}", E::KIND)))?;
        }
        Ok(())
    }

    /// Live hit counters for the named rules (all rules when empty).
    pub fn hit_count(
        &self,
        loc: &RulebaseScope,
        names: &[String],
    ) -> Result<Vec<HitCount>, PangoError> {
        require("rule hit count", &V8_1, &self.standard.client().versioning())?;
        let RulebaseScope::Vsys(vsys) = loc else {
            return Err(PangoError::validation(
                "hit counts are only available for firewall vsys rulebases",
            ));
        };
        let vsys = if vsys.is_empty() { "vsys1" } else { vsys.as_str() };
        hitcount::query(&self.standard.common, E::RULE_TYPE, vsys, names)
    }

    /// Attach an audit comment to the rule's next commit.
    pub fn set_audit_comment(
        &self,
        loc: &RulebaseScope,
        name: &str,
        comment: &str,
    ) -> Result<(), PangoError> {
        let xpath = self.audit_xpath(loc, name)?;
        audit::set(&self.standard.common, &xpath, comment)
    }

    /// The uncommitted audit comment on the rule.
    pub fn current_audit_comment(
        &self,
        loc: &RulebaseScope,
        name: &str,
    ) -> Result<String, PangoError> {
        let xpath = self.audit_xpath(loc, name)?;
        audit::current(&self.standard.common, &xpath)
    }

    /// Committed audit comments for the rule, newest first by default.
    pub fn audit_comment_history(
        &self,
        loc: &RulebaseScope,
        name: &str,
        direction: Direction,
        nlogs: u32,
        skip: u32,
    ) -> Result<Vec<AuditComment>, PangoError> {
        let xpath = self.audit_xpath(loc, name)?;
        audit::history(&self.standard.common, &xpath, direction, nlogs, skip)
    }

    fn audit_xpath(&self, loc: &RulebaseScope, name: &str) -> Result<String, PangoError> {
        require("audit comments", &V9_0, &self.standard.client().versioning())?;
        if name.is_empty() {
            return Err(PangoError::validation("rule name must be specified"));
        }
        Ok(join(&E::xpath(loc, &[name.to_string()])?))
    }
}

impl<'a, E> Deref for Policy<'a, E> {
    type Target = Standard<'a, E>;

    fn deref(&self) -> &Self::Target {
        &self.standard
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Policy;
    use crate::namespace::Movement;
    use crate::poli::security::SecurityRule;
    use crate::testing::ScriptedClient;
    use crate::version::{V8_0, V9_0};
    use crate::xpath::{Rulebase, RulebaseScope};

    const RULES: &str = r#"<rules><entry name="r1"/><entry name="r2"/><entry name="r3"/><entry name="r4"/></rules>"#;

    fn moves(client: &ScriptedClient) -> Vec<String> {
        client
            .calls()
            .into_iter()
            .filter(|c| c.verb == "move")
            .map(|c| c.element)
            .collect()
    }

    #[test]
    fn directly_after_moves_group_behind_anchor() {
        let client = ScriptedClient::new(V9_0);
        client.push_result(RULES);
        let ns: Policy<'_, SecurityRule> = Policy::new(&client);
        let loc = RulebaseScope::device_group("DG1", Rulebase::Pre);
        ns.move_group(&loc, Movement::DirectlyAfter, "r1", &["r3", "r4"])
            .expect("move");
        assert_eq!(moves(&client), vec!["r3 after r1", "r4 after r3"]);
        let calls = client.calls();
        assert!(calls[0].xpath.ends_with("/pre-rulebase/security/rules"));
        assert!(calls[1].xpath.ends_with("/pre-rulebase/security/rules/entry[@name='r3']"));
    }

    #[test]
    fn first_rule_already_in_place_is_not_moved() {
        let client = ScriptedClient::new(V9_0);
        client.push_result(RULES);
        let ns: Policy<'_, SecurityRule> = Policy::new(&client);
        ns.move_group(&RulebaseScope::default(), Movement::After, "r1", &["r3", "r4"])
            .expect("move");
        assert_eq!(moves(&client), vec!["r4 after r3"]);
    }

    #[test]
    fn top_tolerates_already_at_the_top() {
        let client = ScriptedClient::new(V9_0);
        client.push_result(RULES);
        client.push_error("r2 is already at the top");
        let ns: Policy<'_, SecurityRule> = Policy::new(&client);
        ns.move_group(&RulebaseScope::default(), Movement::Top, "", &["r2"])
            .expect("idempotent");
    }

    #[test]
    fn top_surfaces_other_errors() {
        let client = ScriptedClient::new(V9_0);
        client.push_result(RULES);
        client.push_error("commit lock held");
        let ns: Policy<'_, SecurityRule> = Policy::new(&client);
        let err = ns
            .move_group(&RulebaseScope::default(), Movement::Top, "", &["r2"])
            .expect_err("lock");
        assert_eq!(err.panos_message(), Some("commit lock held"));
    }

    #[test]
    fn missing_rule_is_reported_before_any_move() {
        let client = ScriptedClient::new(V9_0);
        client.push_result(RULES);
        let ns: Policy<'_, SecurityRule> = Policy::new(&client);
        let err = ns
            .move_group(&RulebaseScope::default(), Movement::Before, "r1", &["r9"])
            .expect_err("missing");
        assert!(err.is_not_found());
        assert!(moves(&client).is_empty());
    }

    #[test]
    fn relative_moves_need_an_anchor() {
        let client = ScriptedClient::new(V9_0);
        let ns: Policy<'_, SecurityRule> = Policy::new(&client);
        let empty: [&str; 0] = [];
        assert!(ns
            .move_group(&RulebaseScope::default(), Movement::After, "", &["r1"])
            .is_err());
        assert!(ns
            .move_group(&RulebaseScope::default(), Movement::Top, "", &empty)
            .is_err());
        ns.move_group(&RulebaseScope::default(), Movement::Skip, "", &empty)
            .expect("skip");
        assert!(client.calls().is_empty());
    }

    #[test]
    fn hit_count_is_gated_without_io() {
        let client = ScriptedClient::new(V8_0);
        let ns: Policy<'_, SecurityRule> = Policy::new(&client);
        let err = ns
            .hit_count(&RulebaseScope::vsys("vsys1"), &[])
            .expect_err("too old");
        assert!(err.to_string().contains("8.1.0"));
        assert!(client.calls().is_empty());
    }
}
