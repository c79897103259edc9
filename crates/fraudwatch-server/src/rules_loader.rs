//! Rule seeding from YAML
//!
//! Loads the declarative rule set into the rule store at startup. The path
//! may be a single file holding a `rules:` list, or a directory of files
//! each holding one rule document.

use fraudwatch_core::Rule;
use fraudwatch_repository::RuleStore;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
struct RuleSet {
    rules: Vec<Rule>,
}

/// Parse rules from a file or directory
pub fn load_rules(path: &Path) -> anyhow::Result<Vec<Rule>> {
    if path.is_dir() {
        let mut rules = Vec::new();
        let mut entries: Vec<_> = std::fs::read_dir(path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml")
                )
            })
            .collect();
        entries.sort();

        for entry in entries {
            let content = std::fs::read_to_string(&entry)?;
            let rule: Rule = serde_yaml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("invalid rule file {}: {}", entry.display(), e))?;
            rules.push(rule);
        }
        Ok(rules)
    } else {
        let content = std::fs::read_to_string(path)?;
        let set: RuleSet = serde_yaml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("invalid rule set {}: {}", path.display(), e))?;
        Ok(set.rules)
    }
}

/// Load rules and seed them into the store
pub async fn seed_rules(path: &Path, store: &Arc<dyn RuleStore>) -> anyhow::Result<usize> {
    let rules = load_rules(path)?;
    let count = rules.len();

    for rule in rules {
        store.insert(rule).await?;
    }

    info!(count, path = %path.display(), "seeded rules");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudwatch_core::{ConditionOperator, RuleAction};
    use fraudwatch_repository::MemoryRuleStore;

    const RULESET_YAML: &str = r#"
rules:
  - name: large_wallet_transfer
    priority: 8
    conditions:
      - field: paymentMethod
        operator: equals
        value: DIGITAL_WALLET
      - field: amount
        operator: greater_than
        value: 10000
    actions:
      - type: score_adjustment
        adjustment: 15
  - name: embargoed_country
    priority: 9
    conditions:
      - field: location.country
        operator: in
        value: ["KP", "IR"]
    actions:
      - type: block
"#;

    #[test]
    fn test_load_rules_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("rules.yaml");
        std::fs::write(&file, RULESET_YAML).unwrap();

        let rules = load_rules(&file).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].name, "large_wallet_transfer");
        assert_eq!(rules[0].conditions[0].operator, ConditionOperator::Equals);
        assert_eq!(rules[1].actions[0], RuleAction::Block);
    }

    #[test]
    fn test_load_rules_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("01_velocity.yaml"),
            "name: velocity\npriority: 5\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("02_geo.yml"),
            "name: geo\npriority: 7\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "not a rule").unwrap();

        let rules = load_rules(dir.path()).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].name, "velocity");
        assert_eq!(rules[1].name, "geo");
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("rules.yaml");
        std::fs::write(&file, "rules: [ {").unwrap();
        assert!(load_rules(&file).is_err());
    }

    #[tokio::test]
    async fn test_seed_rules_into_store() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("rules.yaml");
        std::fs::write(&file, RULESET_YAML).unwrap();

        let store: Arc<dyn RuleStore> = Arc::new(MemoryRuleStore::new());
        let count = seed_rules(&file, &store).await.unwrap();
        assert_eq!(count, 2);

        let active = store.active_rules().await.unwrap();
        assert_eq!(active[0].name, "embargoed_country"); // priority 9 first
    }
}
