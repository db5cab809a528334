//! Symbol → behavior rule matcher (C5). First-match-wins shell-glob
//! matching over a session's compiled rule list, falling back to the
//! session's default behavior, grounded on `original_source/
//! ConfigLoader.py::compileRules` (which pre-compiles an `fnmatch` closure
//! per rule); this uses `glob::Pattern` instead of hand-rolled `fnmatch`.

use fixem_config::ExecutionConfig;
use fixem_core::{FixemError, Result};
use glob::Pattern;

/// One compiled `(pattern, behaviorName)` rule.
struct CompiledRule {
    pattern: Pattern,
    behavior: String,
}

/// Resolves a symbol to a behavior name via first-match-wins glob rules,
/// falling back to a default behavior. Matching is case-sensitive:
/// `glob::Pattern::matches` is case-sensitive by default, so no extra
/// configuration is needed here.
pub struct RuleMatcher {
    rules: Vec<CompiledRule>,
    default_behavior: String,
}

impl RuleMatcher {
    /// Compile an `ExecutionConfig`'s rule list, preserving declaration
    /// order so resolution is first-match-wins.
    pub fn compile(execution: &ExecutionConfig) -> Result<Self> {
        let mut rules = Vec::with_capacity(execution.rules.len());
        for rule in &execution.rules {
            let pattern = Pattern::new(&rule.pattern).map_err(|e| {
                FixemError::Configuration(format!(
                    "invalid rule pattern '{}': {e}",
                    rule.pattern
                ))
            })?;
            rules.push(CompiledRule {
                pattern,
                behavior: rule.behavior.clone(),
            });
        }
        Ok(Self {
            rules,
            default_behavior: execution.default_behavior.clone(),
        })
    }

    /// Resolve `symbol` to a behavior name: the first rule whose pattern
    /// matches, else the default behavior.
    #[must_use]
    pub fn resolve(&self, symbol: &str) -> &str {
        for rule in &self.rules {
            if rule.pattern.matches(symbol) {
                return &rule.behavior;
            }
        }
        &self.default_behavior
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixem_config::RuleConfig;

    fn execution(rules: Vec<(&str, &str)>, default: &str) -> ExecutionConfig {
        ExecutionConfig {
            default_behavior: default.to_string(),
            rules: rules
                .into_iter()
                .map(|(pattern, behavior)| RuleConfig {
                    pattern: pattern.to_string(),
                    behavior: behavior.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn first_match_wins_else_default() {
        let execution = execution(
            vec![("*AAPL*", "b1"), ("GOOG", "b2"), ("*", "b3")],
            "d",
        );
        let matcher = RuleMatcher::compile(&execution).unwrap();

        assert_eq!(matcher.resolve("AAPL"), "b1");
        assert_eq!(matcher.resolve("GOOG"), "b2");
        assert_eq!(matcher.resolve("MSFT"), "b3");
    }

    #[test]
    fn no_rules_falls_back_to_default() {
        let execution = execution(vec![], "default_behavior");
        let matcher = RuleMatcher::compile(&execution).unwrap();
        assert_eq!(matcher.resolve("ANYTHING"), "default_behavior");
    }

    #[test]
    fn matching_is_case_sensitive() {
        let execution = execution(vec![("aapl", "lower")], "default_behavior");
        let matcher = RuleMatcher::compile(&execution).unwrap();
        assert_eq!(matcher.resolve("AAPL"), "default_behavior");
        assert_eq!(matcher.resolve("aapl"), "lower");
    }
}
