use thiserror::Error;

use crate::routing::pattern::PathPattern;
use crate::services::auth::Role;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid policy rule (expected pattern=ROLE|ROLE): {0}")]
    InvalidRule(String),
    #[error("unknown role name in policy rule: {0}")]
    UnknownRole(String),
}

#[derive(Debug, Clone)]
pub struct PolicyRule {
    pattern: PathPattern,
    allowed: Vec<Role>,
}

/// Ordered path-pattern → allowed-role-set table.
///
/// Parsed once at startup, immutable for the process lifetime. The first
/// matching rule decides; paths matching no rule are open to any
/// authenticated role.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    rules: Vec<PolicyRule>,
}

impl PolicyTable {
    /// Parse comma-delimited `pattern=ROLE|ROLE` entries.
    pub fn parse(config: &str) -> Result<Self, PolicyError> {
        let mut rules = Vec::new();

        for entry in config.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (pattern, roles) = entry
                .split_once('=')
                .ok_or_else(|| PolicyError::InvalidRule(entry.to_string()))?;

            let pattern = pattern.trim();
            if pattern.is_empty() {
                return Err(PolicyError::InvalidRule(entry.to_string()));
            }

            let allowed = roles
                .split('|')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|name| Role::from_name(name).ok_or_else(|| PolicyError::UnknownRole(name.to_string())))
                .collect::<Result<Vec<_>, _>>()?;

            if allowed.is_empty() {
                return Err(PolicyError::InvalidRule(entry.to_string()));
            }

            rules.push(PolicyRule {
                pattern: PathPattern::new(pattern),
                allowed,
            });
        }

        tracing::info!(count = rules.len(), "role policy rules configured");
        Ok(Self { rules })
    }

    /// First-match-wins role check. `true` when no rule matches the path.
    pub fn is_allowed(&self, path: &str, role: Role) -> bool {
        for rule in &self.rules {
            if rule.pattern.matches(path) {
                return rule.allowed.contains(&role);
            }
        }
        true
    }
}
