use crate::routing::pattern::PathPattern;

/// Paths exempt from credential verification.
///
/// Built once at startup from a comma-delimited pattern list. A request whose
/// path matches any pattern carries no identity through the pipeline at all.
#[derive(Debug, Clone)]
pub struct PublicPathMatcher {
    patterns: Vec<PathPattern>,
}

impl PublicPathMatcher {
    pub fn from_config(patterns: &str) -> Self {
        let patterns: Vec<PathPattern> = patterns
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathPattern::new)
            .collect();

        tracing::info!(count = patterns.len(), "public path patterns configured");
        Self { patterns }
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| {
            let matched = pattern.matches(path);
            if matched {
                tracing::debug!(path, pattern = %pattern, "path matched public pattern");
            }
            matched
        })
    }
}
