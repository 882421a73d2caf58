use std::fmt;

/// A glob-style path pattern.
///
/// `*` matches exactly one path segment, `**` matches any remaining segments
/// (including none). Matching operates on `/`-separated segments; empty
/// segments from leading/trailing slashes are ignored, so `/api/auth/**`
/// matches `/api/auth`, `/api/auth/` and `/api/auth/login/otp` alike.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Any,
    Rest,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s {
                "*" => Segment::Any,
                "**" => Segment::Rest,
                literal => Segment::Literal(literal.to_string()),
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        Self::matches_from(&self.segments, &path_segments)
    }

    fn matches_from(pattern: &[Segment], path: &[&str]) -> bool {
        match pattern.first() {
            None => path.is_empty(),
            Some(Segment::Rest) => {
                let rest = &pattern[1..];
                if rest.is_empty() {
                    return true;
                }
                (0..=path.len()).any(|skip| Self::matches_from(rest, &path[skip..]))
            }
            Some(segment) => match path.first() {
                None => false,
                Some(candidate) => {
                    let matched = match segment {
                        Segment::Literal(literal) => literal == candidate,
                        Segment::Any => true,
                        Segment::Rest => unreachable!(),
                    };
                    matched && Self::matches_from(&pattern[1..], &path[1..])
                }
            },
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
