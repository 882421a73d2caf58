use std::fmt;

/// Caller roles as carried in the token's `role` claim.
///
/// The mapping from claim integers is total: any unrecognized value becomes
/// `Unknown`, which no policy rule ever names, so a forged or future role
/// integer can never land in a privileged bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
    Kitchen,
    Unknown,
}

impl Role {
    pub fn from_claim(value: i64) -> Self {
        match value {
            1 => Self::Customer,
            2 => Self::Admin,
            3 => Self::Kitchen,
            _ => Self::Unknown,
        }
    }

    /// Parse a policy-rule role name. `Unknown` is intentionally not
    /// nameable: a rule granting access to unrecognized roles would defeat
    /// the point of the fallback.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "CUSTOMER" => Some(Self::Customer),
            "ADMIN" => Some(Self::Admin),
            "KITCHEN" => Some(Self::Kitchen),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Admin => "ADMIN",
            Self::Kitchen => "KITCHEN",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
