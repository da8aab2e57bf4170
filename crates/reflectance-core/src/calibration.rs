use std::fmt;

use serde::{Deserialize, Serialize};

/// Calibration roles a sample name can carry. `Reference` is the
/// 100%-reflectance panel, `Dark` the zero-signal baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationRole {
    Reference,
    Dark,
}

impl CalibrationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationRole::Reference => "reference",
            CalibrationRole::Dark => "dark",
        }
    }
}

impl fmt::Display for CalibrationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate tying a role to the sample names that carry it. Matching is a
/// case-insensitive prefix test on the digit-stripped sample name, so `ref`,
/// `Ref2` and `REF10` all tag the reference row of their group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleMatcher {
    pub role: CalibrationRole,
    pub prefix: String,
}

impl RoleMatcher {
    pub fn new(role: CalibrationRole, prefix: impl Into<String>) -> Self {
        Self {
            role,
            prefix: prefix.into(),
        }
    }

    pub fn matches(&self, sample_name: &str) -> bool {
        let name = sample_name.trim();
        name.len() >= self.prefix.len()
            && name
                .chars()
                .zip(self.prefix.chars())
                .all(|(a, b)| a.eq_ignore_ascii_case(&b))
    }
}

/// Ordered table of role matchers. Additional roles can be configured without
/// touching the grouping logic; the first matcher per role wins.
pub fn default_role_matchers() -> Vec<RoleMatcher> {
    vec![
        RoleMatcher::new(CalibrationRole::Reference, "ref"),
        RoleMatcher::new(CalibrationRole::Dark, "dark"),
    ]
}

/// True when any configured role claims the name; such rows are calibration
/// measurements, not samples.
pub fn is_calibration(matchers: &[RoleMatcher], sample_name: &str) -> bool {
    matchers.iter().any(|m| m.matches(sample_name))
}

/// The first matcher configured for `role`, if any.
pub fn matcher_for(matchers: &[RoleMatcher], role: CalibrationRole) -> Option<&RoleMatcher> {
    matchers.iter().find(|m| m.role == role)
}
