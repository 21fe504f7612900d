//! Divergence policy
//!
//! Which snapshot fields count toward a desync is a tuning decision, not a
//! property of the snapshot type. A movement system may treat position and
//! rotation as authoritative while velocity is allowed to drift, because
//! velocity is rederived on the next step anyway. The policy is data so it
//! can be loaded from configuration next to the rest of the netcode settings.

use crate::{Error, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// The set of fields that take part in divergence detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DivergenceFields {
    /// Every field the snapshot knows about
    #[default]
    All,
    /// Only the named fields; everything else is cosmetic
    Only(IndexSet<String>),
}

/// Policy passed to `StateSnapshot::compare`
///
/// # Example
///
/// ```
/// use rewind_core::DivergencePolicy;
///
/// let policy = DivergencePolicy::only(["position", "rotation"]).with_tolerance(0.001);
/// assert!(policy.includes("position"));
/// assert!(!policy.includes("velocity"));
/// assert!(policy.float_eq("position", 1.0, 1.0005));
/// // Excluded fields always agree
/// assert!(policy.float_eq("velocity", 1.0, 9.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DivergencePolicy {
    /// Fields that count toward divergence
    #[serde(default)]
    pub fields: DivergenceFields,
    /// Absolute tolerance for float comparisons (0.0 = exact)
    #[serde(default)]
    pub tolerance: f32,
}

impl DivergencePolicy {
    /// Compare every field exactly
    pub fn strict() -> Self {
        Self::default()
    }

    /// Compare only the named fields
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: DivergenceFields::Only(fields.into_iter().map(Into::into).collect()),
            tolerance: 0.0,
        }
    }

    /// Set the float tolerance
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Parse a policy from RON
    ///
    /// ```
    /// use rewind_core::DivergencePolicy;
    ///
    /// let source = r#"(fields: Only(["position"]), tolerance: 0.01)"#;
    /// let policy = DivergencePolicy::from_ron(source).unwrap();
    /// assert!(policy.includes("position"));
    /// ```
    pub fn from_ron(source: &str) -> Result<Self> {
        let policy: Self = ron::from_str(source)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Check the policy is usable
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(Error::InvalidPolicy(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Named fields that are not among `known`, in configuration order
    ///
    /// Always empty for [`DivergenceFields::All`].
    pub fn unknown_fields<'a>(&'a self, known: &[&str]) -> Vec<&'a str> {
        match &self.fields {
            DivergenceFields::All => Vec::new(),
            DivergenceFields::Only(set) => set
                .iter()
                .map(String::as_str)
                .filter(|name| !known.contains(name))
                .collect(),
        }
    }

    /// Whether `field` takes part in divergence detection
    pub fn includes(&self, field: &str) -> bool {
        match &self.fields {
            DivergenceFields::All => true,
            DivergenceFields::Only(set) => set.contains(field),
        }
    }

    /// Exact equality for an included field; excluded fields always agree
    pub fn field_eq<T: PartialEq + ?Sized>(&self, field: &str, a: &T, b: &T) -> bool {
        !self.includes(field) || a == b
    }

    /// Tolerance-aware equality for an included float field
    pub fn float_eq(&self, field: &str, a: f32, b: f32) -> bool {
        !self.includes(field) || (a - b).abs() <= self.tolerance
    }

    /// Tolerance-aware equality over float components of one field
    pub fn floats_eq(&self, field: &str, a: &[f32], b: &[f32]) -> bool {
        if !self.includes(field) {
            return true;
        }
        a.len() == b.len()
            && a.iter()
                .zip(b)
                .all(|(x, y)| (x - y).abs() <= self.tolerance)
    }
}
