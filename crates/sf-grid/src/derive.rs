//! Secondary fields computed from the fields a snapshot already carries.
//!
//! Derivations never touch the snapshot: the computer returns a side map
//! per centering, which the caller merges as it sees fit. A rule whose
//! sources are missing is skipped, not reported as an error.

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use sf_core::Centering;

use crate::snapshot::{FieldMap, GridSnapshot};

/// Ordered list of acceptable source names; the first one present wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceSelector {
    candidates: Vec<String>,
}

impl SourceSelector {
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn resolve<'v>(&'v self, view: &FieldView<'_>) -> Option<&'v str> {
        self.candidates
            .iter()
            .map(String::as_str)
            .find(|name| view.get(name).is_some())
    }
}

/// Read access to the fields of one centering: the snapshot's own fields
/// plus whatever earlier rules derived.
pub struct FieldView<'a> {
    base: &'a FieldMap,
    derived: &'a FieldMap,
}

impl<'a> FieldView<'a> {
    pub fn new(base: &'a FieldMap, derived: &'a FieldMap) -> Self {
        Self { base, derived }
    }

    pub fn get(&self, name: &str) -> Option<&'a Array2<f64>> {
        self.base.get(name).or_else(|| self.derived.get(name))
    }
}

/// A named derived quantity.
pub trait Derivation: Send + Sync {
    /// Name of the produced field.
    fn output(&self) -> &str;

    /// Source fields this rule would read from `view`, or `None` if any is missing.
    fn sources(&self, view: &FieldView<'_>) -> Option<Vec<String>>;

    /// Compute the field; `None` when a source is missing.
    fn derive(&self, view: &FieldView<'_>) -> Option<Array2<f64>>;
}

/// `sqrt(a^2 + b^2)` over a pair of component fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorMagnitude {
    pub output: String,
    pub first: SourceSelector,
    pub second: SourceSelector,
}

impl VectorMagnitude {
    pub fn new(output: impl Into<String>, first: SourceSelector, second: SourceSelector) -> Self {
        Self {
            output: output.into(),
            first,
            second,
        }
    }

    /// `velocity_magnitude` from `x_vel`/`y_vel`.
    pub fn velocity() -> Self {
        Self::new(
            "velocity_magnitude",
            SourceSelector::new(["x_vel"]),
            SourceSelector::new(["y_vel"]),
        )
    }
}

impl Derivation for VectorMagnitude {
    fn output(&self) -> &str {
        &self.output
    }

    fn sources(&self, view: &FieldView<'_>) -> Option<Vec<String>> {
        let a = self.first.resolve(view)?;
        let b = self.second.resolve(view)?;
        Some(vec![a.to_string(), b.to_string()])
    }

    fn derive(&self, view: &FieldView<'_>) -> Option<Array2<f64>> {
        let a = view.get(self.first.resolve(view)?)?;
        let b = view.get(self.second.resolve(view)?)?;
        if a.dim() != b.dim() {
            return None;
        }
        Some(Zip::from(a).and(b).map_collect(|&a, &b| (a * a + b * b).sqrt()))
    }
}

/// Copy of the first available candidate field, e.g. `pressure`, else `density0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstAvailable {
    pub output: String,
    pub candidates: SourceSelector,
}

impl Derivation for FirstAvailable {
    fn output(&self) -> &str {
        &self.output
    }

    fn sources(&self, view: &FieldView<'_>) -> Option<Vec<String>> {
        self.candidates.resolve(view).map(|s| vec![s.to_string()])
    }

    fn derive(&self, view: &FieldView<'_>) -> Option<Array2<f64>> {
        view.get(self.candidates.resolve(view)?).cloned()
    }
}

/// Serializable form of the built-in derivations, for configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DerivationRule {
    VectorMagnitude(VectorMagnitude),
    FirstAvailable(FirstAvailable),
}

impl DerivationRule {
    pub fn into_derivation(self) -> Box<dyn Derivation> {
        match self {
            DerivationRule::VectorMagnitude(rule) => Box::new(rule),
            DerivationRule::FirstAvailable(rule) => Box::new(rule),
        }
    }
}

/// Derived fields keyed by the centering they were computed at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedFields {
    pub point: FieldMap,
    pub cell: FieldMap,
}

impl DerivedFields {
    pub fn fields(&self, centering: Centering) -> &FieldMap {
        match centering {
            Centering::Point => &self.point,
            Centering::Cell => &self.cell,
        }
    }

    pub fn get(&self, centering: Centering, name: &str) -> Option<&Array2<f64>> {
        self.fields(centering).get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty() && self.cell.is_empty()
    }

    pub fn len(&self) -> usize {
        self.point.len() + self.cell.len()
    }
}

/// Which sources a rule picked for a given snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub output: String,
    pub centering: Centering,
    pub sources: Vec<String>,
}

/// Registry of derivation rules applied in registration order.
pub struct DerivedFieldComputer {
    rules: Vec<Box<dyn Derivation>>,
}

impl Default for DerivedFieldComputer {
    fn default() -> Self {
        let mut computer = Self::empty();
        computer.register(VectorMagnitude::velocity());
        computer
    }
}

impl std::fmt::Debug for DerivedFieldComputer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedFieldComputer")
            .field("rules", &self.rule_names())
            .finish()
    }
}

impl DerivedFieldComputer {
    /// A computer with no rules.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn from_rules(rules: impl IntoIterator<Item = DerivationRule>) -> Self {
        Self {
            rules: rules.into_iter().map(DerivationRule::into_derivation).collect(),
        }
    }

    pub fn register(&mut self, rule: impl Derivation + 'static) -> &mut Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.output()).collect()
    }

    /// Run every rule at both centerings.
    ///
    /// A rule is skipped when its sources are missing or when the snapshot
    /// already has a field of the same name at that centering.
    pub fn compute(&self, snapshot: &GridSnapshot) -> DerivedFields {
        let mut derived = DerivedFields::default();
        for centering in [Centering::Point, Centering::Cell] {
            let base = snapshot.fields(centering);
            let mut out = FieldMap::new();
            for rule in &self.rules {
                if base.contains_key(rule.output()) {
                    continue;
                }
                let view = FieldView::new(base, &out);
                if let Some(field) = rule.derive(&view) {
                    out.insert(rule.output().to_string(), field);
                }
            }
            match centering {
                Centering::Point => derived.point = out,
                Centering::Cell => derived.cell = out,
            }
        }
        derived
    }

    /// Which source fields each rule would use on `snapshot`.
    pub fn resolve(&self, snapshot: &GridSnapshot) -> Vec<Resolution> {
        self.resolve_computed(snapshot, &self.compute(snapshot))
    }

    /// [`DerivedFieldComputer::resolve`] for a snapshot whose fields were already derived.
    pub fn resolve_computed(&self, snapshot: &GridSnapshot, derived: &DerivedFields) -> Vec<Resolution> {
        let mut resolutions = Vec::new();
        for centering in [Centering::Point, Centering::Cell] {
            let view = FieldView::new(snapshot.fields(centering), derived.fields(centering));
            for rule in &self.rules {
                if let Some(sources) = rule.sources(&view) {
                    resolutions.push(Resolution {
                        output: rule.output().to_string(),
                        centering,
                        sources,
                    });
                }
            }
        }
        resolutions
    }
}
