use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::Car;

/// Composable car filter. Evaluation is pure: it only looks at the car.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criteria {
    /// Matches every car.
    #[default]
    All,
    /// Make contains the given text.
    Make(String),
    Model(String),
    Group(String),
    /// Registration is not in the set.
    Exclude(BTreeSet<String>),
    And(Box<Criteria>, Box<Criteria>),
}

impl Criteria {
    pub fn matches(&self, car: &Car) -> bool {
        match self {
            Criteria::All => true,
            Criteria::Make(make) => car.make.contains(make.as_str()),
            Criteria::Model(model) => car.model == *model,
            Criteria::Group(group) => car.group == *group,
            Criteria::Exclude(registrations) => !registrations.contains(&car.registration),
            Criteria::And(left, right) => left.matches(car) && right.matches(car),
        }
    }

    /// Logical AND. `All` is the identity and is folded away.
    pub fn and(self, other: Criteria) -> Criteria {
        match (self, other) {
            (Criteria::All, c) | (c, Criteria::All) => c,
            (left, right) => Criteria::And(Box::new(left), Box::new(right)),
        }
    }

    pub fn excluding<I, S>(registrations: I) -> Criteria
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Criteria::Exclude(registrations.into_iter().map(Into::into).collect())
    }
}

/// Fluent construction of an AND chain.
#[derive(Debug, Default)]
pub struct CriteriaBuilder {
    criteria: Criteria,
}

impl CriteriaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make(mut self, make: impl Into<String>) -> Self {
        self.criteria = self.criteria.and(Criteria::Make(make.into()));
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.criteria = self.criteria.and(Criteria::Model(model.into()));
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.criteria = self.criteria.and(Criteria::Group(group.into()));
        self
    }

    pub fn build(self) -> Criteria {
        self.criteria
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polo() -> Car {
        Car::new("VW", "Polo", "XX13 3UR", "A1", 65.0)
    }

    fn cooper() -> Car {
        Car::new("Mini", "Cooper", "XX15 5UR", "C1", 70.0)
    }

    #[test]
    fn all_matches_everything() {
        assert!(Criteria::All.matches(&polo()));
        assert!(Criteria::default().matches(&cooper()));
    }

    #[test]
    fn make_is_substring_match() {
        assert!(Criteria::Make("V".into()).matches(&polo()));
        assert!(!Criteria::Make("VW".into()).matches(&cooper()));
    }

    #[test]
    fn exclusion_by_registration() {
        let c = Criteria::excluding(["XX13 3UR"]);
        assert!(!c.matches(&polo()));
        assert!(c.matches(&cooper()));
    }

    #[test]
    fn and_requires_both() {
        let c = Criteria::Group("A1".into()).and(Criteria::Make("VW".into()));
        assert!(c.matches(&polo()));
        assert!(!c.matches(&cooper()));
    }

    #[test]
    fn and_folds_all() {
        let c = Criteria::All.and(Criteria::Group("A1".into()));
        assert_eq!(c, Criteria::Group("A1".into()));
    }

    #[test]
    fn builder_chains() {
        let c = CriteriaBuilder::new().make("VW").model("Polo").group("A1").build();
        assert!(c.matches(&polo()));
        let c = CriteriaBuilder::new().make("VW").model("Golf").build();
        assert!(!c.matches(&polo()));
        assert_eq!(CriteriaBuilder::new().build(), Criteria::All);
    }

    #[test]
    fn criteria_round_trip_json() {
        let c = CriteriaBuilder::new().group("C1").build().and(Criteria::excluding(["XX15 5UR"]));
        let json = serde_json::to_string(&c).unwrap();
        let back: Criteria = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
