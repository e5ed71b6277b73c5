use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::criteria::Criteria;
use crate::engine::EngineError;
use crate::model::Car;

/// The fleet of cars the engine allocates from.
///
/// `filtered_list` must enumerate in a stable order; rebooking takes the
/// first match.
pub trait Catalog: Send + Sync {
    fn filtered_list(&self, criteria: &Criteria) -> Vec<Car>;
    fn by_key(&self, registration: &str) -> Option<Car>;
    fn add(&mut self, car: Car) -> Result<(), EngineError>;
    /// Mean daily rate across the group, `None` for an unknown group.
    fn average_price(&self, group: &str) -> Option<f64>;
    fn group_prices(&self) -> BTreeMap<String, f64>;
}

/// Insertion-ordered, scanned linearly. Fleets are small.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    cars: Vec<Car>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }
}

impl Catalog for InMemoryCatalog {
    fn filtered_list(&self, criteria: &Criteria) -> Vec<Car> {
        self.cars
            .iter()
            .filter(|car| criteria.matches(car))
            .cloned()
            .collect()
    }

    fn by_key(&self, registration: &str) -> Option<Car> {
        self.cars
            .iter()
            .find(|car| car.registration == registration)
            .cloned()
    }

    fn add(&mut self, car: Car) -> Result<(), EngineError> {
        if self.cars.contains(&car) {
            return Err(EngineError::AlreadyExists(car.registration));
        }
        self.cars.push(car);
        Ok(())
    }

    fn average_price(&self, group: &str) -> Option<f64> {
        let (sum, count) = self
            .cars
            .iter()
            .filter(|car| car.group == group)
            .fold((0.0, 0usize), |(sum, n), car| (sum + car.daily_rate, n + 1));
        (count > 0).then(|| sum / count as f64)
    }

    fn group_prices(&self) -> BTreeMap<String, f64> {
        let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for car in &self.cars {
            let entry = totals.entry(car.group.clone()).or_default();
            entry.0 += car.daily_rate;
            entry.1 += 1;
        }
        totals
            .into_iter()
            .map(|(group, (sum, n))| (group, sum / n as f64))
            .collect()
    }
}

/// What a customer is shown: the car with its group's blended price
/// instead of the car's own rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarView {
    pub make: String,
    pub model: String,
    pub group: String,
    pub group_price: f64,
}

impl CarView {
    pub fn from_car(car: &Car, group_price: f64) -> Self {
        Self {
            make: car.make.clone(),
            model: car.model.clone(),
            group: car.group.clone(),
            group_price,
        }
    }
}

/// Customer views for `cars`, priced from the catalog's group averages.
pub fn customer_views<C: Catalog + ?Sized>(catalog: &C, cars: &[Car]) -> Vec<CarView> {
    let prices = catalog.group_prices();
    cars.iter()
        .map(|car| {
            let price = prices.get(&car.group).copied().unwrap_or(car.daily_rate);
            CarView::from_car(car, price)
        })
        .collect()
}
