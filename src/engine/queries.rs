use std::collections::BTreeMap;

use tracing::debug;

use crate::catalog::{customer_views, CarView, Catalog};
use crate::criteria::Criteria;
use crate::model::*;

use super::Engine;

impl<C: Catalog> Engine<C> {
    pub async fn list_matching(&self, criteria: &Criteria) -> Vec<Car> {
        let fleet = self.fleet.read().await;
        fleet.catalog.filtered_list(criteria)
    }

    /// Every car free for the whole of `span`.
    pub async fn list_available_all(&self, span: Span) -> Vec<Car> {
        self.list_available(&Criteria::All, span).await
    }

    /// Cars matching `criteria` that have no reservation sharing a day
    /// with `span`, in catalog order.
    pub async fn list_available(&self, criteria: &Criteria, span: Span) -> Vec<Car> {
        let fleet = self.fleet.read().await;
        let cars = fleet.available(criteria, &span);
        debug!("{} cars available over {span}", cars.len());
        cars
    }

    /// Available cars as shown to customers, priced at their group average.
    pub async fn list_available_customer_view(&self, criteria: &Criteria, span: Span) -> Vec<CarView> {
        let fleet = self.fleet.read().await;
        let cars = fleet.available(criteria, &span);
        customer_views(&fleet.catalog, &cars)
    }

    /// Reservations sharing at least one day with `span`.
    pub async fn list_reservations(&self, span: Span) -> Vec<Reservation> {
        let fleet = self.fleet.read().await;
        fleet.store.overlapping(&span)
    }

    pub async fn reservations_for(&self, registration: &str) -> Vec<Reservation> {
        let fleet = self.fleet.read().await;
        fleet.store.for_registration(registration)
    }

    pub async fn all_reservations(&self) -> Vec<Reservation> {
        let fleet = self.fleet.read().await;
        fleet.store.list_all()
    }

    pub async fn find_car(&self, registration: &str) -> Option<Car> {
        let fleet = self.fleet.read().await;
        fleet.catalog.by_key(registration)
    }

    pub async fn average_price(&self, group: &str) -> Option<f64> {
        let fleet = self.fleet.read().await;
        fleet.catalog.average_price(group)
    }

    /// Blended daily price per rental group.
    pub async fn group_pricing(&self) -> BTreeMap<String, f64> {
        let fleet = self.fleet.read().await;
        fleet.catalog.group_prices()
    }
}
