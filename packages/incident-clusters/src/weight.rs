//! Per-point clustering weight from severity, category and recency.

use chrono::{DateTime, Duration, Utc};

use crate::types::incident::{IncidentPoint, IncidentType};

/// Upper bound for any single point's weight.
pub const MAX_WEIGHT: f64 = 10.0;

/// Derives a point's weight relative to a fixed reference time.
///
/// Weight mapping: severity x type coefficient x recency coefficient,
/// clamped to [`MAX_WEIGHT`].
#[derive(Debug, Clone, Copy)]
pub struct WeightCalculator {
    reference_time: DateTime<Utc>,
}

impl Default for WeightCalculator {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl WeightCalculator {
    /// Create a calculator that measures recency against `reference_time`.
    pub fn new(reference_time: DateTime<Utc>) -> Self {
        Self { reference_time }
    }

    pub fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    /// Weight in `(0, 10]`.
    pub fn weight(&self, point: &IncidentPoint) -> f64 {
        let base = f64::from(point.severity.value());
        let weight = base
            * type_coefficient(point.incident_type)
            * self.recency_coefficient(point.occurred_at);
        weight.min(MAX_WEIGHT)
    }

    /// x1.3 within 7 days, x1.1 within 30 days, x1.0 otherwise.
    pub fn recency_coefficient(&self, occurred_at: DateTime<Utc>) -> f64 {
        let age = self.reference_time - occurred_at;
        if age <= Duration::days(7) {
            1.3
        } else if age <= Duration::days(30) {
            1.1
        } else {
            1.0
        }
    }
}

/// Higher for more dangerous categories.
pub fn type_coefficient(incident_type: IncidentType) -> f64 {
    match incident_type {
        IncidentType::TeenGang => 1.4,
        IncidentType::ChainSnatching => 1.2,
        IncidentType::Harassment => 1.0,
        IncidentType::Other => 0.8,
    }
}
