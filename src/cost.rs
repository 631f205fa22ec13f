//! Trip cost estimate

use rust_decimal::Decimal;

use crate::models::FlightResult;

/// Fixed allowance for accommodation, food and local transport
pub const MISC_COST_BASELINE: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

pub const ESTIMATED_COST_NOTE: &str =
    "The total cost is an estimate because live flight pricing was unavailable.";

/// Baseline plus the live flight price. The note is set when no live price was available.
#[must_use]
pub fn estimate_total(flight: &FlightResult) -> (Decimal, Option<&'static str>) {
    match flight.live_price() {
        Some(price) => (MISC_COST_BASELINE + price, None),
        None => (MISC_COST_BASELINE, Some(ESTIMATED_COST_NOTE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;

    fn live_flight(total: Decimal) -> FlightResult {
        FlightResult {
            segments: Vec::new(),
            total_price: total,
            provenance: Provenance::Live,
            error_detail: None,
        }
    }

    #[test]
    fn test_baseline_is_five_hundred() {
        assert_eq!(MISC_COST_BASELINE, Decimal::new(500, 0));
    }

    #[test]
    fn test_live_price_is_added() {
        let (total, note) = estimate_total(&live_flight(Decimal::new(42_050, 2)));
        assert_eq!(total, Decimal::new(92_050, 2));
        assert!(note.is_none());
    }

    #[test]
    fn test_zero_offers_keep_baseline() {
        let (total, note) = estimate_total(&live_flight(Decimal::ZERO));
        assert_eq!(total, MISC_COST_BASELINE);
        assert_eq!(note, Some(ESTIMATED_COST_NOTE));
    }

    #[test]
    fn test_failed_flight_keeps_baseline() {
        let mut flight = FlightResult::error("timeout");
        flight.total_price = Decimal::new(999, 0);
        let (total, note) = estimate_total(&flight);
        assert_eq!(total, MISC_COST_BASELINE);
        assert!(note.is_some());
    }
}
