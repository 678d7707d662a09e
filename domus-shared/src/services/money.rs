/// Rules for money values
///
/// Movement amounts and contract costs are stored as `NUMERIC(12, 2)`, so a
/// value must be positive, have at most two decimals and fit ten integer
/// digits.

use rust_decimal::Decimal;

use super::error::{ServiceError, ServiceResult};

/// Largest value a `NUMERIC(12, 2)` column holds: 9 999 999 999.99
pub const MAX_MONEY: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Checks `value` against the money rule, reporting failures on `field`
pub fn check_money(field: &'static str, label: &str, value: Decimal) -> ServiceResult<()> {
    if value <= Decimal::ZERO {
        return Err(ServiceError::validation(
            field,
            format!("{} must be greater than zero", label),
        ));
    }
    if value.scale() > 2 && value != value.round_dp(2) {
        return Err(ServiceError::validation(
            field,
            format!("{} cannot have more than 2 decimals", label),
        ));
    }
    if value > MAX_MONEY {
        return Err(ServiceError::validation(
            field,
            format!("{} cannot exceed {}", label, MAX_MONEY),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: ServiceResult<()>) -> &'static str {
        match result {
            Err(ServiceError::Validation { field, .. }) => field,
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_max_money_is_column_limit() {
        assert_eq!(MAX_MONEY, Decimal::new(999_999_999_999, 2));
        assert_eq!(MAX_MONEY.to_string(), "9999999999.99");
    }

    #[test]
    fn test_accepts_boundaries() {
        assert!(check_money("amount", "Amount", Decimal::new(1, 2)).is_ok());
        assert!(check_money("amount", "Amount", MAX_MONEY).is_ok());
        // trailing zeros beyond two places are still two decimals
        assert!(check_money("amount", "Amount", Decimal::new(125_000, 4)).is_ok());
    }

    #[test]
    fn test_rejects_values_over_the_column_limit() {
        let over = MAX_MONEY + Decimal::new(1, 2);
        assert_eq!(field_of(check_money("amount", "Amount", over)), "amount");
        assert_eq!(
            field_of(check_money("amount", "Amount", Decimal::new(100_000_000_000, 0))),
            "amount"
        );
    }

    #[test]
    fn test_rejects_extra_decimals_instead_of_rounding() {
        let cost = Decimal::new(12_345, 3);
        assert_eq!(field_of(check_money("periodic_cost", "Cost", cost)), "periodic_cost");

        // 0.004 is positive but would round to zero in the column
        let tiny = Decimal::new(4, 3);
        let err = check_money("periodic_cost", "Cost", tiny).unwrap_err();
        assert!(err.to_string().contains("2 decimals"));
    }

    #[test]
    fn test_rejects_zero_and_negative() {
        assert!(check_money("amount", "Amount", Decimal::ZERO).is_err());
        let err = check_money("periodic_cost", "Cost", Decimal::new(-500, 2)).unwrap_err();
        assert_eq!(err.to_string(), "periodic_cost: Cost must be greater than zero");
    }
}
