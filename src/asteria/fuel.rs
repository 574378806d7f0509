/// Manhattan distance covered by a move of `(dx, dy)`. Never overflows.
pub fn distance(dx: i64, dy: i64) -> u128 {
    dx.unsigned_abs() as u128 + dy.unsigned_abs() as u128
}

/// Fuel needed to travel `distance` at `fuel_per_step`. `None` if it doesn't fit a `u128`.
pub fn required_fuel(distance: u128, fuel_per_step: u128) -> Option<u128> {
    distance.checked_mul(fuel_per_step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_manhattan() {
        assert_eq!(distance(3, -4), 7);
        assert_eq!(distance(0, 0), 0);
    }

    #[test]
    fn distance_handles_extremes() {
        assert_eq!(distance(i64::MIN, i64::MIN), 2 * (i64::MAX as u128 + 1));
    }

    #[test]
    fn required_fuel_multiplies() {
        assert_eq!(required_fuel(7, 3), Some(21));
        assert_eq!(required_fuel(u128::MAX, 2), None);
        assert_eq!(required_fuel(u128::MAX, 1), Some(u128::MAX));
    }
}
