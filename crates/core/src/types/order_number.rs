//! Human-facing order numbers.

/// Width of the zero-padded sequence part.
const SEQUENCE_WIDTH: usize = 6;

/// Format an order number from a prefix and a counter value.
///
/// Sequences wider than six digits are printed in full rather than truncated.
///
/// ```
/// use dokan_core::format_order_number;
///
/// assert_eq!(format_order_number("DK", 42), "DK000042");
/// assert_eq!(format_order_number("DK", 1_234_567), "DK1234567");
/// ```
#[must_use]
pub fn format_order_number(prefix: &str, sequence: i64) -> String {
    format!("{prefix}{sequence:0width$}", width = SEQUENCE_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_pads_to_six_digits() {
        assert_eq!(format_order_number("DK", 1), "DK000001");
        assert_eq!(format_order_number("DK", 999_999), "DK999999");
    }

    #[test]
    fn test_custom_prefix() {
        assert_eq!(format_order_number("ORD-", 12), "ORD-000012");
        assert_eq!(format_order_number("", 5), "000005");
    }
}
