const MIN_GROUPED_DIGITS: usize = 5;

/// Formats a number the way the Spanish UI shows it: `,` separates
/// decimals and `.` groups thousands once the integer part has five or
/// more digits (`2512,34` but `12.345`). Without explicit `decimals`,
/// integers print with none and everything else with one.
pub fn format_display_number(value: f64, decimals: Option<usize>) -> String {
    let decimals = decimals.unwrap_or(if value.fract() == 0.0 { 0 } else { 1 });
    let fixed = format!("{:.*}", decimals, value.abs());

    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let group = int_part.len() >= MIN_GROUPED_DIGITS;
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if group && idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_have_no_decimals_by_default() {
        assert_eq!(format_display_number(0.0, None), "0");
        assert_eq!(format_display_number(150.0, None), "150");
        assert_eq!(format_display_number(1234.0, None), "1234");
        assert_eq!(format_display_number(12345.0, None), "12.345");
    }

    #[test]
    fn fractions_get_one_decimal_by_default() {
        assert_eq!(format_display_number(1234.5, None), "1234,5");
        assert_eq!(format_display_number(2512.34, None), "2512,3");
    }

    #[test]
    fn four_digit_volumes_are_not_grouped() {
        assert_eq!(format_display_number(2512.34, Some(2)), "2512,34");
        assert_eq!(format_display_number(9999.0, None), "9999");
        assert_eq!(format_display_number(10000.0, None), "10.000");
    }

    #[test]
    fn explicit_decimals_are_respected() {
        assert_eq!(format_display_number(1234567.891, Some(2)), "1.234.567,89");
        assert_eq!(format_display_number(12.0, Some(2)), "12,00");
    }

    #[test]
    fn negative_values_keep_their_sign() {
        assert_eq!(format_display_number(-1500.26, Some(1)), "-1500,3");
        assert_eq!(format_display_number(-15000.26, Some(1)), "-15.000,3");
        assert_eq!(format_display_number(-0.01, Some(1)), "0,0");
    }
}
