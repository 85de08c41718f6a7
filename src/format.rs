//! Number formatting for tooltips and axis ticks.

/// Integer with `,` thousands separators, e.g. `18903` -> `18,903`.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Compact axis tick label: `950`, `2k`, `1.5k`, `3M`.
///
/// Values are rounded to one decimal before the unit is fixed, so `999_999` is `1M`
/// rather than `1000k`.
pub fn format_axis_label(n: u64) -> String {
    const UNITS: [(u128, &str); 3] = [(1_000, "k"), (1_000_000, "M"), (1_000_000_000, "B")];
    if n < 1_000 {
        return n.to_string();
    }
    let mut label = String::new();
    for (i, (scale, suffix)) in UNITS.iter().enumerate() {
        let tenths = (u128::from(n) * 10 + scale / 2) / scale;
        if tenths < 10_000 || i == UNITS.len() - 1 {
            label = match tenths % 10 {
                0 => format!("{}{}", tenths / 10, suffix),
                frac => format!("{}.{}{}", tenths / 10, frac, suffix),
            };
            break;
        }
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(18903), "18,903");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_axis_label() {
        assert_eq!(format_axis_label(950), "950");
        assert_eq!(format_axis_label(2000), "2k");
        assert_eq!(format_axis_label(1500), "1.5k");
        assert_eq!(format_axis_label(3_000_000), "3M");
        assert_eq!(format_axis_label(999), "999");
        assert_eq!(format_axis_label(1_049), "1k");
        assert_eq!(format_axis_label(1_050), "1.1k");
    }

    #[test]
    fn test_format_axis_label_rounds_into_next_unit() {
        assert_eq!(format_axis_label(999_949), "999.9k");
        assert_eq!(format_axis_label(999_950), "1M");
        assert_eq!(format_axis_label(999_999), "1M");
        assert_eq!(format_axis_label(999_950_000), "1B");
        assert_eq!(format_axis_label(2_500_000_000), "2.5B");
    }
}
