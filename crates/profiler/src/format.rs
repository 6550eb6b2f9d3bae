//! Human-readable number formatting shared by the narrative and the report.

/// `1234567.891, 2` -> `1,234,567.89`.
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// `$1,234.50`
pub fn usd(value: f64) -> String {
    format!("${}", group_thousands(value, 2))
}

/// `0x1234...abcd`
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    let head: String = chars.iter().take(6).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0, 2), "0.00");
        assert_eq!(group_thousands(999.0, 0), "999");
        assert_eq!(group_thousands(1_000.0, 0), "1,000");
        assert_eq!(group_thousands(1_234_567.891, 2), "1,234,567.89");
        assert_eq!(group_thousands(-4_200.5, 1), "-4,200.5");
        assert_eq!(group_thousands(-0.001, 2), "0.00");
    }

    #[test]
    fn test_usd() {
        assert_eq!(usd(1_200_000.0), "$1,200,000.00");
        assert_eq!(usd(12.5), "$12.50");
    }

    #[test]
    fn test_short_address() {
        assert_eq!(short_address("0x1234567890abcdef"), "0x1234...cdef");
    }
}
