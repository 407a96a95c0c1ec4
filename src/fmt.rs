/// Symbol printed before amounts in `currency`; unknown codes print as a prefix.
fn currency_symbol(currency: &str) -> String {
    match currency.to_uppercase().as_str() {
        "AUD" | "USD" | "CAD" | "NZD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" | "CNY" => "¥".to_string(),
        other => format!("{other} "),
    }
}

fn group_thousands(int_part: &str) -> String {
    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped.chars().rev().collect()
}

/// Amount with currency symbol and thousands separators: `$1,234.56`, `-€500.00`.
pub fn money(val: f64, currency: &str) -> String {
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
    let sign = if val < 0.0 && cents != "0.00" { "-" } else { "" };
    format!("{sign}{}{}.{dec_part}", currency_symbol(currency), group_thousands(int_part))
}

/// Annual rate as shown in tables: `4.50%`.
pub fn percent(rate: f64) -> String {
    format!("{rate:.2}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56, "AUD"), "$1,234.56");
        assert_eq!(money(-500.00, "USD"), "-$500.00");
        assert_eq!(money(0.0, "AUD"), "$0.00");
        assert_eq!(money(1000000.99, "EUR"), "€1,000,000.99");
        assert_eq!(money(42.10, "gbp"), "£42.10");
        assert_eq!(money(-0.001, "AUD"), "$0.00");
    }

    #[test]
    fn test_unknown_currency_uses_code() {
        assert_eq!(money(10.0, "CHF"), "CHF 10.00");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(4.5), "4.50%");
    }
}
