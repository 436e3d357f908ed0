use crate::report::Money;

/// Locale conventions for currency strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyFormat {
    pub symbol: String,
    pub decimal_separator: char,
    pub thousands_separator: char,
}

impl Default for MoneyFormat {
    fn default() -> Self {
        Self {
            symbol: "R$".to_string(),
            decimal_separator: ',',
            thousands_separator: '.',
        }
    }
}

impl MoneyFormat {
    /// `R$ 1.234,56`, `-R$ 0,05`
    pub fn format(&self, value: Money) -> String {
        let cents = value.cents();
        let abs = cents.unsigned_abs();
        let whole = group_digits(abs / 100, self.thousands_separator);
        let sign = if cents < 0 { "-" } else { "" };
        let symbol = if self.symbol.is_empty() {
            String::new()
        } else {
            format!("{} ", self.symbol)
        };
        format!(
            "{sign}{symbol}{whole}{}{:02}",
            self.decimal_separator,
            abs % 100
        )
    }
}

fn group_digits(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }

    out.chars().rev().collect()
}
