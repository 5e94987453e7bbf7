//! Display formatting shared by the preprocessor and element templates

/// Round to one decimal, always keeping the decimal point: `12.0 -> "12.0"`
pub fn round_number(num: f64) -> String {
    let mut rounded = round1(num);
    if rounded == 0.0 {
        // drop the sign of -0.0
        rounded = 0.0;
    }
    if rounded.fract() == 0.0 && rounded.is_finite() {
        format!("{rounded:.1}")
    } else {
        rounded.to_string()
    }
}

/// Round to one decimal (half away from zero)
pub fn round1(num: f64) -> f64 {
    (num * 10.0).round() / 10.0
}

/// Insert thousands separators into the integer part: `"1234567.5" -> "1,234,567.5"`
pub fn add_commas(num: &str) -> String {
    let (sign, rest) = match num.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", num),
    };
    let (int_part, frac_part) = match rest.find('.') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    if int_part.len() <= 3 || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return num.to_string();
    }

    let mut out = String::with_capacity(num.len() + int_part.len() / 3);
    out.push_str(sign);
    let lead = int_part.len() % 3;
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (i + 3 - lead) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push_str(frac_part);
    out
}

/// Per-host share of a value summed across `reporting_hosts` instances.
///
/// `decimal` keeps one decimal place, otherwise the result is floored.
pub fn instance_average(value: f64, reporting_hosts: u32, decimal: bool) -> String {
    let avg = value / reporting_hosts.max(1) as f64;
    if decimal {
        round_number(avg)
    } else {
        format!("{}", avg.floor())
    }
}

/// Formatter capabilities handed to element templates
#[derive(Debug, Clone, Copy, Default)]
pub struct Formatters;

impl Formatters {
    pub fn round_number(&self, num: f64) -> String {
        round_number(num)
    }

    pub fn add_commas(&self, num: impl ToString) -> String {
        add_commas(&num.to_string())
    }

    pub fn instance_average(&self, value: f64, reporting_hosts: u32, decimal: bool) -> String {
        instance_average(value, reporting_hosts, decimal)
    }
}
