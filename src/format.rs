use chrono::NaiveDate;

/// Comma after every third digit from the right (1000 -> "1,000").
pub fn format_number(number: i64) -> String {
    let digits = number.abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if number < 0 {
        out.push('-');
    }
    let first = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - first) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// 100000000 -> "$100,000,000".
pub fn format_currency(amount: i64) -> String {
    format!("${}", format_number(amount))
}

/// "2018-06-23" -> "Jun 23, 2018". Unparseable input is returned as-is.
pub fn format_date(release_date: &str) -> String {
    match NaiveDate::parse_from_str(release_date, "%Y-%m-%d") {
        Ok(date) => date.format("%b %d, %Y").to_string(),
        Err(_) => release_date.to_string(),
    }
}

/// Minutes to hours and minutes (112 -> "1h 52m", 120 -> "2h", 45 -> "45m").
pub fn format_runtime(minutes: i64) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    if hours == 0 {
        format!("{rest}m")
    } else if rest == 0 {
        format!("{hours}h")
    } else {
        format!("{hours}h {rest}m")
    }
}

/// Year component of a catalog date ("2018-06-23" -> "2018").
pub fn release_year(date: &str) -> String {
    date.split('-').next().unwrap_or(date).to_string()
}
