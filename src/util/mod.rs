pub(crate) fn today_iso_local() -> String {
    // Use system local timezone (browser runtime).
    let d = js_sys::Date::new_0();
    let y = d.get_full_year();
    let m = d.get_month() + 1;
    let day = d.get_date();
    format!("{:04}-{:02}-{:02}", y, m, day)
}

/// `2024-03-09` or `2024-03-09 14:22:01` -> `09/03/2024`.
pub(crate) fn format_date_dmy(raw: &str) -> String {
    let day_part = raw.split([' ', 'T']).next().unwrap_or_default();
    let mut parts = day_part.splitn(3, '-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(y), Some(m), Some(d)) if !y.is_empty() && !m.is_empty() && !d.is_empty() => {
            format!("{d}/{m}/{y}")
        }
        _ => raw.to_string(),
    }
}

pub(crate) fn format_money(value: f64) -> String {
    format!("{:.2}", value)
}

/// Parse a numeric form field; accepts a comma as decimal separator.
pub(crate) fn parse_decimal(raw: &str) -> Option<f64> {
    let v = raw.trim().replace(',', ".");
    if v.is_empty() {
        return None;
    }
    v.parse::<f64>().ok().filter(|n| n.is_finite())
}
