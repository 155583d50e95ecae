use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

const MONTHS_SHORT_PT_BR: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

const MONTHS_LONG_PT_BR: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

const WEEKDAYS_SHORT_PT_BR: [&str; 7] = ["seg", "ter", "qua", "qui", "sex", "sáb", "dom"];

/// One playable podcast item, already normalized for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Episode {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) members: String,
    pub(crate) thumbnail: String,
    pub(crate) published_at: String,
    pub(crate) duration: u64,
    pub(crate) duration_label: String,
    pub(crate) media_url: String,
    pub(crate) description: String,
}

/// Formats seconds as `HH:MM:SS`.
pub(crate) fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Durations arrive as strings or numbers; anything unusable is zero.
pub(crate) fn parse_duration_seconds(raw: &serde_json::Value) -> u64 {
    match raw {
        serde_json::Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|value| value.is_finite() && *value >= 0.0)
                    .map(|value| value.floor() as u64)
            })
            .unwrap_or(0),
        serde_json::Value::String(text) => {
            let trimmed = text.trim();
            trimmed
                .parse::<u64>()
                .ok()
                .or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|value| value.is_finite() && *value >= 0.0)
                        .map(|value| value.floor() as u64)
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn parse_published_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

/// `d MMM yy` with pt-BR month names, e.g. `8 jan 21`. Unparseable input is returned as-is.
pub(crate) fn format_published_at(raw: &str) -> String {
    match parse_published_date(raw) {
        Some(date) => format!(
            "{} {} {:02}",
            date.day(),
            MONTHS_SHORT_PT_BR[date.month0() as usize],
            date.year().rem_euclid(100)
        ),
        None => raw.to_string(),
    }
}

/// Header date: `EEEEEE, d, MMMM` in pt-BR, e.g. `qui, 8, abril`.
pub(crate) fn format_header_date(date: NaiveDate) -> String {
    format!(
        "{}, {}, {}",
        WEEKDAYS_SHORT_PT_BR[date.weekday().num_days_from_monday() as usize],
        date.day(),
        MONTHS_LONG_PT_BR[date.month0() as usize]
    )
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}

/// Ids are used as page file names; only keep ones that cannot escape the output directory.
pub(crate) fn is_safe_slug(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
}
