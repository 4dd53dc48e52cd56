use crate::config::Config;
use crate::diagnostics::CfgResult;
use crate::time::DateTime;
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use std::env;

/// Conversion applied to back-tick literal contents. Plain function
/// pointers keep converters swappable per `Config`.
pub type StringConverter = fn(&str, &Config) -> CfgResult<Value>;

static ISO_DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})(?:[ T](\d{2}):(\d{2}):(\d{2})(?:\.(\d+))?(?:([+-])(\d{2}):(\d{2})(?::(\d{2})(?:\.\d+)?)?)?)?$",
    )
    .expect("date-time pattern")
});

static ENV_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$(\w+)(?:\|(.*))?$").expect("environment pattern"));

static INTERPOLATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("interpolation pattern"));

/// The default back-tick conversion. In order: ISO date-times, `$NAME` /
/// `$NAME|default` environment references, `${path}` interpolation. When
/// nothing applies (or a lookup fails) the original string comes back and
/// the evaluator decides whether strict conversions make that an error.
pub fn default_string_converter(source: &str, config: &Config) -> CfgResult<Value> {
    if let Some(value) = parse_date_time(source) {
        return Ok(value);
    }
    if let Some(captures) = ENV_REFERENCE.captures(source) {
        let name = &captures[1];
        return Ok(match env::var(name) {
            Ok(value) => Value::String(value),
            Err(_) => match captures.get(2) {
                Some(default) => Value::String(default.as_str().to_string()),
                None => Value::None,
            },
        });
    }
    if INTERPOLATION.is_match(source) {
        if let Some(replaced) = interpolate(source, config) {
            return Ok(Value::String(replaced));
        }
    }
    Ok(Value::String(source.to_string()))
}

fn parse_date_time(source: &str) -> Option<Value> {
    let captures = ISO_DATETIME.captures(source)?;
    let field = |index: usize| -> Option<i64> {
        captures.get(index).map(|m| m.as_str().parse().ok()).flatten()
    };
    let year = field(1)? as i32;
    let month = field(2)? as u32;
    let day = field(3)? as u32;

    if captures.get(4).is_none() {
        return DateTime::date(year, month, day).map(Value::DateTime);
    }
    let hour = field(4)? as u32;
    let minute = field(5)? as u32;
    let second = field(6)? as u32;

    // Fractional seconds are a fraction of a second, rounded to whole
    // nanoseconds.
    let nanosecond = match captures.get(7) {
        Some(fraction) => {
            let parsed: f64 = format!("0.{}", fraction.as_str()).parse().ok()?;
            (parsed * 1e9).round() as u32
        }
        None => 0,
    };

    let offset = match captures.get(8) {
        Some(sign) => {
            let hours = field(9)?;
            let minutes = field(10)?;
            let seconds = field(11).unwrap_or(0);
            let total = (hours * 3600 + minutes * 60 + seconds) as i32;
            Some(if sign.as_str() == "-" { -total } else { total })
        }
        None => None,
    };

    DateTime::new(year, month, day, hour, minute, second, nanosecond, offset).map(Value::DateTime)
}

/// Replace every `${path}` with the textual form of its looked-up value;
/// `None` when any lookup fails.
fn interpolate(source: &str, config: &Config) -> Option<String> {
    let mut out = String::with_capacity(source.len());
    let mut consumed = 0;
    for captures in INTERPOLATION.captures_iter(source) {
        let whole = captures.get(0)?;
        out.push_str(&source[consumed..whole.start()]);
        match config.fetch(&captures[1]) {
            Ok(value) => out.push_str(&value.to_string()),
            Err(_) => return None,
        }
        consumed = whole.end();
    }
    out.push_str(&source[consumed..]);
    Some(out)
}
