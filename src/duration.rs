// DURATION STRINGS
// THE BENCHMARK BINARIES TAKE DURATION FLAGS IN THE FORM "<decimal><unit>"
// ("0.5us", "10ms", "15s"). PARSE THEM INTO std::time::Duration FOR THE
// CONFIG TYPES AND RENDER THEM BACK IN THE LARGEST UNIT THAT IS EXACT.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::error::HarnessError;

const UNITS: [(&str, u128); 4] = [
    ("s", 1_000_000_000),
    ("ms", 1_000_000),
    ("us", 1_000),
    ("ns", 1),
];

fn grammar() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<int>\d+)(?:\.(?P<frac>\d+))?(?P<unit>ns|us|ms|s)$")
            .expect("duration grammar is a valid regex")
    })
}

pub fn parse(raw: &str) -> Result<Duration, HarnessError> {
    let invalid = || {
        HarnessError::InvalidConfig(format!(
            "bad duration `{}` (expected <number><ns|us|ms|s>, e.g. 30us)",
            raw
        ))
    };

    let caps = grammar().captures(raw.trim()).ok_or_else(invalid)?;
    let scale = UNITS
        .iter()
        .find(|(u, _)| *u == &caps["unit"])
        .map(|(_, ns)| *ns)
        .ok_or_else(invalid)?;

    let int: u128 = caps["int"].parse().map_err(|_| invalid())?;
    let mut nanos = int.checked_mul(scale).ok_or_else(invalid)?;

    // FRACTIONAL PART MUST RESOLVE TO WHOLE NANOSECONDS
    if let Some(frac) = caps.name("frac") {
        let digits = frac.as_str();
        let denom = 10u128.checked_pow(digits.len() as u32).ok_or_else(invalid)?;
        let num: u128 = digits.parse().map_err(|_| invalid())?;
        let scaled = num.checked_mul(scale).ok_or_else(invalid)?;
        if scaled % denom != 0 {
            return Err(invalid());
        }
        nanos = nanos.checked_add(scaled / denom).ok_or_else(invalid)?;
    }

    let nanos = u64::try_from(nanos).map_err(|_| invalid())?;
    Ok(Duration::from_nanos(nanos))
}

pub fn format(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0us".to_string();
    }
    for (unit, scale) in UNITS {
        if nanos % scale == 0 {
            return format!("{}{}", nanos / scale, unit);
        }
    }
    format!("{}ns", nanos)
}

// clap value_parser ADAPTER
pub fn parse_arg(raw: &str) -> Result<Duration, String> {
    parse(raw).map_err(|e| e.to_string())
}
