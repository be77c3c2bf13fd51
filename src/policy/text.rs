//! Textual policy/transition grammar.
//!
//! This is the user-facing surface that round-trips through editor text
//! fields, so parse/format must stay left-inverse for all normalized forms.
//! Parse failures return `None` ("unrecognized syntax") and callers must
//! decide fallback behavior explicitly; nothing here silently defaults.

use crate::policy::model::{
    ChanceCadence, Ease, RefreshPolicy, TimeSpan, TimeUnit, TransitionKind, WipeDir,
};

/// Parse a duration literal (`<number><unit>`, unit in `ms|s|m`).
pub fn parse_time_span(text: &str) -> Option<TimeSpan> {
    let text = text.trim();
    let lower = text.to_ascii_lowercase();
    let (num, unit) = if let Some(num) = lower.strip_suffix("ms") {
        (num, TimeUnit::Ms)
    } else if let Some(num) = lower.strip_suffix('s') {
        (num, TimeUnit::S)
    } else if let Some(num) = lower.strip_suffix('m') {
        (num, TimeUnit::M)
    } else {
        return None;
    };
    let amount: f64 = num.trim().parse().ok()?;
    if !amount.is_finite() {
        return None;
    }
    Some(TimeSpan::new(amount, unit))
}

/// Format a duration literal; inverse of [`parse_time_span`].
pub fn format_time_span(span: TimeSpan) -> String {
    format!("{}{}", fmt_num(span.amount), span.unit.suffix())
}

/// Parse a refresh policy string. Legacy spellings (`onLoad`, `onDocstep`)
/// normalize into the canonical union here, at the decode boundary, so
/// downstream components only handle canonical tags.
pub fn parse_refresh_policy(text: &str) -> Option<RefreshPolicy> {
    let text = text.trim();
    match text.to_ascii_lowercase().as_str() {
        "never" | "onload" => return Some(RefreshPolicy::Never),
        "docstep" | "ondocstep" => return Some(RefreshPolicy::Docstep),
        _ => {}
    }

    let (name, args) = parse_call(text)?;
    match name.as_str() {
        "every" => {
            let args = split_args(args);
            let (first, phase) = match args.as_slice() {
                [p] => (*p, None),
                [p, ph] => (*p, Some(*ph)),
                _ => return None,
            };
            let period = parse_time_span(first)?;
            let phase = match phase {
                None => None,
                Some(ph) => Some(parse_time_span(ph)?),
            };
            Some(RefreshPolicy::Every { period, phase })
        }
        "at" => {
            let args = split_args(args);
            let [arg] = args.as_slice() else {
                return None;
            };
            Some(RefreshPolicy::At {
                at: parse_time_span(arg)?,
            })
        }
        "ateach" => {
            let args = split_args(args);
            if args.is_empty() {
                return None;
            }
            let times = args
                .iter()
                .map(|a| parse_time_span(a))
                .collect::<Option<Vec<_>>>()?;
            Some(RefreshPolicy::AtEach { times })
        }
        "poisson" => {
            let args = split_args(args);
            let [arg] = args.as_slice() else {
                return None;
            };
            let rate_per_sec: f64 = arg.parse().ok()?;
            if !rate_per_sec.is_finite() {
                return None;
            }
            Some(RefreshPolicy::Poisson { rate_per_sec })
        }
        "chance" => {
            let args = split_args(args);
            let (p_text, cadence_text) = match args.as_slice() {
                [p] => (*p, None),
                [p, c] => (*p, Some(*c)),
                _ => return None,
            };
            let p: f64 = p_text.parse().ok()?;
            if !p.is_finite() {
                return None;
            }
            let cadence = match cadence_text {
                None => ChanceCadence::Docstep,
                Some(c) if c.eq_ignore_ascii_case("docstep") => ChanceCadence::Docstep,
                Some(c) => ChanceCadence::Every {
                    period: parse_time_span(c)?,
                },
            };
            Some(RefreshPolicy::Chance { p, cadence })
        }
        _ => None,
    }
}

/// Format a refresh policy; left inverse of [`parse_refresh_policy`] for all
/// canonical values.
pub fn format_refresh_policy(policy: &RefreshPolicy) -> String {
    match policy {
        RefreshPolicy::Never => "never".to_string(),
        RefreshPolicy::Docstep => "docstep".to_string(),
        RefreshPolicy::Every { period, phase } => match phase {
            None => format!("every({})", format_time_span(*period)),
            Some(phase) => format!(
                "every({}, {})",
                format_time_span(*period),
                format_time_span(*phase)
            ),
        },
        RefreshPolicy::At { at } => format!("at({})", format_time_span(*at)),
        RefreshPolicy::AtEach { times } => {
            let parts = times
                .iter()
                .map(|t| format_time_span(*t))
                .collect::<Vec<_>>();
            format!("atEach({})", parts.join(", "))
        }
        RefreshPolicy::Poisson { rate_per_sec } => {
            format!("poisson({})", fmt_num(*rate_per_sec))
        }
        RefreshPolicy::Chance { p, cadence } => match cadence {
            ChanceCadence::Docstep => format!("chance({}, docstep)", fmt_num(*p)),
            ChanceCadence::Every { period } => {
                format!("chance({}, {})", fmt_num(*p), format_time_span(*period))
            }
        },
    }
}

/// Parse a transition spec string (`none`, `appear()`, `fade(..)`,
/// `wipe(..)`, `flash(..)`).
pub fn parse_transition(text: &str) -> Option<TransitionKind> {
    let text = text.trim();
    match text.to_ascii_lowercase().as_str() {
        "none" => return Some(TransitionKind::None),
        "appear" | "appear()" => return Some(TransitionKind::Appear),
        _ => {}
    }

    let (name, args) = parse_call(text)?;
    match name.as_str() {
        "fade" => {
            let args = split_args(args);
            let (dur, ease) = match args.as_slice() {
                [d] => (*d, None),
                [d, e] => (*d, Some(*e)),
                _ => return None,
            };
            Some(TransitionKind::Fade {
                duration_ms: parse_duration_ms(dur)?,
                ease: parse_ease_opt(ease)?,
            })
        }
        "wipe" => {
            let args = split_args(args);
            let (dir, dur, ease) = match args.as_slice() {
                [dir, d] => (*dir, *d, None),
                [dir, d, e] => (*dir, *d, Some(*e)),
                _ => return None,
            };
            Some(TransitionKind::Wipe {
                dir: parse_wipe_dir(dir)?,
                duration_ms: parse_duration_ms(dur)?,
                ease: parse_ease_opt(ease)?,
            })
        }
        "flash" => {
            let args = split_args(args);
            let [dur] = args.as_slice() else {
                return None;
            };
            Some(TransitionKind::Flash {
                duration_ms: parse_duration_ms(dur)?,
            })
        }
        _ => None,
    }
}

/// Format a transition spec; left inverse of [`parse_transition`].
pub fn format_transition(spec: &TransitionKind) -> String {
    match spec {
        TransitionKind::None => "none".to_string(),
        TransitionKind::Appear => "appear()".to_string(),
        TransitionKind::Fade { duration_ms, ease } => {
            format!("fade({}ms, {})", fmt_num(*duration_ms), format_ease(*ease))
        }
        TransitionKind::Wipe {
            dir,
            duration_ms,
            ease,
        } => format!(
            "wipe({}, {}ms, {})",
            format_wipe_dir(*dir),
            fmt_num(*duration_ms),
            format_ease(*ease)
        ),
        TransitionKind::Flash { duration_ms } => {
            format!("flash({}ms)", fmt_num(*duration_ms))
        }
    }
}

fn parse_duration_ms(text: &str) -> Option<f64> {
    let span = parse_time_span(text)?;
    let ms = span.millis();
    if !ms.is_finite() || ms < 0.0 {
        return None;
    }
    Some(ms)
}

fn parse_ease_opt(text: Option<&str>) -> Option<Ease> {
    let Some(text) = text else {
        return Some(Ease::Linear);
    };
    match text.trim().to_ascii_lowercase().as_str() {
        "linear" => Some(Ease::Linear),
        "in" => Some(Ease::In),
        "out" => Some(Ease::Out),
        "inout" => Some(Ease::InOut),
        _ => None,
    }
}

fn format_ease(ease: Ease) -> &'static str {
    match ease {
        Ease::Linear => "linear",
        Ease::In => "in",
        Ease::Out => "out",
        Ease::InOut => "inOut",
    }
}

fn parse_wipe_dir(text: &str) -> Option<WipeDir> {
    match text.trim().to_ascii_lowercase().as_str() {
        "left" => Some(WipeDir::Left),
        "right" => Some(WipeDir::Right),
        "up" => Some(WipeDir::Up),
        "down" => Some(WipeDir::Down),
        _ => None,
    }
}

fn format_wipe_dir(dir: WipeDir) -> &'static str {
    match dir {
        WipeDir::Left => "left",
        WipeDir::Right => "right",
        WipeDir::Up => "up",
        WipeDir::Down => "down",
    }
}

/// Split `ident(args)` into a lowercased name and the raw argument text.
fn parse_call(text: &str) -> Option<(String, &str)> {
    let open = text.find('(')?;
    let name = text[..open].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let rest = text[open + 1..].trim_end();
    let args = rest.strip_suffix(')')?;
    Some((name.to_ascii_lowercase(), args))
}

/// Split a call argument list on commas, trimming each piece. Surrounding
/// list brackets are optional (`atEach([1s, 2s])` == `atEach(1s, 2s)`).
fn split_args(args: &str) -> Vec<&str> {
    let mut args = args.trim();
    if let Some(inner) = args
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        args = inner.trim();
    }
    if args.is_empty() {
        return Vec::new();
    }
    args.split(',').map(str::trim).collect()
}

fn fmt_num(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
