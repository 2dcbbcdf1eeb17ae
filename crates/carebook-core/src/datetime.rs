use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Duration,
  LocalResult,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  TimeZone,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;

const TIMEZONE_CONFIG_FILE: &str =
  "carebook-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "CAREBOOK_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "CAREBOOK_TIME_CONFIG";
const DEFAULT_PROJECT_TIMEZONE: &str =
  "UTC";
/// Hour used when a day is given
/// without a clock time.
const DEFAULT_BOOKING_HOUR: u32 = 9;

/// Matches the date picker's
/// `dd/mm/yyyy - h:mm aa`.
const SCHEDULE_DISPLAY_FORMAT: &str =
  "%d/%m/%Y - %-I:%M %p";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

pub fn project_timezone() -> &'static Tz
{
  static PROJECT_TZ: OnceLock<Tz> =
    OnceLock::new();
  PROJECT_TZ.get_or_init(
    resolve_project_timezone
  )
}

#[must_use]
pub fn format_schedule(
  dt: DateTime<Utc>
) -> String {
  dt.with_timezone(project_timezone())
    .format(SCHEDULE_DISPLAY_FORMAT)
    .to_string()
}

#[must_use]
pub fn format_timestamp(
  dt: DateTime<Utc>
) -> String {
  dt.with_timezone(project_timezone())
    .format("%Y-%m-%d %H:%M")
    .to_string()
}

fn resolve_project_timezone() -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(&raw, TIMEZONE_ENV_VAR)
  {
    return tz;
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return tz;
  }

  parse_timezone(
    DEFAULT_PROJECT_TIMEZONE,
    "DEFAULT_PROJECT_TIMEZONE"
  )
  .unwrap_or(chrono_tz::UTC)
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir()
    .ok()
    .map(|dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    })
}

fn load_timezone_from_file(
  path: &PathBuf
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let parsed = fs::read_to_string(path)
    .map_err(|err| err.to_string())
    .and_then(|raw| {
      toml::from_str::<TimezoneConfig>(
        &raw
      )
      .map_err(|err| err.to_string())
    });
  let parsed = match parsed {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed loading timezone config file"
      );
      return None;
    }
  };

  let timezone = parsed
    .timezone
    .or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    })
    .or_else(|| {
      tracing::warn!(
        file = %path.display(),
        "timezone config had no timezone field"
      );
      None
    })?;

  parse_timezone(
    &timezone,
    &format!("file:{}", path.display())
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "configured project timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

fn to_utc_from_project_local(
  local_naive: NaiveDateTime,
  context: &str
) -> anyhow::Result<DateTime<Utc>> {
  match project_timezone()
    .from_local_datetime(&local_naive)
  {
    | LocalResult::Single(local_dt) => {
      Ok(local_dt.with_timezone(&Utc))
    }
    | LocalResult::Ambiguous(
      first,
      second
    ) => {
      tracing::warn!(
        context,
        first = %first,
        second = %second,
        "ambiguous local datetime; using earliest"
      );
      Ok(first.min(second).with_timezone(&Utc))
    }
    | LocalResult::None => {
      Err(anyhow!(
        "local datetime does not \
         exist in configured \
         timezone: {context}"
      ))
    }
  }
}

/// Parses an appointment time as typed
/// on the command line. Inputs without
/// an offset are read in the project
/// timezone.
#[tracing::instrument(skip(now), fields(input = input))]
pub fn parse_schedule_expr(
  input: &str,
  now: DateTime<Utc>
) -> anyhow::Result<DateTime<Utc>> {
  let token = input.trim();
  if token.is_empty() {
    return Err(anyhow!(
      "appointment time cannot be \
       empty"
    ));
  }

  if token.eq_ignore_ascii_case("now") {
    return Ok(now);
  }

  if let Ok(parsed) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(
      parsed.with_timezone(&Utc)
    );
  }

  let (date_part, time_part) =
    split_date_and_time(token);
  let date =
    parse_day(date_part, now)
      .with_context(|| {
        format!(
          "unrecognized appointment \
           date: {date_part}"
        )
      })?;

  let clock = if time_part.is_empty() {
    Some((DEFAULT_BOOKING_HOUR, 0))
  } else {
    parse_clock_time(time_part)
  };
  let time = clock
    .and_then(|(hour, minute)| {
      NaiveTime::from_hms_opt(
        hour, minute, 0
      )
    })
    .ok_or_else(|| {
    anyhow!(
      "unrecognized appointment time: \
       {time_part}"
    )
  })?;

  to_utc_from_project_local(
    date.and_time(time),
    token
  )
}

fn split_date_and_time(
  token: &str
) -> (&str, &str) {
  if token.len() > 10
    && token.as_bytes()[10] == b'T'
  {
    return (&token[..10], &token[11..]);
  }

  match token.split_once(char::is_whitespace)
  {
    | Some((date, rest)) => {
      let rest = rest
        .trim_start()
        .trim_start_matches('-')
        .trim();
      (date, rest)
    }
    | None => (token, "")
  }
}

fn parse_day(
  token: &str,
  now: DateTime<Utc>
) -> Option<NaiveDate> {
  let today = now
    .with_timezone(project_timezone())
    .date_naive();

  match token
    .to_ascii_lowercase()
    .as_str()
  {
    | "today" => return Some(today),
    | "tomorrow" => {
      return today.checked_add_signed(
        Duration::days(1)
      );
    }
    | _ => {}
  }

  NaiveDate::parse_from_str(
    token, "%Y-%m-%d"
  )
  .or_else(|_| {
    NaiveDate::parse_from_str(
      token, "%d/%m/%Y"
    )
  })
  .ok()
}

fn clock_regex() -> Option<&'static Regex>
{
  static CLOCK_RE: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  CLOCK_RE
    .get_or_init(|| {
      Regex::new(
        r"(?i)^(?P<hour>\d{1,2})(?::(?P<minute>\d{2}))?\s*(?P<ampm>[ap]m)?$",
      )
      .ok()
    })
    .as_ref()
}

fn parse_clock_time(
  token: &str
) -> Option<(u32, u32)> {
  let captures = clock_regex()?
    .captures(token.trim())?;

  let raw_hour = captures
    .name("hour")?
    .as_str()
    .parse::<u32>()
    .ok()?;
  let minute = match captures
    .name("minute")
  {
    | Some(m) => {
      m.as_str().parse::<u32>().ok()?
    }
    | None => 0
  };
  if minute > 59 {
    return None;
  }

  let Some(ampm) = captures.name("ampm")
  else {
    // bare "15" is ambiguous; ask for
    // "15:00" or "3pm"
    captures.name("minute")?;
    return (raw_hour <= 23)
      .then_some((raw_hour, minute));
  };

  if raw_hour == 0 || raw_hour > 12 {
    return None;
  }
  let is_pm = ampm
    .as_str()
    .eq_ignore_ascii_case("pm");
  let hour = match (raw_hour, is_pm) {
    | (12, false) => 0,
    | (12, true) => 12,
    | (h, false) => h,
    | (h, true) => h + 12
  };

  Some((hour, minute))
}
