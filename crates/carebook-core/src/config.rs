use std::collections::BTreeMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace
};

const RC_ENV_VAR: &str = "CAREBOOKRC";
const RC_FILE_NAME: &str =
  ".carebookrc";
const DEFAULT_DATA_DIR: &str =
  "~/.carebook";

pub const KEY_DATA_LOCATION: &str =
  "data.location";
pub const KEY_COLOR: &str = "color";
pub const KEY_NOTIFY: &str = "notify";
pub const KEY_SESSION_USER: &str =
  "session.user";
pub const KEY_SESSION_PATIENT: &str =
  "session.patient";

/// Flat `key = value` settings read
/// from a carebookrc file.
#[derive(Debug, Clone)]
pub struct Config {
  map:              BTreeMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

/// One meaningful line of a
/// carebookrc.
#[derive(Debug, PartialEq, Eq)]
enum RcLine<'a> {
  Include(&'a str),
  Setting(&'a str, &'a str)
}

impl Default for Config {
  fn default() -> Self {
    let map = [
      (KEY_DATA_LOCATION, DEFAULT_DATA_DIR),
      (KEY_COLOR, "on"),
      (KEY_NOTIFY, "on")
    ]
    .into_iter()
    .map(|(k, v)| {
      (k.to_string(), v.to_string())
    })
    .collect();

    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    match rc_path(rc_override)? {
      | Some(path) => {
        info!(carebookrc = %path.display(), "loading carebookrc");
        cfg.read_file(&path)?;
      }
      | None => {
        debug!(
          "no carebookrc, using defaults"
        );
      }
    }

    Ok(cfg)
  }

  /// `--rc KEY=VALUE` pairs, applied
  /// after the file.
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (key, value) in overrides {
      debug!(key = %key, value = %value, "rc override");
      self.map.insert(key, value);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn notify_enabled(&self) -> bool {
    self
      .map
      .get(KEY_NOTIFY)
      .is_none_or(|v| is_truthy(v))
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  fn read_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    self
      .loaded_files
      .push(path.clone());

    for (idx, raw) in
      text.lines().enumerate()
    {
      let parsed = parse_line(raw)
        .with_context(|| {
          format!(
            "{}:{}",
            path.display(),
            idx + 1
          )
        })?;

      match parsed {
        | None => {}
        | Some(RcLine::Include(
          target
        )) => {
          // Relative includes resolve
          // next to the including file.
          let target =
            expand_tilde(Path::new(target));
          let target = match path.parent()
          {
            | Some(dir)
              if target.is_relative() =>
            {
              dir.join(target)
            }
            | _ => target
          };
          self.read_file(&target)?;
        }
        | Some(RcLine::Setting(
          key,
          value
        )) => {
          trace!(key, value, "config key");
          self.map.insert(
            key.to_string(),
            value.to_string()
          );
        }
      }
    }

    Ok(())
  }
}

fn parse_line(
  raw: &str
) -> anyhow::Result<Option<RcLine<'_>>> {
  let line = raw
    .split_once('#')
    .map_or(raw, |(before, _)| before)
    .trim();
  if line.is_empty() {
    return Ok(None);
  }

  if let Some(target) =
    line.strip_prefix("include ")
  {
    let target = target.trim();
    if target.is_empty() {
      return Err(anyhow!(
        "include needs a path"
      ));
    }
    return Ok(Some(RcLine::Include(
      target
    )));
  }

  let (key, value) = line
    .split_once('=')
    .ok_or_else(|| {
      anyhow!(
        "expected `key = value`, got \
         `{line}`"
      )
    })?;
  let key = key.trim();
  if key.is_empty() {
    return Err(anyhow!(
      "missing key before `=`"
    ));
  }
  Ok(Some(RcLine::Setting(
    key,
    value.trim()
  )))
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = match override_dir {
    | Some(path) => path.to_path_buf(),
    | None => {
      let location = cfg
        .get(KEY_DATA_LOCATION)
        .unwrap_or_else(|| {
          DEFAULT_DATA_DIR.to_string()
        });
      expand_tilde(Path::new(&location))
    }
  };

  fs::create_dir_all(&dir)
    .with_context(|| {
      format!(
        "failed to create {}",
        dir.display()
      )
    })?;
  Ok(dir)
}

fn rc_path(
  explicit: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = explicit {
    return Ok(Some(path.to_path_buf()));
  }

  match std::env::var(RC_ENV_VAR) {
    | Ok(value) if value == "/dev/null" => {
      return Ok(None);
    }
    | Ok(value) => {
      return Ok(Some(PathBuf::from(
        value
      )));
    }
    | Err(_) => {}
  }

  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!("no home directory")
    })?;
  let candidate =
    home.join(RC_FILE_NAME);
  Ok(candidate.is_file().then_some(
    candidate
  ))
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn is_truthy(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}
