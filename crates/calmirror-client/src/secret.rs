//! Secret references in `config.toml`.
//!
//! A credential value may point outside the file instead of holding the
//! secret itself:
//!
//! - `pass::path/in/store`: first line of `pass show path/in/store`
//! - `env::VAR_NAME`: the environment variable `VAR_NAME`
//! - anything else is the secret, verbatim

use std::process::Command;

/// A parsed credential value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretRef<'a> {
    Pass(&'a str),
    Env(&'a str),
    Plain(&'a str),
}

impl<'a> SecretRef<'a> {
    pub fn parse(value: &'a str) -> Self {
        if let Some(path) = value.strip_prefix("pass::") {
            Self::Pass(path)
        } else if let Some(var) = value.strip_prefix("env::") {
            Self::Env(var)
        } else {
            Self::Plain(value)
        }
    }

    /// Returns true if the value lives outside the config file.
    pub fn is_reference(&self) -> bool {
        !matches!(self, Self::Plain(_))
    }

    pub fn resolve(&self) -> Result<String, String> {
        match self {
            Self::Pass(path) => pass_show(path),
            Self::Env(var) => {
                std::env::var(var).map_err(|_| format!("environment variable `{}` is not set", var))
            }
            Self::Plain(value) => Ok(value.to_string()),
        }
    }
}

/// Resolves a config value that may be a secret reference.
pub fn resolve(value: &str) -> Result<String, String> {
    SecretRef::parse(value).resolve()
}

fn pass_show(path: &str) -> Result<String, String> {
    let output = Command::new("pass")
        .args(["show", path])
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        return Err(format!(
            "`pass show {}` failed ({}): {}",
            path,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| format!("`pass show {}` printed nothing", path))
}
