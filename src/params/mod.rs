//! Parameter tokens, the date input fields, and the binder that maps a
//! descriptor's declared parameters onto the current field values.
//!
//! Every token maps to exactly one field. The binder only emits tokens the
//! descriptor declared; unknown tokens are skipped and reported back so the
//! caller can surface them.

pub mod defaults;

use std::fmt;

use anyhow::Result;

/// One of the four date-range parameters a query may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterToken {
    StartDate,
    EndDate,
    StartMonth,
    EndMonth,
}

impl ParameterToken {
    pub const ALL: [Self; 4] = [
        Self::StartDate,
        Self::EndDate,
        Self::StartMonth,
        Self::EndMonth,
    ];

    /// Wire name of the token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartDate => "start_date",
            Self::EndDate => "end_date",
            Self::StartMonth => "start_month",
            Self::EndMonth => "end_month",
        }
    }

    /// Look up a token by its wire name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for ParameterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Date fields
// ---------------------------------------------------------------------------

/// The four date inputs, each holding an ISO-8601 date string.
///
/// Values are not validated; whatever the operator typed is sent as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateFields {
    pub start_date: String,
    pub end_date: String,
    pub start_month: String,
    pub end_month: String,
}

impl DateFields {
    /// Current content of the field bound to `token`.
    pub fn get(&self, token: ParameterToken) -> &str {
        match token {
            ParameterToken::StartDate => &self.start_date,
            ParameterToken::EndDate => &self.end_date,
            ParameterToken::StartMonth => &self.start_month,
            ParameterToken::EndMonth => &self.end_month,
        }
    }

    /// Overwrite the field bound to `token`.
    pub fn set(&mut self, token: ParameterToken, value: impl Into<String>) {
        let value = value.into();
        match token {
            ParameterToken::StartDate => self.start_date = value,
            ParameterToken::EndDate => self.end_date = value,
            ParameterToken::StartMonth => self.start_month = value,
            ParameterToken::EndMonth => self.end_month = value,
        }
    }

    /// Overwrite a field by wire name. Fails for unknown names.
    pub fn set_by_name(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let token = ParameterToken::from_name(name).ok_or_else(|| {
            anyhow::anyhow!(
                "unknown parameter '{name}' (expected one of: start_date, end_date, start_month, end_month)"
            )
        })?;
        self.set(token, value);
        Ok(())
    }

    /// Apply optional overrides on top of the current values.
    pub fn apply_overrides(&mut self, overrides: &DateOverrides) {
        for token in ParameterToken::ALL {
            if let Some(value) = overrides.get(token) {
                self.set(token, value);
            }
        }
    }
}

/// Optional per-field values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct DateOverrides {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub start_month: Option<String>,
    pub end_month: Option<String>,
}

impl DateOverrides {
    fn get(&self, token: ParameterToken) -> Option<&str> {
        match token {
            ParameterToken::StartDate => self.start_date.as_deref(),
            ParameterToken::EndDate => self.end_date.as_deref(),
            ParameterToken::StartMonth => self.start_month.as_deref(),
            ParameterToken::EndMonth => self.end_month.as_deref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Parameters bound for a single request.
///
/// Keys are unique; iteration follows the descriptor's declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundParams {
    entries: Vec<(ParameterToken, String)>,
    ignored: Vec<String>,
}

impl BoundParams {
    /// Value bound for `token`, if the descriptor declared it.
    pub fn get(&self, token: ParameterToken) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, v)| v.as_str())
    }

    /// `(wire name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declared names that did not match any known token.
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    /// Bound values as a JSON object, for logging.
    pub fn to_json(&self) -> serde_json::Value {
        self.iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect::<serde_json::Map<_, _>>()
            .into()
    }

    fn insert(&mut self, token: ParameterToken, value: &str) {
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((token, value.to_string())),
        }
    }
}

/// Bind a descriptor's declared parameter names to the current field values.
///
/// Only declared, recognized tokens are emitted. A token declared twice is
/// sent once. Unrecognized names are collected in [`BoundParams::ignored`].
pub fn bind(declared: &[String], fields: &DateFields) -> BoundParams {
    let mut bound = BoundParams::default();
    for name in declared {
        match ParameterToken::from_name(name) {
            Some(token) => bound.insert(token, fields.get(token)),
            None => {
                if !bound.ignored.contains(name) {
                    bound.ignored.push(name.clone());
                }
            }
        }
    }
    bound
}
