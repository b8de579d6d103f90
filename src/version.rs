use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    #[error("Invalid version constraint '{0}'")]
    InvalidConstraint(String),

    #[error("Invalid requirement '{requirement}': {reason}")]
    InvalidRequirement { requirement: String, reason: String },
}

/// Release version such as `4.53.0` or `4.45`.
///
/// Only the numeric release segment takes part in ordering; suffixes like
/// `.dev0`, `rc1` or `+cpu` are kept for display and otherwise ignored.
/// Missing trailing components compare as zero.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    release: Vec<u64>,
    raw: String,
}

impl Version {
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    fn component(&self, i: usize) -> u64 {
        self.release.get(i).copied().unwrap_or(0)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let raw = raw.strip_prefix('v').unwrap_or(raw);
        let public = raw.split('+').next().unwrap_or_default();
        let mut release = Vec::new();
        for part in public.split('.') {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                // first non-numeric segment ends the release part (e.g. "dev0")
                break;
            }
            let value = digits
                .parse::<u64>()
                .map_err(|_| VersionError::InvalidVersion(s.to_string()))?;
            release.push(value);
            if digits.len() != part.len() {
                // "0rc1": keep the number, drop the pre-release tail
                break;
            }
        }
        if release.is_empty() {
            return Err(VersionError::InvalidVersion(s.to_string()));
        }
        Ok(Version {
            release,
            raw: raw.to_string(),
        })
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.raw
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Eq => "==",
            Op::Ne => "!=",
        }
    }

    pub fn negate(self) -> Op {
        match self {
            Op::Lt => Op::Ge,
            Op::Le => Op::Gt,
            Op::Gt => Op::Le,
            Op::Ge => Op::Lt,
            Op::Eq => Op::Ne,
            Op::Ne => Op::Eq,
        }
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Op::Lt => ordering == Ordering::Less,
            Op::Le => ordering != Ordering::Greater,
            Op::Gt => ordering == Ordering::Greater,
            Op::Ge => ordering != Ordering::Less,
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
        }
    }
}

impl FromStr for Op {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(Op::Lt),
            "<=" => Ok(Op::Le),
            ">" => Ok(Op::Gt),
            ">=" => Ok(Op::Ge),
            "==" => Ok(Op::Eq),
            "!=" => Ok(Op::Ne),
            other => Err(VersionError::InvalidConstraint(other.to_string())),
        }
    }
}

/// `<op><version>`, e.g. `>=4.45.0`. Serialized in that compact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionConstraint {
    pub op: Op,
    pub version: Version,
}

impl VersionConstraint {
    pub fn new(op: Op, version: Version) -> Self {
        VersionConstraint { op, version }
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.op.holds(version.cmp(&self.version))
    }

    pub fn negate(&self) -> Self {
        VersionConstraint {
            op: self.op.negate(),
            version: self.version.clone(),
        }
    }
}

impl FromStr for VersionConstraint {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !matches!(c, '<' | '>' | '=' | '!' | '~'))
            .ok_or_else(|| VersionError::InvalidConstraint(s.to_string()))?;
        let (op, version) = s.split_at(split);
        if op.is_empty() {
            return Err(VersionError::InvalidConstraint(s.to_string()));
        }
        let op = op
            .parse::<Op>()
            .map_err(|_| VersionError::InvalidConstraint(s.to_string()))?;
        Ok(VersionConstraint {
            op,
            version: version.parse()?,
        })
    }
}

impl TryFrom<String> for VersionConstraint {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionConstraint> for String {
    fn from(value: VersionConstraint) -> Self {
        value.to_string()
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.version)
    }
}

/// A dependency requirement as found in package metadata, e.g.
/// `transformers>=4.45,<4.57` or `transformers <4.57, >=4.45 ; python_version >= "3.9"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub constraints: Vec<VersionConstraint>,
    raw: String,
}

impl Requirement {
    /// Lower and upper bound of the requirement, ordered by version rather
    /// than by declaration order.
    pub fn bounds(&self) -> Result<(Version, Version), VersionError> {
        let bounds: Vec<&Version> = self
            .constraints
            .iter()
            .filter(|c| c.op != Op::Ne)
            .map(|c| &c.version)
            .collect();
        match bounds.as_slice() {
            [a, b] => {
                let (min, max) = if a <= b { (a, b) } else { (b, a) };
                Ok(((*min).clone(), (*max).clone()))
            }
            _ => Err(VersionError::InvalidRequirement {
                requirement: self.raw.clone(),
                reason: format!("expected two bounding versions, found {}", bounds.len()),
            }),
        }
    }
}

impl FromStr for Requirement {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| VersionError::InvalidRequirement {
            requirement: s.to_string(),
            reason: reason.to_string(),
        };
        let body = s.split(';').next().unwrap_or_default().trim();
        let name_end = body
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .unwrap_or(body.len());
        let name = &body[..name_end];
        if name.is_empty() {
            return Err(invalid("missing package name"));
        }
        let mut rest = body[name_end..].trim_start();
        if let Some(after) = rest.strip_prefix('[') {
            let close = after.find(']').ok_or_else(|| invalid("unterminated extras"))?;
            rest = after[close + 1..].trim_start();
        }
        let rest = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .unwrap_or(rest);
        let constraints = rest
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| c.replace(' ', "").parse::<VersionConstraint>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Requirement {
            name: name.to_string(),
            constraints,
            raw: s.to_string(),
        })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
