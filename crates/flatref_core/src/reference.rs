use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Leading segment of every application reference.
pub const REF_KIND: &str = "app";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("reference must start with `{REF_KIND}/`: {0}")]
    MissingKind(String),
    #[error("reference must have exactly four `/`-separated segments: {0}")]
    SegmentCount(String),
    #[error("invalid app id `{0}`")]
    InvalidAppId(String),
    #[error("invalid {field} `{value}`")]
    InvalidToken { field: &'static str, value: String },
}

/// An application variant, canonically written `app/<app_id>/<arch>/<branch>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    app_id: String,
    arch: String,
    branch: String,
}

impl Reference {
    pub fn new(
        app_id: impl Into<String>,
        arch: impl Into<String>,
        branch: impl Into<String>,
    ) -> Result<Self, ReferenceError> {
        let app_id = app_id.into();
        let arch = arch.into();
        let branch = branch.into();

        if !is_valid_app_id(&app_id) {
            return Err(ReferenceError::InvalidAppId(app_id));
        }
        if !is_valid_token(&arch) {
            return Err(ReferenceError::InvalidToken {
                field: "architecture",
                value: arch,
            });
        }
        if !is_valid_token(&branch) {
            return Err(ReferenceError::InvalidToken {
                field: "branch",
                value: branch,
            });
        }
        Ok(Self {
            app_id,
            arch,
            branch,
        })
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{REF_KIND}/{}/{}/{}", self.app_id, self.arch, self.branch)
    }
}

impl FromStr for Reference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let rest = trimmed
            .strip_prefix(REF_KIND)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| ReferenceError::MissingKind(trimmed.to_string()))?;

        let parts: Vec<&str> = rest.split('/').collect();
        let [app_id, arch, branch] = parts.as_slice() else {
            return Err(ReferenceError::SegmentCount(trimmed.to_string()));
        };
        Reference::new(*app_id, *arch, *branch)
    }
}

/// Reverse-DNS style id: at least two non-empty dot-separated labels, no
/// slashes or whitespace.
pub fn is_valid_app_id(app_id: &str) -> bool {
    if !is_valid_token(app_id) || !app_id.contains('.') {
        return false;
    }
    app_id.split('.').all(|label| !label.is_empty())
}

fn is_valid_token(token: &str) -> bool {
    !token.is_empty() && !token.chars().any(|c| c == '/' || c.is_whitespace())
}
