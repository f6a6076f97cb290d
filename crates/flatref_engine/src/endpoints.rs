use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const ARCH_PLACEHOLDER: &str = "{arch}";
pub const APP_ID_PLACEHOLDER: &str = "{app_id}";

pub const DEFAULT_CATALOG_TEMPLATE: &str =
    "https://dl.flathub.org/repo/appstream/{arch}/appstream.xml.gz";
pub const DEFAULT_PRIMARY_TEMPLATE: &str =
    "https://dl.flathub.org/repo/appstream/{app_id}.flatpakref";
pub const DEFAULT_MIRROR_TEMPLATE: &str = "https://flathub.org/repo/appstream/{app_id}.flatpakref";

pub fn default_user_agent() -> String {
    format!("flatref/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("{field} template `{template}` lacks the {placeholder} placeholder")]
    MissingPlaceholder {
        field: &'static str,
        template: String,
        placeholder: &'static str,
    },
    #[error("{field} template `{template}` does not expand to a valid url: {reason}")]
    InvalidUrl {
        field: &'static str,
        template: String,
        reason: String,
    },
}

/// Where the catalog and the descriptor files live. Every field may be
/// omitted from a configuration file and falls back to the Flathub default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Endpoints {
    pub catalog: String,
    pub primary: String,
    pub mirror: String,
    pub user_agent: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            catalog: DEFAULT_CATALOG_TEMPLATE.to_string(),
            primary: DEFAULT_PRIMARY_TEMPLATE.to_string(),
            mirror: DEFAULT_MIRROR_TEMPLATE.to_string(),
            user_agent: default_user_agent(),
        }
    }
}

impl Endpoints {
    /// The catalog may be a fixed location, so its placeholder is optional.
    pub fn validate(&self) -> Result<(), EndpointError> {
        check_expands("catalog", &self.catalog, ARCH_PLACEHOLDER, "x86_64")?;
        require_placeholder("primary", &self.primary, APP_ID_PLACEHOLDER)?;
        check_expands("primary", &self.primary, APP_ID_PLACEHOLDER, "org.example.App")?;
        require_placeholder("mirror", &self.mirror, APP_ID_PLACEHOLDER)?;
        check_expands("mirror", &self.mirror, APP_ID_PLACEHOLDER, "org.example.App")?;
        Ok(())
    }

    pub fn catalog_url(&self, arch: &str) -> String {
        self.catalog.replace(ARCH_PLACEHOLDER, arch)
    }

    pub fn primary_url(&self, app_id: &str) -> String {
        self.primary.replace(APP_ID_PLACEHOLDER, app_id)
    }

    pub fn mirror_url(&self, app_id: &str) -> String {
        self.mirror.replace(APP_ID_PLACEHOLDER, app_id)
    }
}

fn require_placeholder(
    field: &'static str,
    template: &str,
    placeholder: &'static str,
) -> Result<(), EndpointError> {
    if template.contains(placeholder) {
        Ok(())
    } else {
        Err(EndpointError::MissingPlaceholder {
            field,
            template: template.to_string(),
            placeholder,
        })
    }
}

fn check_expands(
    field: &'static str,
    template: &str,
    placeholder: &str,
    sample: &str,
) -> Result<(), EndpointError> {
    Url::parse(&template.replace(placeholder, sample))
        .map(|_| ())
        .map_err(|err| EndpointError::InvalidUrl {
            field,
            template: template.to_string(),
            reason: err.to_string(),
        })
}
