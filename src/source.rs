// src/source.rs

//! Private registry module source addresses.
//!
//! A source has the shape `<host>/<namespace>/<name>/<provider>`, optionally
//! followed by `//<subdir>`. Without a host the public registry is implied,
//! which remote test runs do not support.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::client::RegistryModuleId;
use crate::diagnostics::Diagnostic;

/// Hostname of the public module registry.
pub const PUBLIC_REGISTRY_HOST: &str = "registry.terraform.io";

/// Attribute name diagnostics about the source are attributed to.
pub const SOURCE_ATTRIBUTE: &str = "source";

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Za-z](?:[0-9A-Za-z_-]{0,62}[0-9A-Za-z])?$").expect("static regex")
});

static PROVIDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-z]{1,64}$").expect("static regex"));

static HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Za-z.-]+(?::[0-9]{1,5})?$").expect("static regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSource {
    pub host: String,
    pub namespace: String,
    pub name: String,
    pub provider: String,
    pub subdir: Option<String>,
}

impl ModuleSource {
    /// Parse a registry module source string.
    pub fn parse(source: &str) -> Result<Self, SourceError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(SourceError::new(
                "Invalid module source address",
                "A module source address is required.",
            ));
        }

        let (package, subdir) = match source.split_once("//") {
            Some((_, rest)) if source.contains("://") => {
                return Err(SourceError::new(
                    "Invalid module source address",
                    format!(
                        "The source \"{source}\" looks like a URL, but remote tests require a registry module address; found \"{rest}\" after the scheme."
                    ),
                ));
            }
            Some((package, subdir)) if !subdir.is_empty() => (package, Some(subdir.to_string())),
            Some((package, _)) => (package, None),
            None => (source, None),
        };

        let parts: Vec<&str> = package.split('/').collect();
        let (host, namespace, name, provider) = match parts.as_slice() {
            [namespace, name, provider] => (PUBLIC_REGISTRY_HOST, *namespace, *name, *provider),
            [host, namespace, name, provider] => (*host, *namespace, *name, *provider),
            _ => {
                return Err(SourceError::new(
                    "Invalid module source address",
                    format!(
                        "A registry module address must have the form \"<host>/<namespace>/<name>/<provider>\", but \"{package}\" has {} segment(s).",
                        parts.len()
                    ),
                ));
            }
        };

        if !HOST.is_match(host) {
            return Err(SourceError::new(
                "Invalid registry hostname",
                format!("\"{host}\" is not a valid hostname."),
            ));
        }
        for (what, value) in [("namespace", namespace), ("module name", name)] {
            if !LABEL.is_match(value) {
                return Err(SourceError::new(
                    format!("Invalid module {what}"),
                    format!(
                        "The {what} \"{value}\" must contain only letters, digits, dashes and underscores, and must start and end with a letter or digit."
                    ),
                ));
            }
        }
        if !PROVIDER.is_match(provider) {
            return Err(SourceError::new(
                "Invalid module provider",
                format!(
                    "The target system \"{provider}\" must contain only lowercase letters and digits."
                ),
            ));
        }

        Ok(Self {
            host: host.to_lowercase(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            provider: provider.to_string(),
            subdir,
        })
    }

    pub fn is_public_registry(&self) -> bool {
        self.host == PUBLIC_REGISTRY_HOST
    }

    /// Identifier of the module within the private registry of its namespace.
    pub fn registry_module_id(&self) -> RegistryModuleId {
        RegistryModuleId {
            organization: self.namespace.clone(),
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            provider: self.provider.clone(),
        }
    }

    /// Parse and reject anything remote test runs cannot target.
    ///
    /// Failures are returned as diagnostics attributed to `source`.
    pub fn parse_private(source: &str) -> Result<Self, Diagnostic> {
        let addr = Self::parse(source).map_err(|err| {
            Diagnostic::attribute(err.summary, err.detail, SOURCE_ATTRIBUTE)
        })?;

        if addr.is_public_registry() {
            return Err(Diagnostic::attribute(
                "Module source points to the public registry",
                "Terraform Cloud can only execute tests for modules held within private registries.",
                SOURCE_ATTRIBUTE,
            ));
        }

        Ok(addr)
    }
}

impl fmt::Display for ModuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.host, self.namespace, self.name, self.provider
        )?;
        if let Some(subdir) = &self.subdir {
            write!(f, "//{subdir}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    pub summary: String,
    pub detail: String,
}

impl SourceError {
    fn new(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.summary, self.detail)
    }
}

impl std::error::Error for SourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_private_registry_source() {
        let addr = ModuleSource::parse("app.terraform.io/acme/vpc/aws").unwrap();
        assert_eq!(addr.host, "app.terraform.io");
        assert_eq!(addr.namespace, "acme");
        assert_eq!(addr.name, "vpc");
        assert_eq!(addr.provider, "aws");
        assert!(!addr.is_public_registry());
        assert_eq!(addr.to_string(), "app.terraform.io/acme/vpc/aws");
    }

    #[test]
    fn three_part_source_implies_public_registry() {
        let addr = ModuleSource::parse("acme/vpc/aws").unwrap();
        assert!(addr.is_public_registry());

        let diag = ModuleSource::parse_private("acme/vpc/aws").unwrap_err();
        assert_eq!(diag.summary, "Module source points to the public registry");
        assert_eq!(diag.attribute.as_deref(), Some("source"));
    }

    #[test]
    fn keeps_subdirectory() {
        let addr = ModuleSource::parse("tfe.example.com/acme/vpc/aws//modules/subnet").unwrap();
        assert_eq!(addr.subdir.as_deref(), Some("modules/subnet"));
        assert_eq!(addr.registry_module_id().name, "vpc");
    }

    #[test]
    fn rejects_malformed_sources() {
        assert!(ModuleSource::parse("").is_err());
        assert!(ModuleSource::parse("acme/vpc").is_err());
        assert!(ModuleSource::parse("https://example.com/acme/vpc/aws").is_err());
        assert!(ModuleSource::parse("app.terraform.io/acme/-vpc/aws").is_err());
        assert!(ModuleSource::parse("app.terraform.io/acme/vpc/AWS").is_err());
    }

    #[test]
    fn parse_errors_are_attributed_to_source() {
        let diag = ModuleSource::parse_private("a/b").unwrap_err();
        assert_eq!(diag.attribute.as_deref(), Some(SOURCE_ATTRIBUTE));
        assert!(diag.detail.contains("2 segment(s)"));
    }
}
