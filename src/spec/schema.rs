use crate::spec::document::{ApiDocument, RemoteDocument, SpecDocument};
use crate::spec::version::{matches_requirement, SUPPORTED_FORMAT, DEFAULT_FORMAT_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

/// A validated application specification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    pub format_version: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
    pub shell: ShellSpec,
    pub remotes: Vec<RemoteSpec>,
    pub apis: Vec<ApiSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellSpec {
    pub name: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSpec {
    pub name: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exposed_components: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RouteSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSpec {
    pub name: String,
    pub port: u16,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RouteSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, alias = "component", skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
}

/// The three kinds of component a spec can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    Shell,
    Remote,
    Api,
}

impl ComponentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Shell => "shell",
            ComponentKind::Remote => "remote",
            ComponentKind::Api => "api",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A borrowed component of a [`Spec`], tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Component<'a> {
    Shell(&'a ShellSpec),
    Remote(&'a RemoteSpec),
    Api(&'a ApiSpec),
}

impl<'a> Component<'a> {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Shell(_) => ComponentKind::Shell,
            Component::Remote(_) => ComponentKind::Remote,
            Component::Api(_) => ComponentKind::Api,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Component::Shell(s) => &s.name,
            Component::Remote(r) => &r.name,
            Component::Api(a) => &a.name,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            Component::Shell(s) => s.port,
            Component::Remote(r) => r.port,
            Component::Api(a) => a.port,
        }
    }

    /// Directory of this component relative to the output root.
    pub fn output_dir(&self) -> PathBuf {
        component_dir(self.kind(), self.name())
    }

    /// JSON view of the component, as handed to generators.
    pub fn to_json(&self) -> serde_json::Value {
        let value = match self {
            Component::Shell(s) => serde_json::to_value(s),
            Component::Remote(r) => serde_json::to_value(r),
            Component::Api(a) => serde_json::to_value(a),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}

/// Directory of a component relative to the output root.
///
/// The shell lives at a fixed location so renaming it never moves files.
pub fn component_dir(kind: ComponentKind, name: &str) -> PathBuf {
    match kind {
        ComponentKind::Shell => PathBuf::from("shell"),
        ComponentKind::Remote => PathBuf::from("remotes").join(name),
        ComponentKind::Api => PathBuf::from("apis").join(name),
    }
}

impl Spec {
    /// Every component in generation order: shell, remotes, apis.
    pub fn components(&self) -> impl Iterator<Item = Component<'_>> {
        std::iter::once(Component::Shell(&self.shell))
            .chain(self.remotes.iter().map(Component::Remote))
            .chain(self.apis.iter().map(Component::Api))
    }

    pub fn remote(&self, name: &str) -> Option<&RemoteSpec> {
        self.remotes.iter().find(|r| r.name == name)
    }

    pub fn api(&self, name: &str) -> Option<&ApiSpec> {
        self.apis.iter().find(|a| a.name == name)
    }
}

impl SpecDocument {
    /// Check the document structurally and build the typed [`Spec`].
    ///
    /// Every issue is collected, in passes: required fields (top-level name,
    /// shell, remotes in array order, apis in array order), component names,
    /// duplicate names, port 0, duplicate ports, and finally the format
    /// version. A component that fails one pass is left out of the later ones.
    pub fn validate(self) -> Result<Spec, ValidationError> {
        let mut issues = Vec::new();

        let name = required(self.name, "", "name", &mut issues);
        let shell_doc = self.shell.unwrap_or_default();
        let theme = shell_doc.theme;
        let shell_name = required_name(shell_doc.name, "shell", &mut issues);
        let shell_port = required(shell_doc.port, "shell", "port", &mut issues);

        let mut remotes: Vec<Slot<RemoteSpec>> = self
            .remotes
            .into_iter()
            .enumerate()
            .map(|(i, doc)| {
                let path = format!("remotes[{i}]");
                let remote = required_remote(&path, doc, &mut issues);
                (path, remote)
            })
            .collect();
        let mut apis: Vec<Slot<ApiSpec>> = self
            .apis
            .into_iter()
            .enumerate()
            .map(|(i, doc)| {
                let path = format!("apis[{i}]");
                let api = required_api(&path, doc, &mut issues);
                (path, api)
            })
            .collect();

        retain_slots(&mut remotes, |path, r| check_component_name(path, &r.name, &mut issues));
        retain_slots(&mut apis, |path, a| check_component_name(path, &a.name, &mut issues));

        check_unique_names("remotes", slot_names(&remotes), &mut issues);
        check_unique_names("apis", slot_names(&apis), &mut issues);

        let shell_port = shell_port.filter(|&port| check_port("shell", port, &mut issues));
        retain_slots(&mut remotes, |path, r| check_port(path, r.port, &mut issues));
        retain_slots(&mut apis, |path, a| check_port(path, a.port, &mut issues));

        let shell = shell_name
            .zip(shell_port)
            .map(|(name, port)| ShellSpec { name, port, theme });
        let remotes: Vec<RemoteSpec> = remotes.into_iter().filter_map(|(_, r)| r).collect();
        let apis: Vec<ApiSpec> = apis.into_iter().filter_map(|(_, a)| a).collect();

        let ports = shell
            .iter()
            .map(|s| (ComponentKind::Shell, s.name.as_str(), s.port))
            .chain(remotes.iter().map(|r| (ComponentKind::Remote, r.name.as_str(), r.port)))
            .chain(apis.iter().map(|a| (ComponentKind::Api, a.name.as_str(), a.port)));
        check_unique_ports(ports, &mut issues);

        let format_version = self
            .format_version
            .unwrap_or_else(|| DEFAULT_FORMAT_VERSION.to_string());
        match matches_requirement(&format_version, Some(SUPPORTED_FORMAT)) {
            Ok(true) => {}
            Ok(false) => issues.push(ValidationIssue::UnsupportedFormatVersion {
                value: format_version.clone(),
                reason: format!("expected {SUPPORTED_FORMAT}"),
            }),
            Err(e) => issues.push(ValidationIssue::UnsupportedFormatVersion {
                value: format_version.clone(),
                reason: e.to_string(),
            }),
        }

        match (name, shell) {
            (Some(name), Some(shell)) if issues.is_empty() => Ok(Spec {
                format_version,
                name,
                description: self.description,
                metadata: self.metadata,
                shell,
                remotes,
                apis,
            }),
            _ => Err(ValidationError { issues }),
        }
    }
}

/// A collection entry and its document path; `None` once it failed a pass.
type Slot<T> = (String, Option<T>);

fn retain_slots<T>(slots: &mut [Slot<T>], mut keep: impl FnMut(&str, &T) -> bool) {
    for (path, slot) in slots.iter_mut() {
        if slot.as_ref().is_some_and(|item| !keep(path, item)) {
            *slot = None;
        }
    }
}

fn slot_names<T: Named>(slots: &[Slot<T>]) -> impl Iterator<Item = &str> {
    slots
        .iter()
        .filter_map(|(_, slot)| slot.as_ref())
        .map(Named::name)
}

trait Named {
    fn name(&self) -> &str;
}

impl Named for RemoteSpec {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for ApiSpec {
    fn name(&self) -> &str {
        &self.name
    }
}

fn required<T>(
    value: Option<T>,
    path: &str,
    field: &'static str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<T> {
    if value.is_none() {
        issues.push(ValidationIssue::MissingField {
            path: path.to_string(),
            field,
        });
    }
    value
}

/// Like [`required`], but a blank string counts as missing.
fn required_text(
    value: Option<String>,
    path: &str,
    field: &'static str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    match value {
        Some(text) if text.trim().is_empty() => {
            issues.push(ValidationIssue::MissingField {
                path: path.to_string(),
                field,
            });
            None
        }
        other => required(other, path, field, issues),
    }
}

fn required_name(
    value: Option<String>,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    required_text(value, path, "name", issues)
}

fn check_port(path: &str, port: u16, issues: &mut Vec<ValidationIssue>) -> bool {
    if port == 0 {
        issues.push(ValidationIssue::InvalidPort {
            path: path.to_string(),
        });
        return false;
    }
    true
}

fn check_component_name(path: &str, name: &str, issues: &mut Vec<ValidationIssue>) -> bool {
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        issues.push(ValidationIssue::InvalidName {
            path: path.to_string(),
            name: name.to_string(),
        });
    }
    valid
}

fn required_remote(
    path: &str,
    doc: RemoteDocument,
    issues: &mut Vec<ValidationIssue>,
) -> Option<RemoteSpec> {
    let name = required_name(doc.name, path, issues);
    let port = required(doc.port, path, "port", issues);
    Some(RemoteSpec {
        name: name?,
        port: port?,
        exposed_components: doc.exposed_components,
        dependencies: doc.dependencies,
        routes: doc.routes,
    })
}

fn required_api(
    path: &str,
    doc: ApiDocument,
    issues: &mut Vec<ValidationIssue>,
) -> Option<ApiSpec> {
    let name = required_name(doc.name, path, issues);
    let port = required(doc.port, path, "port", issues);
    let database = required_text(doc.database, path, "database", issues);
    Some(ApiSpec {
        name: name?,
        port: port?,
        database: database?,
        spec: doc.spec,
        routes: doc.routes,
    })
}

fn check_unique_names<'a>(
    collection: &'static str,
    names: impl Iterator<Item = &'a str>,
    issues: &mut Vec<ValidationIssue>,
) {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            issues.push(ValidationIssue::DuplicateName {
                collection,
                name: name.to_string(),
            });
        }
    }
}

fn check_unique_ports<'a>(
    ports: impl Iterator<Item = (ComponentKind, &'a str, u16)>,
    issues: &mut Vec<ValidationIssue>,
) {
    let mut seen: HashMap<u16, String> = HashMap::new();
    for (kind, name, port) in ports {
        let label = format!("{kind} '{name}'");
        if let Some(first) = seen.get(&port) {
            issues.push(ValidationIssue::DuplicatePort {
                port,
                first: first.clone(),
                second: label,
            });
        } else {
            seen.insert(port, label);
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// The first violation, in validation order.
    pub fn first_issue(&self) -> Option<&ValidationIssue> {
        self.issues.first()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingField {
        path: String,
        field: &'static str,
    },
    InvalidName {
        path: String,
        name: String,
    },
    InvalidPort {
        path: String,
    },
    DuplicateName {
        collection: &'static str,
        name: String,
    },
    DuplicatePort {
        port: u16,
        first: String,
        second: String,
    },
    UnsupportedFormatVersion {
        value: String,
        reason: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { path, field } if path.is_empty() => {
                write!(f, "missing required field '{field}'")
            }
            ValidationIssue::MissingField { path, field } => {
                write!(f, "{path}: missing required field '{field}'")
            }
            ValidationIssue::InvalidName { path, name } => write!(
                f,
                "{path}: invalid component name '{name}' (use letters, digits, '-' or '_')"
            ),
            ValidationIssue::InvalidPort { path } => {
                write!(f, "{path}: port must be between 1 and 65535")
            }
            ValidationIssue::DuplicateName { collection, name } => {
                write!(f, "{collection}: duplicate component name '{name}'")
            }
            ValidationIssue::DuplicatePort {
                port,
                first,
                second,
            } => write!(f, "port {port} is used by both {first} and {second}"),
            ValidationIssue::UnsupportedFormatVersion { value, reason } => {
                write!(f, "unsupported formatVersion '{value}': {reason}")
            }
        }
    }
}
