//! Where each tracked field lives inside a generated component.
//!
//! A [`Binding`] names the wiring file, the managed region that holds the
//! field and the structural path used when that region is missing. Region
//! bodies and fallback expressions are rendered from the same JSON value.

use crate::changes::{ShellField, TrackedField};
use crate::region::{render_region, CommentStyle};
use crate::spec::{ApiSpec, Component, RemoteSpec, ShellSpec, Spec};
use crate::ts::StructuralTarget;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Region id of the shell's remote registry.
pub const REGISTRY_REGION: &str = "remotes";

/// Directory of a remote's exposed unit modules.
pub const UNITS_DIR: &str = "src/components";

/// Host used in registry entries when none is configured.
pub const DEFAULT_REMOTE_HOST: &str = "http://localhost";

const INDENT: &str = "  ";

/// How a value is written inside its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    /// `key: value,` inside an object literal nested `depth` levels deep
    Property { key: &'static str, depth: usize },
    /// `export const name = value;`
    Export { name: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// Wiring file relative to the component directory
    pub file: &'static str,
    pub region: &'static str,
    pub shape: BodyShape,
    /// `(callee, property path)` for the structural fallback
    pub fallback: Option<(&'static str, &'static str)>,
}

impl Binding {
    pub fn target(&self) -> Option<StructuralTarget> {
        self.fallback
            .map(|(callee, path)| StructuralTarget::new(callee, path))
    }

    fn indent(&self) -> String {
        match self.shape {
            BodyShape::Property { depth, .. } => INDENT.repeat(depth),
            BodyShape::Export { .. } => String::new(),
        }
    }

    /// The value as a JavaScript expression, starting at column zero.
    pub fn expression(&self, value: &Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
    }

    /// Region body holding `value`.
    pub fn body(&self, value: &Value) -> String {
        let indent = self.indent();
        let expression = indent_continuation(&self.expression(value), &indent);
        match self.shape {
            BodyShape::Property { key, .. } => format!("{indent}{key}: {expression},\n"),
            BodyShape::Export { name } => format!("export const {name} = {expression};\n"),
        }
    }

    /// Complete region, markers included, as emitted by templates.
    pub fn block(&self, value: &Value) -> String {
        let style = CommentStyle::for_path(Path::new(self.file));
        render_region(style, self.region, &self.indent(), &self.body(value))
    }
}

fn indent_continuation(text: &str, indent: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.is_empty() {
                line.to_string()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

const MODULE_FEDERATION: &str = "module-federation.config.js";
const RSPACK: &str = "rspack.config.js";
const SERVICE_CONFIG: &str = "src/config.ts";
const ROUTES: &str = "src/routes.ts";

const MF_CALLEE: &str = "createModuleFederationConfig";
const RSPACK_CALLEE: &str = "defineConfig";
const SERVICE_CALLEE: &str = "defineServiceConfig";

const DEV_SERVER_PORT: Binding = Binding {
    file: RSPACK,
    region: "port",
    shape: BodyShape::Property {
        key: "port",
        depth: 2,
    },
    fallback: Some((RSPACK_CALLEE, "devServer.port")),
};

const ROUTES_EXPORT: Binding = Binding {
    file: ROUTES,
    region: "routes",
    shape: BodyShape::Export { name: "routes" },
    fallback: None,
};

/// Binding of the shell's remote registry.
pub const REGISTRY: Binding = Binding {
    file: MODULE_FEDERATION,
    region: REGISTRY_REGION,
    shape: BodyShape::Property {
        key: "remotes",
        depth: 1,
    },
    fallback: Some((MF_CALLEE, "remotes")),
};

pub fn shell_binding(field: ShellField) -> Binding {
    match field {
        ShellField::Name => Binding {
            file: MODULE_FEDERATION,
            region: "name",
            shape: BodyShape::Property {
                key: "name",
                depth: 1,
            },
            fallback: Some((MF_CALLEE, "name")),
        },
        ShellField::Port => DEV_SERVER_PORT,
        ShellField::Theme => Binding {
            file: "src/theme.ts",
            region: "theme",
            shape: BodyShape::Export { name: "theme" },
            fallback: None,
        },
    }
}

pub fn remote_binding(field: TrackedField) -> Option<Binding> {
    let binding = match field {
        TrackedField::Port => DEV_SERVER_PORT,
        TrackedField::ExposedUnits => Binding {
            file: MODULE_FEDERATION,
            region: "exposes",
            shape: BodyShape::Property {
                key: "exposes",
                depth: 1,
            },
            fallback: Some((MF_CALLEE, "exposes")),
        },
        TrackedField::Dependencies => Binding {
            file: MODULE_FEDERATION,
            region: "shared",
            shape: BodyShape::Property {
                key: "shared",
                depth: 1,
            },
            fallback: Some((MF_CALLEE, "shared")),
        },
        TrackedField::Routes => ROUTES_EXPORT,
        TrackedField::Database | TrackedField::SpecRef => return None,
    };
    Some(binding)
}

pub fn api_binding(field: TrackedField) -> Option<Binding> {
    let property = |region, key| Binding {
        file: SERVICE_CONFIG,
        region,
        shape: BodyShape::Property { key, depth: 1 },
        fallback: Some((SERVICE_CALLEE, key)),
    };
    match field {
        TrackedField::Port => Some(property("port", "port")),
        TrackedField::Database => Some(property("database", "database")),
        TrackedField::SpecRef => Some(property("spec-ref", "specRef")),
        TrackedField::Routes => Some(ROUTES_EXPORT),
        TrackedField::Dependencies | TrackedField::ExposedUnits => None,
    }
}

pub fn shell_value(shell: &ShellSpec, field: ShellField) -> Value {
    match field {
        ShellField::Name => json!(shell.name),
        ShellField::Port => json!(shell.port),
        ShellField::Theme => json!(shell.theme),
    }
}

/// Registry entry for one remote: `<name>@<host>:<port>/remoteEntry.js`.
pub fn registry_entry(remote: &RemoteSpec, host: &str) -> String {
    format!(
        "{}@{}:{}/remoteEntry.js",
        remote.name,
        host.trim_end_matches('/'),
        remote.port
    )
}

pub fn registry_value(remotes: &[RemoteSpec], host: &str) -> Value {
    let entries: Map<String, Value> = remotes
        .iter()
        .map(|r| (r.name.clone(), Value::String(registry_entry(r, host))))
        .collect();
    Value::Object(entries)
}

/// Module path of an exposed unit inside its remote.
pub fn exposed_unit_path(unit: &str) -> String {
    format!("./{UNITS_DIR}/{unit}.tsx")
}

pub fn remote_value(remote: &RemoteSpec, field: TrackedField) -> Option<Value> {
    match field {
        TrackedField::Port => Some(json!(remote.port)),
        TrackedField::ExposedUnits => {
            let exposes: Map<String, Value> = remote
                .exposed_components
                .iter()
                .map(|unit| (format!("./{unit}"), Value::String(exposed_unit_path(unit))))
                .collect();
            Some(Value::Object(exposes))
        }
        TrackedField::Dependencies => Some(json!(remote.dependencies)),
        TrackedField::Routes => Some(json!(remote.routes)),
        TrackedField::Database | TrackedField::SpecRef => None,
    }
}

pub fn api_value(api: &ApiSpec, field: TrackedField) -> Option<Value> {
    match field {
        TrackedField::Port => Some(json!(api.port)),
        TrackedField::Database => Some(json!(api.database)),
        TrackedField::SpecRef => Some(json!(api.spec)),
        TrackedField::Routes => Some(json!(api.routes)),
        TrackedField::Dependencies | TrackedField::ExposedUnits => None,
    }
}

/// One field to write into one wiring file.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPatch {
    pub binding: Binding,
    pub value: Value,
}

pub fn shell_patches(shell: &ShellSpec, fields: &BTreeSet<ShellField>) -> Vec<FieldPatch> {
    fields
        .iter()
        .map(|&field| FieldPatch {
            binding: shell_binding(field),
            value: shell_value(shell, field),
        })
        .collect()
}

pub fn remote_patches(remote: &RemoteSpec, fields: &BTreeSet<TrackedField>) -> Vec<FieldPatch> {
    fields
        .iter()
        .filter_map(|&field| {
            Some(FieldPatch {
                binding: remote_binding(field)?,
                value: remote_value(remote, field)?,
            })
        })
        .collect()
}

pub fn api_patches(api: &ApiSpec, fields: &BTreeSet<TrackedField>) -> Vec<FieldPatch> {
    fields
        .iter()
        .filter_map(|&field| {
            Some(FieldPatch {
                binding: api_binding(field)?,
                value: api_value(api, field)?,
            })
        })
        .collect()
}

const REMOTE_FIELDS: [TrackedField; 4] = [
    TrackedField::Port,
    TrackedField::ExposedUnits,
    TrackedField::Dependencies,
    TrackedField::Routes,
];

const API_FIELDS: [TrackedField; 4] = [
    TrackedField::Port,
    TrackedField::Database,
    TrackedField::SpecRef,
    TrackedField::Routes,
];

/// Every managed region of `component`, rendered with markers and keyed by
/// region id, for templates to embed.
pub fn component_regions(
    component: Component<'_>,
    spec: &Spec,
    remote_host: &str,
) -> BTreeMap<String, String> {
    let patches = match component {
        Component::Shell(shell) => {
            let mut patches = shell_patches(
                shell,
                &BTreeSet::from([ShellField::Name, ShellField::Port, ShellField::Theme]),
            );
            patches.push(FieldPatch {
                binding: REGISTRY,
                value: registry_value(&spec.remotes, remote_host),
            });
            patches
        }
        Component::Remote(remote) => remote_patches(remote, &BTreeSet::from(REMOTE_FIELDS)),
        Component::Api(api) => api_patches(api, &BTreeSet::from(API_FIELDS)),
    };

    patches
        .into_iter()
        .map(|p| (p.binding.region.to_string(), p.binding.block(&p.value)))
        .collect()
}
