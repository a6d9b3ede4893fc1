//! Built-in generator rendering embedded minijinja templates.
//!
//! Templates embed pre-rendered managed regions (`regions.<id>`) so freshly
//! generated files are byte-identical to what a later patch would produce.

use crate::generator::{ComponentGenerator, FileTree, GenerationContext, GenerationError};
use crate::spec::{Component, ComponentKind};
use crate::wiring::{component_regions, UNITS_DIR};
use minijinja::{AutoEscape, Environment};
use serde_json::json;
use std::path::PathBuf;

const SHELL: &[(&str, &str)] = &[
    ("package.json", SHELL_PACKAGE),
    ("rspack.config.js", RSPACK_CONFIG),
    ("module-federation.config.js", SHELL_FEDERATION),
    ("src/index.ts", BOOTSTRAP_ENTRY),
    ("src/bootstrap.tsx", SHELL_BOOTSTRAP),
    ("src/theme.ts", SHELL_THEME),
];

const REMOTE: &[(&str, &str)] = &[
    ("package.json", REMOTE_PACKAGE),
    ("rspack.config.js", RSPACK_CONFIG),
    ("module-federation.config.js", REMOTE_FEDERATION),
    ("src/index.ts", REMOTE_INDEX),
    ("src/routes.ts", ROUTES),
];

const API: &[(&str, &str)] = &[
    ("package.json", API_PACKAGE),
    ("src/define-config.ts", API_DEFINE_CONFIG),
    ("src/config.ts", API_CONFIG),
    ("src/routes.ts", ROUTES),
    ("src/server.ts", API_SERVER),
];

/// Template for `src/components/<Unit>.tsx` of a remote.
const EXPOSED_UNIT: &str = r#"import React from "react";

export default function {{ unit }}() {
  return <section className="{{ component.name }}-{{ unit | lower }}">{{ unit }}</section>;
}
"#;

const SHELL_PACKAGE: &str = r#"{
  "name": "{{ component.name }}",
  "private": true,
  "version": "0.1.0",
  "scripts": {
    "dev": "rspack serve",
    "build": "rspack build"
  },
  "dependencies": {
    "react": "^18.3.1",
    "react-dom": "^18.3.1"
  },
  "devDependencies": {
    "@module-federation/enhanced": "^0.8.0",
    "@rspack/cli": "^1.1.0",
    "@rspack/core": "^1.1.0",
    "typescript": "^5.6.0"
  }
}
"#;

const REMOTE_PACKAGE: &str = r#"{
  "name": "{{ component.name }}",
  "private": true,
  "version": "0.1.0",
  "scripts": {
    "dev": "rspack serve",
    "build": "rspack build"
  },
  "dependencies": {
{%- for dep in component.dependencies | default([]) %}
    "{{ dep }}": "*"{% if not loop.last %},{% endif %}
{%- endfor %}
  },
  "devDependencies": {
    "@module-federation/enhanced": "^0.8.0",
    "@rspack/cli": "^1.1.0",
    "@rspack/core": "^1.1.0",
    "typescript": "^5.6.0"
  }
}
"#;

const RSPACK_CONFIG: &str = r#"const { defineConfig } = require("@rspack/cli");
const { ModuleFederationPlugin } = require("@module-federation/enhanced/rspack");
const federation = require("./module-federation.config");

module.exports = defineConfig({
  entry: "./src/index.ts",
  devServer: {
{{ regions.port }}    historyApiFallback: true,
  },
  resolve: {
    extensions: [".ts", ".tsx", ".js"],
  },
  plugins: [new ModuleFederationPlugin(federation)],
});
"#;

const SHELL_FEDERATION: &str = r#"const { createModuleFederationConfig } = require("@module-federation/enhanced");

module.exports = createModuleFederationConfig({
{{ regions.name }}{{ regions.remotes }}  shared: {
    react: { singleton: true },
    "react-dom": { singleton: true },
  },
});
"#;

const REMOTE_FEDERATION: &str = r#"const { createModuleFederationConfig } = require("@module-federation/enhanced");

module.exports = createModuleFederationConfig({
  name: "{{ component.name }}",
  filename: "remoteEntry.js",
{{ regions.exposes }}{{ regions.shared }}});
"#;

const BOOTSTRAP_ENTRY: &str = r#"import("./bootstrap");
"#;

const SHELL_BOOTSTRAP: &str = r#"import React from "react";
import { createRoot } from "react-dom/client";
import { theme } from "./theme";

function App() {
  return (
    <main data-theme={theme ?? undefined}>
      <h1>{{ spec.name }}</h1>
    </main>
  );
}

const container = document.getElementById("root");
if (container) {
  createRoot(container).render(<App />);
}
"#;

const SHELL_THEME: &str = r#"{{ regions.theme }}
export type Theme = typeof theme;
"#;

const REMOTE_INDEX: &str = r#"export { routes } from "./routes";
"#;

const ROUTES: &str = r#"export interface RouteDefinition {
  path: string;
  method?: string;
  handler?: string;
}

{{ regions.routes }}"#;

const API_PACKAGE: &str = r#"{
  "name": "{{ component.name }}",
  "private": true,
  "version": "0.1.0",
  "scripts": {
    "dev": "tsx watch src/server.ts",
    "start": "node dist/server.js"
  },
  "devDependencies": {
    "tsx": "^4.19.0",
    "typescript": "^5.6.0"
  }
}
"#;

const API_DEFINE_CONFIG: &str = r#"export interface ServiceConfig {
  port: number;
  database: string;
  specRef: string | null;
}

export function defineServiceConfig(config: ServiceConfig): ServiceConfig {
  return config;
}
"#;

const API_CONFIG: &str = r#"import { defineServiceConfig } from "./define-config";

export default defineServiceConfig({
{{ regions.port }}{{ regions.database }}{{ regions["spec-ref"] }}});
"#;

const API_SERVER: &str = r#"import http from "node:http";
import config from "./config";
import { routes } from "./routes";

const server = http.createServer((req, res) => {
  const route = routes.find(
    (r) => r.path === req.url && (r.method ?? "GET").toUpperCase() === req.method,
  );
  res.statusCode = route ? 200 : 404;
  res.setHeader("content-type", "application/json");
  res.end(JSON.stringify({ service: "{{ component.name }}", handler: route?.handler ?? null }));
});

server.listen(config.port, () => {
  console.log(`{{ component.name }} listening on ${config.port}`);
});
"#;

/// Renders the embedded template set for a component kind.
pub struct TemplateGenerator {
    env: Environment<'static>,
}

impl TemplateGenerator {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        Self { env }
    }

    fn templates(kind: ComponentKind) -> &'static [(&'static str, &'static str)] {
        match kind {
            ComponentKind::Shell => SHELL,
            ComponentKind::Remote => REMOTE,
            ComponentKind::Api => API,
        }
    }

    fn render_one(
        &self,
        component: &str,
        name: &str,
        source: &str,
        ctx: &serde_json::Value,
    ) -> Result<String, GenerationError> {
        self.env
            .render_str(source, ctx)
            .map_err(|e| GenerationError::Template {
                component: component.to_string(),
                template: name.to_string(),
                message: e.to_string(),
            })
    }
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentGenerator for TemplateGenerator {
    fn name(&self) -> &str {
        "templates"
    }

    fn render(
        &self,
        component: Component<'_>,
        ctx: &GenerationContext<'_>,
    ) -> Result<FileTree, GenerationError> {
        let name = component.name();
        let regions = component_regions(component, ctx.spec, ctx.remote_host);
        let mut context = json!({
            "spec": { "name": ctx.spec.name },
            "component": component.to_json(),
            "regions": regions,
        });

        let mut tree = FileTree::new();
        for (path, source) in Self::templates(component.kind()) {
            tree.insert(*path, self.render_one(name, path, source, &context)?);
        }

        if let Component::Remote(remote) = component {
            for unit in &remote.exposed_components {
                context["unit"] = json!(unit);
                let path = PathBuf::from(UNITS_DIR).join(format!("{unit}.tsx"));
                let rendered = self.render_one(name, "exposed unit", EXPOSED_UNIT, &context)?;
                tree.insert(path, rendered);
            }
        }

        tree.validate(name)?;
        Ok(tree)
    }
}
