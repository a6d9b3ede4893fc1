//! Structured diff between two specifications.

use crate::spec::{ApiSpec, RemoteSpec, ShellSpec, Spec};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Scalar shell fields that can change in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShellField {
    Name,
    Port,
    Theme,
}

impl ShellField {
    pub fn as_str(self) -> &'static str {
        match self {
            ShellField::Name => "name",
            ShellField::Port => "port",
            ShellField::Theme => "theme",
        }
    }
}

/// Fields of remotes and apis whose change marks a component as modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrackedField {
    Port,
    Dependencies,
    ExposedUnits,
    Routes,
    Database,
    SpecRef,
}

impl TrackedField {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackedField::Port => "port",
            TrackedField::Dependencies => "dependencies",
            TrackedField::ExposedUnits => "exposedUnits",
            TrackedField::Routes => "routes",
            TrackedField::Database => "database",
            TrackedField::SpecRef => "specRef",
        }
    }
}

impl fmt::Display for ShellField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A component present in both specs with differing tracked fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDelta {
    pub name: String,
    pub fields: BTreeSet<TrackedField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionChanges {
    /// Names only in the new spec, in new-spec order
    pub added: Vec<String>,
    /// Names only in the old spec, in old-spec order
    pub removed: Vec<String>,
    /// Components in both, in new-spec order
    pub modified: Vec<ComponentDelta>,
}

impl CollectionChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn modified_names(&self) -> Vec<&str> {
        self.modified.iter().map(|d| d.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub shell: BTreeSet<ShellField>,
    pub remotes: CollectionChanges,
    pub apis: CollectionChanges,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.shell.is_empty() && self.remotes.is_empty() && self.apis.is_empty()
    }
}

/// Fields a component exposes for change tracking.
trait Tracked {
    fn name(&self) -> &str;
    fn changed_fields(&self, other: &Self) -> BTreeSet<TrackedField>;
}

impl Tracked for RemoteSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn changed_fields(&self, other: &Self) -> BTreeSet<TrackedField> {
        let mut fields = BTreeSet::new();
        if self.port != other.port {
            fields.insert(TrackedField::Port);
        }
        if self.dependencies != other.dependencies {
            fields.insert(TrackedField::Dependencies);
        }
        if self.exposed_components != other.exposed_components {
            fields.insert(TrackedField::ExposedUnits);
        }
        if self.routes != other.routes {
            fields.insert(TrackedField::Routes);
        }
        fields
    }
}

impl Tracked for ApiSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn changed_fields(&self, other: &Self) -> BTreeSet<TrackedField> {
        let mut fields = BTreeSet::new();
        if self.port != other.port {
            fields.insert(TrackedField::Port);
        }
        if self.routes != other.routes {
            fields.insert(TrackedField::Routes);
        }
        if self.database != other.database {
            fields.insert(TrackedField::Database);
        }
        if self.spec != other.spec {
            fields.insert(TrackedField::SpecRef);
        }
        fields
    }
}

fn diff_collection<T: Tracked>(old: &[T], new: &[T]) -> CollectionChanges {
    let old_by_name: HashMap<&str, &T> = old.iter().map(|c| (c.name(), c)).collect();
    let new_by_name: HashMap<&str, &T> = new.iter().map(|c| (c.name(), c)).collect();

    let mut changes = CollectionChanges::default();
    for entry in new {
        match old_by_name.get(entry.name()) {
            None => changes.added.push(entry.name().to_string()),
            Some(previous) => {
                let fields = previous.changed_fields(entry);
                if !fields.is_empty() {
                    changes.modified.push(ComponentDelta {
                        name: entry.name().to_string(),
                        fields,
                    });
                }
            }
        }
    }
    changes.removed = old
        .iter()
        .filter(|c| !new_by_name.contains_key(c.name()))
        .map(|c| c.name().to_string())
        .collect();
    changes
}

fn diff_shell(old: &ShellSpec, new: &ShellSpec) -> BTreeSet<ShellField> {
    let mut fields = BTreeSet::new();
    if old.name != new.name {
        fields.insert(ShellField::Name);
    }
    if old.port != new.port {
        fields.insert(ShellField::Port);
    }
    if old.theme != new.theme {
        fields.insert(ShellField::Theme);
    }
    fields
}

/// Compute the change set that turns `old` into `new`.
pub fn diff(old: &Spec, new: &Spec) -> ChangeSet {
    ChangeSet {
        shell: diff_shell(&old.shell, &new.shell),
        remotes: diff_collection(&old.remotes, &new.remotes),
        apis: diff_collection(&old.apis, &new.apis),
    }
}
