//! In-memory item catalog — the server's view of the CI object graph.
//!
//! Loaded once at startup from a JSON file and never mutated. Implements
//! item lookup, canonical links and pipeline mapping for the favorite
//! engine.
//!
//! Link layout:
//! - root: `/blue/rest/organizations/<org>/`
//! - top-level item or folder child: `<parent>/pipelines/<name>/`
//! - multi-branch child: `<parent>/branches/<name>/`

pub mod store;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::favorite::model::{Item, ItemKind, Link, Pipeline, PipelineKind, Reachable};
use crate::resolver::{ItemRegistry, LinkResolver, PipelineAdapter};

pub use store::InMemoryStore;

const DEFAULT_ORGANIZATION: &str = "jenkins";

/// Catalog loading errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid item name {0:?}")]
    InvalidName(String),
    #[error("duplicate item {0}")]
    Duplicate(String),
}

/// On-disk catalog layout.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default = "default_organization")]
    organization: String,
    #[serde(default)]
    items: Vec<ItemEntry>,
}

fn default_organization() -> String {
    DEFAULT_ORGANIZATION.into()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ItemEntry {
    Job {
        name: String,
        #[serde(default)]
        primary: bool,
    },
    Folder {
        name: String,
        #[serde(default)]
        items: Vec<ItemEntry>,
    },
    #[serde(rename = "multibranch")]
    MultiBranch {
        name: String,
        #[serde(default)]
        branches: Vec<ItemEntry>,
    },
}

/// A located item: the item, its container and its canonical link.
struct Located<'a> {
    item: &'a Item,
    parent: Option<&'a Item>,
    link: Link,
}

/// Read-only item tree of one organization.
#[derive(Debug, Clone)]
pub struct Catalog {
    organization: String,
    items: Vec<Item>,
}

impl Catalog {
    pub fn new(organization: &str, items: Vec<Item>) -> Self {
        Self {
            organization: organization.into(),
            items,
        }
    }

    /// Load a catalog from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        let items = build_items(file.items, "")?;
        Ok(Self::new(&file.organization, items))
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Link of the organization root.
    pub fn root_link(&self) -> Link {
        Link::new("/blue/rest/organizations").rel(&urlencoding::encode(&self.organization))
    }

    /// Number of items, counting nested ones.
    pub fn len(&self) -> usize {
        fn count(items: &[Item]) -> usize {
            items.iter().map(|i| 1 + count(&i.children)).sum()
        }
        count(&self.items)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn locate(&self, full_name: &str) -> Option<Located<'_>> {
        let mut level = &self.items;
        let mut parent: Option<&Item> = None;
        let mut link = self.root_link();

        for segment in full_name.split('/') {
            let item = level.iter().find(|i| i.name == segment)?;
            let collection = match parent {
                Some(p) if p.is_multibranch() => "branches",
                _ => "pipelines",
            };
            link = link.rel(collection).rel(&urlencoding::encode(&item.name));

            if item.full_name == full_name {
                return Some(Located { item, parent, link });
            }
            parent = Some(item);
            level = &item.children;
        }
        None
    }
}

fn build_items(entries: Vec<ItemEntry>, prefix: &str) -> Result<Vec<Item>, CatalogError> {
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(entries.len());

    for entry in entries {
        let (name, kind, primary, children) = match entry {
            ItemEntry::Job { name, primary } => (name, ItemKind::Job, primary, Vec::new()),
            ItemEntry::Folder { name, items } => (name, ItemKind::Folder, false, items),
            ItemEntry::MultiBranch { name, branches } => {
                (name, ItemKind::MultiBranch, false, branches)
            }
        };

        if name.is_empty() || name.contains('/') {
            return Err(CatalogError::InvalidName(name));
        }
        let full_name = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        if !seen.insert(name.clone()) {
            return Err(CatalogError::Duplicate(full_name));
        }

        let children = build_items(children, &full_name)?;
        items.push(Item {
            name,
            full_name,
            kind,
            primary,
            children,
        });
    }
    Ok(items)
}

impl ItemRegistry for Catalog {
    fn item(&self, full_name: &str) -> Option<&Item> {
        self.locate(full_name).map(|l| l.item)
    }
}

impl LinkResolver for Catalog {
    fn resolve_link(&self, item: &Item) -> Option<Link> {
        self.locate(&item.full_name).map(|l| l.link)
    }
}

impl PipelineAdapter for Catalog {
    fn pipeline(&self, item: &Item, parent: &dyn Reachable) -> Option<Pipeline> {
        let kind = match item.kind {
            ItemKind::Folder => PipelineKind::Folder,
            ItemKind::MultiBranch => PipelineKind::MultiBranch,
            ItemKind::Job => {
                let in_project = self
                    .locate(&item.full_name)
                    .and_then(|l| l.parent)
                    .is_some_and(Item::is_multibranch);
                if in_project {
                    PipelineKind::Branch
                } else {
                    PipelineKind::Pipeline
                }
            }
        };
        let link = parent.link().rel(&urlencoding::encode(&item.name));
        Some(Pipeline::new(item, kind, link))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "organization": "jenkins",
        "items": [
            { "type": "job", "name": "standalone" },
            { "type": "folder", "name": "team", "items": [
                { "type": "job", "name": "build" },
                { "type": "multibranch", "name": "repo", "branches": [
                    { "type": "job", "name": "feature%2Fx" },
                    { "type": "job", "name": "main", "primary": true }
                ]}
            ]}
        ]
    }"#;

    fn sample() -> Catalog {
        Catalog::from_json(SAMPLE).unwrap()
    }

    #[test]
    fn loads_nested_items_with_full_names() {
        let c = sample();
        assert_eq!(c.organization(), "jenkins");
        assert_eq!(c.len(), 6);
        let main = c.item("team/repo/main").unwrap();
        assert!(main.primary);
        assert_eq!(main.name, "main");
    }

    #[test]
    fn unknown_items_are_none() {
        let c = sample();
        assert!(c.item("team/missing").is_none());
        assert!(c.item("standalone/child").is_none());
        assert!(c.item("").is_none());
    }

    #[test]
    fn organization_defaults_to_jenkins() {
        let c = Catalog::from_json(r#"{"items":[]}"#).unwrap();
        assert_eq!(c.organization(), "jenkins");
        assert!(c.is_empty());
    }

    #[test]
    fn links_follow_collection_layout() {
        let c = sample();
        let link = |name: &str| c.resolve_link(c.item(name).unwrap()).unwrap();
        assert_eq!(
            link("standalone").href(),
            "/blue/rest/organizations/jenkins/pipelines/standalone/"
        );
        assert_eq!(
            link("team/build").href(),
            "/blue/rest/organizations/jenkins/pipelines/team/pipelines/build/"
        );
        assert_eq!(
            link("team/repo/main").href(),
            "/blue/rest/organizations/jenkins/pipelines/team/pipelines/repo/branches/main/"
        );
        assert_eq!(
            link("team/repo/feature%2Fx").href(),
            "/blue/rest/organizations/jenkins/pipelines/team/pipelines/repo/branches/feature%252Fx/"
        );
    }

    #[test]
    fn foreign_items_have_no_link() {
        let c = sample();
        assert!(c.resolve_link(&Item::job("ghost", "ghost")).is_none());
    }

    #[test]
    fn pipeline_kinds() {
        let c = sample();
        let parent = Link::new("/p/");
        let kind = |name: &str| c.pipeline(c.item(name).unwrap(), &parent).unwrap().kind;
        assert_eq!(kind("standalone"), PipelineKind::Pipeline);
        assert_eq!(kind("team"), PipelineKind::Folder);
        assert_eq!(kind("team/repo"), PipelineKind::MultiBranch);
        assert_eq!(kind("team/repo/main"), PipelineKind::Branch);
    }

    #[test]
    fn pipeline_link_is_below_parent() {
        let c = sample();
        let p = c
            .pipeline(c.item("team/build").unwrap(), &Link::new("/anchor/"))
            .unwrap();
        assert_eq!(p.link().href(), "/anchor/build/");
        assert_eq!(p.full_name, "team/build");
    }

    #[test]
    fn rejects_duplicate_siblings() {
        let err = Catalog::from_json(
            r#"{"items":[{"type":"job","name":"a"},{"type":"folder","name":"a"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate(name) if name == "a"));
    }

    #[test]
    fn rejects_slash_and_empty_names() {
        assert!(matches!(
            Catalog::from_json(r#"{"items":[{"type":"job","name":"a/b"}]}"#),
            Err(CatalogError::InvalidName(_))
        ));
        assert!(matches!(
            Catalog::from_json(r#"{"items":[{"type":"job","name":""}]}"#),
            Err(CatalogError::InvalidName(_))
        ));
    }

    #[test]
    fn rejects_unknown_item_type() {
        assert!(matches!(
            Catalog::from_json(r#"{"items":[{"type":"view","name":"v"}]}"#),
            Err(CatalogError::Json(_))
        ));
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(Catalog::from_path(&path).unwrap().len(), 6);

        let err = Catalog::from_path(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }
}
