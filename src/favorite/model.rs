//! Favorite data model — items, links, anchors and the favorite view.
//!
//! Items are read-only snapshots of the CI object graph. Links are API
//! hrefs that always end in `/`, matching how the REST layer addresses
//! resources.

use serde::{Deserialize, Serialize};

/// Kind of an item in the CI object graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Job,
    Folder,
    MultiBranch,
}

/// A node of the CI object graph (job, folder, multi-branch project).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    /// Slash-joined path from the root, e.g. `folder/job`.
    pub full_name: String,
    pub kind: ItemKind,
    /// Set by the source-control integration on the repository's
    /// default branch job.
    pub primary: bool,
    pub children: Vec<Item>,
}

#[cfg(test)]
impl Item {
    pub fn job(name: &str, full_name: &str) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            kind: ItemKind::Job,
            primary: false,
            children: Vec::new(),
        }
    }

    pub fn folder(name: &str, full_name: &str, kind: ItemKind, children: Vec<Item>) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            kind,
            primary: false,
            children,
        }
    }

    /// Mark this item as the primary instance.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }
}

impl Item {
    pub fn is_job(&self) -> bool {
        self.kind == ItemKind::Job
    }

    pub fn is_multibranch(&self) -> bool {
        self.kind == ItemKind::MultiBranch
    }

    /// Direct child job by name.
    pub fn child_job(&self, name: &str) -> Option<&Item> {
        self.children
            .iter()
            .find(|c| c.is_job() && c.name == name)
    }

    /// All jobs below this item, depth first in declaration order.
    pub fn all_jobs(&self) -> Vec<&Item> {
        let mut jobs = Vec::new();
        collect_jobs(self, &mut jobs);
        jobs
    }
}

fn collect_jobs<'a>(item: &'a Item, out: &mut Vec<&'a Item>) {
    for child in &item.children {
        if child.is_job() {
            out.push(child);
        } else {
            collect_jobs(child, out);
        }
    }
}

/// An API href. Always ends in `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    href: String,
}

impl Link {
    pub fn new(href: &str) -> Self {
        let mut href = href.to_string();
        if !href.ends_with('/') {
            href.push('/');
        }
        Self { href }
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    /// Append a relative segment: `/a/` + `b` → `/a/b/`.
    pub fn rel(&self, segment: &str) -> Link {
        let segment = segment.trim_matches('/');
        Link {
            href: format!("{}{segment}/", self.href),
        }
    }

    /// Drop the last segment: `/a/b/` → `/a/`. The root stays the root.
    pub fn ancestor(&self) -> Link {
        let trimmed = self.href.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(pos) => Link {
                href: trimmed[..=pos].to_string(),
            },
            None => Link { href: "/".into() },
        }
    }
}

impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.href)
    }
}

/// Parent context a resolved favorite is linked relative to.
///
/// Evaluated lazily: resolvers that decline never ask for the link.
pub trait Reachable {
    fn link(&self) -> Link;
}

impl Reachable for Link {
    fn link(&self) -> Link {
        self.clone()
    }
}

/// Anchor derived from an item's own canonical link: one level above it.
#[derive(Debug, Clone)]
pub struct AncestorOf(pub Link);

impl Reachable for AncestorOf {
    fn link(&self) -> Link {
        self.0.ancestor()
    }
}

/// Intent to add (`true`) or remove (`false`) a favorite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteAction {
    #[serde(alias = "isFavorite")]
    pub favorite: bool,
}

/// The caller's identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
}

impl Principal {
    pub fn new(id: &str) -> Self {
        Self { id: id.into() }
    }
}

/// Kind of a pipeline representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    Pipeline,
    Folder,
    MultiBranch,
    Branch,
}

/// API representation of a pipeline-like item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub name: String,
    pub full_name: String,
    pub kind: PipelineKind,
    #[serde(rename = "_links")]
    pub links: SelfLinks,
}

impl Pipeline {
    pub fn new(item: &Item, kind: PipelineKind, link: Link) -> Self {
        Self {
            name: item.name.clone(),
            full_name: item.full_name.clone(),
            kind,
            links: SelfLinks { self_link: link },
        }
    }

    pub fn link(&self) -> &Link {
        &self.links.self_link
    }
}

/// HAL-style `_links` block carrying only `self`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
}

/// A resolved favorite: the target representation plus `<target>/favorite/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub item: Pipeline,
    #[serde(rename = "_links")]
    pub links: SelfLinks,
}

impl Favorite {
    /// Wrap a pipeline, linking the favorite below the pipeline's own link.
    pub fn of(pipeline: Pipeline) -> Self {
        let link = pipeline.link().rel("favorite");
        Self {
            item: pipeline,
            links: SelfLinks { self_link: link },
        }
    }

    pub fn link(&self) -> &Link {
        &self.links.self_link
    }
}
