//! Multi-branch resolver — a multi-branch project is favorited through
//! its default branch.

use crate::favorite::model::{Favorite, Item, Pipeline, PipelineKind, Reachable};
use crate::favorite::{FavoriteError, FavoriteResolver, select_default_branch};

/// Resolves multi-branch projects to the favorite of their default
/// branch, linked at `<parent>/<project>/branches/<branch>/favorite/`.
///
/// Declines every other item kind.
#[derive(Debug, Default, Clone, Copy)]
pub struct MultiBranchResolver;

impl FavoriteResolver for MultiBranchResolver {
    fn name(&self) -> &'static str {
        "multibranch"
    }

    fn resolve(
        &self,
        item: &Item,
        parent: &dyn Reachable,
    ) -> Result<Option<Favorite>, FavoriteError> {
        if !item.is_multibranch() {
            return Ok(None);
        }

        let branch = select_default_branch(item)?;
        let link = parent
            .link()
            .rel(&urlencoding::encode(&item.name))
            .rel("branches")
            .rel(&urlencoding::encode(&branch.name));

        Ok(Some(Favorite::of(Pipeline::new(
            branch,
            PipelineKind::Branch,
            link,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favorite::model::{ItemKind, Link};

    fn project(branches: Vec<Item>) -> Item {
        Item::folder("repo", "team/repo", ItemKind::MultiBranch, branches)
    }

    #[test]
    fn declines_plain_jobs_and_folders() {
        let parent = Link::new("/p/");
        let r = MultiBranchResolver;
        assert!(r.resolve(&Item::job("a", "a"), &parent).unwrap().is_none());
        let folder = Item::folder("f", "f", ItemKind::Folder, vec![Item::job("master", "f/master")]);
        assert!(r.resolve(&folder, &parent).unwrap().is_none());
    }

    #[test]
    fn resolves_to_default_branch_favorite() {
        let p = project(vec![
            Item::job("feature", "team/repo/feature"),
            Item::job("main", "team/repo/main").primary(),
        ]);
        let parent = Link::new("/blue/rest/organizations/jenkins/pipelines/team/pipelines/");
        let fav = MultiBranchResolver.resolve(&p, &parent).unwrap().unwrap();

        assert_eq!(fav.item.full_name, "team/repo/main");
        assert_eq!(fav.item.kind, PipelineKind::Branch);
        assert_eq!(
            fav.link().href(),
            "/blue/rest/organizations/jenkins/pipelines/team/pipelines/repo/branches/main/favorite/"
        );
    }

    #[test]
    fn branch_names_are_encoded_in_links() {
        let p = project(vec![Item::job("release/1.0", "team/repo/release/1.0").primary()]);
        let fav = MultiBranchResolver
            .resolve(&p, &Link::new("/p/"))
            .unwrap()
            .unwrap();
        assert_eq!(fav.item.link().href(), "/p/repo/branches/release%2F1.0/");
    }

    #[test]
    fn project_without_default_branch_fails() {
        let p = project(vec![Item::job("develop", "team/repo/develop")]);
        let err = MultiBranchResolver.resolve(&p, &Link::new("/p/")).unwrap_err();
        assert!(matches!(err, FavoriteError::BadRequest(_)));
    }
}
