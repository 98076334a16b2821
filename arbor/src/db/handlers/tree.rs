//! Repository for tree-shaped entity kinds.
//!
//! Only the parent link is stored. Trees are assembled per read, breadth-first: each level is one
//! backend query for the children of the previous level, trash-filtered and ordered like any
//! other read. A visited-id set guarantees every node is emitted at most once and assembly
//! terminates even if stored links form a cycle.

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{debug, instrument};

use crate::db::handlers::repository::{ChildrenResolve, FindOptions, Repository};
use crate::db::models::{Entity, FlatNode, TreeEntity, TreeNode};
use crate::db::order::{OrderBy, resolve_order};
use crate::db::query::{Condition, Query, TrashMode};
use crate::db::storage::Backend;
use crate::errors::{Error, Result};
use crate::pagination::{PageOptions, Paginated, manual_paginate};
use crate::types::{EntityId, abbrev_uuid};

/// Flatten a forest into pre-order, annotating each entry with its distance from its root and
/// its parent in the traversal. `children` doesn't survive flattening.
pub fn to_flat_trees<E: Entity>(forest: Vec<TreeNode<E>>) -> Vec<FlatNode<E>> {
    let mut flat = Vec::new();
    let mut stack: Vec<(TreeNode<E>, usize, Option<EntityId>)> =
        forest.into_iter().rev().map(|node| (node, 0, None)).collect();

    while let Some((TreeNode { item, children }, depth, parent)) = stack.pop() {
        let id = item.id();
        stack.extend(children.into_iter().rev().map(|child| (child, depth + 1, Some(id))));
        flat.push(FlatNode { item, depth, parent });
    }
    flat
}

pub struct TreeRepository<E, B> {
    backend: B,
    order_by: Option<OrderBy>,
    children_resolve: ChildrenResolve,
    _entity: PhantomData<fn() -> E>,
}

impl<E, B> Clone for TreeRepository<E, B>
where
    B: Clone,
{
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            order_by: self.order_by.clone(),
            children_resolve: self.children_resolve,
            _entity: PhantomData,
        }
    }
}

impl<E, B> TreeRepository<E, B>
where
    E: TreeEntity,
    B: Backend<E>,
{
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            order_by: None,
            children_resolve: ChildrenResolve::default(),
            _entity: PhantomData,
        }
    }

    pub fn with_order(mut self, order_by: Option<OrderBy>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_children_resolve(mut self, children_resolve: ChildrenResolve) -> Self {
        self.children_resolve = children_resolve;
        self
    }

    pub fn children_resolve(&self) -> ChildrenResolve {
        self.children_resolve
    }

    /// Entities without a parent, matching the caller's conditions.
    #[instrument(
        skip(self, options),
        fields(resource = E::SCHEMA.resource, trashed = %options.trashed),
        err
    )]
    pub async fn find_roots(&self, options: &FindOptions) -> Result<Vec<E>> {
        let query = self.build_query(options)?.filter(Condition::is_null(E::parent_column()));
        Ok(self.backend.find(&query).await?)
    }

    /// `root` with its descendants attached, down to `options.depth` levels.
    ///
    /// # Errors
    /// - `InvalidState` if `root` isn't stored, whatever its trash state
    #[instrument(
        skip(self, root, options),
        fields(resource = E::SCHEMA.resource, root = %abbrev_uuid(&root.id())),
        err
    )]
    pub async fn find_descendants_tree(
        &self,
        root: &E,
        options: &FindOptions,
    ) -> Result<TreeNode<E>> {
        let exists = Query::new()
            .filter(Condition::eq(E::SCHEMA.id_column(), root.id()))
            .trashed(TrashMode::All);
        if self.backend.count(&exists).await? == 0 {
            return Err(Error::InvalidState {
                message: format!("{} {} does not exist", E::SCHEMA.resource, root.id()),
            });
        }
        self.assemble(root.clone(), options).await
    }

    /// `root` and its descendants in pre-order, without nesting.
    pub async fn find_descendants(&self, root: &E, options: &FindOptions) -> Result<Vec<E>> {
        let tree = self.find_descendants_tree(root, options).await?;
        Ok(to_flat_trees(vec![tree]).into_iter().map(|node| node.item).collect())
    }

    /// Every root matching the options, each with its descendants attached. Descendants of
    /// different roots are fetched concurrently; root order is kept.
    #[instrument(
        skip(self, options),
        fields(resource = E::SCHEMA.resource, trashed = %options.trashed),
        err
    )]
    pub async fn find_trees(&self, options: &FindOptions) -> Result<Vec<TreeNode<E>>> {
        let roots = self.find_roots(options).await?;
        // Conditions pick the roots; everything under a picked root belongs to its tree
        let descend = FindOptions {
            conditions: Vec::new(),
            ..options.clone()
        };
        try_join_all(roots.into_iter().map(|root| self.assemble(root, &descend))).await
    }

    /// The chain from the topmost ancestor down to `node`, `node` included.
    ///
    /// Without a per-call ordering the chain is returned root first. Ancestors filtered out by the
    /// trash mode or the conditions are left out of the chain without breaking it.
    #[instrument(
        skip(self, node, options),
        fields(resource = E::SCHEMA.resource, node = %abbrev_uuid(&node.id())),
        err
    )]
    pub async fn find_ancestors(&self, node: &E, options: &FindOptions) -> Result<Vec<E>> {
        let chain = self.walk_ancestors(node).await?;
        let mut query = Query::new()
            .filters(options.conditions.iter().cloned())
            .filter(Condition::is_in(E::SCHEMA.id_column(), chain.iter().copied()))
            .trashed(options.trashed);

        if options.order_by.is_some() {
            query = query.order_by(resolve_order(options.order_by.as_ref(), None, &E::SCHEMA)?);
            return Ok(self.backend.find(&query).await?);
        }

        let mut found: HashMap<EntityId, E> = self
            .backend
            .find(&query)
            .await?
            .into_iter()
            .map(|entity| (entity.id(), entity))
            .collect();
        Ok(chain.iter().rev().filter_map(|id| found.remove(id)).collect())
    }

    /// Number of entries [`TreeRepository::find_ancestors`] would return.
    #[instrument(
        skip(self, node, options),
        fields(resource = E::SCHEMA.resource, node = %abbrev_uuid(&node.id())),
        err
    )]
    pub async fn count_ancestors(&self, node: &E, options: &FindOptions) -> Result<i64> {
        let chain = self.walk_ancestors(node).await?;
        let query = Query::new()
            .filters(options.conditions.iter().cloned())
            .filter(Condition::is_in(E::SCHEMA.id_column(), chain))
            .trashed(options.trashed);
        Ok(self.backend.count(&query).await?)
    }

    /// Ids from `node` up to its topmost ancestor, following stored links through trashed rows.
    async fn walk_ancestors(&self, node: &E) -> Result<Vec<EntityId>> {
        let mut chain = vec![node.id()];
        let mut visited = HashSet::from([node.id()]);
        let mut next = node.parent_id();

        while let Some(id) = next {
            if !visited.insert(id) {
                break;
            }
            let query = Query::new()
                .filter(Condition::eq(E::SCHEMA.id_column(), id))
                .trashed(TrashMode::All);
            let Some(parent) = self.backend.find(&query).await?.into_iter().next() else {
                break;
            };
            chain.push(id);
            next = parent.parent_id();
        }
        Ok(chain)
    }

    async fn assemble(&self, root: E, options: &FindOptions) -> Result<TreeNode<E>> {
        let order = resolve_order(options.order_by.as_ref(), self.order_by.as_ref(), &E::SCHEMA)?;
        let parent_column = E::parent_column();

        let mut visited = HashSet::from([root.id()]);
        let mut frontier = vec![root.id()];
        let mut levels: Vec<Vec<E>> = Vec::new();

        while !frontier.is_empty() && options.depth.is_none_or(|max| levels.len() < max) {
            let query = Query::new()
                .filter(Condition::is_in(parent_column, frontier.iter().copied()))
                .trashed(options.trashed)
                .order_by(order.clone());
            let level: Vec<E> = self
                .backend
                .find(&query)
                .await?
                .into_iter()
                .filter(|entity| visited.insert(entity.id()))
                .collect();
            frontier = level.iter().map(|entity| entity.id()).collect();
            levels.push(level);
        }

        // Attach bottom-up. Each level arrives fully ordered, so grouping by parent keeps the
        // order among siblings.
        let mut below: HashMap<EntityId, Vec<TreeNode<E>>> = HashMap::new();
        for level in levels.into_iter().rev() {
            let mut grouped: HashMap<EntityId, Vec<TreeNode<E>>> = HashMap::new();
            for item in level {
                let children = below.remove(&item.id()).unwrap_or_default();
                if let Some(parent) = item.parent_id() {
                    grouped.entry(parent).or_default().push(TreeNode { item, children });
                }
            }
            below = grouped;
        }

        let children = below.remove(&root.id()).unwrap_or_default();
        Ok(TreeNode { item: root, children })
    }
}

#[async_trait]
impl<E, B> Repository<E> for TreeRepository<E, B>
where
    E: TreeEntity,
    B: Backend<E>,
{
    type Item = FlatNode<E>;
    type Backend = B;

    fn backend(&self) -> &B {
        &self.backend
    }

    fn default_order(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    async fn list(&self, options: &FindOptions) -> Result<Vec<FlatNode<E>>> {
        let forest = self.find_trees(options).await?;
        Ok(to_flat_trees(forest))
    }

    async fn paginate(
        &self,
        options: &FindOptions,
        page: &PageOptions,
    ) -> Result<Paginated<FlatNode<E>>> {
        let data = self.list(options).await?;
        Ok(manual_paginate(data, page))
    }

    async fn list_ids(&self, ids: &[EntityId]) -> Result<Vec<FlatNode<E>>> {
        let wanted: HashSet<EntityId> = ids.iter().copied().collect();
        let mut items: Vec<FlatNode<E>> = self
            .list(&FindOptions::new())
            .await?
            .into_iter()
            .filter(|node| wanted.contains(&node.id()))
            .collect();

        // Live nodes under a trashed ancestor aren't reachable from any live root
        let listed: HashSet<EntityId> = items.iter().map(FlatNode::id).collect();
        for entity in self.find_by_ids(ids, TrashMode::None).await? {
            if listed.contains(&entity.id()) {
                continue;
            }
            let depth = self.walk_ancestors(&entity).await?.len() - 1;
            items.push(FlatNode {
                parent: entity.parent_id(),
                depth,
                item: entity,
            });
        }
        Ok(items)
    }

    #[instrument(
        skip(self, targets),
        fields(
            resource = E::SCHEMA.resource,
            policy = ?self.children_resolve,
            count = targets.len()
        ),
        err
    )]
    async fn resolve_children(&self, targets: &[E]) -> Result<()> {
        let policy = self.children_resolve;
        if policy == ChildrenResolve::Delete || targets.is_empty() {
            return Ok(());
        }

        let target_ids: HashSet<EntityId> = targets.iter().map(|target| target.id()).collect();
        let parents: HashMap<EntityId, Option<EntityId>> =
            targets.iter().map(|target| (target.id(), target.parent_id())).collect();

        let query = Query::new()
            .filter(Condition::is_in(E::parent_column(), target_ids.iter().copied()))
            .trashed(TrashMode::All);
        let children = self.backend.find(&query).await?;

        let mut moved = 0;
        for mut child in children {
            // Goes down together with its parent
            if target_ids.contains(&child.id()) {
                continue;
            }
            let new_parent = match policy {
                ChildrenResolve::Root | ChildrenResolve::Delete => None,
                ChildrenResolve::Up => {
                    // Nearest ancestor that survives this delete
                    let mut candidate = child.parent_id();
                    let mut seen = HashSet::new();
                    while let Some(id) = candidate.filter(|id| target_ids.contains(id)) {
                        if !seen.insert(id) {
                            candidate = None;
                            break;
                        }
                        candidate = parents.get(&id).copied().flatten();
                    }
                    candidate
                }
            };
            child.set_parent_id(new_parent);
            self.backend.save(&child).await?;
            moved += 1;
        }

        debug!(moved, "Re-linked children of deleted {}", E::SCHEMA.resource);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::categories::Category;
    use crate::db::models::comments::Comment;
    use crate::db::storage::InMemoryBackend;

    type Categories = TreeRepository<Category, InMemoryBackend<Category>>;

    fn repository() -> Categories {
        TreeRepository::new(InMemoryBackend::new())
            .with_order(Some(OrderBy::asc("custom_order")))
            .with_children_resolve(ChildrenResolve::Up)
    }

    async fn insert(
        repo: &Categories,
        name: &str,
        parent: Option<&Category>,
        position: i64,
    ) -> Category {
        let category = Category::new(name, parent.map(|p| p.id)).with_order(position);
        repo.insert(&category).await.unwrap()
    }

    /// Root A, child B under A, grandchild C under B
    async fn abc(repo: &Categories) -> (Category, Category, Category) {
        let a = insert(repo, "A", None, 0).await;
        let b = insert(repo, "B", Some(&a), 0).await;
        let c = insert(repo, "C", Some(&b), 0).await;
        (a, b, c)
    }

    fn names(nodes: &[TreeNode<Category>]) -> Vec<&str> {
        nodes.iter().map(|n| n.item.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_three_level_tree() {
        let repo = repository();
        let (a, b, c) = abc(&repo).await;

        let trees = repo.find_trees(&FindOptions::new()).await.unwrap();
        assert_eq!(names(&trees), vec!["A"]);
        assert_eq!(names(&trees[0].children), vec!["B"]);
        assert_eq!(names(&trees[0].children[0].children), vec!["C"]);

        let flat = to_flat_trees(trees);
        let shape: Vec<_> = flat.iter().map(|n| (n.id(), n.depth, n.parent)).collect();
        assert_eq!(shape, vec![(a.id, 0, None), (b.id, 1, Some(a.id)), (c.id, 2, Some(b.id))]);
    }

    #[tokio::test]
    async fn test_flatten_counts_every_node_with_its_depth() {
        let repo = repository();
        let r1 = insert(&repo, "r1", None, 0).await;
        let r2 = insert(&repo, "r2", None, 1).await;
        let x = insert(&repo, "x", Some(&r1), 0).await;
        insert(&repo, "y", Some(&r1), 1).await;
        insert(&repo, "z", Some(&x), 0).await;
        insert(&repo, "w", Some(&r2), 0).await;

        let trees = repo.find_trees(&FindOptions::new()).await.unwrap();
        let total: usize = trees.iter().map(TreeNode::size).sum();
        let flat = to_flat_trees(trees);
        assert_eq!(flat.len(), total);
        assert_eq!(flat.len(), 6);

        let order: Vec<_> = flat.iter().map(|n| (n.item.name.as_str(), n.depth)).collect();
        assert_eq!(order, vec![("r1", 0), ("x", 1), ("z", 2), ("y", 1), ("r2", 0), ("w", 1)]);
    }

    #[tokio::test]
    async fn test_siblings_follow_ordering() {
        let repo = repository();
        let root = insert(&repo, "root", None, 0).await;
        insert(&repo, "second", Some(&root), 2).await;
        insert(&repo, "first", Some(&root), 1).await;

        let trees = repo.find_trees(&FindOptions::new()).await.unwrap();
        assert_eq!(names(&trees[0].children), vec!["first", "second"]);

        let reversed = FindOptions::new().order_by(OrderBy::desc("custom_order"));
        let trees = repo.find_trees(&reversed).await.unwrap();
        assert_eq!(names(&trees[0].children), vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_no_trashed_node_at_any_depth() {
        let repo = repository();
        let (a, b, c) = abc(&repo).await;
        let d = insert(&repo, "D", Some(&a), 1).await;
        repo.soft_remove(&[c.id, d.id]).await.unwrap();

        let flat = repo.list(&FindOptions::new()).await.unwrap();
        assert!(flat.iter().all(|n| n.item.deleted_at.is_none()));
        assert_eq!(flat.iter().map(FlatNode::id).collect::<Vec<_>>(), vec![a.id, b.id]);

        let all = repo.list(&FindOptions::new().trashed(TrashMode::All)).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_only_trashed_trees() {
        let repo = repository();
        let (a, b, c) = abc(&repo).await;
        let r = insert(&repo, "R", None, 1).await;
        let x = insert(&repo, "X", Some(&r), 0).await;
        repo.soft_remove(&[r.id, x.id, c.id]).await.unwrap();

        let trees = repo.find_trees(&FindOptions::new().trashed(TrashMode::Only)).await.unwrap();
        assert_eq!(names(&trees), vec!["R"]);
        assert_eq!(names(&trees[0].children), vec!["X"]);

        // C is trashed, but its live root keeps it out of the trash listing
        let flat = repo.list(&FindOptions::new().trashed(TrashMode::Only)).await.unwrap();
        let shape: Vec<_> = flat.iter().map(|n| (n.id(), n.depth, n.parent)).collect();
        assert_eq!(shape, vec![(r.id, 0, None), (x.id, 1, Some(r.id))]);
        assert!(flat.iter().all(|n| n.item.deleted_at.is_some()));

        let live = repo.list(&FindOptions::new()).await.unwrap();
        assert_eq!(live.iter().map(FlatNode::id).collect::<Vec<_>>(), vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn test_depth_limits_assembly() {
        let repo = repository();
        abc(&repo).await;

        let trees = repo.find_trees(&FindOptions::new().depth(1)).await.unwrap();
        assert_eq!(trees[0].size(), 2);

        let roots_only = repo.find_trees(&FindOptions::new().depth(0)).await.unwrap();
        assert_eq!(roots_only[0].size(), 1);
    }

    #[tokio::test]
    async fn test_cycle_terminates() {
        let mut a = Category::new("A", None);
        let mut b = Category::new("B", None);
        a.parent_id = Some(b.id);
        b.parent_id = Some(a.id);
        let backend = InMemoryBackend::with_rows([a.clone(), b.clone()]);
        let repo: Categories = TreeRepository::new(backend);

        let tree = repo.find_descendants_tree(&a, &FindOptions::new()).await.unwrap();
        assert_eq!(tree.size(), 2);

        let ancestors = repo.find_ancestors(&a, &FindOptions::new()).await.unwrap();
        assert_eq!(ancestors.len(), 2);
    }

    #[tokio::test]
    async fn test_descendants_of_missing_node() {
        let repo = repository();
        let ghost = Category::new("ghost", None);
        let err = repo.find_descendants_tree(&ghost, &FindOptions::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_find_descendants_is_flat_pre_order() {
        let repo = repository();
        let (a, b, c) = abc(&repo).await;

        let ids = |found: Vec<Category>| found.iter().map(|e| e.id).collect::<Vec<_>>();
        let below_a = repo.find_descendants(&a, &FindOptions::new()).await.unwrap();
        assert_eq!(ids(below_a), vec![a.id, b.id, c.id]);

        let below_b = repo.find_descendants(&b, &FindOptions::new()).await.unwrap();
        assert_eq!(ids(below_b), vec![b.id, c.id]);
    }

    #[tokio::test]
    async fn test_ancestors_root_first() {
        let repo = repository();
        let (a, b, c) = abc(&repo).await;

        let ids = |found: Vec<Category>| found.iter().map(|e| e.id).collect::<Vec<_>>();
        let chain = repo.find_ancestors(&c, &FindOptions::new()).await.unwrap();
        assert_eq!(ids(chain), vec![a.id, b.id, c.id]);
        assert_eq!(repo.count_ancestors(&c, &FindOptions::new()).await.unwrap(), 3);
        assert_eq!(repo.count_ancestors(&a, &FindOptions::new()).await.unwrap(), 1);

        // A trashed ancestor drops out of the chain under the default trash mode
        repo.soft_remove(&[b.id]).await.unwrap();
        let chain = repo.find_ancestors(&c, &FindOptions::new()).await.unwrap();
        assert_eq!(ids(chain), vec![a.id, c.id]);
        let trashed = FindOptions::new().trashed(TrashMode::Only);
        assert_eq!(repo.count_ancestors(&c, &trashed).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ancestors_with_explicit_order() {
        let repo = repository();
        let (a, b, c) = abc(&repo).await;
        let options = FindOptions::new().order_by(OrderBy::desc("name"));
        let chain = repo.find_ancestors(&c, &options).await.unwrap();
        assert_eq!(chain.iter().map(|e| e.id).collect::<Vec<_>>(), vec![c.id, b.id, a.id]);
    }

    #[tokio::test]
    async fn test_roots_with_conditions() {
        let repo = repository();
        let (a, ..) = abc(&repo).await;
        insert(&repo, "Z", None, 1).await;

        let options = FindOptions::new().filter(Condition::eq("name", "A"));
        let trees = repo.find_trees(&options).await.unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].item.id, a.id);
        // Conditions select roots only
        assert_eq!(trees[0].size(), 3);
    }

    #[tokio::test]
    async fn test_up_policy_moves_children_to_grandparent() {
        let repo = repository();
        let (a, b, c) = abc(&repo).await;

        repo.resolve_children(std::slice::from_ref(&b)).await.unwrap();
        let c = repo.find_one(c.id, TrashMode::None).await.unwrap().unwrap();
        assert_eq!(c.parent_id, Some(a.id));
    }

    #[tokio::test]
    async fn test_up_policy_on_root_makes_children_roots() {
        let repo = repository();
        let (a, b, _) = abc(&repo).await;

        repo.resolve_children(std::slice::from_ref(&a)).await.unwrap();
        let b = repo.find_one(b.id, TrashMode::None).await.unwrap().unwrap();
        assert_eq!(b.parent_id, None);
    }

    #[tokio::test]
    async fn test_up_policy_skips_deleted_ancestors() {
        let repo = repository();
        let (a, b, c) = abc(&repo).await;
        let d = insert(&repo, "D", Some(&c), 0).await;

        // Deleting B and C together: D lands under A, not under C
        repo.resolve_children(&[b.clone(), c.clone()]).await.unwrap();
        let d = repo.find_one(d.id, TrashMode::None).await.unwrap().unwrap();
        assert_eq!(d.parent_id, Some(a.id));
        // C is deleted along with B and keeps its link
        let c = repo.find_one(c.id, TrashMode::None).await.unwrap().unwrap();
        assert_eq!(c.parent_id, Some(b.id));
    }

    #[tokio::test]
    async fn test_root_policy() {
        let repo = repository().with_children_resolve(ChildrenResolve::Root);
        let (_, b, c) = abc(&repo).await;

        repo.resolve_children(std::slice::from_ref(&b)).await.unwrap();
        let c = repo.find_one(c.id, TrashMode::None).await.unwrap().unwrap();
        assert_eq!(c.parent_id, None);
    }

    #[tokio::test]
    async fn test_delete_policy_leaves_links() {
        let repo: TreeRepository<Comment, InMemoryBackend<Comment>> =
            TreeRepository::new(InMemoryBackend::new())
                .with_order(Some(OrderBy::column("created_at")));
        let post = uuid::Uuid::new_v4();
        let top = repo.insert(&Comment::new(post, "top", None)).await.unwrap();
        let reply = repo.insert(&Comment::new(post, "reply", Some(top.id))).await.unwrap();

        repo.resolve_children(std::slice::from_ref(&top)).await.unwrap();
        let reply = repo.find_one(reply.id, TrashMode::None).await.unwrap().unwrap();
        assert_eq!(reply.parent_id, Some(top.id));
    }

    #[tokio::test]
    async fn test_paginate_flattened_listing() {
        let repo = repository();
        for i in 0..25 {
            insert(&repo, &format!("c{i}"), None, i).await;
        }

        let page = repo.paginate(&FindOptions::new(), &PageOptions::new(3, 10)).await.unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items[0].item.custom_order, 20);
        assert_eq!(page.meta.total_pages, 3);
    }

    #[tokio::test]
    async fn test_list_ids_reaches_nodes_under_trashed_ancestors() {
        let repo = repository();
        let (a, b, c) = abc(&repo).await;
        repo.soft_remove(&[b.id]).await.unwrap();

        let listed = repo.list_ids(&[a.id, c.id, b.id]).await.unwrap();
        let shape: Vec<_> = listed.iter().map(|n| (n.id(), n.depth, n.parent)).collect();
        assert_eq!(shape, vec![(a.id, 0, None), (c.id, 2, Some(b.id))]);
    }

    #[test]
    fn test_flatten_empty_forest() {
        assert!(to_flat_trees::<Category>(Vec::new()).is_empty());
    }
}
