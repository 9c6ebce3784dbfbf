//! In-memory view of the category hierarchy.
//!
//! The tree is built once per request from a bulk fetch of the category
//! table and then traversed without touching the database again. Every
//! traversal tracks the nodes it has visited, so a corrupted parent chain
//! surfaces as [`CoreError::CyclicHierarchy`] instead of an endless loop.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::catalog::Category;
use crate::CoreError;

/// Separator used when rendering a category path for display.
pub const PATH_SEPARATOR: &str = " / ";

#[derive(Debug, Default, Clone)]
pub struct CategoryTree {
    nodes: HashMap<i64, Category>,
    children: HashMap<i64, Vec<i64>>,
    /// Ids in the order the categories were supplied.
    order: Vec<i64>,
}

impl CategoryTree {
    /// Index `categories` by id and by parent.
    ///
    /// Later duplicates of an id already seen are ignored.
    pub fn from_categories<I>(categories: I) -> Self
    where
        I: IntoIterator<Item = Category>,
    {
        let mut tree = Self::default();
        for category in categories {
            if tree.nodes.contains_key(&category.id) {
                continue;
            }
            if let Some(parent_id) = category.parent_id {
                tree.children.entry(parent_id).or_default().push(category.id);
            }
            tree.order.push(category.id);
            tree.nodes.insert(category.id, category);
        }
        tree
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: i64) -> Option<&Category> {
        self.nodes.get(&id)
    }

    /// All categories in the order they were supplied.
    pub fn iter(&self) -> impl Iterator<Item = &Category> + '_ {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Categories without a parent.
    #[must_use]
    pub fn roots(&self) -> Vec<&Category> {
        self.iter().filter(|c| c.parent_id.is_none()).collect()
    }

    /// Direct children of `id`, in supply order.
    pub fn children(&self, id: i64) -> impl Iterator<Item = &Category> + '_ {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.nodes.get(child))
    }

    fn node(&self, id: i64) -> Result<&Category, CoreError> {
        self.nodes.get(&id).ok_or(CoreError::NotFound {
            entity: "category",
            id,
        })
    }

    /// Ids of `id` and every category below it.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if `id` is unknown, [`CoreError::CyclicHierarchy`]
    /// if a node is reached twice.
    pub fn descendant_ids(&self, id: i64) -> Result<BTreeSet<i64>, CoreError> {
        self.node(id)?;

        let mut visited = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                return Err(CoreError::CyclicHierarchy {
                    category_id: current,
                });
            }
            if let Some(kids) = self.children.get(&current) {
                stack.extend(kids.iter().rev().copied());
            }
        }
        Ok(visited)
    }

    /// Names from the root ancestor down to `id`.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if `id` or an ancestor is unknown,
    /// [`CoreError::CyclicHierarchy`] if the parent chain loops.
    pub fn full_path(&self, id: i64) -> Result<Vec<String>, CoreError> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        let mut current = self.node(id)?;
        loop {
            if !seen.insert(current.id) {
                return Err(CoreError::CyclicHierarchy {
                    category_id: current.id,
                });
            }
            names.push(current.name.clone());
            match current.parent_id {
                Some(parent_id) => current = self.node(parent_id)?,
                None => break,
            }
        }
        names.reverse();
        Ok(names)
    }

    /// [`full_path`](Self::full_path) joined for display, e.g.
    /// `"Electronics / Phones / Smartphones"`.
    ///
    /// # Errors
    ///
    /// Same as [`full_path`](Self::full_path).
    pub fn display_path(&self, id: i64) -> Result<String, CoreError> {
        Ok(self.full_path(id)?.join(PATH_SEPARATOR))
    }

    /// Categories that may be chosen as the parent of `editing`.
    ///
    /// When creating (`None`) every category is allowed. When editing, the
    /// category itself and all of its descendants are excluded.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`descendant_ids`](Self::descendant_ids).
    pub fn allowed_parents(&self, editing: Option<i64>) -> Result<Vec<&Category>, CoreError> {
        let Some(id) = editing else {
            return Ok(self.iter().collect());
        };
        let excluded = self.descendant_ids(id)?;
        Ok(self.iter().filter(|c| !excluded.contains(&c.id)).collect())
    }

    /// Check that `parent_id` may become the parent of `category_id`.
    ///
    /// `category_id` is `None` for a category that does not exist yet.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if the parent is unknown,
    /// [`CoreError::InvalidParent`] if it is the category itself or one of
    /// its descendants.
    pub fn validate_parent(
        &self,
        category_id: Option<i64>,
        parent_id: Option<i64>,
    ) -> Result<(), CoreError> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        self.node(parent_id)?;

        if let Some(id) = category_id {
            if self.descendant_ids(id)?.contains(&parent_id) {
                return Err(CoreError::InvalidParent {
                    category_id: id,
                    parent_id,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn cat(id: i64, name: &str, parent_id: Option<i64>) -> Category {
        Category {
            id,
            name: name.to_string(),
            parent_id,
            description: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Electronics(1) → Phones(2) → Smartphones(3); Electronics → Laptops(4);
    /// Clothing(5) is a second root.
    fn sample_tree() -> CategoryTree {
        CategoryTree::from_categories(vec![
            cat(1, "Electronics", None),
            cat(2, "Phones", Some(1)),
            cat(3, "Smartphones", Some(2)),
            cat(4, "Laptops", Some(1)),
            cat(5, "Clothing", None),
        ])
    }

    fn ids(categories: &[&Category]) -> Vec<i64> {
        categories.iter().map(|c| c.id).collect()
    }

    #[test]
    fn descendant_ids_includes_self_and_all_levels() {
        let tree = sample_tree();
        let ids: Vec<i64> = tree.descendant_ids(1).expect("descendants").into_iter().collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn descendant_ids_of_leaf_is_just_itself() {
        let tree = sample_tree();
        let ids: Vec<i64> = tree.descendant_ids(3).expect("descendants").into_iter().collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn descendant_ids_is_superset_of_each_child() {
        let tree = sample_tree();
        for category in tree.iter() {
            let own = tree.descendant_ids(category.id).expect("descendants");
            assert!(own.contains(&category.id));
            for child in tree.children(category.id) {
                let child_set = tree.descendant_ids(child.id).expect("child descendants");
                assert!(
                    child_set.is_subset(&own),
                    "descendants of {} not contained in {}",
                    child.id,
                    category.id
                );
            }
        }
    }

    #[test]
    fn descendant_ids_unknown_category_is_not_found() {
        let tree = sample_tree();
        assert_eq!(
            tree.descendant_ids(99),
            Err(CoreError::NotFound {
                entity: "category",
                id: 99
            })
        );
    }

    #[test]
    fn descendant_ids_detects_cycle() {
        let tree = CategoryTree::from_categories(vec![
            cat(1, "A", Some(3)),
            cat(2, "B", Some(1)),
            cat(3, "C", Some(2)),
        ]);
        assert!(matches!(
            tree.descendant_ids(1),
            Err(CoreError::CyclicHierarchy { .. })
        ));
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let tree = CategoryTree::from_categories(vec![cat(1, "Loop", Some(1))]);
        assert_eq!(
            tree.descendant_ids(1),
            Err(CoreError::CyclicHierarchy { category_id: 1 })
        );
        assert_eq!(
            tree.full_path(1),
            Err(CoreError::CyclicHierarchy { category_id: 1 })
        );
    }

    #[test]
    fn full_path_walks_from_root() {
        let tree = sample_tree();
        assert_eq!(
            tree.full_path(3).expect("path"),
            vec!["Electronics", "Phones", "Smartphones"]
        );
        assert_eq!(
            tree.display_path(3).expect("path"),
            "Electronics / Phones / Smartphones"
        );
    }

    #[test]
    fn full_path_of_root_is_its_name() {
        let tree = sample_tree();
        assert_eq!(tree.display_path(5).expect("path"), "Clothing");
    }

    #[test]
    fn full_path_detects_cycle_above_node() {
        // 3 hangs below a 1 <-> 2 loop.
        let tree = CategoryTree::from_categories(vec![
            cat(1, "A", Some(2)),
            cat(2, "B", Some(1)),
            cat(3, "Leaf", Some(1)),
        ]);
        assert!(matches!(
            tree.full_path(3),
            Err(CoreError::CyclicHierarchy { .. })
        ));
    }

    #[test]
    fn full_path_with_dangling_parent_is_not_found() {
        let tree = CategoryTree::from_categories(vec![cat(2, "Orphan", Some(1))]);
        assert_eq!(
            tree.full_path(2),
            Err(CoreError::NotFound {
                entity: "category",
                id: 1
            })
        );
    }

    #[test]
    fn allowed_parents_for_new_category_is_everything() {
        let tree = sample_tree();
        let allowed = tree.allowed_parents(None).expect("allowed");
        assert_eq!(ids(&allowed), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn allowed_parents_excludes_self_and_descendants() {
        let tree = sample_tree();
        let allowed = tree.allowed_parents(Some(2)).expect("allowed");
        assert_eq!(ids(&allowed), vec![1, 4, 5]);
    }

    #[test]
    fn allowed_parents_never_overlaps_descendants() {
        let tree = sample_tree();
        for category in tree.iter() {
            let excluded = tree.descendant_ids(category.id).expect("descendants");
            let allowed = tree.allowed_parents(Some(category.id)).expect("allowed");
            assert!(allowed.iter().all(|c| !excluded.contains(&c.id)));
        }
    }

    #[test]
    fn validate_parent_rejects_descendant() {
        let tree = sample_tree();
        assert_eq!(
            tree.validate_parent(Some(1), Some(3)),
            Err(CoreError::InvalidParent {
                category_id: 1,
                parent_id: 3
            })
        );
        assert_eq!(
            tree.validate_parent(Some(2), Some(2)),
            Err(CoreError::InvalidParent {
                category_id: 2,
                parent_id: 2
            })
        );
    }

    #[test]
    fn validate_parent_accepts_unrelated_and_clearing() {
        let tree = sample_tree();
        assert_eq!(tree.validate_parent(Some(2), Some(5)), Ok(()));
        assert_eq!(tree.validate_parent(Some(2), None), Ok(()));
        assert_eq!(tree.validate_parent(None, Some(3)), Ok(()));
    }

    #[test]
    fn validate_parent_rejects_unknown_parent() {
        let tree = sample_tree();
        assert!(matches!(
            tree.validate_parent(None, Some(42)),
            Err(CoreError::NotFound { id: 42, .. })
        ));
    }

    #[test]
    fn roots_lists_every_parentless_category() {
        let tree = sample_tree();
        assert_eq!(ids(&tree.roots()), vec![1, 5]);
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let tree = CategoryTree::from_categories(vec![cat(1, "First", None), cat(1, "Second", None)]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(1).map(|c| c.name.as_str()), Some("First"));
    }
}
