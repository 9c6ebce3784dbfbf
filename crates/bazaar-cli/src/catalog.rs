//! `catalog` command handlers.

use bazaar_core::{Category, CategoryTree};

/// One line per category, `id<TAB>path`, in id order.
///
/// # Errors
///
/// Fails if any category's ancestry loops back on itself.
pub(crate) fn render_tree(tree: &CategoryTree) -> anyhow::Result<Vec<String>> {
    tree.iter()
        .map(|category| {
            let path = tree.display_path(category.id)?;
            Ok(format!("{}\t{path}", category.id))
        })
        .collect()
}

pub(crate) async fn run_tree(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let rows = bazaar_db::list_categories(pool).await?;
    let tree = CategoryTree::from_categories(rows.into_iter().map(Category::from));

    if tree.is_empty() {
        println!("no categories");
        return Ok(());
    }
    for line in render_tree(&tree)? {
        println!("{line}");
    }
    Ok(())
}
