//! Category display formatting

use crate::models::{Category, CategoryKind};

/// Categories as a tree with an Expense and an Income branch
pub fn format_category_tree(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.\n\nRun 'fintrack init' to create the built-in categories."
            .to_string();
    }

    let mut output = String::new();
    for (i, kind) in [CategoryKind::Expense, CategoryKind::Income].into_iter().enumerate() {
        let branch: Vec<&Category> = categories.iter().filter(|c| c.kind == kind).collect();
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&format!("{}\n", kind));

        if branch.is_empty() {
            output.push_str("  (no categories)\n");
            continue;
        }
        for (j, category) in branch.iter().enumerate() {
            let prefix = if j == branch.len() - 1 { "└── " } else { "├── " };
            let mut flags = Vec::new();
            if !category.is_builtin() {
                flags.push("custom");
            }
            if category.archived {
                flags.push("archived");
            }
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!(" ({})", flags.join(", "))
            };
            output.push_str(&format!("  {}{}{}\n", prefix, category.name, flags));
        }
    }

    output
}

/// Flat list with short IDs, for picking a category by ID
pub fn format_category_list(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.".to_string();
    }

    let name_width = categories
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<10}  {:<name_width$}  {:<8}  {}\n",
        "ID",
        "Name",
        "Kind",
        "Owner",
        name_width = name_width
    ));
    for category in categories {
        output.push_str(&format!(
            "{:<10}  {:<name_width$}  {:<8}  {}\n",
            category.id,
            category.name,
            category.kind,
            if category.is_builtin() { "built-in" } else { "you" },
            name_width = name_width
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;

    #[test]
    fn test_category_tree() {
        let mut pets = Category::new("Pets", CategoryKind::Expense, UserId::new());
        pets.archived = true;
        let categories = vec![
            Category::builtin("Groceries", CategoryKind::Expense),
            pets,
            Category::builtin("Salary", CategoryKind::Income),
        ];

        let tree = format_category_tree(&categories);
        assert!(tree.contains("├── Groceries"));
        assert!(tree.contains("└── Pets (custom, archived)"));
        assert!(tree.contains("Income\n  └── Salary"));
    }

    #[test]
    fn test_empty_tree() {
        assert!(format_category_tree(&[]).contains("fintrack init"));
    }
}
