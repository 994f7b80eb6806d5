//! Category grouping and keyboard navigation over the catalog.

use folio_core::{BookId, BookRecord, Catalog, CategoryRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup<'a> {
    pub category: &'a CategoryRecord,
    pub books: Vec<&'a BookRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Groups books by category in category declaration order, keeping catalog order inside a group.
pub fn group_by_category(catalog: &Catalog) -> Vec<CategoryGroup<'_>> {
    catalog
        .categories()
        .iter()
        .map(|category| CategoryGroup {
            category,
            books: catalog.books_in_category(&category.name).collect(),
        })
        .collect()
}

fn locate(groups: &[CategoryGroup<'_>], id: &BookId) -> Option<(usize, usize)> {
    groups.iter().enumerate().find_map(|(g, group)| {
        group
            .books
            .iter()
            .position(|book| &book.id == id)
            .map(|i| (g, i))
    })
}

fn first_book(groups: &[CategoryGroup<'_>]) -> Option<BookId> {
    groups
        .iter()
        .find_map(|group| group.books.first())
        .map(|book| book.id.clone())
}

/// The book focused after moving from `current` in `direction`.
///
/// Left/right walk within a row and wrap into neighbouring rows; up/down jump
/// to the nearest column of the previous/next non-empty row. An unknown or
/// missing `current` lands on the first book.
pub fn grid_neighbor(
    groups: &[CategoryGroup<'_>],
    current: Option<&BookId>,
    direction: NavDirection,
) -> Option<BookId> {
    let Some((g, i)) = current.and_then(|id| locate(groups, id)) else {
        return first_book(groups);
    };

    let flat: Vec<(usize, usize)> = groups
        .iter()
        .enumerate()
        .flat_map(|(g, group)| (0..group.books.len()).map(move |i| (g, i)))
        .collect();
    let pos = flat.iter().position(|&slot| slot == (g, i))?;

    let target = match direction {
        NavDirection::Left => pos.checked_sub(1).and_then(|p| flat.get(p)).copied(),
        NavDirection::Right => flat.get(pos + 1).copied(),
        NavDirection::Up => (0..g)
            .rev()
            .find(|&row| !groups[row].books.is_empty())
            .map(|row| (row, i.min(groups[row].books.len() - 1))),
        NavDirection::Down => (g + 1..groups.len())
            .find(|&row| !groups[row].books.is_empty())
            .map(|row| (row, i.min(groups[row].books.len() - 1))),
    };

    target
        .map(|(g, i)| groups[g].books[i].id.clone())
        .or_else(|| Some(groups[g].books[i].id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Rgb;

    fn catalog() -> Catalog {
        let category = |name: &str, level| CategoryRecord {
            name: name.to_string(),
            accent_color: Rgb(0, 0, 0),
            shelf_level: level,
        };
        let book = |id: &str, cat: &str| BookRecord {
            id: BookId::new(id),
            title: id.to_string(),
            category: cat.to_string(),
            cover_image_ref: String::new(),
            content_ref: String::new(),
            tags: Vec::new(),
            spatial_position: [0.0; 3],
            spatial_rotation: [0.0; 3],
            accent_color: Rgb(0, 0, 0),
            description: None,
        };
        Catalog::new(
            vec![category("x", 1), category("empty", 2), category("y", 0)],
            vec![book("a", "y"), book("b", "x"), book("c", "y"), book("d", "x"), book("e", "y")],
        )
        .unwrap()
    }

    fn ids(group: &CategoryGroup<'_>) -> Vec<String> {
        group.books.iter().map(|b| b.id.to_string()).collect()
    }

    #[test]
    fn groups_partition_catalog_in_order() {
        let catalog = catalog();
        let groups = group_by_category(&catalog);
        assert_eq!(groups.len(), 3);
        assert_eq!(ids(&groups[0]), vec!["b", "d"]);
        assert!(groups[1].books.is_empty());
        assert_eq!(ids(&groups[2]), vec!["a", "c", "e"]);

        let total: usize = groups.iter().map(|g| g.books.len()).sum();
        assert_eq!(total, catalog.len());
        for book in catalog.books() {
            let count = groups
                .iter()
                .filter(|g| g.books.iter().any(|b| b.id == book.id))
                .count();
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn neighbor_walks_rows_and_skips_empty_groups() {
        let catalog = catalog();
        let groups = group_by_category(&catalog);
        let id = |s: &str| BookId::new(s);

        assert_eq!(grid_neighbor(&groups, None, NavDirection::Right), Some(id("b")));
        assert_eq!(
            grid_neighbor(&groups, Some(&id("ghost")), NavDirection::Down),
            Some(id("b"))
        );
        assert_eq!(grid_neighbor(&groups, Some(&id("b")), NavDirection::Right), Some(id("d")));
        assert_eq!(grid_neighbor(&groups, Some(&id("d")), NavDirection::Right), Some(id("a")));
        assert_eq!(grid_neighbor(&groups, Some(&id("a")), NavDirection::Left), Some(id("d")));
        assert_eq!(grid_neighbor(&groups, Some(&id("b")), NavDirection::Left), Some(id("b")));
        assert_eq!(grid_neighbor(&groups, Some(&id("d")), NavDirection::Down), Some(id("c")));
        assert_eq!(grid_neighbor(&groups, Some(&id("e")), NavDirection::Up), Some(id("d")));
        assert_eq!(grid_neighbor(&groups, Some(&id("e")), NavDirection::Down), Some(id("e")));
    }
}
