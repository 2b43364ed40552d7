//! Page-number pagination over an already ordered list.

use serde::Serialize;

use crate::error::DomainError;

/// Default number of posts per page.
pub const DEFAULT_PER_PAGE: usize = 10;

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number.
    pub number: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub num_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            per_page: self.per_page,
            total_items: self.total_items,
            num_pages: self.num_pages,
        }
    }
}

/// Cut page `number` out of `items`.
///
/// Page 1 always exists, even for an empty list. Any other page outside
/// `1..=num_pages` is not found.
pub fn paginate<T>(items: Vec<T>, number: usize, per_page: usize) -> Result<Page<T>, DomainError> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let num_pages = total_items.div_ceil(per_page).max(1);

    if number == 0 || number > num_pages {
        return Err(DomainError::not_found("page", number));
    }

    let items = items
        .into_iter()
        .skip((number - 1) * per_page)
        .take(per_page)
        .collect();

    Ok(Page {
        items,
        number,
        per_page,
        total_items,
        num_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page() {
        let page = paginate((1..=25).collect(), 1, 10).unwrap();

        assert_eq!(page.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(page.num_pages, 3);
        assert_eq!(page.total_items, 25);
        assert!(page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn test_last_page_is_partial() {
        let page = paginate((1..=25).collect(), 3, 10).unwrap();

        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn test_empty_list_has_one_empty_page() {
        let page = paginate(Vec::<u8>::new(), 1, 10).unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.num_pages, 1);
    }

    #[test]
    fn test_out_of_range_pages_are_not_found() {
        assert!(matches!(
            paginate((1..=5).collect::<Vec<_>>(), 2, 10),
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            paginate((1..=5).collect::<Vec<_>>(), 0, 10),
            Err(DomainError::NotFound { .. })
        ));
    }
}
