//! Page arithmetic

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Requested page, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub index: usize,
    pub size: usize,
}

impl PageRequest {
    /// Build a request. A zero size is rejected; a zero index means the first page.
    pub fn new(index: usize, size: usize) -> CoreResult<Self> {
        if size == 0 {
            return Err(CoreError::InvalidPageSize { size });
        }
        Ok(Self {
            index: index.max(1),
            size,
        })
    }

    pub fn first(size: usize) -> CoreResult<Self> {
        Self::new(1, size)
    }

    /// Clamp the index into `[1, total_pages(count, size)]`
    pub fn clamp(self, count: usize) -> Self {
        Self {
            index: self.index.clamp(1, total_pages(count, self.size)),
            size: self.size,
        }
    }
}

/// Number of pages for `count` items; an empty list still has one page
pub fn total_pages(count: usize, size: usize) -> usize {
    let size = size.max(1);
    ((count + size - 1) / size).max(1)
}

/// Resolved page returned with every list result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub index: usize,
    pub size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl PageInfo {
    pub fn has_previous(&self) -> bool {
        self.index > 1
    }

    pub fn has_next(&self) -> bool {
        self.index < self.total_pages
    }

    /// 1-based position of the first item on the page (0 when empty)
    pub fn first_item(&self) -> usize {
        if self.total_items == 0 {
            0
        } else {
            (self.index - 1) * self.size + 1
        }
    }

    /// 1-based position of the last item on the page (0 when empty)
    pub fn last_item(&self) -> usize {
        (self.index * self.size).min(self.total_items)
    }
}

/// Clamp the request and slice out one page
pub fn paginate<T>(items: &[T], request: PageRequest) -> (&[T], PageInfo) {
    let request = request.clamp(items.len());
    let start = ((request.index - 1) * request.size).min(items.len());
    let end = (start + request.size).min(items.len());

    let info = PageInfo {
        index: request.index,
        size: request.size,
        total_items: items.len(),
        total_pages: total_pages(items.len(), request.size),
    };
    (&items[start..end], info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(15, 10), 2);
        assert_eq!(total_pages(3, 1), 3);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(PageRequest::new(1, 0), Err(CoreError::InvalidPageSize { size: 0 })));
        assert_eq!(PageRequest::new(0, 5).unwrap().index, 1);
    }

    #[test]
    fn test_clamp_bounds() {
        for count in 0..40 {
            for size in 1..7 {
                for index in 0..12 {
                    let clamped = PageRequest { index, size }.clamp(count);
                    assert!(clamped.index >= 1);
                    assert!(clamped.index <= total_pages(count, size));
                }
            }
        }
    }

    #[test]
    fn test_journal_fifteen_items() {
        let items: Vec<u32> = (1..=15).collect();
        let (page1, info) = paginate(&items, PageRequest::new(1, 10).unwrap());
        assert_eq!(page1.len(), 10);
        assert_eq!(info.total_pages, 2);
        assert!(info.has_next());
        let (page2, info) = paginate(&items, PageRequest::new(2, 10).unwrap());
        assert_eq!(page2, &[11, 12, 13, 14, 15]);
        assert_eq!((info.first_item(), info.last_item()), (11, 15));
        assert!(!info.has_next());
    }

    #[test]
    fn test_page_beyond_end_is_clamped() {
        let items: Vec<u32> = (1..=5).collect();
        let (page, info) = paginate(&items, PageRequest::new(9, 2).unwrap());
        assert_eq!(page, &[5]);
        assert_eq!(info.index, 3);
    }

    #[test]
    fn test_pages_cover_sequence() {
        let items: Vec<u32> = (0..23).collect();
        let size = 4;
        let pages = total_pages(items.len(), size);
        let mut rebuilt = Vec::new();
        for index in 1..=pages {
            let (slice, _) = paginate(&items, PageRequest::new(index, size).unwrap());
            rebuilt.extend_from_slice(slice);
        }
        assert_eq!(rebuilt, items);
    }

    #[test]
    fn test_empty_list_single_page() {
        let items: Vec<u32> = vec![];
        let (page, info) = paginate(&items, PageRequest::new(3, 10).unwrap());
        assert!(page.is_empty());
        assert_eq!(info.index, 1);
        assert_eq!(info.total_pages, 1);
        assert_eq!((info.first_item(), info.last_item()), (0, 0));
    }
}
