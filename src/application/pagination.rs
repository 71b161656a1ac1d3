//! Page-window arithmetic shared by the listing views.

/// The LIMIT/OFFSET window and page count for one listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u32,
    pub offset: u32,
    pub total_pages: u32,
}

impl PageWindow {
    /// Compute the window for 1-based `page`. `total_pages` is at least 1
    /// even for an empty store, so "page 1 of 1" always renders.
    pub fn compute(page: u32, per_page: u32, total: u64) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total
            .div_ceil(u64::from(per_page))
            .clamp(1, u64::from(u32::MAX)) as u32;
        let page = page.max(1);
        let offset = page.saturating_sub(1).saturating_mul(per_page);

        Self {
            limit: per_page,
            offset,
            total_pages,
        }
    }
}

/// Boundary page an out-of-range request must be redirected to, or `None`
/// when the requested page is valid. Only the dashboard applies this; the
/// public listing views intentionally serve whatever window the arithmetic
/// yields.
pub fn clamp_page(page: i64, total_pages: u32) -> Option<u32> {
    if page < 1 {
        Some(1)
    } else if page > i64::from(total_pages) {
        Some(total_pages)
    } else {
        None
    }
}

/// Coerce a raw `?page=` query value into the 1-based page number the
/// non-clamping views use.
pub fn sanitize_page(page: Option<i64>) -> u32 {
    match page {
        Some(value) if value >= 1 => value.min(i64::from(u32::MAX)) as u32,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_still_has_one_page() {
        let window = PageWindow::compute(1, 5, 0);
        assert_eq!(window.total_pages, 1);
        assert_eq!(window.offset, 0);
        assert_eq!(window.limit, 5);
    }

    #[test]
    fn second_page_of_twelve_rows() {
        let window = PageWindow::compute(2, 5, 12);
        assert_eq!(window.offset, 5);
        assert_eq!(window.total_pages, 3);
    }

    #[test]
    fn exact_multiple_has_no_partial_page() {
        assert_eq!(PageWindow::compute(1, 5, 10).total_pages, 2);
        assert_eq!(PageWindow::compute(1, 5, 11).total_pages, 3);
    }

    #[test]
    fn clamp_redirects_to_nearest_boundary() {
        assert_eq!(clamp_page(9, 3), Some(3));
        assert_eq!(clamp_page(0, 3), Some(1));
        assert_eq!(clamp_page(-4, 3), Some(1));
        assert_eq!(clamp_page(2, 3), None);
        assert_eq!(clamp_page(3, 3), None);
    }

    #[test]
    fn sanitize_page_floors_at_one() {
        assert_eq!(sanitize_page(None), 1);
        assert_eq!(sanitize_page(Some(-3)), 1);
        assert_eq!(sanitize_page(Some(7)), 7);
    }
}
