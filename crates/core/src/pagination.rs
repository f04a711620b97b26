//! Page-number pagination for list endpoints.
//!
//! Clients send a single 1-indexed `page` parameter. The server knows the
//! page size and the total count, and reports the resulting page window.

use serde::Serialize;

/// Page window reported alongside list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_records_count: i64,
    pub records_per_page: i64,
    pub current_page: i64,
    pub total_pages: i64,
    pub next_page: Option<i64>,
    pub prev_page: Option<i64>,
}

/// Parse the raw `page` parameter. Absent, non-numeric and non-positive
/// values all mean page 1.
pub fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

impl Pagination {
    /// Compute the window for `requested_page`, clamped to `1..=total_pages`.
    pub fn compute(total_records_count: i64, records_per_page: i64, requested_page: i64) -> Self {
        let records_per_page = records_per_page.max(1);
        let total_records_count = total_records_count.max(0);
        let total_pages = (total_records_count + records_per_page - 1) / records_per_page;
        let current_page = requested_page.clamp(1, total_pages.max(1));

        Self {
            total_records_count,
            records_per_page,
            current_page,
            total_pages,
            next_page: (current_page < total_pages).then_some(current_page + 1),
            prev_page: (current_page >= 2).then_some(current_page - 1),
        }
    }

    /// Row offset of the first record on the current page.
    pub fn offset(&self) -> i64 {
        (self.current_page - 1) * self.records_per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_of_three() {
        let p = Pagination::compute(25, 10, 1);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.next_page, Some(2));
        assert_eq!(p.prev_page, None);
    }

    #[test]
    fn last_page_of_three() {
        let p = Pagination::compute(25, 10, 3);
        assert_eq!(p.offset(), 20);
        assert_eq!(p.next_page, None);
        assert_eq!(p.prev_page, Some(2));
    }

    #[test]
    fn out_of_range_pages_clamp() {
        assert_eq!(Pagination::compute(25, 10, parse_page(Some("0"))).current_page, 1);
        assert_eq!(Pagination::compute(25, 10, parse_page(Some("abc"))).current_page, 1);
        assert_eq!(Pagination::compute(25, 10, parse_page(None)).current_page, 1);
        assert_eq!(Pagination::compute(25, 10, 9).current_page, 3);
    }

    #[test]
    fn empty_result_set_is_page_one() {
        let p = Pagination::compute(0, 10, 4);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.next_page, None);
        assert_eq!(p.prev_page, None);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(Pagination::compute(25, 10, 2)).unwrap();
        assert_eq!(json["totalRecordsCount"], 25);
        assert_eq!(json["recordsPerPage"], 10);
        assert_eq!(json["currentPage"], 2);
        assert_eq!(json["nextPage"], 3);
        assert_eq!(json["prevPage"], 1);
    }
}
