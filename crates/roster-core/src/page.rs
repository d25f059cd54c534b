//! Page-number handling for paginated listings.
//!
//! A missing or non-numeric page parameter yields the first page; a number
//! outside `1..=num_pages` clamps to the last page. Listings never fail on a
//! bad page parameter.

use serde::Serialize;

/// Page size of the general listing.
pub const HOME_PAGE_SIZE: usize = 5;

/// Page size of the per-department listing.
pub const DEPARTMENT_PAGE_SIZE: usize = 10;

/// Number of pages needed for `total` items. An empty set still has one page.
pub fn num_pages(total: u64, page_size: usize) -> usize {
  let size = page_size.max(1) as u64;
  total.div_ceil(size).max(1) as usize
}

/// Resolve a raw `?page=` value against the number of available pages.
pub fn resolve(raw: Option<&str>, num_pages: usize) -> usize {
  let last = num_pages.max(1);
  let Some(raw) = raw.map(str::trim) else { return 1 };
  match raw.parse::<i64>() {
    Ok(n) if n >= 1 => usize::try_from(n).map_or(last, |n| n.min(last)),
    Ok(_) => last,
    // Still an integer, just too large for i64.
    Err(_) if is_integer(raw) => last,
    Err(_) => 1,
  }
}

fn is_integer(s: &str) -> bool {
  let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
  !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub items:        Vec<T>,
  /// 1-based page number actually served.
  pub number:       usize,
  pub page_size:    usize,
  pub num_pages:    usize,
  pub total_items:  u64,
  pub has_previous: bool,
  pub has_next:     bool,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, number: usize, page_size: usize, total_items: u64) -> Self {
    let num_pages = num_pages(total_items, page_size);
    Self {
      items,
      number,
      page_size,
      num_pages,
      total_items,
      has_previous: number > 1,
      has_next: number < num_pages,
    }
  }
}

/// Offset of the first item on page `number`.
pub fn offset(number: usize, page_size: usize) -> usize {
  number.saturating_sub(1) * page_size
}
