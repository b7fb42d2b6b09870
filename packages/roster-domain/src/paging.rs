use serde::Serialize;

use crate::{Error, Result};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
	pub page: u32,
	pub per_page: u32,
}
impl Pagination {
	pub fn new(page: Option<u32>, per_page: Option<u32>, max_per_page: u32) -> Result<Self> {
		let page = page.unwrap_or(DEFAULT_PAGE);
		let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE.min(max_per_page));

		if page == 0 {
			return Err(Error::InvalidInput { message: "page must be at least 1.".to_string() });
		}
		if per_page == 0 {
			return Err(Error::InvalidInput {
				message: "perPage must be at least 1.".to_string(),
			});
		}
		if per_page > max_per_page {
			return Err(Error::InvalidInput {
				message: format!("perPage must not exceed {max_per_page}."),
			});
		}

		Ok(Self { page, per_page })
	}

	/// Returns the page slice of `items`, clamped to its bounds.
	pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
		let start = (self.page as usize - 1).saturating_mul(self.per_page as usize);

		if start >= items.len() {
			return Vec::new();
		}

		items.into_iter().skip(start).take(self.per_page as usize).collect()
	}

	pub fn total_pages(&self, total: u64) -> u64 {
		total.div_ceil(u64::from(self.per_page))
	}
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
	pub total: u64,
	pub page: u32,
	pub per_page: u32,
	pub result: Vec<T>,
}
impl<T> Page<T> {
	pub fn empty(pagination: Pagination) -> Self {
		Self { total: 0, page: pagination.page, per_page: pagination.per_page, result: Vec::new() }
	}

	/// Slices `items` for `pagination` without touching `total`.
	pub fn from_window(total: u64, items: Vec<T>, pagination: Pagination) -> Self {
		Self {
			total,
			page: pagination.page,
			per_page: pagination.per_page,
			result: pagination.slice(items),
		}
	}

	pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
		Page {
			total: self.total,
			page: self.page,
			per_page: self.per_page,
			result: self.result.into_iter().map(f).collect(),
		}
	}
}
