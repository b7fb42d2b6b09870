pub mod fields;
pub mod identity;
pub mod models;
pub mod paging;
pub mod rating;
pub mod skills;
pub mod sort;
pub mod time_serde;
pub mod visibility;

mod error;

pub use error::{Error, Result};
