//! This module contains the data models for the seekwatch application.

pub mod history;
pub mod product;
pub mod report;
pub mod snapshot;

pub use history::ProductHistory;
pub use product::{ProductId, ProductSummary};
pub use report::{GroupId, Report};
pub use snapshot::{FullSnapshot, KeptSnapshot, Price, SizeLabel, SizeQuote};

use serde::{Deserialize, Serialize};

/// How a product entered the current processing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// First time this product id has ever been observed.
    NewProduct,
    /// Known product whose remote freshness marker (`updateTime`) changed.
    Updated,
}
