//! Data providers: marketplace HTTP client, session handling and detail-page
//! extraction.

pub mod extract;
pub mod http;
pub mod session;
pub mod traits;

pub use extract::PageExtractor;
pub use http::MarketplaceClient;
pub use session::{SessionProvider, SharedSession};
pub use traits::{DataSource, DataSourceError};
