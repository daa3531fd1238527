pub mod config;
pub mod error;
pub mod filter;
pub mod listing;
pub mod notice;
pub mod schema;
pub mod session;

pub use error::ClientError;
pub use filter::{ListQuery, ListRecord, Selection, SortSpec, SortValue};
pub use listing::{Applied, CollectionSource, RemoteFilter, ResourceList};
pub use notice::Notice;
