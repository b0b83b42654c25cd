mod client;
mod queries;

pub use client::{DataServiceClient, DataServiceError};
pub use queries::{CreatedUser, StoredUser};
