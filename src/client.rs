mod store_client;
mod unsubscribe_client;

pub use store_client::{RestMemberStore, StoreApiKey};
pub use unsubscribe_client::{UnsubscribeClient, UnsubscribeReply};
