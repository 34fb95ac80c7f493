pub mod key_value_store;
pub mod remote_datastore;

pub use key_value_store::KeyValueStore;
pub use remote_datastore::{Record, RemoteDatastore};
