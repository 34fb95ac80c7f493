pub mod remote;

pub use remote::{FakeRemote, RemoteCall};
