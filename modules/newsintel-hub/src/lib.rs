pub mod hub;

pub use hub::{PushHub, SinkHandle};
