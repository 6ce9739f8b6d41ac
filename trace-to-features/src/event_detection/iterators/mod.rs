pub mod event;

pub use event::{EventFilter, EventIter};
