mod executor;
mod launcher;

pub use executor::{Executor, Streams};
