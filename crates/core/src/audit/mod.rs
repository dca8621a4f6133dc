mod events;
mod sqlite;
mod store;
mod writer;

pub use events::*;
pub use sqlite::*;
pub use store::*;
pub use writer::*;
