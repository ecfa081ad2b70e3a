pub mod item;
pub mod preference;
pub mod recommendation;
pub mod taste;
