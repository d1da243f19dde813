pub mod extract;
pub mod hide;
pub mod info;
pub mod search;
