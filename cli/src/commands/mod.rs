pub mod fetch;
pub mod join;
pub mod search;
pub mod sources;
