pub mod book;
pub mod goal;
pub mod library;
pub mod recap;
pub mod user;
