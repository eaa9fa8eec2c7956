pub mod fixture;
pub mod newsapi;
