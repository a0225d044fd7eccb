pub mod cache;
pub mod club;
pub mod cms;
pub mod error;
pub mod news;
pub mod quiz;
pub mod race;
pub mod weather;
