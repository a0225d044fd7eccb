pub mod club;
pub mod cms;
pub mod news;
pub mod quiz;
pub mod race;
pub mod standings;
pub mod weather;
