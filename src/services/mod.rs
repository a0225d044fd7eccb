pub mod cms;
pub mod countdown;
pub mod schedule;
