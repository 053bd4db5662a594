pub mod lock;
pub mod time;
