pub mod assignment;
pub mod attempt;
pub mod question;
pub mod quiz;
pub mod result_log;
