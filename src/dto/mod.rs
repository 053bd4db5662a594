pub mod admin_dto;
pub mod student_dto;
