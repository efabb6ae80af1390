// src/models/mod.rs

pub mod class;
pub mod exam;
pub mod exam_result;
pub mod question;
pub mod submission;
pub mod user;
