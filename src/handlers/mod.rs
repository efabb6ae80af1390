// src/handlers/mod.rs

pub mod auth;
pub mod classes;
pub mod entities;
pub mod exams;
