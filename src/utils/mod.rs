// src/utils/mod.rs

pub mod access;
pub mod grading;
pub mod hash;
pub mod html;
pub mod jwt;
