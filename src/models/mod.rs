// src/models/mod.rs

pub mod event;
pub mod question;
pub mod response;
pub mod user;
