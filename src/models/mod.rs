// src/models/mod.rs

pub mod attempt;
pub mod catalog;
pub mod certificate;
pub mod payment;
pub mod question;
pub mod user;
