// src/handlers/mod.rs

pub mod catalog;
pub mod certificate;
pub mod exam;
pub mod payment;
