// src/services/mod.rs

pub mod notifier;
pub mod payment_provider;
pub mod renderer;
