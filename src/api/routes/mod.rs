//! API Routes
//!
//! Route handlers organized by functionality.

pub mod dispatch;
pub mod health;
pub mod invoke;
