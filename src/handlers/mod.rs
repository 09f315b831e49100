pub mod asset_handlers;
pub mod blog_handlers;
pub mod health_handlers;
pub mod permalink_handlers;
