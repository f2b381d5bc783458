pub mod challenge;
pub mod health_handlers;
pub mod object_handlers;
