pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod transcripts;

pub use routes::create_router;
