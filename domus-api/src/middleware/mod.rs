/// Middleware for the API server
///
/// Authentication is a route-level `from_fn` layer defined in `app`; this
/// module holds the tower layers applied to every response.

pub mod security;
