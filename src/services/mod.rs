//! Services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! `backend` owns the wire protocol of the identity/backend collaborator;
//! `auth_context` layers reachability tracking and auth events on top so
//! route handlers stay focused on cookies and HTTP status mapping. `events`
//! drains the auth event channel into the application log.

pub mod auth_context;
pub mod backend;
pub mod events;
