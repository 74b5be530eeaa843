//! Collection service — the `/api/users` back-end the form controller talks to.
//!
//! ```text
//! ┌────────────┐  HTTP  ┌───────────────────────────────────────────┐
//! │ controller │ ─────> │ server.rs  (ServerConfig, build_router)    │
//! │  (client)  │ <───── │   └─ api.rs  (handlers, ApiError)          │
//! └────────────┘        │        │ DbHandle::call (blocking pool)    │
//!                       │        v                                   │
//!                       │   db.rs  (UsersDb, SQLite via rusqlite)    │
//!                       └───────────────────────────────────────────┘
//! ```
//!
//! | Module   | Responsibility                                          |
//! |----------|---------------------------------------------------------|
//! | `models` | `StoredUser`, validated `UserFields`, id parsing        |
//! | `db`     | Schema, paging query, CRUD                              |
//! | `api`    | Routes for `POST/GET/PUT/DELETE /api/users`, `/health`  |
//! | `server` | Router assembly, CORS, bind, graceful shutdown          |

pub mod api;
pub mod db;
pub mod models;
#[allow(clippy::module_inception)]
pub mod server;

pub use api::{AppState, SharedState};
pub use db::{DbHandle, UsersDb};
pub use server::{ServerConfig, build_router, open_database, start_server};
