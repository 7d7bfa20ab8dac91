//! Homepage sections: catalog, store, editor and page composition.
//!
//! ## Overview
//!
//! An admin assembles the homepage from a fixed catalog of section kinds.
//! Each stored section has an order, an enabled flag and a flat config map
//! whose editable fields are described by a per-kind schema. The composer
//! renders the enabled sections in order; the editor loads and saves one
//! section's config with type coercion.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────┐
//! │  Admin / │ ───────> │  server.rs  (axum Router, ServerConfig)      │
//! │  Browser │ <─────── │    └─ api.rs  (handlers, AppState, guard)    │
//! └──────────┘ WebSocket│         │                                    │
//!       ^               │         │ DbHandle::call()                   │
//!       │ reqwest       │         v                                    │
//! ┌──────────┐          │  db.rs  (SectionDb, SQLite)                  │
//! │client.rs │          │         │                                    │
//! │offline.rs│          │         │ schema defaults / merge            │
//! └──────────┘          │         v                                    │
//!                       │  editor.rs · compose.rs                      │
//!                       └──────────────────────────────────────────────┘
//! ```
//!
//! ## Supporting Modules
//!
//! | Module    | Responsibility                                            |
//! |-----------|-----------------------------------------------------------|
//! | `catalog` | `SectionKind` and the addable section definitions         |
//! | `schema`  | Per-kind `FieldSpec` tables and default values            |
//! | `models`  | `SectionInstance`, `ConfigValue`, create/patch payloads   |
//! | `writer`  | `SectionWriter` trait shared by local and remote stores   |
//! | `offline` | Durable FIFO of mutations that could not be delivered     |
//! | `client`  | `RemoteStore`, HTTP implementation of `SectionWriter`     |
//! | `ws`      | `WsMessage` enum + `broadcast_message()` helper           |

pub mod api;
pub mod catalog;
pub mod client;
pub mod compose;
pub mod db;
pub mod editor;
pub mod models;
pub mod offline;
pub mod schema;
pub mod server;
pub mod writer;
pub mod ws;
