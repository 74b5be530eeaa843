//! Record form controller — the client side of the user records list.
//!
//! ## Overview
//!
//! The page holds one persistent creation form, an ordered list of record
//! forms (one per loaded record) and a `more` control. Clicking a control runs
//! one request against the collection endpoint and reflects the result on the
//! control's failed-flag and on the list.
//!
//! ```text
//!   click(ControlId) ──> controller.rs  (RecordFormController)
//!                           │  begin: validate, disable, build UsersRequest
//!                           v
//!                        transport.rs  (Transport trait, HttpTransport)
//!                           │  POST | PUT | DELETE | GET /api/users
//!                           v
//!                        complete: failed-flag, re-enable, mutate view.rs list
//! ```
//!
//! ## Supporting Modules
//!
//! | Module       | Responsibility                                         |
//! |--------------|--------------------------------------------------------|
//! | `form`       | `Input`, `Control`, `Form`, factory, serializer        |
//! | `view`       | `Page`, `ListView`, `FormKey`, `ControlId`             |
//! | `transport`  | `UsersRequest`, `Transport`, reqwest `HttpTransport`   |
//!
//! ## Operation contracts
//!
//! | Operation | Validates | On success                  | On failure                 |
//! |-----------|-----------|-----------------------------|----------------------------|
//! | add       | yes       | clear flag, re-enable       | set flag, re-enable        |
//! | update    | yes       | clear flag, re-enable       | set flag, re-enable        |
//! | remove    | no        | drop the form               | set flag, stays disabled   |
//! | load-more | no        | append forms, clear flag    | set flag, re-enable        |

pub mod controller;
pub mod form;
pub mod transport;
pub mod view;

pub use controller::{DEFAULT_PAGE_SIZE, Outcome, RecordFormController};
pub use form::{Action, Control, Form, Input, InputType};
pub use form::{apply_input_constraints, create_record_form, serialize_form};
pub use transport::{HttpTransport, Transport, UsersRequest};
pub use view::{ControlId, FormKey, ListView, Page};
