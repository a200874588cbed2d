//! # lcpt-state — License Status Lifecycle
//!
//! The lifecycle a status server must implement, as data:
//!
//! ```text
//! ready ──register──▶ active ──return──▶ returned
//!   │                   │ ▲
//!   │                   │ └── register (idempotent), renew
//!   │                   └──(end passes)──▶ expired
//!   ├──return / cancel──▶ cancelled
//!   └──revoke (also from active)──▶ revoked
//! ```
//!
//! - **Status** (`status.rs`): the closed [`LicenseStatus`] enum and the
//!   [`EventType`] values a status document records.
//! - **Transition table** (`transition.rs`): [`expected`] maps a status and a
//!   client operation to the outcome a conforming server must produce.
//! - **Model** (`lifecycle.rs`): [`LifecycleModel`] follows one license
//!   through a scenario and reports every observed response that
//!   contradicts the table as a [`LifecycleViolation`]. [`replay`] rebuilds
//!   the state an event log implies, so a server transition that happened
//!   before the harness looked can still be judged.
//!
//! ## Design
//!
//! The harness does not own the state; the server does. The model never
//! refuses to advance: after each observation it adopts the server's reported
//! state and returns the violation, so a scenario can record the failure and
//! continue with what the server actually did.

pub mod lifecycle;
pub mod status;
pub mod transition;

pub use lifecycle::{replay, LifecycleModel, LifecycleViolation, Snapshot, TransitionRecord, Trigger};
pub use status::{EventType, LicenseStatus};
pub use transition::{expected, server_transition, Expectation, Operation, ServerTransition};
