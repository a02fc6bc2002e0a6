//! Six-step identification flow: Upload, Classify, Review, Decide, Enrich,
//! Result.

pub mod runtime;
pub mod session;
pub mod update;

pub use runtime::{FlowServices, Session, ViewAction, ViewPort, run_view};
pub use session::{SessionSnapshot, SessionState, Step, UserDecision};
pub use update::{FlowCmd, FlowEvent, FlowMsg, WITHHELD_NOTICE, reset, update};
