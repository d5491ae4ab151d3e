//! External collaborator stubs (§4.9, C9) — the trivial subprocess/HTTP
//! wrappers the engine itself never touches: inventory loading, the
//! `run` subcommand's shell-out, and the `pr` subcommand's forge POST.
//!
//! These are deliberately thin — spec §1 scopes them as "external
//! collaborators" whose interfaces §6 describes, not part of the Health
//! Orchestration Engine core. Grounded on the teacher's
//! `discovery::get_changed_files` shell-out-and-parse pattern and its
//! existing `serde_yaml` dependency.

mod inventory;
mod pr_opener;
mod shell_runner;

pub use inventory::{Inventory, InventoryError};
pub use pr_opener::{open_pull_request, PrOpenError, PrOutcome};
pub use shell_runner::{run_in_repositories, RunOutcome};
