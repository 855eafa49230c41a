pub mod cli;
pub mod config;
pub mod errors;
pub mod instructions;
pub mod metadata;
pub mod minter;
pub mod notify;
pub mod session;
pub mod state;
pub mod telemetry;

pub use crate::{
    errors::{MinterError, PreconditionError, Result},
    metadata::NftMetadata,
    minter::{Minter, TreeParams},
    notify::{Notifier, RecordingNotifier, TracingNotifier},
    session::{MinterSession, SessionCell},
    state::{
        AssetContext, AssetKind, AssetReference, MinterState, TransactionGate,
        TreeAccountSummary, TreeConfigSummary,
    },
};
