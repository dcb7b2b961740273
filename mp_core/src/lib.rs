pub mod addon;
pub mod errors;
pub mod orphan;
pub mod plan;
pub mod profile;
pub mod resolve;

pub use addon::{
    Dependency, File, FileId, Mod, ModId, ReleaseChannel, preference_cmp, select_preferred,
    sort_by_preference,
};
pub use errors::{ConflictSide, Error};
pub use orphan::{cascade_removal, collect_orphans, forced_cascade};
pub use plan::{Action, ActionKind, Plan, Reason};
pub use profile::{InstalledMod, Profile, ProfileDocument, SCHEMA_VERSION};
pub use resolve::{Decision, Resolution, Resolved, order_actions};
