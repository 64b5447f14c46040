pub mod mods;
pub mod sync_context;

pub use mods::Mods;
pub use sync_context::SyncContext;
