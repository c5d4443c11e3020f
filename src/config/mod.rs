//! Configuration: environment-driven server settings and the game balance
//! catalog loaded from an external document at startup.

mod balance;
mod server;

pub use balance::{
    Balance, EconomyConfig, HealingConfig, MapGenConfig, MatchmakingConfig, NeutralModifiers,
    QuickMatchDefaults, StructureConfig, SuddenDeathConfig, TerrainOverride, TroopConfig,
    WinConditions,
};
pub use server::ServerConfig;
