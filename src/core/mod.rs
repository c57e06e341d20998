// ─── Packhorse Core ───
// Modular backend for installing CurseForge modpacks into managed
// launcher instances.
//
// Architecture:
//   core/
//     instance/   — Instance model + CRUD manager
//     downloader/ — Concurrent download queue with size verification
//     loaders/    — Forge provisioning (idempotent)
//     pack/       — Pack source, manifest, overlay, catalog, orchestrator
//     state/      — Process-wide context (dirs, HTTP client, manager)

pub mod downloader;
pub mod error;
pub mod http;
pub mod instance;
pub mod loaders;
pub mod pack;
pub mod state;
