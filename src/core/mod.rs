// ─── Cleanroom Relauncher Core ───
// Relaunches the game under a Cleanroom release it resolves and caches.
//
// Architecture:
//   core/
//     context      Per-run paths, bundle and host startup data
//     probe        Is Cleanroom already loaded?
//     catalog/     Release listing (GitHub) with on-disk fallback
//     config/      Persisted user selection and JVM tuning
//     configure    When and how the selection gets (re)configured
//     version/     Profile-driven resolution of libraries and natives
//     downloader/  Blocking downloads with SHA-1 validation
//     extraction/  Hash-gated wrapper extraction cache
//     java/        Java inspection and memory ceiling
//     launch/      Argument assembly + child process orchestration
//     relauncher   The end-to-end run

pub mod catalog;
pub mod config;
pub mod configure;
pub mod context;
pub mod downloader;
pub mod error;
pub mod extraction;
pub mod http;
pub mod java;
pub mod launch;
pub mod probe;
pub mod relauncher;
pub mod version;
