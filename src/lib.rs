//! # POP Planner
//!
//! Cost planning for standard operating procedures (POPs).
//!
//! ## Features
//!
//! - Projects made of departments, procedures and reusable resource groups
//! - Resources in seven fixed categories, including a recurrence schedule
//! - Project totals that count a shared group once
//! - Printable, paginated HTML report per department
//! - CSV and JSON exports
//! - Local JSON persistence that never crashes on bad data
//!
//! ## Example
//!
//! ```no_run
//! use pop_planner::store::FileStore;
//! use pop_planner::workspace::Workspace;
//! use pop_planner::cost::project_total;
//!
//! let workspace = Workspace::open(FileStore::new(".pop-planner"), "meus-projetos");
//! for project in workspace.projects() {
//!     println!("{}: {:.2}", project.name, project_total(project));
//! }
//! ```

pub mod config;
pub mod cost;
pub mod edit;
pub mod error;
pub mod export;
pub mod model;
pub mod recurrence;
pub mod store;
pub mod telemetry;
pub mod workspace;
