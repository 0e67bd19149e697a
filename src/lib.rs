//! Hiring stage progression for an applicant tracking system.
//!
//! [`workflow`] computes where an application stands in its job's hiring
//! workflow and which transition is available; [`gateway`] persists
//! transitions through the backend; [`pipeline`] ties the two together
//! behind operator actions.

pub mod config;
pub mod error;
pub mod gateway;
pub mod notice;
pub mod pipeline;
pub mod session;
pub mod workflow;

pub use config::HirewiseConfig;
pub use error::{HirewiseError, ProgressionError};
pub use gateway::{ApplicationClient, ApplicationGateway, GatewayError};
pub use notice::{Notice, NoticeLevel};
pub use pipeline::{ActionError, PipelineController, TransitionOutcome};
pub use session::SessionStore;
