//! Instance lifecycle controller for a single Compute Engine VM.

pub mod api;
pub mod client;
pub mod controller;
pub mod error;
pub mod poll;
pub mod template;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use api::ComputeApi;
pub use client::GceClient;
pub use controller::InstanceController;
pub use error::{ComputeError, ComputeResult};
pub use poll::{PollPolicy, wait_for_operation};
pub use template::{InstanceTemplate, build_instance_template};
pub use types::{
    Image, Instance, InstanceIdentity, Operation, OperationError, OperationErrorDetail,
    OperationStatus, StartOutcome, StartStage,
};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCall, MockComputeApi};
