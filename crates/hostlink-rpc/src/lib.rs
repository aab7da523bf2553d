//! Hostlink RPC
//!
//! JSON-RPC 2.0 over HTTP for the embedded frontend:
//! - `POST /rpc`, one request object per call (no batches)
//! - methods registered once at startup into an `RpcRegistry`
//! - methods that declare a `ctx` parameter receive a per-call `Context`

mod config;
mod context;
mod error;
mod protocol;
mod registry;
mod server;

pub use config::RpcConfig;
pub use context::{Application, Context};
pub use error::{codes, MethodError, RegistryError, RpcError, ServerError};
pub use protocol::{parse_request, Params, Payload, Rejection, RequestId, RpcRequest, RpcResponse};
pub use registry::{Args, Call, MethodInfo, RpcMethod, RpcRegistry, CONTEXT_PARAM};
pub use server::{RpcServer, ServerHandle};

pub type Result<T> = std::result::Result<T, ServerError>;
