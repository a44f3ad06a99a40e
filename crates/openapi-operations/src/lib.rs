//! # openapi-operations
//!
//! Compiles OpenAPI 3.x documents into independently invocable, validated
//! HTTP operations.
//!
//! Loading walks the document once: security schemes are normalized into
//! tagged descriptors, each path/method pair becomes an immutable
//! [`OperationSpec`] with a synthesized validation model, and the raw
//! document is discarded. Invocation validates caller-supplied arguments,
//! injects authentication material from a caller-supplied context, routes
//! values into the path, query, headers, or JSON body, and always resolves to
//! an [`InvocationResult`]; transport failures are returned as data, never
//! raised.
//!
//! Compiled sets are immutable and safe to invoke concurrently from any
//! number of callers.
//!
//! ## Example
//!
//! ```no_run
//! use openapi_operations::{AuthContext, DocumentLoader, Executor};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let set = DocumentLoader::load_file("./petstore.yaml")?;
//! let operation = set.get("pets_id").expect("unknown operation");
//!
//! let executor = Executor::new();
//! let context = AuthContext::new().with_header("X-API-Key", "secret");
//! let result = executor
//!     .invoke(operation, &json!({"id": "42"}), &context)
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod auth;
mod compiler;
mod error;
mod executor;
mod loader;
mod model;
mod params;
mod resolver;
mod types;

pub use error::{LoadError, LoadResult, ValidationError};
pub use executor::{Executor, DEFAULT_TIMEOUT};
pub use loader::{DocumentLoader, OperationSet};
pub use model::{FieldSpec, ValidationModel};
pub use types::{
    ApiKeyLocation, AuthContext, AuthDescriptor, AuthRequirement, HttpMethod, InvocationFailure,
    InvocationResult, OAuthFlow, OperationSpec, ParamType, ParameterDescriptor,
    ParameterLocation, SchemeKind,
};
