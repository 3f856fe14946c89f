//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use jsonrpsee::types::ErrorObjectOwned;
use pushbridge_core::error::AppError;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const INVALID_QUEUE_NAME: i32 = 4004;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const DB_ERROR: i32 = 5001;
    pub const EXTERNAL_SERVICE_ERROR: i32 = 5003;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let code = match &err {
        AppError::InvalidQueueName(_) => code::INVALID_QUEUE_NAME,
        AppError::InvalidIdempotencyKey(_)
        | AppError::MalformedPayload(_)
        | AppError::InvalidMessage(_)
        | AppError::Validation(_)
        | AppError::Serialization(_) => code::VALIDATION_ERROR,
        AppError::ResourceProvision { .. } | AppError::Dispatch { .. } => {
            code::EXTERNAL_SERVICE_ERROR
        }
        AppError::Engine(_) | AppError::Database(_) => code::DB_ERROR,
        AppError::Config(_) | AppError::Internal(_) => code::INTERNAL_ERROR,
    };
    ErrorObjectOwned::owned(code, err.to_string(), None::<()>)
}
