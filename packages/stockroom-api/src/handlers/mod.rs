//! HTTP endpoint implementations for the resource collections.

mod records;
pub mod request_utils;
pub mod response;

pub use records::{create_record, delete_record, list_records, partial_update_record, read_record};
pub use response::{error_response, ApiError, ErrorResponse};
