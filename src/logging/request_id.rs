//! Correlation IDs for detection calls

use uuid::Uuid;

/// Generate a new request ID using UUID v4
///
/// Every `detect` call gets one; it is attached to the call's tracing span
/// so all attempts of one call share it.
///
/// # Examples
///
/// ```
/// use yolo_remote::logging::generate_request_id;
///
/// let request_id = generate_request_id();
/// assert_eq!(request_id.len(), 36);
/// ```
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}
