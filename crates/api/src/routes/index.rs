use axum::Json;
use serde_json::{json, Value};

use crate::error::AppError;

/// GET / lists the public endpoints.
pub async fn api_index() -> Json<Value> {
    Json(json!({
        "message": "Event Management API",
        "endpoints": {
            "User Routes": {
                "POST /api/v1/user/register": "Register a new user",
                "POST /api/v1/user/login": "Login a user",
                "POST /api/v1/user/logout": "Logout a user",
                "POST /api/v1/user/profile": "Get user profile (requires login)",
            },
            "Event Routes": {
                "POST /api/v1/event/create-event": "Create a new event (Admin only)",
                "GET /api/v1/event/participants/:eventId": "Get event participants by event ID",
                "POST /api/v1/event/join/:eventId": "Join an event (requires login)",
                "POST /api/v1/event/cancel-participant/:eventId": "Cancel participation in an event (requires login)",
            }
        }
    }))
}

pub async fn not_found() -> AppError {
    AppError::NotFound("oops ! 404 not found".to_string())
}
