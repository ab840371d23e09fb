mod complaint;
mod health;
mod zone;

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::API_KEY_HEADER;
use crate::entity::complaint::{ComplaintStatus, Source};
use crate::model::complaint::{
    CancelComplaintRequest, ComplaintResponse, CreateComplaintRequest, RejectVerificationRequest,
    ReopenComplaintRequest, ReopenLogResponse,
};
use crate::model::zone::{ZoneRequest, ZoneResponse};

pub use crate::api::complaint::{
    cancel_complaint, create_complaint, delete_complaint, get_complaint, reject_complaint, reject_verification,
    remind_complaint, reopen_complaint, report_result, verify_complaint,
};
pub use crate::api::health::health_check;
pub use crate::api::zone::{create_zone, delete_zone, list_zones, update_zone};

struct StaffApiKey;

impl Modify for StaffApiKey {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        complaint::create_complaint,
        complaint::get_complaint,
        complaint::cancel_complaint,
        complaint::reopen_complaint,
        complaint::report_result,
        complaint::verify_complaint,
        complaint::reject_verification,
        complaint::reject_complaint,
        complaint::remind_complaint,
        complaint::delete_complaint,
        zone::list_zones,
        zone::create_zone,
        zone::update_zone,
        zone::delete_zone,
    ),
    components(schemas(
        Source,
        ComplaintStatus,
        CreateComplaintRequest,
        CancelComplaintRequest,
        ReopenComplaintRequest,
        RejectVerificationRequest,
        ComplaintResponse,
        ReopenLogResponse,
        ZoneRequest,
        ZoneResponse,
    )),
    modifiers(&StaffApiKey),
    tags(
        (name = "complaint", description = "ช่องทางของประชาชน"),
        (name = "staff", description = "งานของเจ้าหน้าที่ ต้องใช้ x-api-key"),
        (name = "zone", description = "จัดการโซนและกลุ่มแจ้งเตือน"),
    ),
)]
pub struct ApiDoc;
