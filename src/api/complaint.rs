use actix_multipart::Multipart;
use actix_web::{delete, get, post, web, HttpResponse};
use bytes::BytesMut;
use chrono::Utc;
use futures_util::TryStreamExt;

use crate::lifecycle::validate::{MAX_IMAGE_BYTES, MAX_REPORT_IMAGES};
use crate::lifecycle::ComplaintEngine;
use crate::model::complaint::{
    CancelComplaintRequest, ComplaintResponse, CreateComplaintRequest, RejectVerificationRequest,
    ReopenComplaintRequest, ReportInput,
};
use crate::model::global_error::{AppError, ErrorCode};
use crate::util::image_store::ImageUpload;

#[utoipa::path(
    post,
    path = "/complaints",
    summary = "รับเรื่องร้องเรียนใหม่",
    request_body = CreateComplaintRequest,
    responses(
        (status = 201, description = "บันทึกเรื่องร้องเรียนสำเร็จ", body = ComplaintResponse),
        (status = 400, description = "ข้อมูลไม่ถูกต้อง หรือพื้นที่ยังไม่มีกลุ่มผู้รับผิดชอบ"),
    ),
    tag = "complaint",
)]
#[post("/complaints")]
pub async fn create_complaint(
    engine: web::Data<ComplaintEngine>,
    body: web::Json<CreateComplaintRequest>,
) -> Result<HttpResponse, AppError> {
    let detail = engine.create_complaint(body.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Created().json(ComplaintResponse::from(detail)))
}

#[utoipa::path(
    get,
    path = "/complaints/{id}",
    summary = "ดูรายละเอียดเรื่องร้องเรียน",
    params(("id", description = "รหัสเรื่องร้องเรียน")),
    responses(
        (status = 200, description = "รายละเอียดพร้อมประวัติการขอแก้ไข", body = ComplaintResponse),
        (status = 404, description = "ไม่พบเรื่องร้องเรียน"),
    ),
    tag = "complaint",
)]
#[get("/complaints/{id}")]
pub async fn get_complaint(
    engine: web::Data<ComplaintEngine>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let detail = engine.find_complaint(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ComplaintResponse::from(detail)))
}

#[utoipa::path(
    post,
    path = "/complaints/{id}/cancel",
    summary = "ผู้แจ้งยกเลิกเรื่อง",
    params(("id", description = "รหัสเรื่องร้องเรียน")),
    request_body = CancelComplaintRequest,
    responses(
        (status = 200, description = "ยกเลิกสำเร็จ", body = ComplaintResponse),
        (status = 403, description = "ไม่ใช่ผู้แจ้ง"),
    ),
    tag = "complaint",
)]
#[post("/complaints/{id}/cancel")]
pub async fn cancel_complaint(
    engine: web::Data<ComplaintEngine>,
    path: web::Path<String>,
    body: web::Json<CancelComplaintRequest>,
) -> Result<HttpResponse, AppError> {
    let detail = engine
        .cancel_complaint(&path.into_inner(), &body.line_user_id, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(ComplaintResponse::from(detail)))
}

#[utoipa::path(
    post,
    path = "/complaints/{id}/reopen",
    summary = "ผู้แจ้งขอแก้ไขงาน",
    params(("id", description = "รหัสเรื่องร้องเรียน")),
    request_body = ReopenComplaintRequest,
    responses(
        (status = 200, description = "เปิดเรื่องใหม่สำเร็จ", body = ComplaintResponse),
        (status = 400, description = "เกินระยะเวลาขอแก้ไข"),
    ),
    tag = "complaint",
)]
#[post("/complaints/{id}/reopen")]
pub async fn reopen_complaint(
    engine: web::Data<ComplaintEngine>,
    path: web::Path<String>,
    body: web::Json<ReopenComplaintRequest>,
) -> Result<HttpResponse, AppError> {
    let detail = engine
        .reopen_complaint(&path.into_inner(), &body.line_user_id, body.reason.as_deref(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(ComplaintResponse::from(detail)))
}

fn multipart_error(err: actix_multipart::MultipartError) -> AppError {
    AppError::with_detail(ErrorCode::ValidationError, err.to_string())
}

/// Reads the `message` text field and the `images` file fields.
async fn read_report(mut payload: Multipart) -> Result<ReportInput, AppError> {
    let mut input = ReportInput::default();

    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_default();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or("image")
            .to_string();

        if name == "images" && input.images.len() == MAX_REPORT_IMAGES {
            return Err(AppError::with_detail(
                ErrorCode::TooManyImages,
                format!("more than {} images", MAX_REPORT_IMAGES),
            ));
        }

        // oversized files stop growing once past the limit; validation rejects them
        let mut data = BytesMut::new();
        while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
            if data.len() <= MAX_IMAGE_BYTES {
                data.extend_from_slice(&chunk);
            }
        }

        match name.as_str() {
            "message" => {
                input.message = String::from_utf8(data.to_vec())
                    .map_err(|_| AppError::with_detail(ErrorCode::ValidationError, "message is not utf-8"))?;
            }
            "images" => input.images.push(ImageUpload {
                filename,
                content_type,
                bytes: data.freeze(),
            }),
            _ => {}
        }
    }

    Ok(input)
}

#[utoipa::path(
    post,
    path = "/api/complaints/{id}/report",
    summary = "รายงานผลการดำเนินงาน",
    description = "multipart/form-data: `message` และไฟล์ `images` ไม่เกิน 5 รูป รูปละไม่เกิน 3MB",
    params(("id", description = "รหัสเรื่องร้องเรียน")),
    responses(
        (status = 200, description = "ปิดงานสำเร็จ", body = ComplaintResponse),
        (status = 400, description = "สถานะไม่ถูกต้อง หรือรูปภาพไม่ผ่านเงื่อนไข"),
    ),
    security(("api_key" = [])),
    tag = "staff",
)]
#[post("/complaints/{id}/report")]
pub async fn report_result(
    engine: web::Data<ComplaintEngine>,
    path: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let input = read_report(payload).await?;
    let detail = engine.report_result(&path.into_inner(), input, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(ComplaintResponse::from(detail)))
}

#[utoipa::path(
    post,
    path = "/api/complaints/{id}/verify",
    summary = "ตรวจรับงาน",
    params(("id", description = "รหัสเรื่องร้องเรียน")),
    responses((status = 200, description = "ตรวจรับสำเร็จ", body = ComplaintResponse)),
    security(("api_key" = [])),
    tag = "staff",
)]
#[post("/complaints/{id}/verify")]
pub async fn verify_complaint(
    engine: web::Data<ComplaintEngine>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let detail = engine.verify_complaint(&path.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(ComplaintResponse::from(detail)))
}

#[utoipa::path(
    post,
    path = "/api/complaints/{id}/reject-verification",
    summary = "ไม่ผ่านการตรวจรับ ส่งกลับไปแก้ไข",
    params(("id", description = "รหัสเรื่องร้องเรียน")),
    request_body = RejectVerificationRequest,
    responses((status = 200, description = "ส่งกลับแก้ไขแล้ว", body = ComplaintResponse)),
    security(("api_key" = [])),
    tag = "staff",
)]
#[post("/complaints/{id}/reject-verification")]
pub async fn reject_verification(
    engine: web::Data<ComplaintEngine>,
    path: web::Path<String>,
    body: web::Json<RejectVerificationRequest>,
) -> Result<HttpResponse, AppError> {
    let detail = engine
        .reject_verification(&path.into_inner(), &body.reason, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(ComplaintResponse::from(detail)))
}

#[utoipa::path(
    post,
    path = "/api/complaints/{id}/reject",
    summary = "ปฏิเสธผลงาน",
    params(("id", description = "รหัสเรื่องร้องเรียน")),
    responses((status = 200, description = "ปฏิเสธแล้ว", body = ComplaintResponse)),
    security(("api_key" = [])),
    tag = "staff",
)]
#[post("/complaints/{id}/reject")]
pub async fn reject_complaint(
    engine: web::Data<ComplaintEngine>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let detail = engine.reject_complaint(&path.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(ComplaintResponse::from(detail)))
}

#[utoipa::path(
    post,
    path = "/api/complaints/{id}/remind",
    summary = "แจ้งเตือนเรื่องค้าง",
    params(("id", description = "รหัสเรื่องร้องเรียน")),
    responses(
        (status = 200, description = "ส่งแจ้งเตือนแล้ว", body = ComplaintResponse),
        (status = 400, description = "แจ้งเตือนไปแล้วภายใน 1 วัน"),
    ),
    security(("api_key" = [])),
    tag = "staff",
)]
#[post("/complaints/{id}/remind")]
pub async fn remind_complaint(
    engine: web::Data<ComplaintEngine>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let detail = engine.remind_complaint(&path.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(ComplaintResponse::from(detail)))
}

#[utoipa::path(
    delete,
    path = "/api/complaints/{id}",
    summary = "ลบเรื่องร้องเรียนพร้อมรูปภาพ",
    params(("id", description = "รหัสเรื่องร้องเรียน")),
    responses(
        (status = 204, description = "ลบสำเร็จ"),
        (status = 404, description = "ไม่พบเรื่องร้องเรียน"),
    ),
    security(("api_key" = [])),
    tag = "staff",
)]
#[delete("/complaints/{id}")]
pub async fn delete_complaint(
    engine: web::Data<ComplaintEngine>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    engine.delete_complaint(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
