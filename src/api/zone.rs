use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;

use crate::geo::zones::ZoneAdmin;
use crate::model::global_error::AppError;
use crate::model::zone::{ZoneRequest, ZoneResponse};

#[utoipa::path(
    get,
    path = "/api/zones",
    summary = "รายการโซน",
    responses((status = 200, description = "โซนทั้งหมดตามลำดับที่บันทึก", body = Vec<ZoneResponse>)),
    security(("api_key" = [])),
    tag = "zone",
)]
#[get("/zones")]
pub async fn list_zones(admin: web::Data<ZoneAdmin>) -> Result<HttpResponse, AppError> {
    let zones: Vec<ZoneResponse> = admin
        .list_zones()
        .await?
        .into_iter()
        .map(ZoneResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(zones))
}

#[utoipa::path(
    post,
    path = "/api/zones",
    summary = "สร้างโซน",
    request_body = ZoneRequest,
    responses(
        (status = 201, description = "สร้างโซนสำเร็จ", body = ZoneResponse),
        (status = 400, description = "ชื่อซ้ำ หรือขอบเขตไม่ถูกต้อง"),
    ),
    security(("api_key" = [])),
    tag = "zone",
)]
#[post("/zones")]
pub async fn create_zone(
    admin: web::Data<ZoneAdmin>,
    body: web::Json<ZoneRequest>,
) -> Result<HttpResponse, AppError> {
    let zone = admin.create_zone(body.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Created().json(ZoneResponse::from(zone)))
}

#[utoipa::path(
    put,
    path = "/api/zones/{id}",
    summary = "แก้ไขโซน",
    params(("id", description = "รหัสโซน", example = 1)),
    request_body = ZoneRequest,
    responses(
        (status = 200, description = "แก้ไขสำเร็จ", body = ZoneResponse),
        (status = 404, description = "ไม่พบโซน"),
    ),
    security(("api_key" = [])),
    tag = "zone",
)]
#[put("/zones/{id}")]
pub async fn update_zone(
    admin: web::Data<ZoneAdmin>,
    path: web::Path<i32>,
    body: web::Json<ZoneRequest>,
) -> Result<HttpResponse, AppError> {
    let zone = admin
        .update_zone(path.into_inner(), body.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(ZoneResponse::from(zone)))
}

#[utoipa::path(
    delete,
    path = "/api/zones/{id}",
    summary = "ลบโซน",
    params(("id", description = "รหัสโซน", example = 1)),
    responses(
        (status = 204, description = "ลบสำเร็จ"),
        (status = 404, description = "ไม่พบโซน"),
    ),
    security(("api_key" = [])),
    tag = "zone",
)]
#[delete("/zones/{id}")]
pub async fn delete_zone(admin: web::Data<ZoneAdmin>, path: web::Path<i32>) -> Result<HttpResponse, AppError> {
    admin.delete_zone(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
