use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::util::image_store::ImageStoreError;

/// Broad failure category, independent of the HTTP mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Permission,
    State,
    TimeWindow,
    Configuration,
    Unauthorized,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // 400 BAD REQUEST
    ValidationError,
    InvalidLocation,
    TooManyImages,
    ImageTooLarge,
    UnsupportedImageType,
    EmptyResolutionMessage,
    InvalidPolygon,
    DuplicateZoneName,
    InvalidStatusTransition,
    StaleComplaintState,
    ReopenWindowExpired,
    ReminderTooSoon,
    ZoneNotConfigured,

    // 401 UNAUTHORIZED
    InvalidApiKey,

    // 403 FORBIDDEN
    NotComplaintOwner,
    SourceNotLine,

    // 404 NOT FOUND
    ComplaintNotFound,
    ZoneNotFound,

    // 500 SERVER ERRORS
    LineTokenMissing,
    ImageStoreFailed,
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "ข้อมูลไม่ถูกต้อง",
            ErrorCode::InvalidLocation => "พิกัดไม่ถูกต้อง ต้องอยู่ในรูปแบบ lat,lng",
            ErrorCode::TooManyImages => "อัปโหลดรูปภาพได้ไม่เกิน 5 รูป",
            ErrorCode::ImageTooLarge => "รูปภาพต้องมีขนาดไม่เกิน 3MB",
            ErrorCode::UnsupportedImageType => "อนุญาตเฉพาะไฟล์รูปภาพเท่านั้น",
            ErrorCode::EmptyResolutionMessage => "กรุณาระบุผลการดำเนินงาน",
            ErrorCode::InvalidPolygon => "ขอบเขตโซนต้องมีอย่างน้อย 3 จุดที่ถูกต้อง",
            ErrorCode::DuplicateZoneName => "ชื่อโซนนี้มีอยู่แล้ว",
            ErrorCode::InvalidStatusTransition => "ไม่สามารถเปลี่ยนสถานะเรื่องร้องเรียนนี้ได้",
            ErrorCode::StaleComplaintState => "สถานะเรื่องร้องเรียนถูกเปลี่ยนไปแล้ว",
            ErrorCode::ReopenWindowExpired => "ขอแก้ไขได้ภายใน 3 วันหลังดำเนินการเสร็จสิ้นเท่านั้น",
            ErrorCode::ReminderTooSoon => "แจ้งเตือนซ้ำได้วันละ 1 ครั้งเท่านั้น",
            ErrorCode::ZoneNotConfigured => "ไม่พบกลุ่มผู้รับผิดชอบสำหรับพื้นที่นี้",

            ErrorCode::InvalidApiKey => "API key ไม่ถูกต้อง",

            ErrorCode::NotComplaintOwner => "ไม่มีสิทธิ์ดำเนินการกับเรื่องร้องเรียนนี้",
            ErrorCode::SourceNotLine => "ดำเนินการได้เฉพาะเรื่องที่แจ้งผ่าน LINE",

            ErrorCode::ComplaintNotFound => "ไม่พบเรื่องร้องเรียน",
            ErrorCode::ZoneNotFound => "ไม่พบโซน",

            ErrorCode::LineTokenMissing => "ยังไม่ได้ตั้งค่า LINE access token",
            ErrorCode::ImageStoreFailed => "จัดการไฟล์รูปภาพไม่สำเร็จ",
            ErrorCode::DatabaseError => "เกิดข้อผิดพลาดของฐานข้อมูล",
            ErrorCode::InternalError => "เกิดข้อผิดพลาดภายในระบบ",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::ValidationError
            | ErrorCode::InvalidLocation
            | ErrorCode::TooManyImages
            | ErrorCode::ImageTooLarge
            | ErrorCode::UnsupportedImageType
            | ErrorCode::EmptyResolutionMessage
            | ErrorCode::InvalidPolygon
            | ErrorCode::DuplicateZoneName => ErrorKind::Validation,

            ErrorCode::InvalidStatusTransition | ErrorCode::StaleComplaintState => ErrorKind::State,

            ErrorCode::ReopenWindowExpired | ErrorCode::ReminderTooSoon => ErrorKind::TimeWindow,

            ErrorCode::ZoneNotConfigured | ErrorCode::LineTokenMissing => ErrorKind::Configuration,

            ErrorCode::InvalidApiKey => ErrorKind::Unauthorized,

            ErrorCode::NotComplaintOwner | ErrorCode::SourceNotLine => ErrorKind::Permission,

            ErrorCode::ComplaintNotFound | ErrorCode::ZoneNotFound => ErrorKind::NotFound,

            ErrorCode::ImageStoreFailed | ErrorCode::DatabaseError | ErrorCode::InternalError => {
                ErrorKind::Internal
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::State | ErrorKind::TimeWindow => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Permission => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            // a zone without any group is a data problem the caller's location ran into,
            // a missing token is ours
            ErrorKind::Configuration => match self {
                ErrorCode::ZoneNotConfigured => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

impl ValidationFieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    ApiError(ErrorCode, Option<String>),

    #[error("ข้อมูลไม่ถูกต้อง")]
    ValidationError(Vec<ValidationFieldError>),
}

impl AppError {
    pub fn new(code: ErrorCode) -> Self {
        AppError::ApiError(code, None)
    }

    pub fn with_detail(code: ErrorCode, detail: impl Into<String>) -> Self {
        AppError::ApiError(code, Some(detail.into()))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::ApiError(code, _) => *code,
            AppError::ValidationError(_) => ErrorCode::ValidationError,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.code().kind()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        tracing::error!(error = %err, "database error");
        AppError::new(ErrorCode::DatabaseError)
    }
}

impl From<ImageStoreError> for AppError {
    fn from(err: ImageStoreError) -> Self {
        tracing::error!(error = %err, "image store error");
        AppError::with_detail(ErrorCode::ImageStoreFailed, err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ValidationFieldError>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.code().status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let code = self.code();
        let (detail, errors) = match self {
            AppError::ApiError(_, detail) => (detail.clone(), Vec::new()),
            AppError::ValidationError(errors) => (None, errors.clone()),
        };

        HttpResponse::build(code.status_code()).json(ErrorResponse {
            code: format!("{:?}", code),
            message: code.message().to_string(),
            detail,
            errors,
        })
    }
}
