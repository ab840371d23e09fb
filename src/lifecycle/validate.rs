use crate::entity::complaint::Source;
use crate::geo::LatLng;
use crate::model::complaint::CreateComplaintRequest;
use crate::model::global_error::{AppError, ErrorCode, ValidationFieldError};
use crate::util::image_store::ImageUpload;

pub const MAX_REPORT_IMAGES: usize = 5;
pub const MAX_IMAGE_BYTES: usize = 3 * 1024 * 1024;

/// Intake fields after checking, trimmed and with blanks dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidIntake {
    pub source: Source,
    pub description: String,
    pub reporter_name: Option<String>,
    pub received_by: Option<String>,
    pub phone: Option<String>,
    pub location: String,
    pub point: LatLng,
    pub line_user_id: Option<String>,
    pub image_before: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn validate_intake(request: &CreateComplaintRequest) -> Result<ValidIntake, AppError> {
    let mut errors = Vec::new();

    let description = request.description.trim().to_string();
    if description.is_empty() {
        errors.push(ValidationFieldError::new("description", "กรุณาระบุรายละเอียด"));
    }

    let location = non_blank(request.location.as_deref());
    let point = location.as_deref().and_then(LatLng::parse);
    match (&location, point) {
        (None, _) => errors.push(ValidationFieldError::new("location", "กรุณาระบุพิกัด")),
        (Some(_), None) => errors.push(ValidationFieldError::new(
            "location",
            ErrorCode::InvalidLocation.message(),
        )),
        _ => {}
    }

    let reporter_name = non_blank(request.reporter_name.as_deref());
    let received_by = non_blank(request.received_by.as_deref());
    let line_user_id = non_blank(request.line_user_id.as_deref());

    if request.source == Source::Line {
        if line_user_id.is_none() {
            errors.push(ValidationFieldError::new("lineUserId", "เรื่องจาก LINE ต้องมี lineUserId"));
        }
    } else {
        if received_by.is_none() {
            errors.push(ValidationFieldError::new("receivedBy", "กรุณาระบุผู้รับเรื่อง"));
        }
        if reporter_name.is_none() {
            errors.push(ValidationFieldError::new("reporterName", "กรุณาระบุชื่อผู้แจ้ง"));
        }
    }

    let (Some(location), Some(point)) = (location, point) else {
        return Err(AppError::ValidationError(errors));
    };
    // stored as `lat,lng` so the record and the map link agree
    let location: String = location.chars().filter(|c| !c.is_whitespace()).collect();
    if !errors.is_empty() {
        return Err(AppError::ValidationError(errors));
    }

    let image_before = request
        .image_before
        .as_deref()
        .and_then(|urls| merge_image_urls(None, urls));

    Ok(ValidIntake {
        source: request.source,
        description,
        reporter_name,
        received_by,
        phone: non_blank(request.phone.as_deref()),
        location,
        point,
        // only LINE complaints are owned by a LINE user
        line_user_id: line_user_id.filter(|_| request.source == Source::Line),
        image_before,
    })
}

/// Rejects the whole batch on the first bad file.
pub fn validate_images(images: &[ImageUpload]) -> Result<(), AppError> {
    if images.len() > MAX_REPORT_IMAGES {
        return Err(AppError::with_detail(
            ErrorCode::TooManyImages,
            format!("received {} images", images.len()),
        ));
    }

    for image in images {
        if !image.content_type.trim().to_ascii_lowercase().starts_with("image/") {
            return Err(AppError::with_detail(
                ErrorCode::UnsupportedImageType,
                format!("{} ({})", image.filename, image.content_type),
            ));
        }
        if image.bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::with_detail(
                ErrorCode::ImageTooLarge,
                format!("{} is {} bytes", image.filename, image.bytes.len()),
            ));
        }
    }

    Ok(())
}

/// Appends `added` to a comma-joined url list, dropping blanks and duplicates.
pub fn merge_image_urls(existing: Option<&str>, added: &[String]) -> Option<String> {
    let mut urls: Vec<&str> = Vec::new();
    let existing = existing.into_iter().flat_map(|list| list.split(','));

    for url in existing.chain(added.iter().map(String::as_str)) {
        let url = url.trim();
        if !url.is_empty() && !urls.contains(&url) {
            urls.push(url);
        }
    }

    if urls.is_empty() { None } else { Some(urls.join(",")) }
}
