use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Asia::Bangkok;

use crate::entity::complaint::{ComplaintStatus, Source};

const MAP_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1&query=";
const BUDDHIST_ERA_OFFSET: i32 = 543;
const THAI_MONTHS: [&str; 12] = [
    "ม.ค.", "ก.พ.", "มี.ค.", "เม.ย.", "พ.ค.", "มิ.ย.", "ก.ค.", "ส.ค.", "ก.ย.", "ต.ค.", "พ.ย.", "ธ.ค.",
];

/// Last six characters of the id, uppercased.
pub fn short_ref(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    let start = chars.len().saturating_sub(6);
    chars[start..].iter().collect::<String>().to_uppercase()
}

/// Bangkok wall-clock time with a Buddhist-era year, e.g. `18 ต.ค. 2569 14:05 น.`.
pub fn thai_datetime(at: DateTime<Utc>) -> String {
    let local = at.with_timezone(&Bangkok);
    format!(
        "{} {} {} {:02}:{:02} น.",
        local.day(),
        THAI_MONTHS[local.month0() as usize],
        local.year() + BUDDHIST_ERA_OFFSET,
        local.hour(),
        local.minute()
    )
}

pub fn map_url(location: &str) -> String {
    let query: String = location.chars().filter(|c| !c.is_whitespace()).collect();
    format!("{}{}", MAP_SEARCH_URL, query)
}

pub fn source_label(source: Source) -> &'static str {
    match source {
        Source::Line => "LINE",
        Source::Facebook => "Facebook",
        Source::Phone => "โทรศัพท์",
        Source::Counter => "เคาน์เตอร์",
        Source::Other => "อื่นๆ",
    }
}

pub fn source_color(source: Source) -> &'static str {
    match source {
        Source::Line => "#06C755",
        Source::Facebook => "#1877F2",
        Source::Phone => "#8E44AD",
        Source::Counter => "#D35400",
        Source::Other => "#7F8C8D",
    }
}

pub fn status_label(status: ComplaintStatus) -> &'static str {
    match status {
        ComplaintStatus::Pending => "รอดำเนินการ",
        ComplaintStatus::Done => "เสร็จสิ้น",
        ComplaintStatus::Verified => "ตรวจสอบแล้ว",
        ComplaintStatus::Rejected => "ไม่อนุมัติ",
        ComplaintStatus::Cancelled => "ยกเลิก",
        ComplaintStatus::Reopened => "ขอแก้ไข",
    }
}

pub fn status_color(status: ComplaintStatus) -> &'static str {
    match status {
        ComplaintStatus::Pending => "#F39C12",
        ComplaintStatus::Done => "#27AE60",
        ComplaintStatus::Verified => "#2980B9",
        ComplaintStatus::Rejected => "#C0392B",
        ComplaintStatus::Cancelled => "#7F8C8D",
        ComplaintStatus::Reopened => "#8E44AD",
    }
}

/// Placeholder for optional text fields in cards.
pub fn or_dash(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => "-",
    }
}
