use serde_json::{json, Value};

use super::format::{map_url, or_dash, short_ref, source_label, status_label, thai_datetime};
use super::NotifyKind;
use crate::model::complaint::ComplaintDetail;

#[derive(Debug, Clone, PartialEq)]
pub struct TelegramMessage {
    pub text: String,
    pub reply_markup: Value,
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn line(label: &str, value: &str) -> String {
    format!("<b>{}:</b> {}", label, escape_html(value))
}

pub fn build_telegram_message(detail: &ComplaintDetail, kind: NotifyKind) -> TelegramMessage {
    let complaint = &detail.complaint;

    let mut lines = vec![
        format!(
            "<b>📢 เรื่องร้องเรียน ({})</b> #{}",
            escape_html(&kind.label()),
            short_ref(&complaint.id)
        ),
        line("วันที่แจ้ง", &thai_datetime(complaint.created_at)),
        line("ช่องทาง", source_label(complaint.source)),
        line("ผู้แจ้ง", or_dash(complaint.reporter_name.as_deref())),
        line("ผู้รับเรื่อง", or_dash(complaint.received_by.as_deref())),
        line("โทร", or_dash(complaint.phone.as_deref())),
        line("โซน", or_dash(complaint.zone_name.as_deref())),
        line("สถานะ", status_label(complaint.status)),
        String::new(),
        line("รายละเอียด", or_dash(Some(&complaint.description))),
    ];

    match kind {
        NotifyKind::Done => lines.push(line("ผลการดำเนินงาน", or_dash(complaint.message.as_deref()))),
        NotifyKind::ReopenRequested => {
            lines.push(line("เหตุผลที่ขอแก้ไข", or_dash(detail.latest_reopen_reason())))
        }
        _ => {}
    }

    let location = complaint.location.as_deref().filter(|l| !l.trim().is_empty());
    if let Some(location) = location {
        lines.push(format!(
            "<b>พิกัด:</b> <a href=\"{}\">{}</a>",
            escape_html(&map_url(location)),
            escape_html(location)
        ));
    }

    let reply_markup = match location {
        Some(location) => json!({
            "inline_keyboard": [[{ "text": "📍 ดูแผนที่", "url": map_url(location) }]]
        }),
        None => json!({ "inline_keyboard": [] }),
    };

    TelegramMessage {
        text: lines.join("\n"),
        reply_markup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::complaint::ComplaintStatus;
    use crate::testing::{sample_complaint, sample_reopen_log};

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
    }

    #[test]
    fn message_lists_fields_and_map_button() {
        let mut detail = sample_complaint();
        detail.complaint.description = "ไฟดับ <ซอย 3> & มืด".to_string();

        let message = build_telegram_message(&detail, NotifyKind::New);

        assert!(message.text.starts_with("<b>📢 เรื่องร้องเรียน (ใหม่)</b> #D4E5FF"));
        assert!(message.text.contains("ไฟดับ &lt;ซอย 3&gt; &amp; มืด"));
        assert!(message.text.contains("<b>ผู้แจ้ง:</b> สมชาย"));
        assert!(message.text.contains("<b>ช่องทาง:</b> LINE"));
        assert!(message.text.contains("https://www.google.com/maps/search/?api=1&amp;query=13.75,100.50"));
        assert_eq!(
            message.reply_markup["inline_keyboard"][0][0]["url"],
            "https://www.google.com/maps/search/?api=1&query=13.75,100.50"
        );
    }

    #[test]
    fn done_and_reopen_sections() {
        let mut detail = sample_complaint();
        detail.complaint.status = ComplaintStatus::Done;
        detail.complaint.message = Some("เปลี่ยนหลอดไฟแล้ว".to_string());
        let done = build_telegram_message(&detail, NotifyKind::Done);
        assert!(done.text.contains("<b>ผลการดำเนินงาน:</b> เปลี่ยนหลอดไฟแล้ว"));

        detail.complaint.status = ComplaintStatus::Reopened;
        detail.reopen_logs = vec![sample_reopen_log(1, &detail.complaint.id, "ยังดับอยู่")];
        let reopen = build_telegram_message(&detail, NotifyKind::ReopenRequested);
        assert!(reopen.text.contains("<b>เหตุผลที่ขอแก้ไข:</b> ยังดับอยู่"));
        assert!(reopen.text.contains("<b>สถานะ:</b> ขอแก้ไข"));
    }

    #[test]
    fn no_location_means_empty_keyboard() {
        let mut detail = sample_complaint();
        detail.complaint.location = None;

        let message = build_telegram_message(&detail, NotifyKind::Overdue { days: 2 });
        assert!(message.text.contains("(ค้าง 2 วัน)"));
        assert_eq!(message.reply_markup, json!({ "inline_keyboard": [] }));
    }
}
