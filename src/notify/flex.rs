//! LINE Flex bubble for complaint notifications.

use serde_json::{json, Value};

use super::format::{
    map_url, or_dash, short_ref, source_color, source_label, status_color, status_label, thai_datetime,
};
use super::NotifyKind;
use crate::model::complaint::ComplaintDetail;

fn info_row(label: &str, value: &str) -> Value {
    json!({
        "type": "box",
        "layout": "baseline",
        "spacing": "sm",
        "contents": [
            { "type": "text", "text": label, "color": "#8C8C8C", "size": "sm", "flex": 2 },
            { "type": "text", "text": value, "color": "#333333", "size": "sm", "flex": 5, "wrap": true }
        ]
    })
}

fn paragraph(title: &str, body: &str) -> Value {
    json!({
        "type": "box",
        "layout": "vertical",
        "margin": "md",
        "contents": [
            { "type": "text", "text": title, "weight": "bold", "size": "sm" },
            { "type": "text", "text": body, "size": "sm", "wrap": true }
        ]
    })
}

pub fn build_flex_message(detail: &ComplaintDetail, kind: NotifyKind) -> Value {
    let complaint = &detail.complaint;
    let reference = short_ref(&complaint.id);
    let label = kind.label();

    let mut body = vec![
        json!({
            "type": "box",
            "layout": "horizontal",
            "contents": [{
                "type": "text",
                "text": source_label(complaint.source),
                "size": "xs",
                "color": "#FFFFFF",
                "align": "center",
                "gravity": "center"
            }],
            "backgroundColor": source_color(complaint.source),
            "cornerRadius": "md",
            "paddingAll": "4px",
            "width": "90px"
        }),
        info_row("วันที่แจ้ง", &thai_datetime(complaint.created_at)),
        info_row("ผู้แจ้ง", or_dash(complaint.reporter_name.as_deref())),
        info_row("ผู้รับเรื่อง", or_dash(complaint.received_by.as_deref())),
        info_row("โทร", or_dash(complaint.phone.as_deref())),
        info_row("โซน", or_dash(complaint.zone_name.as_deref())),
        json!({
            "type": "box",
            "layout": "baseline",
            "spacing": "sm",
            "contents": [
                { "type": "text", "text": "สถานะ", "color": "#8C8C8C", "size": "sm", "flex": 2 },
                {
                    "type": "text",
                    "text": status_label(complaint.status),
                    "color": status_color(complaint.status),
                    "weight": "bold",
                    "size": "sm",
                    "flex": 5
                }
            ]
        }),
        json!({ "type": "separator", "margin": "md" }),
        paragraph("รายละเอียด", or_dash(Some(&complaint.description))),
    ];

    match kind {
        NotifyKind::Done => {
            body.push(paragraph("ผลการดำเนินงาน", or_dash(complaint.message.as_deref())));
        }
        NotifyKind::ReopenRequested => {
            body.push(paragraph("เหตุผลที่ขอแก้ไข", or_dash(detail.latest_reopen_reason())));
        }
        _ => {}
    }

    let mut bubble = json!({
        "type": "bubble",
        "header": {
            "type": "box",
            "layout": "vertical",
            "backgroundColor": status_color(complaint.status),
            "contents": [
                {
                    "type": "text",
                    "text": format!("เรื่องร้องเรียน ({})", label),
                    "weight": "bold",
                    "size": "lg",
                    "color": "#FFFFFF"
                },
                { "type": "text", "text": format!("#{}", reference), "size": "sm", "color": "#FFFFFF" }
            ]
        },
        "body": {
            "type": "box",
            "layout": "vertical",
            "spacing": "sm",
            "contents": body
        }
    });

    if let Some(location) = complaint.location.as_deref().filter(|l| !l.trim().is_empty()) {
        bubble["footer"] = json!({
            "type": "box",
            "layout": "vertical",
            "contents": [{
                "type": "button",
                "style": "primary",
                "height": "sm",
                "action": { "type": "uri", "label": "ดูแผนที่", "uri": map_url(location) }
            }]
        });
    }

    json!({
        "type": "flex",
        "altText": format!("[{}] เรื่องร้องเรียน #{}", label, reference),
        "contents": bubble
    })
}
