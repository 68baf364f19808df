use super::csrf::CSRF_FIELD;
use super::domain::{CheckInResult, MemberDisplay};
use super::form::{DNI_MAX_LENGTH, DNI_PLACEHOLDER};

const MISSING: &str = "N/A";

/// Inputs to one render of the kiosk page.
#[derive(Debug)]
pub struct KioskPage<'a> {
    pub result: &'a CheckInResult,
    pub dni: &'a str,
    pub dni_error: Option<String>,
    pub csrf_token: &'a str,
    pub reload_after_secs: u64,
}

pub fn render_page(page: &KioskPage<'_>) -> String {
    let result = page.result;
    let refresh = if result.reload {
        format!(
            "<meta http-equiv=\"refresh\" content=\"{}; url=/\">",
            page.reload_after_secs
        )
    } else {
        String::new()
    };

    let welcome = if result.welcome_message.is_empty() {
        String::new()
    } else {
        format!(
            "<h1 class=\"welcome\">{}</h1>",
            escape_html(&result.welcome_message)
        )
    };

    let classes = optional_block("classes", result.classes_message.as_deref());
    let error = optional_block("error", result.error_message.as_deref());
    let alert = result
        .low_balance_alert
        .as_deref()
        .map(|alert| {
            format!(
                "<div class=\"alert\" role=\"alert\">{}</div>",
                escape_html(alert)
            )
        })
        .unwrap_or_default();
    let member = result.member.as_ref().map(member_block).unwrap_or_default();
    let dni_error = page
        .dni_error
        .as_deref()
        .map(|message| {
            format!(
                "<ul class=\"errorlist\"><li>{}</li></ul>",
                escape_html(message)
            )
        })
        .unwrap_or_default();

    format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">{refresh}\
<title>Check-in</title></head><body>\
{welcome}{classes}{error}{alert}{member}\
<form method=\"post\" action=\"/\">\
<input type=\"hidden\" name=\"{CSRF_FIELD}\" value=\"{token}\">\
{dni_error}\
<input type=\"text\" name=\"dni\" maxlength=\"{DNI_MAX_LENGTH}\" placeholder=\"{DNI_PLACEHOLDER}\" value=\"{dni}\" autofocus required>\
<button type=\"submit\">Check in</button>\
</form></body></html>",
        token = escape_html(page.csrf_token),
        dni = escape_html(page.dni),
    )
}

fn optional_block(class: &str, message: Option<&str>) -> String {
    message
        .map(|message| format!("<p class=\"{class}\">{}</p>", escape_html(message)))
        .unwrap_or_default()
}

fn member_block(member: &MemberDisplay) -> String {
    let remaining = member
        .remaining_classes
        .map(|count| count.to_string())
        .unwrap_or_else(|| MISSING.to_string());
    let expires_on = member
        .expires_on
        .map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| MISSING.to_string());

    format!(
        "<dl class=\"member\">\
<dt>Name</dt><dd>{}</dd>\
<dt>Surname</dt><dd>{}</dd>\
<dt>Plan</dt><dd>{}</dd>\
<dt>Classes remaining</dt><dd>{}</dd>\
<dt>Expires</dt><dd>{}</dd>\
</dl>",
        escape_html(member.first_name.as_deref().unwrap_or(MISSING)),
        escape_html(member.last_name.as_deref().unwrap_or(MISSING)),
        escape_html(&member.plan_label),
        remaining,
        expires_on,
    )
}

pub(crate) fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}
