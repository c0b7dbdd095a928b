//! HTML rendering for the record table and the connection error page.
//!
//! Pages are plain server-rendered HTML with one form per action. All record text passes
//! through [`escape`] before it reaches the markup.

use rxstatus_core::constants::{
    ENV_BASE_ID, ENV_TABLE_NAME, FIELD_DOB, FIELD_PATIENT_NAME, FIELD_PHARMACY, FIELD_STATUS,
};
use rxstatus_core::{ConnectionError, Notice, NoticeKind, Record};
use std::fmt::Write;

const TITLE: &str = "Patient Pharmacy Status";

const STYLE: &str = "body{font-family:sans-serif;margin:2rem}\
table{border-collapse:collapse;margin-bottom:2rem}\
th,td{border:1px solid #ccc;padding:.4rem .6rem;text-align:left}\
.notice{padding:.6rem 1rem;margin-bottom:1rem;border-radius:4px}\
.notice-success{background:#e6f4ea;color:#1e4620}\
.notice-error{background:#fdecea;color:#611a15}\
form.inline{display:inline}";

/// Troubleshooting steps shown when the record list cannot be loaded.
pub const TROUBLESHOOTING: [&str; 3] = [
    "Verify that the access token has read and write permissions for the base",
    "Verify the base ID (AIRTABLE_BASE_ID)",
    "Verify the table name (AIRTABLE_TABLE_NAME)",
];

/// Escape text for use in HTML element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

fn notice_html(notice: Option<&Notice>) -> String {
    match notice {
        None => String::new(),
        Some(notice) => {
            let class = match notice.kind {
                NoticeKind::Success => "notice notice-success",
                NoticeKind::Error => "notice notice-error",
            };
            format!(
                "<div class=\"{class}\" role=\"status\">{}</div>\n",
                escape(&notice.text)
            )
        }
    }
}

fn cell(value: Option<&str>) -> String {
    format!("<td>{}</td>", escape(value.unwrap_or_default()))
}

fn input(name: &str, placeholder: Option<&str>, required: bool) -> String {
    let placeholder = escape(placeholder.unwrap_or(name));
    let required = if required { " required" } else { "" };
    format!("<input type=\"text\" name=\"{name}\" placeholder=\"{placeholder}\"{required}>")
}

fn record_row(record: &Record) -> String {
    let id = escape(record.id.as_str());
    let fields = &record.fields;

    let edit_inputs = [
        (FIELD_PATIENT_NAME, fields.patient_name.as_deref()),
        (FIELD_PHARMACY, fields.pharmacy.as_deref()),
        (FIELD_STATUS, fields.status.as_deref()),
        (FIELD_DOB, fields.dob.as_deref()),
    ]
    .into_iter()
    .map(|(name, current)| input(name, current, false))
    .collect::<String>();

    format!(
        "<tr><td>{id}</td>{}{}{}{}<td>\
         <form class=\"inline\" method=\"post\" action=\"/edit\">\
         <input type=\"hidden\" name=\"id\" value=\"{id}\">{edit_inputs}\
         <button type=\"submit\">Update</button></form> \
         <form class=\"inline\" method=\"post\" action=\"/delete\">\
         <input type=\"hidden\" name=\"id\" value=\"{id}\">\
         <button type=\"submit\">Delete</button></form>\
         </td></tr>\n",
        cell(fields.patient_name.as_deref()),
        cell(fields.pharmacy.as_deref()),
        cell(fields.status.as_deref()),
        cell(fields.dob.as_deref()),
    )
}

/// Render the record table with the add, edit and delete forms.
pub fn render_records(records: &[Record], notice: Option<&Notice>) -> String {
    let mut body = format!("<h1>{TITLE}</h1>\n");
    body.push_str(&notice_html(notice));

    body.push_str("<table>\n<thead><tr><th>ID</th>");
    for column in [FIELD_PATIENT_NAME, FIELD_PHARMACY, FIELD_STATUS, FIELD_DOB] {
        let _ = write!(body, "<th>{column}</th>");
    }
    body.push_str("<th>Actions</th></tr></thead>\n<tbody>\n");
    if records.is_empty() {
        body.push_str("<tr><td colspan=\"6\">No records found.</td></tr>\n");
    }
    for record in records {
        body.push_str(&record_row(record));
    }
    body.push_str("</tbody>\n</table>\n");

    body.push_str("<h2>Add record</h2>\n<form method=\"post\" action=\"/add\">");
    for column in [FIELD_PATIENT_NAME, FIELD_PHARMACY, FIELD_STATUS, FIELD_DOB] {
        body.push_str(&input(column, None, true));
    }
    body.push_str("<button type=\"submit\">Add</button></form>\n");

    document(&body)
}

/// Render the page shown in place of the table when the record list cannot be fetched.
pub fn render_connection_error(err: &ConnectionError, notice: Option<&Notice>) -> String {
    let mut body = String::from("<h1>Unable to load records</h1>\n");
    body.push_str(&notice_html(notice));
    let _ = writeln!(body, "<p class=\"notice notice-error\">{}</p>", escape(&err.to_string()));

    body.push_str("<h2>Troubleshooting</h2>\n<ul>\n");
    for step in TROUBLESHOOTING {
        let _ = writeln!(body, "<li>{}</li>", escape(step));
    }
    body.push_str("</ul>\n");
    let _ = writeln!(
        body,
        "<p>Configuration is read from the {ENV_BASE_ID} and {ENV_TABLE_NAME} environment variables at startup.</p>"
    );

    document(&body)
}

/// Render a generic failure page.
pub fn render_internal_error() -> String {
    document("<h1>Internal error</h1>\n<p>The request could not be completed.</p>\n")
}
