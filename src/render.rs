//! HTML views of a lookup result.

use crate::{domain::host_from_url, errors::IcpError, LookupOutcome, LookupPipeline, LookupRecord};

/// Rendered popup body plus what produced it.
pub struct PopupView {
    pub html: String,
    pub outcome: Result<LookupOutcome, IcpError>,
}

/// Look up the page at `page_url` and render the popup body.
///
/// A missing, empty or host-less URL renders the error notice, linked to the
/// primary provider's endpoint.
pub async fn popup_view(pipeline: &LookupPipeline, page_url: Option<&str>) -> PopupView {
    let host = match page_url.map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => host_from_url(url),
        None => Err(IcpError::InvalidHost("No page URL given".to_string())),
    };

    match host {
        Ok(host) => {
            let outcome = pipeline.lookup_detailed(&host).await;
            PopupView {
                html: render_record(&outcome.record),
                outcome: Ok(outcome),
            }
        }
        Err(e) => PopupView {
            html: render_error(&e.to_string(), &pipeline.provider_url()),
            outcome: Err(e),
        },
    }
}

/// Table with one row per record field.
pub fn render_record(record: &LookupRecord) -> String {
    let rows = [
        ("域名", &record.domain),
        ("网站名", &record.site_name),
        ("性质", &record.nature),
        ("单位名称", &record.company_name),
        ("审核时间", &record.time),
        ("ICP", &record.icp),
    ];

    let mut html = String::from("<center>\n    <table>\n");
    for (label, value) in rows {
        html.push_str(&format!(
            "        <tr><td><b>{}</b></td><td>{}</td></tr>\n",
            label,
            escape_html(value)
        ));
    }
    html.push_str("    </table>\n</center>");
    html
}

/// Error notice with a link to query the provider directly.
pub fn render_error(message: &str, direct_url: &str) -> String {
    format!(
        "<div style=\"color: red; text-align: center;\">\n    查询失败: {}<br>\n    <a href=\"{}\" target=\"_blank\">点击直接访问API</a>\n</div>",
        escape_html(message),
        escape_html(direct_url)
    )
}

/// Wrap a fragment in a minimal page.
pub fn render_page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>ICP</title></head>\n<body>\n<div id=\"content\">\n{}\n</div>\n</body>\n</html>\n",
        body
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
