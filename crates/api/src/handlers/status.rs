use axum::{
    extract::{Path, State},
    response::Html,
};

use html_escape::encode_safe;

use crate::{error::ApiResult, routes::AppState};

fn row(name: &str, status: &str) -> String {
    let name = encode_safe(name);
    format!(
        "<tr><td><a href='/logs/{name}'>{name}</a></td><td>{}</td></tr>",
        encode_safe(status)
    )
}

/// 管理进程与Worker状态表
pub async fn status_page(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let stats = state.pool.stats().await?;
    let manager_name: &str = &state.manager_name;

    let manager = stats
        .get(manager_name)
        .map(|status| row(manager_name, status))
        .unwrap_or_default();
    let workers = stats
        .iter()
        .filter(|(name, _)| name.as_str() != manager_name)
        .map(|(name, status)| row(name, status))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Html(format!(
        r#"<html>
    <head>
        <title>Entity linking containers</title>
    </head>
    <body>
        <h4>Manager</h4>
        <table>
        <tr><td>name</td><td>status</td></tr>
        {manager}
        </table>
        <h4>Workers</h4>
        <table>
        <tr><td>name</td><td>status</td></tr>
        {workers}
        </table>
    </body>
</html>"#
    )))
}

/// 日志页，换行渲染为 `<br />`
pub async fn logs_page(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Html<String>> {
    let logs = state.pool.logs(&name).await?;
    let body = encode_safe(&logs).replace('\n', "<br />");

    Ok(Html(format!(
        r#"<html>
    <head>
        <title>{} logs</title>
    </head>
    <body>
        {body}
    </body>
</html>"#,
        encode_safe(&name)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_escapes_quotes_and_markup() {
        let html = row("w'><script>", r#"<b>"x" & y</b>"#);
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b>"));
        assert!(!html.contains("w'>"));
        assert!(html.contains("&lt;b&gt;&quot;x&quot; &amp; y"));
    }

    #[test]
    fn test_row_links_to_logs() {
        assert_eq!(
            row("el-worker-1", "running"),
            "<tr><td><a href='/logs/el-worker-1'>el-worker-1</a></td><td>running</td></tr>"
        );
    }
}
