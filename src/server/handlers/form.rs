//! The single-page question form.

use std::sync::Arc;
use axum::extract::State;
use axum::response::Html;
use axum::Form;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::state::AppState;

const PAGE_TITLE: &str = "Project Gutenberg RAG with Mistral API";
const PAGE_DESCRIPTION: &str = "Enter a question and get an answer generated via \
    Retrieval-Augmented Generation using Project Gutenberg documents and Mistral AI.";
const PLACEHOLDER: &str = "Enter your question here...";

#[derive(Debug, Default, Deserialize)]
pub struct QueryForm {
    #[serde(default)]
    pub query: String,
}

pub async fn index() -> Html<String> {
    Html(render_page("", None))
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<QueryForm>,
) -> Result<Html<String>, ApiError> {
    let answer = state.orchestrator.answer_query(&form.query).await?;
    Ok(Html(render_page(&form.query, Some(&answer))))
}

pub fn render_page(query: &str, answer: Option<&str>) -> String {
    let output = answer.map(escape_html).unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }}
textarea, output {{ display: block; width: 100%; box-sizing: border-box; }}
output {{ white-space: pre-wrap; min-height: 4rem; border: 1px solid #ccc; padding: 0.5rem; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p>{description}</p>
<form method="post" action="/">
<label for="query">Question</label>
<textarea id="query" name="query" rows="2" placeholder="{placeholder}">{query}</textarea>
<button type="submit">Submit</button>
</form>
<h2>Answer</h2>
<output for="query">{output}</output>
</body>
</html>
"#,
        title = escape_html(PAGE_TITLE),
        description = escape_html(PAGE_DESCRIPTION),
        placeholder = escape_html(PLACEHOLDER),
        query = escape_html(query),
        output = output,
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_has_form_and_no_answer() {
        let page = render_page("", None);
        assert!(page.contains("<title>Project Gutenberg RAG with Mistral API</title>"));
        assert!(page.contains(r#"placeholder="Enter your question here...""#));
        assert!(page.contains(r#"<output for="query"></output>"#));
    }

    #[test]
    fn answer_and_query_are_escaped() {
        let page = render_page("<b>bold?</b>", Some("a < b & \"c\""));
        assert!(page.contains("&lt;b&gt;bold?&lt;/b&gt;"));
        assert!(page.contains("a &lt; b &amp; &quot;c&quot;"));
        assert!(!page.contains("<b>bold?</b>"));
    }
}
