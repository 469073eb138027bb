use crate::models::{Choice, Poll, PollResult};

// Page chrome is fixed at compile time and shared by every request.
const LAYOUT_HEAD: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="UTF-8">
    <title>"#;

const LAYOUT_BODY: &str = r#"</title>
  </head>
  <body>
    <div class="container">
      <header>
        <h1>Hidden Polls</h1>
      </header>
"#;

const LAYOUT_TAIL: &str = r#"    </div>
  </body>
</html>
"#;

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

/// Wraps an already-rendered body in the page layout.
pub fn layout(title: &str, body: &str) -> String {
    let mut page = String::with_capacity(LAYOUT_HEAD.len() + LAYOUT_BODY.len() + body.len() + 128);
    page.push_str(LAYOUT_HEAD);
    page.push_str(&escape(title));
    page.push_str(LAYOUT_BODY);
    page.push_str(body);
    page.push_str(LAYOUT_TAIL);
    page
}

pub fn poll_page(poll: &Poll, choices: &[Choice]) -> String {
    let mut body = format!(
        "<div class=\"row\">\n<h2>{}</h2>\n<form method=\"POST\" action=\"/answer\">\n<input type=\"hidden\" value=\"{}\" name=\"poll_id\" />\n",
        escape(&poll.name),
        poll.id
    );
    for choice in choices {
        body.push_str(&format!(
            "  <p><input name=\"choice_id\" type=\"radio\" value=\"{}\" /> {}</p>\n",
            choice.id,
            escape(&choice.answer)
        ));
    }
    body.push_str("<p><input type=\"submit\" value=\"Vote\" /></p>\n</form>\n</div>\n");

    layout(&poll.name, &body)
}

pub fn results_page(result: &PollResult) -> String {
    let mut body = format!(
        "<div class=\"row\">\n<h2>{}</h2>\n<p><em>{} total votes</em></p>\n<ul>\n",
        escape(&result.poll.name),
        result.count
    );
    for summary in &result.summaries {
        body.push_str(&format!(
            "    <li>{}: {} votes ({:.3})</li>\n",
            escape(&summary.choice.answer),
            summary.count,
            summary.percentage
        ));
    }
    body.push_str("</ul>\n</div>\n");

    layout(&result.poll.name, &body)
}
